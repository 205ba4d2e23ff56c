//! Marker-based container codec sniffing.
//!
//! Reads up to 2 MiB from the file head and, for larger files, up to
//! 2 MiB from the tail (Matroska often places track metadata near the
//! end). Codec detection is a priority-ordered substring search over the
//! combined window; anything other than MKV and the MP4/MOV family yields
//! empty labels.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Maximum bytes read from each end of the file.
const WINDOW: u64 = 2 << 20;

/// Matroska codec-ID markers, highest priority first.
const MKV_VIDEO: &[(&str, &str)] = &[
    ("V_MPEGH/ISO/HEVC", "H.265/HEVC"),
    ("V_MPEG4/ISO/AVC", "H.264/AVC"),
    ("V_AV1", "AV1"),
    ("V_VP9", "VP9"),
];

const MKV_AUDIO: &[(&str, &str)] = &[
    ("A_EAC3", "E-AC-3"),
    ("A_AC3", "AC-3"),
    ("A_OPUS", "Opus"),
    ("A_AAC", "AAC"),
    ("A_VORBIS", "Vorbis"),
    ("A_FLAC", "FLAC"),
    ("A_DTS", "DTS"),
    ("A_TRUEHD", "TrueHD"),
];

/// MP4/MOV FourCC markers, highest priority first.
const MP4_VIDEO: &[(&[&str], &str)] = &[
    (&["hvc1", "hev1"], "H.265/HEVC"),
    (&["avc1"], "H.264/AVC"),
    (&["av01"], "AV1"),
    (&["vp09"], "VP9"),
];

const MP4_AUDIO: &[(&[&str], &str)] = &[
    (&["ec-3"], "E-AC-3"),
    (&["ac-3"], "AC-3"),
    (&["mp4a"], "AAC/MP4A"),
    (&["opus"], "Opus"),
];

/// Report `(video, audio)` codec labels for the file.
///
/// `ext` is the lowercase extension including the dot. Unreadable files
/// and unrecognized containers return empty strings.
pub fn sniff_container_codecs(file_abs: &Path, ext: &str) -> (String, String) {
    let buf = match read_head_and_tail(file_abs) {
        Some(b) if !b.is_empty() => b,
        _ => return (String::new(), String::new()),
    };

    let has = |marker: &str| contains(&buf, marker.as_bytes());

    match ext {
        ".mkv" => {
            let video = MKV_VIDEO
                .iter()
                .find(|(m, _)| has(m))
                .map(|(_, label)| label.to_string())
                .unwrap_or_default();
            let audio = MKV_AUDIO
                .iter()
                .find(|(m, _)| has(m))
                .map(|(_, label)| label.to_string())
                .unwrap_or_default();
            (video, audio)
        }
        ".mp4" | ".m4v" | ".mov" => {
            let video = MP4_VIDEO
                .iter()
                .find(|(ms, _)| ms.iter().any(|m| has(m)))
                .map(|(_, label)| label.to_string())
                .unwrap_or_default();
            let audio = MP4_AUDIO
                .iter()
                .find(|(ms, _)| ms.iter().any(|m| has(m)))
                .map(|(_, label)| label.to_string())
                .unwrap_or_default();
            (video, audio)
        }
        _ => (String::new(), String::new()),
    }
}

/// Read up to [`WINDOW`] bytes from the start and, when the file is
/// larger than one window, up to [`WINDOW`] bytes from the end.
fn read_head_and_tail(path: &Path) -> Option<Vec<u8>> {
    let mut f = File::open(path).ok()?;
    let size = f.metadata().ok()?.len();

    let head_len = size.min(WINDOW);
    let mut buf = Vec::with_capacity((head_len * 2) as usize);
    let mut head = vec![0u8; head_len as usize];
    f.read_exact(&mut head).ok()?;
    buf.extend_from_slice(&head);

    if size > WINDOW {
        let tail_len = WINDOW.min(size);
        let mut tail = vec![0u8; tail_len as usize];
        f.seek(SeekFrom::Start(size - tail_len)).ok()?;
        f.read_exact(&mut tail).ok()?;
        buf.extend_from_slice(&tail);
    }

    Some(buf)
}

/// Naive subsequence search; the haystack is at most 4 MiB and needles
/// are a handful of bytes, so this beats pulling in a search crate.
fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() || haystack.len() < needle.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}
