//! SRT to WebVTT conversion.
//!
//! A pure text transform: strip the UTF-8 BOM, normalize line endings,
//! emit the `WEBVTT` preamble, drop cue-index lines, and swap the `,`
//! millisecond separator for `.` on timestamp lines. Applying the
//! transform to its own output leaves it byte-identical.

/// Convert SRT bytes to VTT bytes.
pub fn srt_to_vtt(input: &[u8]) -> Vec<u8> {
    let input = input.strip_prefix(&[0xEF, 0xBB, 0xBF][..]).unwrap_or(input);
    let text = String::from_utf8_lossy(input);
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut lines: Vec<&str> = text.split('\n').collect();
    // A trailing newline yields a phantom empty segment; dropping it keeps
    // the transform idempotent (every emitted line ends in exactly one \n).
    if text.ends_with('\n') {
        lines.pop();
    }

    let mut out = String::with_capacity(text.len() + 16);
    if !text.starts_with("WEBVTT") {
        out.push_str("WEBVTT\n\n");
    }
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            out.push('\n');
            continue;
        }
        if is_all_digits(trimmed) {
            continue;
        }
        if line.contains("-->") {
            out.push_str(&line.replace(',', "."));
            out.push('\n');
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.into_bytes()
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
