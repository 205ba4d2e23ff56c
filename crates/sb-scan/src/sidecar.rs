//! Sidecar resolution: subtitles, lyrics, and cover art.
//!
//! A media file's companions live next to it and follow naming rules
//! based on the file stem. Resolution goes through a per-scan [`DirCache`]
//! so a directory full of media is enumerated once, not once per file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sb_core::{encode_id, Subtitle};

/// One cached directory entry.
#[derive(Debug, Clone)]
pub struct DirEntryMeta {
    pub name: String,
    pub is_dir: bool,
}

/// Per-scan cache of directory listings.
///
/// Unreadable directories cache as empty so repeat failures stay cheap.
#[derive(Debug, Default)]
pub struct DirCache {
    entries: HashMap<PathBuf, Arc<Vec<DirEntryMeta>>>,
}

impl DirCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// List `dir`, reading it at most once for the lifetime of the cache.
    pub fn list(&mut self, dir: &Path) -> Arc<Vec<DirEntryMeta>> {
        if let Some(cached) = self.entries.get(dir) {
            return cached.clone();
        }
        let mut out = Vec::new();
        if let Ok(rd) = std::fs::read_dir(dir) {
            for ent in rd.flatten() {
                let is_dir = ent.file_type().map(|t| t.is_dir()).unwrap_or(false);
                out.push(DirEntryMeta {
                    name: ent.file_name().to_string_lossy().to_string(),
                    is_dir,
                });
            }
        }
        let arc = Arc::new(out);
        self.entries.insert(dir.to_path_buf(), arc.clone());
        arc
    }

    /// Whether `dir` directly contains a non-directory entry named `name`.
    fn has_file(&mut self, dir: &Path, name: &str) -> bool {
        self.list(dir).iter().any(|e| !e.is_dir && e.name == name)
    }
}

/// Split a file name into (lowercase stem, lowercase `.ext`).
fn split_lower(name: &str) -> (String, String) {
    let low = name.to_lowercase();
    match low.rfind('.') {
        Some(idx) if idx > 0 => (low[..idx].to_string(), low[idx..].to_string()),
        _ => (low, String::new()),
    }
}

/// Locate subtitle companions for a video file.
///
/// `clip.vtt` pairs with `clip.mp4` as the unnamed (Chinese) track;
/// `clip.en.srt` pairs with language token `en`. The first entry after
/// sorting (Chinese first, then label) is flagged default.
pub fn find_sidecar_subtitles(media_abs: &Path, cache: &mut DirCache) -> Vec<Subtitle> {
    let dir = match media_abs.parent() {
        Some(d) => d,
        None => return Vec::new(),
    };
    let base = match media_abs.file_stem().and_then(|s| s.to_str()) {
        Some(b) => b,
        None => return Vec::new(),
    };
    let base_lower = base.to_lowercase();
    let base_prefix = format!("{base_lower}.");

    let mut out = Vec::new();
    for ent in cache.list(dir).iter() {
        if ent.is_dir {
            continue;
        }
        let (stem, ext) = split_lower(&ent.name);
        if ext != ".vtt" && ext != ".srt" {
            continue;
        }

        let token = if stem == base_lower {
            String::new()
        } else if let Some(suffix) = stem.strip_prefix(&base_prefix) {
            suffix.to_string()
        } else {
            continue;
        };

        let abs = dir.join(&ent.name);
        let id = encode_id(&abs);
        // .srt goes through the conversion endpoint; .vtt streams as-is.
        let src = if ext == ".srt" {
            format!("/api/subtitle?id={id}")
        } else {
            format!("/api/stream?id={id}")
        };

        let (lang, label) = if token.is_empty() {
            ("zh".to_string(), "字幕".to_string())
        } else {
            (token.clone(), subtitle_label(&token))
        };

        out.push(Subtitle {
            id,
            label,
            lang,
            src,
            default: false,
        });
    }

    if out.is_empty() {
        return out;
    }

    out.sort_by(|a, b| {
        let a_zh = a.lang == "zh";
        let b_zh = b.lang == "zh";
        b_zh.cmp(&a_zh)
            .then_with(|| a.label.to_lowercase().cmp(&b.label.to_lowercase()))
    });
    out[0].default = true;
    out
}

/// Pretty display label for a subtitle language token.
pub fn subtitle_label(token: &str) -> String {
    match token.trim().to_lowercase().as_str() {
        "zh" | "zh-cn" | "zh-hans" => "中文".into(),
        "zh-tw" | "zh-hant" => "繁體".into(),
        "en" | "en-us" | "en-gb" => "English".into(),
        "ja" | "jp" => "日本語".into(),
        "ko" => "한국어".into(),
        "fr" => "Français".into(),
        "de" => "Deutsch".into(),
        "es" => "Español".into(),
        "ru" => "Русский".into(),
        _ => token.into(),
    }
}

/// Generic cover-art names checked after stem-based candidates.
const GENERIC_COVERS: &[&str] = &[
    "cover.jpg",
    "folder.jpg",
    "front.jpg",
    "album.jpg",
    "albumart.jpg",
];

/// Locate cover-art and lyrics companions for an audio file.
///
/// Lyrics prefer an exact `stem.lrc` match, then the first
/// `stem.<token>.lrc`, then any `.lrc` in the directory. Cover art is the
/// first existing among `stem.{jpg,jpeg,png,webp}` and the generic names.
pub fn find_audio_sidecars(
    media_abs: &Path,
    cache: &mut DirCache,
) -> (Option<PathBuf>, Option<PathBuf>) {
    let dir = match media_abs.parent() {
        Some(d) => d,
        None => return (None, None),
    };
    let base = match media_abs.file_stem().and_then(|s| s.to_str()) {
        Some(b) => b,
        None => return (None, None),
    };
    let base_lower = base.to_lowercase();
    let base_prefix = format!("{base_lower}.");

    let mut exact: Option<String> = None;
    let mut lang_match: Option<String> = None;
    let mut any: Option<String> = None;
    for ent in cache.list(dir).iter() {
        if ent.is_dir {
            continue;
        }
        let (stem, ext) = split_lower(&ent.name);
        if ext != ".lrc" {
            continue;
        }
        if stem == base_lower {
            exact = Some(ent.name.clone());
            break;
        }
        if lang_match.is_none() && stem.starts_with(&base_prefix) {
            lang_match = Some(ent.name.clone());
        }
        if any.is_none() {
            any = Some(ent.name.clone());
        }
    }
    let lyrics = exact
        .or(lang_match)
        .or(any)
        .map(|name| dir.join(name));

    let mut cover = None;
    for ext in ["jpg", "jpeg", "png", "webp"] {
        let candidate = format!("{base}.{ext}");
        if cache.has_file(dir, &candidate) {
            cover = Some(dir.join(candidate));
            break;
        }
    }
    if cover.is_none() {
        for name in GENERIC_COVERS {
            if cache.has_file(dir, name) {
                cover = Some(dir.join(name));
                break;
            }
        }
    }

    (cover, lyrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_core::decode_id;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn subtitle_tokens_and_sources() {
        let tmp = tempfile::tempdir().unwrap();
        let d = tmp.path();
        touch(d, "clip.mp4");
        touch(d, "clip.en.srt");
        touch(d, "clip.zh.vtt");
        touch(d, "unrelated.srt");

        let mut cache = DirCache::new();
        let subs = find_sidecar_subtitles(&d.join("clip.mp4"), &mut cache);
        assert_eq!(subs.len(), 2);

        // zh sorts first and carries the default flag.
        assert_eq!(subs[0].lang, "zh");
        assert_eq!(subs[0].label, "中文");
        assert!(subs[0].default);
        assert!(subs[0].src.starts_with("/api/stream?id="));

        assert_eq!(subs[1].lang, "en");
        assert_eq!(subs[1].label, "English");
        assert!(!subs[1].default);
        assert!(subs[1].src.starts_with("/api/subtitle?id="));
    }

    #[test]
    fn bare_stem_subtitle_is_chinese_default() {
        let tmp = tempfile::tempdir().unwrap();
        let d = tmp.path();
        touch(d, "Movie.mkv");
        touch(d, "movie.SRT");

        let mut cache = DirCache::new();
        let subs = find_sidecar_subtitles(&d.join("Movie.mkv"), &mut cache);
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].lang, "zh");
        assert_eq!(subs[0].label, "字幕");
        assert!(subs[0].default);
    }

    #[test]
    fn exactly_one_default_among_many() {
        let tmp = tempfile::tempdir().unwrap();
        let d = tmp.path();
        touch(d, "show.mp4");
        for token in ["en", "ja", "fr", "de"] {
            touch(d, &format!("show.{token}.vtt"));
        }

        let mut cache = DirCache::new();
        let subs = find_sidecar_subtitles(&d.join("show.mp4"), &mut cache);
        assert_eq!(subs.len(), 4);
        assert_eq!(subs.iter().filter(|s| s.default).count(), 1);
        // No zh track: label order decides (Deutsch < English < Français < 日本語).
        assert_eq!(subs[0].label, "Deutsch");
        assert!(subs[0].default);
    }

    #[test]
    fn unknown_token_label_is_verbatim() {
        assert_eq!(subtitle_label("pt-br"), "pt-br");
        assert_eq!(subtitle_label("ZH-CN"), "中文");
    }

    #[test]
    fn lyrics_priority_exact_then_lang_then_any() {
        let tmp = tempfile::tempdir().unwrap();
        let d = tmp.path();
        touch(d, "song.mp3");
        touch(d, "album.lrc");
        touch(d, "song.en.lrc");

        let mut cache = DirCache::new();
        let (_, lyrics) = find_audio_sidecars(&d.join("song.mp3"), &mut cache);
        assert_eq!(lyrics.unwrap().file_name().unwrap(), "song.en.lrc");

        touch(d, "song.lrc");
        let mut fresh = DirCache::new();
        let (_, lyrics) = find_audio_sidecars(&d.join("song.mp3"), &mut fresh);
        assert_eq!(lyrics.unwrap().file_name().unwrap(), "song.lrc");
    }

    #[test]
    fn any_lrc_is_last_resort() {
        let tmp = tempfile::tempdir().unwrap();
        let d = tmp.path();
        touch(d, "song.mp3");
        touch(d, "collection.lrc");

        let mut cache = DirCache::new();
        let (_, lyrics) = find_audio_sidecars(&d.join("song.mp3"), &mut cache);
        assert_eq!(lyrics.unwrap().file_name().unwrap(), "collection.lrc");
    }

    #[test]
    fn cover_prefers_stem_then_generics() {
        let tmp = tempfile::tempdir().unwrap();
        let d = tmp.path();
        touch(d, "song.mp3");
        touch(d, "cover.jpg");

        let mut cache = DirCache::new();
        let (cover, _) = find_audio_sidecars(&d.join("song.mp3"), &mut cache);
        assert_eq!(cover.unwrap().file_name().unwrap(), "cover.jpg");

        touch(d, "song.png");
        let mut fresh = DirCache::new();
        let (cover, _) = find_audio_sidecars(&d.join("song.mp3"), &mut fresh);
        assert_eq!(cover.unwrap().file_name().unwrap(), "song.png");
    }

    #[test]
    fn subtitle_ids_decode_to_sidecar_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let d = tmp.path();
        touch(d, "clip.mp4");
        touch(d, "clip.en.srt");

        let mut cache = DirCache::new();
        let subs = find_sidecar_subtitles(&d.join("clip.mp4"), &mut cache);
        let decoded = decode_id(&subs[0].id).unwrap();
        assert_eq!(decoded, d.join("clip.en.srt").to_string_lossy());
    }

    #[test]
    fn dir_cache_lists_once() {
        let tmp = tempfile::tempdir().unwrap();
        let d = tmp.path();
        touch(d, "a.mp3");

        let mut cache = DirCache::new();
        let first = cache.list(d);
        // A file created after the first listing is invisible to this scan.
        touch(d, "b.mp3");
        let second = cache.list(d);
        assert_eq!(first.len(), second.len());
    }
}
