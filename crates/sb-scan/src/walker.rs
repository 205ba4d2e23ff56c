//! Recursive share walker.
//!
//! Walks each share root, applies the blacklist and classifier, resolves
//! sidecars, and hands every accepted item to the callback. Per-entry
//! errors are swallowed (a single unreadable file must not kill a scan);
//! only cancellation and callback failures surface.

use std::path::Path;

use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use sb_core::config::{BlacklistConfig, Share};
use sb_core::paths::{is_existing_dir, normalize};
use sb_core::{encode_id, Error, MediaItem, MediaKind, Result};

use crate::rules::{is_blocked_size, is_blocked_string};
use crate::sidecar::{find_audio_sidecars, find_sidecar_subtitles, DirCache};

/// Internal safety ceiling applied when the configured cap is 0.
pub const WALK_ITEM_CEILING: usize = 100_000;

/// What a walk produced.
#[derive(Debug, Clone, Copy)]
pub struct WalkOutcome {
    /// Number of items handed to the callback.
    pub produced: usize,
    /// False iff the walk stopped because it hit the item cap.
    pub complete: bool,
}

/// Walk all shares, invoking `cb(item, abs_path, share_root)` per accepted
/// media file.
///
/// `max_items == 0` means no user-imposed cap; [`WALK_ITEM_CEILING`] still
/// applies. The cancellation token is polled between directory entries.
pub fn walk_shares<F>(
    shares: &[Share],
    blacklist: &BlacklistConfig,
    max_items: usize,
    cancel: &CancellationToken,
    cb: &mut F,
) -> Result<WalkOutcome>
where
    F: FnMut(MediaItem, &Path, &Path) -> Result<()>,
{
    let limit = if max_items == 0 {
        WALK_ITEM_CEILING
    } else {
        max_items
    };
    let mut produced = 0usize;
    let mut dir_cache = DirCache::new();

    'shares: for sh in shares {
        let root = normalize(&sh.path);
        if root.as_os_str().is_empty() || !is_existing_dir(&root) {
            continue;
        }

        let folders = blacklist.folders.clone();
        let walker = WalkDir::new(&root)
            .follow_links(true)
            .into_iter()
            .filter_entry(move |e| {
                // The share root itself is never filtered, even if dotted.
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                !name.starts_with('.') && !is_blocked_string(&folders, &name)
            });

        for entry in walker {
            if cancel.is_cancelled() {
                return Err(Error::Internal("scan cancelled".into()));
            }

            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            let ext = match name.rfind('.') {
                Some(idx) => name[idx..].to_lowercase(),
                None => continue,
            };
            if is_blocked_string(&blacklist.extensions, &ext) {
                continue;
            }
            if is_blocked_string(&blacklist.filenames, &name) {
                continue;
            }
            if sb_core::media::is_subtitle_ext(&ext) || sb_core::media::is_lyrics_ext(&ext) {
                continue;
            }

            let meta = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    tracing::debug!(error = %e, file = %name, "stat failed, skipping");
                    continue;
                }
            };
            let size = meta.len() as i64;
            if is_blocked_size(size, &blacklist.size_rule) {
                continue;
            }
            let mod_time = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);

            let path = entry.path();
            let kind = MediaKind::from_ext(&ext);
            let mut item = MediaItem {
                id: encode_id(path),
                name,
                ext,
                kind,
                share_label: sh.label.clone(),
                size,
                mod_time,
                subtitles: Vec::new(),
                cover_id: String::new(),
                lyrics_id: String::new(),
            };

            match kind {
                MediaKind::Video => {
                    item.subtitles = find_sidecar_subtitles(path, &mut dir_cache);
                }
                MediaKind::Audio => {
                    let (cover, lyrics) = find_audio_sidecars(path, &mut dir_cache);
                    if let Some(c) = cover {
                        item.cover_id = encode_id(&c);
                    }
                    if let Some(l) = lyrics {
                        item.lyrics_id = encode_id(&l);
                    }
                }
                _ => {}
            }

            cb(item, path, &root)?;
            produced += 1;
            if produced >= limit {
                break 'shares;
            }
        }
    }

    Ok(WalkOutcome {
        produced,
        complete: produced < limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn share(label: &str, path: &Path) -> Share {
        Share {
            label: label.into(),
            path: path.to_string_lossy().to_string(),
        }
    }

    fn collect(
        shares: &[Share],
        blacklist: &BlacklistConfig,
        max_items: usize,
    ) -> (Vec<MediaItem>, WalkOutcome) {
        let cancel = CancellationToken::new();
        let mut items = Vec::new();
        let outcome = walk_shares(shares, blacklist, max_items, &cancel, &mut |item, _, _| {
            items.push(item);
            Ok(())
        })
        .unwrap();
        (items, outcome)
    }

    #[test]
    fn classifies_and_attaches_sidecars() {
        let tmp = tempfile::tempdir().unwrap();
        let d = tmp.path();
        std::fs::write(d.join("clip.mp4"), b"v").unwrap();
        std::fs::write(d.join("clip.en.srt"), b"s").unwrap();
        std::fs::write(d.join("song.mp3"), b"a").unwrap();
        std::fs::write(d.join("song.jpg"), b"c").unwrap();
        std::fs::write(d.join("readme.txt"), b"t").unwrap();

        let (items, outcome) = collect(
            &[share("A", d)],
            &BlacklistConfig::default(),
            0,
        );
        assert!(outcome.complete);
        assert_eq!(items.len(), 3); // srt is a sidecar, not an item

        let video = items.iter().find(|i| i.kind == MediaKind::Video).unwrap();
        assert_eq!(video.subtitles.len(), 1);
        let audio = items.iter().find(|i| i.kind == MediaKind::Audio).unwrap();
        assert!(!audio.cover_id.is_empty());
        let other = items.iter().find(|i| i.kind == MediaKind::Other).unwrap();
        assert_eq!(other.name, "readme.txt");
    }

    #[test]
    fn hidden_dirs_skipped_but_dotted_root_scanned() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join(".library");
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join("a.mp4"), b"v").unwrap();
        std::fs::write(root.join(".git").join("b.mp4"), b"v").unwrap();

        let (items, _) = collect(&[share("A", &root)], &BlacklistConfig::default(), 0);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "a.mp4");
    }

    #[test]
    fn folder_blacklist_regex_prunes_subtree() {
        let tmp = tempfile::tempdir().unwrap();
        let d = tmp.path();
        std::fs::create_dir_all(d.join("extras")).unwrap();
        std::fs::write(d.join("keep.mp4"), b"v").unwrap();
        std::fs::write(d.join("extras").join("drop.mp4"), b"v").unwrap();

        let blacklist = BlacklistConfig {
            folders: vec!["/^ext/".into()],
            ..Default::default()
        };
        let (items, _) = collect(&[share("A", d)], &blacklist, 0);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "keep.mp4");
    }

    #[test]
    fn extension_and_filename_blacklists_apply() {
        let tmp = tempfile::tempdir().unwrap();
        let d = tmp.path();
        std::fs::write(d.join("a.iso"), b"x").unwrap();
        std::fs::write(d.join("Thumbs.db"), b"x").unwrap();
        std::fs::write(d.join("keep.mp4"), b"x").unwrap();

        let blacklist = BlacklistConfig {
            extensions: vec![".iso".into()],
            filenames: vec!["thumbs.db".into()],
            ..Default::default()
        };
        let (items, _) = collect(&[share("A", d)], &blacklist, 0);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "keep.mp4");
    }

    #[test]
    fn size_rule_filters_items() {
        let tmp = tempfile::tempdir().unwrap();
        let d = tmp.path();
        std::fs::write(d.join("big.mp4"), vec![0u8; 4096]).unwrap();
        std::fs::write(d.join("small.mp4"), vec![0u8; 10]).unwrap();

        let blacklist = BlacklistConfig {
            size_rule: ">=1KB".into(),
            ..Default::default()
        };
        let (items, _) = collect(&[share("A", d)], &blacklist, 0);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "small.mp4");
    }

    #[test]
    fn item_cap_reports_incomplete() {
        let tmp = tempfile::tempdir().unwrap();
        let d = tmp.path();
        for i in 0..5 {
            std::fs::write(d.join(format!("f{i}.mp4")), b"v").unwrap();
        }

        let (items, outcome) = collect(&[share("A", d)], &BlacklistConfig::default(), 3);
        assert_eq!(items.len(), 3);
        assert!(!outcome.complete);
    }

    #[test]
    fn missing_root_is_skipped() {
        let (items, outcome) = collect(
            &[share("gone", &PathBuf::from("/nonexistent/streambox-test"))],
            &BlacklistConfig::default(),
            0,
        );
        assert!(items.is_empty());
        assert!(outcome.complete);
    }

    #[test]
    fn cancellation_surfaces_as_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.mp4"), b"v").unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = walk_shares(
            &[share("A", tmp.path())],
            &BlacklistConfig::default(),
            0,
            &cancel,
            &mut |_, _, _| Ok(()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn files_without_extension_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("README"), b"x").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), b"x").unwrap();

        let (items, _) = collect(&[share("A", tmp.path())], &BlacklistConfig::default(), 0);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "notes.txt");
    }
}
