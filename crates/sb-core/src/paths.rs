//! Path normalization and share-root authorization.
//!
//! All user-supplied paths pass through [`normalize`] before use: it trims
//! whitespace and stray quotes (pasted Windows paths arrive wrapped in
//! them), folds `.`/`..` components, and resolves to absolute form.
//! [`is_allowed_file`] is the single authorization gate for the stream,
//! subtitle, and probe endpoints.

use std::path::{Component, Path, PathBuf};

use crate::config::Share;

/// Normalize a raw path string: trim, strip quotes, clean, make absolute.
///
/// Returns an empty path when the input is blank after trimming.
pub fn normalize(raw: &str) -> PathBuf {
    let trimmed = raw.trim().replace('"', "");
    if trimmed.is_empty() {
        return PathBuf::new();
    }
    // Forward slashes are accepted on Windows; elsewhere the separator
    // already is `/` and backslashes are ordinary filename bytes.
    let osified = if cfg!(windows) {
        trimmed.replace('/', "\\")
    } else {
        trimmed
    };
    let p = PathBuf::from(osified);
    let abs = if p.is_absolute() {
        p
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(p),
            Err(_) => p,
        }
    };
    clean(&abs)
}

/// Lexically clean a path: drop `.` components, fold `..` into the parent.
///
/// Leading `..` components at the root are dropped (the root has no
/// parent), matching `filepath.Clean` semantics for absolute paths.
pub fn clean(p: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in p.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                ) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Whether the path exists and is a directory.
pub fn is_existing_dir(p: &Path) -> bool {
    std::fs::metadata(p).map(|m| m.is_dir()).unwrap_or(false)
}

/// Whether `target` equals `root` or lies strictly below it.
///
/// Comparisons fold case on Windows (case-insensitive filesystems), and
/// are byte-exact elsewhere. Both sides are lexically cleaned first.
pub fn within_root(root: &Path, target: &Path) -> bool {
    let root = clean(root);
    let target = clean(target);

    if cfg!(windows) {
        let r = root.to_string_lossy().to_lowercase();
        let t = target.to_string_lossy().to_lowercase();
        if r == t {
            return true;
        }
        let mut prefix = r;
        if !prefix.ends_with(std::path::MAIN_SEPARATOR) {
            prefix.push(std::path::MAIN_SEPARATOR);
        }
        t.starts_with(&prefix)
    } else {
        if root == target {
            return true;
        }
        target.starts_with(&root) && target != root
    }
}

/// Whether two raw paths normalize to the same location.
pub fn same_path(a: &str, b: &str) -> bool {
    let na = normalize(a);
    let nb = normalize(b);
    if cfg!(windows) {
        na.to_string_lossy().eq_ignore_ascii_case(&nb.to_string_lossy())
    } else {
        na == nb
    }
}

/// Authorization check for serving `file_abs`: the path must lie within
/// some share root, exist, and not be a directory.
pub fn is_allowed_file(file_abs: &Path, shares: &[Share]) -> bool {
    if file_abs.as_os_str().is_empty() {
        return false;
    }
    let f = clean(file_abs);

    for sh in shares {
        let root = normalize(&sh.path);
        if root.as_os_str().is_empty() {
            continue;
        }
        if within_root(&root, &f) {
            return std::fs::metadata(&f).map(|m| m.is_file()).unwrap_or(false);
        }
    }
    false
}

/// Normalize a share list: clean each root, drop blanks, default the label
/// to the directory basename.
pub fn normalize_shares(shares: &[Share]) -> Vec<Share> {
    let mut out = Vec::with_capacity(shares.len());
    for sh in shares {
        let p = normalize(&sh.path);
        if p.as_os_str().is_empty() {
            continue;
        }
        let label = sh.label.trim();
        let label = if label.is_empty() {
            p.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default()
        } else {
            label.to_string()
        };
        out.push(Share {
            label,
            path: p.to_string_lossy().to_string(),
        });
    }
    out
}

/// Collapse shares whose roots compare case-insensitively equal.
pub fn dedupe_shares(shares: Vec<Share>) -> Vec<Share> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(shares.len());
    for sh in shares {
        if seen.insert(sh.path.to_lowercase()) {
            out.push(sh);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share(label: &str, path: &str) -> Share {
        Share {
            label: label.into(),
            path: path.into(),
        }
    }

    #[test]
    fn normalize_trims_and_strips_quotes() {
        assert_eq!(normalize("  \"/tmp/media\"  "), PathBuf::from("/tmp/media"));
    }

    #[test]
    fn normalize_cleans_dots() {
        assert_eq!(normalize("/tmp/a/../b/./c"), PathBuf::from("/tmp/b/c"));
    }

    #[test]
    fn normalize_blank_is_empty() {
        assert_eq!(normalize("   "), PathBuf::new());
    }

    #[test]
    fn clean_stops_at_root() {
        assert_eq!(clean(Path::new("/../../x")), PathBuf::from("/x"));
    }

    #[test]
    fn within_root_exact_and_child() {
        assert!(within_root(Path::new("/srv/media"), Path::new("/srv/media")));
        assert!(within_root(
            Path::new("/srv/media"),
            Path::new("/srv/media/a/b.mp4")
        ));
    }

    #[test]
    fn within_root_rejects_sibling_prefix() {
        // "/srv/media2" shares a string prefix with "/srv/media" but is outside.
        assert!(!within_root(
            Path::new("/srv/media"),
            Path::new("/srv/media2/x.mp4")
        ));
    }

    #[test]
    fn within_root_rejects_parent() {
        assert!(!within_root(Path::new("/srv/media"), Path::new("/srv")));
    }

    #[test]
    fn allowed_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.mp4");
        std::fs::write(&file, b"x").unwrap();
        let shares = vec![share("A", dir.path().to_str().unwrap())];

        assert!(is_allowed_file(&file, &shares));
        assert!(!is_allowed_file(&dir.path().join("missing.mp4"), &shares));
        // Directories are never servable.
        assert!(!is_allowed_file(dir.path(), &shares));
        // Outside any root.
        assert!(!is_allowed_file(Path::new("/etc/passwd"), &shares));
    }

    #[test]
    fn allowed_rejects_dotdot_escape() {
        let dir = tempfile::tempdir().unwrap();
        let shares = vec![share("A", dir.path().to_str().unwrap())];
        let escape = dir.path().join("../outside.mp4");
        assert!(!is_allowed_file(&escape, &shares));
    }

    #[test]
    fn normalize_shares_defaults_label() {
        let out = normalize_shares(&[share("", "/tmp/Movies")]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].label, "Movies");
    }

    #[test]
    fn dedupe_collapses_case_insensitive_roots() {
        let out = dedupe_shares(vec![share("A", "/tmp/x"), share("B", "/TMP/X")]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].label, "A");
    }
}
