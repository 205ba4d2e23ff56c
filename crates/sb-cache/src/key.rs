//! Cache-key derivation.
//!
//! The key is a total function of every input that affects scan output:
//! the share set (order- and case-insensitive) and the four blacklist
//! rule groups. Identical inputs produce byte-identical keys.

use sb_core::config::{BlacklistConfig, Share};
use sb_core::paths::normalize;

/// Compute the deterministic cache key for a share set + blacklist.
pub fn media_cache_key(shares: &[Share], blacklist: &BlacklistConfig) -> String {
    let mut out = shares_cache_key(shares);

    let exts = norm_rule_list(&blacklist.extensions);
    let files = norm_rule_list(&blacklist.filenames);
    let folders = norm_rule_list(&blacklist.folders);

    out.push_str("blExt=");
    out.push_str(&exts.join(","));
    out.push('\n');
    out.push_str("blFile=");
    out.push_str(&files.join(","));
    out.push('\n');
    out.push_str("blFolder=");
    out.push_str(&folders.join(","));
    out.push('\n');
    out.push_str("blSize=");
    out.push_str(&blacklist.size_rule.trim().to_lowercase());
    out.push('\n');

    out
}

/// One `root|label` line per share, sorted by lowercased root.
fn shares_cache_key(shares: &[Share]) -> String {
    let mut normalized: Vec<(String, String)> = shares
        .iter()
        .map(|sh| {
            (
                normalize(&sh.path).to_string_lossy().to_lowercase(),
                sh.label.trim().to_string(),
            )
        })
        .collect();
    normalized.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = String::new();
    for (root, label) in normalized {
        out.push_str(&root);
        out.push('|');
        out.push_str(&label);
        out.push('\n');
    }
    out
}

/// Trim, drop blanks, lowercase, and sort a rule list.
fn norm_rule_list(rules: &[String]) -> Vec<String> {
    let mut out: Vec<String> = rules
        .iter()
        .map(|r| r.trim().to_lowercase())
        .filter(|r| !r.is_empty())
        .collect();
    out.sort();
    out
}
