//! Blacklist rule matching.
//!
//! String rules block by case-insensitive exact match, or by regular
//! expression when the rule is wrapped in slashes (`/pattern/`). Size
//! rules are range or comparison expressions over byte counts with
//! binary units (KB = 1024 B).

/// Whether any rule in the list blocks `target`.
///
/// Rules are trimmed first; empty rules are skipped. A `/re/` rule whose
/// interior fails to compile silently matches nothing.
pub fn is_blocked_string(rules: &[String], target: &str) -> bool {
    for rule in rules {
        let rule = rule.trim();
        if rule.is_empty() {
            continue;
        }

        if rule.len() > 2 && rule.starts_with('/') && rule.ends_with('/') {
            let pattern = &rule[1..rule.len() - 1];
            if let Ok(re) = regex::Regex::new(pattern) {
                if re.is_match(target) {
                    return true;
                }
            }
            continue;
        }

        if rule.eq_ignore_ascii_case(target) {
            return true;
        }
        // Non-ASCII rules fold through full lowercasing.
        if rule.to_lowercase() == target.to_lowercase() {
            return true;
        }
    }
    false
}

/// Whether the size rule blocks a file of `size` bytes.
///
/// Accepted forms (whitespace-insensitive, case-insensitive):
/// `MIN-MAX`, `>=V`, `<=V`, `>V`, `<V`. An empty rule never blocks.
pub fn is_blocked_size(size: i64, rule: &str) -> bool {
    let rule = rule.trim().to_uppercase();
    if rule.is_empty() {
        return false;
    }

    if let Some((lo, hi)) = rule.split_once('-') {
        let min = parse_size(lo);
        let max = parse_size(hi);
        if min >= 0 && max > 0 {
            return size >= min && size <= max;
        }
    }

    if let Some(rest) = rule.strip_prefix(">=") {
        return size >= parse_size(rest);
    }
    if let Some(rest) = rule.strip_prefix("<=") {
        return size <= parse_size(rest);
    }
    if let Some(rest) = rule.strip_prefix('>') {
        return size > parse_size(rest);
    }
    if let Some(rest) = rule.strip_prefix('<') {
        return size < parse_size(rest);
    }
    false
}

/// Parse a size expression like `1.5GB`, `200KB`, `512B`, or `4096`.
///
/// Units are binary multiples; bare numbers are bytes. Unparseable input
/// yields 0.
pub fn parse_size(s: &str) -> i64 {
    let s = s.trim();
    if s.is_empty() {
        return 0;
    }

    let (num, scale): (&str, i64) = if let Some(n) = s.strip_suffix("TB") {
        (n, 1 << 40)
    } else if let Some(n) = s.strip_suffix("GB") {
        (n, 1 << 30)
    } else if let Some(n) = s.strip_suffix("MB") {
        (n, 1 << 20)
    } else if let Some(n) = s.strip_suffix("KB") {
        (n, 1 << 10)
    } else if let Some(n) = s.strip_suffix('B') {
        (n, 1)
    } else {
        (s, 1)
    };

    let val: f64 = num.trim().parse().unwrap_or(0.0);
    (val * scale as f64) as i64
}
