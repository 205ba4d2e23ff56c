//! Weak ETag derivation.
//!
//! `W/"<base36(FNV1a64(key ∥ builtAt_LE))>"` — covers content identity
//! across builds with the same inputs: same key and build instant hash to
//! the same tag, a new build instant almost always changes it.

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a over a byte slice.
fn fnv1a64(seed: u64, bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(seed, |h, b| (h ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

/// Lowercase base-36 rendering of a u64.
fn u64_base36(mut v: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if v == 0 {
        return "0".into();
    }
    let mut buf = [0u8; 13];
    let mut pos = buf.len();
    while v > 0 {
        pos -= 1;
        buf[pos] = DIGITS[(v % 36) as usize];
        v /= 36;
    }
    String::from_utf8_lossy(&buf[pos..]).into_owned()
}

/// Weak ETag for a cache key and build instant (unix nanoseconds).
pub fn weak_etag(key: &str, built_at_nanos: i64) -> String {
    let h = fnv1a64(FNV_OFFSET, key.as_bytes());
    let h = fnv1a64(h, &(built_at_nanos as u64).to_le_bytes());
    format!("W/\"{}\"", u64_base36(h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_inputs_equal_tags() {
        assert_eq!(weak_etag("k", 42), weak_etag("k", 42));
    }

    #[test]
    fn distinct_instants_distinct_tags() {
        assert_ne!(weak_etag("k", 1), weak_etag("k", 2));
    }

    #[test]
    fn distinct_keys_distinct_tags() {
        assert_ne!(weak_etag("a", 1), weak_etag("b", 1));
    }

    #[test]
    fn weak_format() {
        let tag = weak_etag("key", 123456789);
        assert!(tag.starts_with("W/\""));
        assert!(tag.ends_with('"'));
        let inner = &tag[3..tag.len() - 1];
        assert!(!inner.is_empty());
        assert!(inner.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
    }

    #[test]
    fn fnv_reference_vectors() {
        // Standard FNV-1a test vectors.
        assert_eq!(fnv1a64(FNV_OFFSET, b""), 0xcbf29ce484222325);
        assert_eq!(fnv1a64(FNV_OFFSET, b"a"), 0xaf63dc4c8601ec8c);
        assert_eq!(fnv1a64(FNV_OFFSET, b"foobar"), 0x85944171f73967e8);
    }

    #[test]
    fn base36_digits() {
        assert_eq!(u64_base36(0), "0");
        assert_eq!(u64_base36(35), "z");
        assert_eq!(u64_base36(36), "10");
        assert_eq!(u64_base36(u64::MAX), "3w5e11264sgsf");
    }
}
