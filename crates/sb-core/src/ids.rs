//! Reversible URL-safe encoding of absolute paths to opaque item IDs.
//!
//! IDs are base64url without padding over the UTF-8 bytes of the absolute
//! path, so they survive query strings unescaped and decode back to the
//! exact path they were minted from.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::path::Path;

use crate::error::{Error, Result};

/// Encode an absolute path into an opaque, URL-safe ID.
pub fn encode_id(abs_path: &Path) -> String {
    URL_SAFE_NO_PAD.encode(abs_path.to_string_lossy().as_bytes())
}

/// Decode an ID back into the path string it was minted from.
///
/// Fails on malformed base64, non-UTF-8 bytes, or an empty payload.
pub fn decode_id(id: &str) -> Result<String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(id)
        .map_err(|e| Error::Validation(format!("bad id: {e}")))?;
    if bytes.is_empty() {
        return Err(Error::Validation("bad id: empty".into()));
    }
    String::from_utf8(bytes).map_err(|e| Error::Validation(format!("bad id: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn round_trip() {
        let p = PathBuf::from("/tmp/A/clip.mp4");
        let id = encode_id(&p);
        assert_eq!(decode_id(&id).unwrap(), "/tmp/A/clip.mp4");
    }

    #[test]
    fn round_trip_unicode() {
        let p = PathBuf::from("/媒体/音乐/夜曲.mp3");
        assert_eq!(decode_id(&encode_id(&p)).unwrap(), "/媒体/音乐/夜曲.mp3");
    }

    #[test]
    fn no_padding_or_unsafe_chars() {
        // Path length chosen so standard base64 would need padding.
        let id = encode_id(Path::new("/tmp/a"));
        assert!(!id.contains('='));
        assert!(!id.contains('+'));
        assert!(!id.contains('/'));
    }

    #[test]
    fn empty_decodes_to_error() {
        assert!(decode_id("").is_err());
    }

    #[test]
    fn garbage_decodes_to_error() {
        assert!(decode_id("!!not-base64!!").is_err());
    }
}
