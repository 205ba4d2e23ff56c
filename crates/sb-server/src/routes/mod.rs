//! Route handlers, one module per endpoint group.

pub mod config;
pub mod ip;
pub mod media;
pub mod prefs;
pub mod probe;
pub mod stream;
pub mod subtitle;

use std::path::PathBuf;

use crate::error::AppError;
use sb_core::paths::{is_allowed_file, normalize};
use sb_core::{decode_id, Error};

/// Decode a request `id`, normalize it, and enforce share containment.
///
/// This is the authorization gate shared by the stream, subtitle, and
/// probe endpoints: no handler touches a path that did not pass here.
pub(crate) fn authorize_id(
    id: &str,
    shares: &[sb_core::config::Share],
) -> Result<PathBuf, AppError> {
    if id.is_empty() {
        return Err(AppError(Error::Validation("missing id".into())));
    }
    let decoded = decode_id(id)?;
    let target = normalize(&decoded);
    if !is_allowed_file(&target, shares) {
        return Err(AppError(Error::Forbidden("not allowed".into())));
    }
    Ok(target)
}

/// Lowercase `.ext` of a path's file name.
pub(crate) fn lower_ext(path: &std::path::Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.rfind('.').map(|idx| n[idx..].to_lowercase()))
        .unwrap_or_default()
}
