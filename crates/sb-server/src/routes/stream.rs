//! The stream endpoint: direct play with range support, or a transcoded
//! pipe through the gate.

use std::io::SeekFrom;
use std::path::Path;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, Response, StatusCode};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use sb_av::{ffmpeg_available, TranscodeOptions, TranscodeStream};
use sb_core::{Error, MediaKind};

use crate::context::AppContext;
use crate::error::AppError;
use crate::routes::{authorize_id, lower_ext};

#[derive(Deserialize)]
pub struct StreamQuery {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub transcode: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub bitrate: Option<String>,
    #[serde(default)]
    pub start: Option<f64>,
}

/// GET /api/stream
pub async fn get_stream(
    State(ctx): State<AppContext>,
    Query(q): Query<StreamQuery>,
    headers: HeaderMap,
) -> Result<Response<Body>, AppError> {
    let cfg = ctx.store.snapshot();
    let target = authorize_id(&q.id, &cfg.shares)?;

    let meta = tokio::fs::metadata(&target)
        .await
        .map_err(|_| Error::not_found("file", target.display()))?;
    if meta.is_dir() {
        return Err(AppError(Error::not_found("file", target.display())));
    }

    let ext = lower_ext(&target);
    let kind = MediaKind::from_ext(&ext);

    if q.transcode.as_deref() == Some("1") {
        let allowed = match kind {
            MediaKind::Video => cfg.playback.video.transcode,
            MediaKind::Audio => cfg.playback.audio.transcode,
            _ => false,
        };
        if !allowed {
            return Err(AppError(Error::Forbidden(
                "Transcoding is disabled in configuration".into(),
            )));
        }

        if ffmpeg_available() {
            let mut opts = TranscodeOptions {
                format: q.format.clone().unwrap_or_default(),
                bitrate: q.bitrate.clone().unwrap_or_default(),
                offset: q.start.unwrap_or(0.0),
            };
            if kind == MediaKind::Audio && opts.format.is_empty() {
                opts.format = "mp3".into();
            }

            match TranscodeStream::start(&ctx.gate, &target, opts).await {
                Ok(stream) => return transcode_response(kind, stream),
                Err(e @ Error::Busy(_)) => return Err(AppError(e)),
                Err(e) => {
                    tracing::warn!(
                        file = %target.display(),
                        error = %e,
                        "transcode start failed, falling back to direct play"
                    );
                }
            }
        } else {
            tracing::warn!("ffmpeg not found in PATH, falling back to direct play");
        }
    }

    serve_direct(&target, meta.len(), meta.modified().ok(), &ext, &headers).await
}

fn transcode_response(kind: MediaKind, stream: TranscodeStream) -> Result<Response<Body>, AppError> {
    let ct = if kind == MediaKind::Audio {
        "audio/mpeg"
    } else {
        "video/mp4"
    };
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, ct)
        .header(header::CACHE_CONTROL, "no-store")
        .header("X-MSP-Transcode", "1")
        .body(Body::from_stream(ReaderStream::new(stream)))
        .map_err(response_error)
}

fn response_error(e: axum::http::Error) -> AppError {
    AppError(Error::Internal(format!("response build failed: {e}")))
}

/// Keep Content-Disposition filenames inside the visible-ASCII range a
/// header value allows.
fn header_safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Serve original file bytes with single-range support.
async fn serve_direct(
    target: &Path,
    size: u64,
    modified: Option<std::time::SystemTime>,
    ext: &str,
    headers: &HeaderMap,
) -> Result<Response<Body>, AppError> {
    let ct = content_type_for(ext);
    let file_name = target
        .file_name()
        .map(|n| header_safe_filename(&n.to_string_lossy()))
        .unwrap_or_default();
    let last_modified = modified.map(http_date);

    // Conditional GET on modification time.
    if let (Some(ref lm), Some(since)) = (
        &last_modified,
        headers
            .get(header::IF_MODIFIED_SINCE)
            .and_then(|v| v.to_str().ok()),
    ) {
        if let (Ok(lm_time), Ok(since_time)) = (
            DateTime::parse_from_rfc2822(&lm.replace("GMT", "+0000")),
            DateTime::parse_from_rfc2822(&since.replace("GMT", "+0000")),
        ) {
            if lm_time <= since_time {
                let mut builder = Response::builder().status(StatusCode::NOT_MODIFIED);
                if let Some(ref lm) = last_modified {
                    builder = builder.header(header::LAST_MODIFIED, lm);
                }
                return builder.body(Body::empty()).map_err(response_error);
            }
        }
    }

    // A failed If-Range precondition downgrades to the full body.
    let range_header = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    let if_range_ok = match (
        headers.get(header::IF_RANGE).and_then(|v| v.to_str().ok()),
        &last_modified,
    ) {
        (Some(if_range), Some(lm)) => if_range.trim() == lm,
        (Some(_), None) => false,
        (None, _) => true,
    };
    let range = if if_range_ok {
        range_header.and_then(|v| parse_range_header(v, size))
    } else {
        None
    };

    let base = |status: StatusCode| {
        let mut builder = Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, ct)
            .header(header::ACCEPT_RANGES, "bytes")
            .header(header::CACHE_CONTROL, "no-store")
            .header(
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{file_name}\""),
            );
        if let Some(ref lm) = last_modified {
            builder = builder.header(header::LAST_MODIFIED, lm);
        }
        builder
    };

    match range {
        Some(ParsedRange::Unsatisfiable) => base(StatusCode::RANGE_NOT_SATISFIABLE)
            .header(header::CONTENT_RANGE, format!("bytes */{size}"))
            .body(Body::empty())
            .map_err(response_error),
        Some(ParsedRange::Satisfiable(start, end)) => {
            let length = end - start + 1;
            let mut file = tokio::fs::File::open(target)
                .await
                .map_err(|_| Error::not_found("file", target.display()))?;
            file.seek(SeekFrom::Start(start)).await.map_err(Error::from)?;
            let body = Body::from_stream(ReaderStream::new(file.take(length)));

            base(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_RANGE, format!("bytes {start}-{end}/{size}"))
                .header(header::CONTENT_LENGTH, length.to_string())
                .body(body)
                .map_err(response_error)
        }
        None => {
            let file = tokio::fs::File::open(target)
                .await
                .map_err(|_| Error::not_found("file", target.display()))?;
            let body = Body::from_stream(ReaderStream::new(file));
            base(StatusCode::OK)
                .header(header::CONTENT_LENGTH, size.to_string())
                .body(body)
                .map_err(response_error)
        }
    }
}

/// RFC 7231 HTTP-date for Last-Modified.
fn http_date(t: std::time::SystemTime) -> String {
    DateTime::<Utc>::from(t)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

enum ParsedRange {
    Satisfiable(u64, u64),
    Unsatisfiable,
}

/// Parse a single-range `bytes=` header against the entity size.
///
/// Returns `None` for malformed values and for multi-range requests,
/// which are answered with the full representation.
fn parse_range_header(value: &str, size: u64) -> Option<ParsedRange> {
    let spec = value.trim().strip_prefix("bytes=")?;
    if spec.contains(',') {
        return None;
    }
    let (start_str, end_str) = spec.split_once('-')?;
    let start_str = start_str.trim();
    let end_str = end_str.trim();

    if start_str.is_empty() {
        // Suffix range: the final N bytes.
        let suffix: u64 = end_str.parse().ok()?;
        if suffix == 0 || size == 0 {
            return Some(ParsedRange::Unsatisfiable);
        }
        let start = size.saturating_sub(suffix);
        return Some(ParsedRange::Satisfiable(start, size - 1));
    }

    let start: u64 = start_str.parse().ok()?;
    if start >= size {
        return Some(ParsedRange::Unsatisfiable);
    }
    let end = if end_str.is_empty() {
        size - 1
    } else {
        let e: u64 = end_str.parse().ok()?;
        if e < start {
            return Some(ParsedRange::Unsatisfiable);
        }
        e.min(size - 1)
    };
    Some(ParsedRange::Satisfiable(start, end))
}

/// Content-type by extension, with a small fallback table before
/// `application/octet-stream`.
fn content_type_for(ext: &str) -> &'static str {
    match ext {
        ".mp4" | ".m4v" => "video/mp4",
        ".mkv" => "video/x-matroska",
        ".webm" => "video/webm",
        ".avi" => "video/x-msvideo",
        ".mov" => "video/quicktime",
        ".ts" => "video/mp2t",
        ".vtt" => "text/vtt; charset=utf-8",
        ".srt" | ".lrc" => "text/plain; charset=utf-8",
        ".mp3" => "audio/mpeg",
        ".aac" => "audio/aac",
        ".wav" => "audio/wav",
        ".flac" => "audio/flac",
        ".m4a" => "audio/mp4",
        ".ogg" => "audio/ogg",
        ".opus" => "audio/opus",
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".gif" => "image/gif",
        ".webp" => "image/webp",
        ".bmp" => "image/bmp",
        ".svg" => "image/svg+xml",
        ".json" => "application/json",
        ".txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_full_and_open() {
        match parse_range_header("bytes=0-1023", 4096).unwrap() {
            ParsedRange::Satisfiable(s, e) => {
                assert_eq!((s, e), (0, 1023));
            }
            _ => panic!("expected satisfiable"),
        }
        match parse_range_header("bytes=500-", 1000).unwrap() {
            ParsedRange::Satisfiable(s, e) => assert_eq!((s, e), (500, 999)),
            _ => panic!("expected satisfiable"),
        }
    }

    #[test]
    fn range_end_clamps_to_size() {
        match parse_range_header("bytes=0-999999", 100).unwrap() {
            ParsedRange::Satisfiable(s, e) => assert_eq!((s, e), (0, 99)),
            _ => panic!("expected satisfiable"),
        }
    }

    #[test]
    fn range_suffix() {
        match parse_range_header("bytes=-100", 1000).unwrap() {
            ParsedRange::Satisfiable(s, e) => assert_eq!((s, e), (900, 999)),
            _ => panic!("expected satisfiable"),
        }
        // Suffix longer than the file serves the whole file.
        match parse_range_header("bytes=-5000", 1000).unwrap() {
            ParsedRange::Satisfiable(s, e) => assert_eq!((s, e), (0, 999)),
            _ => panic!("expected satisfiable"),
        }
    }

    #[test]
    fn range_unsatisfiable() {
        assert!(matches!(
            parse_range_header("bytes=5000-", 1000),
            Some(ParsedRange::Unsatisfiable)
        ));
        assert!(matches!(
            parse_range_header("bytes=10-5", 1000),
            Some(ParsedRange::Unsatisfiable)
        ));
        assert!(matches!(
            parse_range_header("bytes=-0", 1000),
            Some(ParsedRange::Unsatisfiable)
        ));
    }

    #[test]
    fn range_malformed_or_multi_is_ignored() {
        assert!(parse_range_header("bytes=abc-def", 1000).is_none());
        assert!(parse_range_header("items=0-10", 1000).is_none());
        assert!(parse_range_header("bytes=0-1,5-9", 1000).is_none());
    }

    #[test]
    fn content_types_from_table() {
        assert_eq!(content_type_for(".mp4"), "video/mp4");
        assert_eq!(content_type_for(".m4v"), "video/mp4");
        assert_eq!(content_type_for(".mkv"), "video/x-matroska");
        assert_eq!(content_type_for(".vtt"), "text/vtt; charset=utf-8");
        assert_eq!(content_type_for(".srt"), "text/plain; charset=utf-8");
        assert_eq!(content_type_for(".lrc"), "text/plain; charset=utf-8");
        assert_eq!(content_type_for(".xyz"), "application/octet-stream");
    }

    #[test]
    fn http_date_format() {
        let t = std::time::UNIX_EPOCH;
        assert_eq!(http_date(t), "Thu, 01 Jan 1970 00:00:00 GMT");
    }

    #[test]
    fn filenames_are_header_safe() {
        assert_eq!(header_safe_filename("clip.mp4"), "clip.mp4");
        assert_eq!(header_safe_filename("with space.mp4"), "with space.mp4");
        assert_eq!(header_safe_filename("夜曲.mp3"), "__.mp3");
        assert_eq!(header_safe_filename("a\"b\\c.mkv"), "a_b_c.mkv");
    }
}
