//! The listing endpoint: cache-coordinated, ETagged, conditionally
//! truncated.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use sb_core::Error;

use crate::context::AppContext;
use crate::error::AppError;

#[derive(Deserialize)]
pub struct MediaQuery {
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// GET /api/media
pub async fn get_media(
    State(ctx): State<AppContext>,
    Query(q): Query<MediaQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let cfg = ctx.store.snapshot();
    let shares = cfg.shares.clone();
    let blacklist = cfg.blacklist.clone();
    let max_items = cfg.max_items;
    let refresh = q.refresh.as_deref() == Some("1");

    // The coordinator does filesystem and DB work; keep it off the
    // async workers.
    let cache = ctx.cache.clone();
    let (mut resp, etag) = tokio::task::spawn_blocking(move || {
        cache.get_or_build(&shares, &blacklist, refresh, max_items)
    })
    .await
    .map_err(|e| Error::Internal(format!("listing build panicked: {e}")))?;

    resp.videos_total = resp.videos.len();
    resp.audios_total = resp.audios.len();
    resp.images_total = resp.images.len();
    resp.others_total = resp.others.len();

    // A truncated page is client-specific; it bypasses ETag caching.
    if let Some(limit) = q.limit.filter(|l| *l > 0) {
        resp.videos.truncate(limit);
        resp.audios.truncate(limit);
        resp.images.truncate(limit);
        resp.others.truncate(limit);
        resp.limited = true;
        return Ok((
            StatusCode::OK,
            [(header::CACHE_CONTROL, "no-store")],
            Json(resp),
        )
            .into_response());
    }

    if !etag.is_empty() {
        let matched = headers
            .get(header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim() == etag)
            .unwrap_or(false);
        if matched && !refresh {
            return Ok((
                StatusCode::NOT_MODIFIED,
                [(header::ETAG, etag)],
            )
                .into_response());
        }
        return Ok((StatusCode::OK, [(header::ETAG, etag)], Json(resp)).into_response());
    }

    Ok((StatusCode::OK, Json(resp)).into_response())
}
