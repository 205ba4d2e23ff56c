//! The subtitle endpoint: VTT passthrough, SRT converted on the fly.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use sb_core::Error;
use sb_probe::srt_to_vtt;

use crate::context::AppContext;
use crate::error::{bad_request, AppError};
use crate::routes::{authorize_id, lower_ext};

#[derive(Deserialize)]
pub struct SubtitleQuery {
    #[serde(default)]
    pub id: String,
}

/// GET /api/subtitle
pub async fn get_subtitle(
    State(ctx): State<AppContext>,
    Query(q): Query<SubtitleQuery>,
) -> Result<Response, AppError> {
    let shares = ctx.store.shares();
    let target = authorize_id(&q.id, &shares)?;

    let ext = lower_ext(&target);
    match ext.as_str() {
        ".vtt" => {
            let bytes = tokio::fs::read(&target)
                .await
                .map_err(|_| Error::not_found("subtitle", target.display()))?;
            Ok(vtt_response(bytes))
        }
        ".srt" => {
            let bytes = tokio::fs::read(&target)
                .await
                .map_err(|_| Error::not_found("subtitle", target.display()))?;
            Ok(vtt_response(srt_to_vtt(&bytes)))
        }
        _ => Err(bad_request("unsupported subtitle format")),
    }
}

fn vtt_response(bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/vtt; charset=utf-8"),
            (header::CACHE_CONTROL, "private, max-age=0"),
        ],
        bytes,
    )
        .into_response()
}
