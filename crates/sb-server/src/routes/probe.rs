//! The probe endpoint: container codec labels plus subtitle sidecars.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use sb_core::{Error, MediaKind, Subtitle};
use sb_probe::sniff_container_codecs;
use sb_scan::{find_sidecar_subtitles, DirCache};

use crate::context::AppContext;
use crate::error::AppError;
use crate::routes::{authorize_id, lower_ext};

#[derive(Deserialize)]
pub struct ProbeQuery {
    #[serde(default)]
    pub id: String,
}

#[derive(Serialize)]
pub struct ProbeResponse {
    pub container: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub video: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub audio: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtitles: Vec<Subtitle>,
}

/// GET /api/probe
pub async fn get_probe(
    State(ctx): State<AppContext>,
    Query(q): Query<ProbeQuery>,
) -> Result<Json<ProbeResponse>, AppError> {
    let shares = ctx.store.shares();
    let target = authorize_id(&q.id, &shares)?;
    let ext = lower_ext(&target);

    // Sniffing reads up to 4 MiB; keep it off the async workers.
    let sniff_target = target.clone();
    let sniff_ext = ext.clone();
    let (video, audio, subtitles) = tokio::task::spawn_blocking(move || {
        let (video, audio) = sniff_container_codecs(&sniff_target, &sniff_ext);
        let subtitles = if MediaKind::from_ext(&sniff_ext) == MediaKind::Video {
            find_sidecar_subtitles(&sniff_target, &mut DirCache::new())
        } else {
            Vec::new()
        };
        (video, audio, subtitles)
    })
    .await
    .map_err(|e| Error::Internal(format!("probe task panicked: {e}")))?;

    Ok(Json(ProbeResponse {
        container: ext.trim_start_matches('.').to_string(),
        video,
        audio,
        subtitles,
    }))
}
