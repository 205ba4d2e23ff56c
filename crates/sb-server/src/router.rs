//! Axum router construction.
//!
//! JSON endpoints get gzip compression; stream and subtitle bodies are
//! served uncompressed (range math and media bytes do not mix with
//! transfer compression). All routes share the device-tracking
//! middleware, permissive CORS, and request tracing.

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::track_new_devices;
use crate::routes;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Compressible JSON API.
    let api = Router::new()
        .route(
            "/api/config",
            get(routes::config::get_config).post(routes::config::post_config),
        )
        .route("/api/shares", post(routes::config::post_shares))
        .route("/api/media", get(routes::media::get_media))
        .route("/api/probe", get(routes::probe::get_probe))
        .route("/api/ip", get(routes::ip::get_ip))
        .route(
            "/api/prefs",
            get(routes::prefs::get_prefs).post(routes::prefs::post_prefs),
        )
        .layer(CompressionLayer::new());

    // Raw byte endpoints, never compressed.
    let media = Router::new()
        .route("/api/stream", get(routes::stream::get_stream))
        .route("/api/subtitle", get(routes::subtitle::get_subtitle));

    api.merge(media)
        .layer(from_fn_with_state(ctx.clone(), track_new_devices))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
