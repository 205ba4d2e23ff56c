//! sb-server: the HTTP surface of streambox.
//!
//! Routes are thin adapters over the cache coordinator, index store,
//! sniffer, and transcode gate. [`context::AppContext`] carries the shared
//! handles; [`serve`] binds everything to a listener.

pub mod context;
pub mod error;
pub mod lanip;
pub mod middleware;
pub mod router;
pub mod routes;

pub use context::{AppContext, ConfigStore};
pub use router::build_router;

use std::net::SocketAddr;

/// Serve the router on an already-bound listener until shutdown.
pub async fn serve(ctx: AppContext, listener: tokio::net::TcpListener) -> std::io::Result<()> {
    let app = build_router(ctx);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}
