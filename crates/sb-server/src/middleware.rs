//! Request middleware: first-seen device logging.
//!
//! Remote IPs outside loopback are recorded once in a lock-free map; the
//! first request from a new address gets an info-level log line so LAN
//! device arrivals are visible without request-level noise.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::context::AppContext;

/// Log the first request from every non-loopback remote address.
pub async fn track_new_devices(
    State(ctx): State<AppContext>,
    req: Request,
    next: Next,
) -> Response {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        let ip = addr.ip();
        if !ip.is_loopback() {
            let key = ip.to_string();
            if ctx.seen_ips.insert(key.clone(), ()).is_none() {
                tracing::info!(
                    ip = %key,
                    method = %req.method(),
                    path = %req.uri().path(),
                    "new device"
                );
            }
        }
    }
    next.run(req).await
}
