//! LAN address endpoint.

use axum::Json;
use serde::Serialize;

use crate::lanip;

#[derive(Serialize)]
pub struct IpResponse {
    #[serde(rename = "lanIPs")]
    pub lan_ips: Vec<String>,
}

/// GET /api/ip
pub async fn get_ip() -> Json<IpResponse> {
    Json(IpResponse {
        lan_ips: lanip::lan_ipv4s(),
    })
}
