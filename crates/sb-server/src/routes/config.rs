//! Configuration endpoints: full-config get/replace and share mutations.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use sb_core::config::{Config, Share};
use sb_core::paths::{is_existing_dir, normalize, same_path};
use sb_core::Error;

use crate::context::AppContext;
use crate::error::{bad_request, AppError};
use crate::lanip;

/// GET /api/config response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigView {
    pub config: Config,
    #[serde(rename = "lanIPs")]
    pub lan_ips: Vec<String>,
    pub urls: Vec<String>,
    pub now_unix: i64,
}

/// POST /api/config and /api/shares response.
#[derive(Serialize)]
pub struct ConfigResult {
    pub config: Config,
}

/// GET /api/config
pub async fn get_config(State(ctx): State<AppContext>) -> Json<ConfigView> {
    let config = ctx.store.snapshot();
    let port = config.effective_port();
    Json(ConfigView {
        config,
        lan_ips: lanip::lan_ipv4s(),
        urls: lanip::access_urls(port),
        now_unix: chrono::Utc::now().timestamp(),
    })
}

/// POST /api/config — replace the whole configuration.
pub async fn post_config(
    State(ctx): State<AppContext>,
    body: String,
) -> Result<Json<ConfigResult>, AppError> {
    let mut incoming = Config::from_json(&body).map_err(|_| bad_request("JSON 解析失败"))?;

    // Only shares rooted at reachable directories survive the update.
    incoming.shares.retain(|sh| {
        let p = normalize(&sh.path);
        !p.as_os_str().is_empty() && is_existing_dir(&p)
    });

    let updated = ctx
        .store
        .update(|cfg| *cfg = incoming)
        .map_err(|e| AppError(Error::Internal(format!("写入配置失败: {e}"))))?;

    ctx.cache.invalidate();
    Ok(Json(ConfigResult { config: updated }))
}

/// POST /api/shares request body.
#[derive(Deserialize)]
pub struct SharesOpRequest {
    #[serde(default)]
    pub op: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub path: String,
}

/// POST /api/shares — add or remove a single share.
pub async fn post_shares(
    State(ctx): State<AppContext>,
    body: String,
) -> Result<Json<ConfigResult>, AppError> {
    let req: SharesOpRequest =
        serde_json::from_str(&body).map_err(|_| bad_request("JSON 解析失败"))?;

    let op = req.op.trim().to_lowercase();
    let path = normalize(&req.path);
    let path_str = path.to_string_lossy().to_string();
    let label = {
        let trimmed = req.label.trim();
        if trimmed.is_empty() {
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default()
        } else {
            trimmed.to_string()
        }
    };

    match op.as_str() {
        "add" => {
            if path_str.is_empty() || !is_existing_dir(&path) {
                return Err(bad_request("目录不存在或不可访问"));
            }
        }
        "remove" => {
            if path_str.is_empty() {
                return Err(bad_request("缺少 path"));
            }
        }
        _ => return Err(bad_request("不支持的 op（add/remove）")),
    }

    let updated = ctx
        .store
        .update(|cfg| match op.as_str() {
            "add" => {
                cfg.shares.push(Share {
                    label: label.clone(),
                    path: path_str.clone(),
                });
            }
            _ => {
                cfg.shares.retain(|sh| !same_path(&sh.path, &path_str));
            }
        })
        .map_err(|e| AppError(Error::Internal(format!("写入配置失败: {e}"))))?;

    ctx.cache.invalidate();
    Ok(Json(ConfigResult { config: updated }))
}
