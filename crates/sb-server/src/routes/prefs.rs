//! Preference endpoints backed by the `user_prefs` table.

use std::collections::HashMap;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use sb_db::queries::prefs;

use crate::context::AppContext;
use crate::error::{bad_request, AppError};

#[derive(Serialize)]
pub struct PrefsResponse {
    pub prefs: HashMap<String, String>,
}

#[derive(Deserialize)]
pub struct PrefsUpdateRequest {
    #[serde(default)]
    pub prefs: HashMap<String, String>,
}

/// GET /api/prefs
pub async fn get_prefs(State(ctx): State<AppContext>) -> Result<Json<PrefsResponse>, AppError> {
    let Some(ref pool) = ctx.db else {
        return Ok(Json(PrefsResponse {
            prefs: HashMap::new(),
        }));
    };
    let conn = sb_db::get_conn(pool)?;
    let prefs = prefs::get_all_prefs(&conn)?;
    Ok(Json(PrefsResponse { prefs }))
}

/// POST /api/prefs
pub async fn post_prefs(
    State(ctx): State<AppContext>,
    body: String,
) -> Result<Json<PrefsResponse>, AppError> {
    let req: PrefsUpdateRequest =
        serde_json::from_str(&body).map_err(|_| bad_request("JSON 解析失败"))?;
    if req.prefs.is_empty() {
        return Err(bad_request("缺少 prefs"));
    }

    if let Some(ref pool) = ctx.db {
        let conn = sb_db::get_conn(pool)?;
        prefs::set_prefs(&conn, &req.prefs)?;
    }
    Ok(Json(PrefsResponse { prefs: req.prefs }))
}
