//! Scan-metadata persistence, one row per cache key.

use rusqlite::{params, Connection};
use sb_core::{Error, Result};

use crate::models::ScanMeta;

/// Fetch scan metadata for a cache key, if a committed scan exists.
pub fn get_scan_meta(conn: &Connection, cache_key: &str) -> Result<Option<ScanMeta>> {
    if cache_key.trim().is_empty() {
        return Ok(None);
    }
    let result = conn.query_row(
        "SELECT scan_id, built_at, complete FROM media_scans WHERE cache_key = ?1",
        [cache_key],
        |row| {
            Ok(ScanMeta {
                scan_id: row.get(0)?,
                built_at: row.get(1)?,
                complete: row.get::<_, i64>(2)? != 0,
            })
        },
    );
    match result {
        Ok(meta) => Ok(Some(meta)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Upsert scan metadata for a cache key.
///
/// No-ops on blank keys or non-positive ids so a failed build can never
/// poison the table.
pub fn set_scan_meta(conn: &Connection, cache_key: &str, meta: ScanMeta) -> Result<()> {
    if cache_key.trim().is_empty() || meta.scan_id <= 0 || meta.built_at <= 0 {
        return Ok(());
    }
    conn.execute(
        "INSERT INTO media_scans (cache_key, scan_id, built_at, complete)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(cache_key) DO UPDATE SET
            scan_id = excluded.scan_id,
            built_at = excluded.built_at,
            complete = excluded.complete",
        params![cache_key, meta.scan_id, meta.built_at, meta.complete as i64],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}
