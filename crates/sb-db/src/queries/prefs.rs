//! Key-value preference bag used by the web client.
//!
//! Lives in this crate only because it shares the index database; the
//! engine itself never reads these keys.

use std::collections::HashMap;

use rusqlite::Connection;
use sb_core::{Error, Result};

/// Read the full preference map.
pub fn get_all_prefs(conn: &Connection) -> Result<HashMap<String, String>> {
    let mut stmt = conn
        .prepare("SELECT key, value FROM user_prefs")
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
        .map_err(|e| Error::database(e.to_string()))?;

    let mut out = HashMap::new();
    for row in rows {
        let (k, v) = row.map_err(|e| Error::database(e.to_string()))?;
        out.insert(k, v);
    }
    Ok(out)
}

/// Upsert a batch of preferences in one transaction. Blank keys are
/// skipped.
pub fn set_prefs(conn: &Connection, prefs: &HashMap<String, String>) -> Result<()> {
    if prefs.is_empty() {
        return Ok(());
    }
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;
    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO user_prefs (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            )
            .map_err(|e| Error::database(e.to_string()))?;
        for (k, v) in prefs {
            if k.trim().is_empty() {
                continue;
            }
            stmt.execute([k, v])
                .map_err(|e| Error::database(e.to_string()))?;
        }
    }
    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}
