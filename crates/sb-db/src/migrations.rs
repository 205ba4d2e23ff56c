//! Embedded SQL migrations and runner.
//!
//! Migrations are stored as `&str` constants and executed in order. A
//! `schema_migrations` table tracks which versions have been applied.

use rusqlite::Connection;
use sb_core::{Error, Result};

/// V1: initial schema -- media index, scan metadata, and preference bag.
const V1_INITIAL: &str = r#"
-- Indexed media items. One row per file; path is the conflict key so a
-- rescan overwrites in place.
CREATE TABLE media_items (
    id           TEXT NOT NULL,
    path         TEXT NOT NULL UNIQUE,
    name         TEXT NOT NULL,
    ext          TEXT NOT NULL,
    kind         TEXT NOT NULL,
    share_label  TEXT NOT NULL,
    size         INTEGER NOT NULL,
    mod_time     INTEGER NOT NULL,
    subtitles    TEXT NOT NULL DEFAULT '',
    audio_cover  TEXT NOT NULL DEFAULT '',
    audio_lyrics TEXT NOT NULL DEFAULT '',
    scan_id      INTEGER NOT NULL,
    share_root   TEXT NOT NULL
);

CREATE INDEX idx_media_items_kind ON media_items(kind);
CREATE INDEX idx_media_items_scan_kind ON media_items(scan_id, kind);
CREATE INDEX idx_media_items_scan_share ON media_items(scan_id, share_label);
CREATE INDEX idx_media_items_share_root ON media_items(share_root);

-- One row per cache key, overwritten on every committed scan.
CREATE TABLE media_scans (
    cache_key TEXT PRIMARY KEY,
    scan_id   INTEGER NOT NULL,
    built_at  INTEGER NOT NULL,
    complete  INTEGER NOT NULL
);

-- Key-value bag for the web client's per-user preferences.
CREATE TABLE user_prefs (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// All migrations in apply order.
const MIGRATIONS: &[(i64, &str)] = &[(1, V1_INITIAL)];

/// Run any migrations that have not yet been applied.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )
    .map_err(|e| Error::database(e.to_string()))?;

    for (version, sql) in MIGRATIONS {
        let applied: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM schema_migrations WHERE version = ?1",
                [version],
                |row| row.get(0),
            )
            .map_err(|e| Error::database(e.to_string()))?;
        if applied > 0 {
            continue;
        }

        conn.execute_batch(sql)
            .map_err(|e| Error::database(format!("migration v{version} failed: {e}")))?;
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, datetime('now'))",
            [version],
        )
        .map_err(|e| Error::database(e.to_string()))?;
        tracing::debug!(version, "applied migration");
    }

    Ok(())
}
