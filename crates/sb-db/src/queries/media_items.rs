//! Media-item persistence: upsert, purge, and typed queries.

use rusqlite::{params, params_from_iter, Connection};
use sb_core::{Error, MediaItem, MediaKind, Result, Subtitle};

/// Upsert an item by path, overwriting every non-key column including the
/// scan id and owning share root.
pub fn upsert_media_item(
    conn: &Connection,
    item: &MediaItem,
    path: &str,
    scan_id: i64,
    share_root: &str,
) -> Result<()> {
    let subtitles = if item.subtitles.is_empty() {
        String::new()
    } else {
        serde_json::to_string(&item.subtitles)
            .map_err(|e| Error::Internal(format!("subtitle serialization failed: {e}")))?
    };

    conn.execute(
        "INSERT INTO media_items (
            id, path, name, ext, kind, share_label,
            size, mod_time, subtitles, audio_cover, audio_lyrics,
            scan_id, share_root
         )
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
         ON CONFLICT(path) DO UPDATE SET
            id = excluded.id,
            name = excluded.name,
            ext = excluded.ext,
            kind = excluded.kind,
            share_label = excluded.share_label,
            size = excluded.size,
            mod_time = excluded.mod_time,
            subtitles = excluded.subtitles,
            audio_cover = excluded.audio_cover,
            audio_lyrics = excluded.audio_lyrics,
            scan_id = excluded.scan_id,
            share_root = excluded.share_root",
        params![
            item.id,
            path,
            item.name,
            item.ext,
            item.kind.as_str(),
            item.share_label,
            item.size,
            item.mod_time,
            subtitles,
            item.cover_id,
            item.lyrics_id,
            scan_id,
            share_root,
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Delete rows under the given roots that the current scan did not visit.
pub fn delete_stale_by_scan(conn: &Connection, scan_id: i64, share_roots: &[String]) -> Result<()> {
    if scan_id <= 0 || share_roots.is_empty() {
        return Ok(());
    }
    let placeholders = vec!["?"; share_roots.len()].join(",");
    let sql =
        format!("DELETE FROM media_items WHERE scan_id != ? AND share_root IN ({placeholders})");

    let mut args: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(1 + share_roots.len());
    args.push(&scan_id);
    for root in share_roots {
        args.push(root);
    }
    conn.execute(&sql, params_from_iter(args))
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Delete rows whose share root is no longer configured. An empty root
/// set deletes everything.
pub fn delete_by_share_roots_not_in(conn: &Connection, share_roots: &[String]) -> Result<()> {
    if share_roots.is_empty() {
        conn.execute("DELETE FROM media_items", [])
            .map_err(|e| Error::database(e.to_string()))?;
        return Ok(());
    }
    let placeholders = vec!["?"; share_roots.len()].join(",");
    let sql = format!("DELETE FROM media_items WHERE share_root NOT IN ({placeholders})");
    conn.execute(&sql, params_from_iter(share_roots.iter()))
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// List items of one kind for a scan, ordered by share label then
/// case-folded name.
pub fn query_media_items(conn: &Connection, scan_id: i64, kind: MediaKind) -> Result<Vec<MediaItem>> {
    if scan_id <= 0 {
        return Ok(Vec::new());
    }

    let mut stmt = conn
        .prepare(
            "SELECT id, name, ext, kind, share_label, size, mod_time,
                    subtitles, audio_cover, audio_lyrics
             FROM media_items
             WHERE scan_id = ?1 AND kind = ?2
             ORDER BY share_label, lower(name)",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let rows = stmt
        .query_map(params![scan_id, kind.as_str()], |row| {
            let kind_str: String = row.get(3)?;
            let subtitles_json: String = row.get(7)?;
            Ok(MediaItem {
                id: row.get(0)?,
                name: row.get(1)?,
                ext: row.get(2)?,
                kind: MediaKind::from_str_lossy(&kind_str),
                share_label: row.get(4)?,
                size: row.get(5)?,
                mod_time: row.get(6)?,
                subtitles: parse_subtitles(&subtitles_json),
                cover_id: row.get(8)?,
                lyrics_id: row.get(9)?,
            })
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows)
}

/// Count items of one kind for a scan.
pub fn count_media_items(conn: &Connection, scan_id: i64, kind: MediaKind) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(1) FROM media_items WHERE scan_id = ?1 AND kind = ?2",
        params![scan_id, kind.as_str()],
        |row| row.get(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}

fn parse_subtitles(json: &str) -> Vec<Subtitle> {
    if json.trim().is_empty() {
        return Vec::new();
    }
    serde_json::from_str(json).unwrap_or_default()
}
