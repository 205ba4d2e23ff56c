//! The scan/build procedure behind the coordinator.
//!
//! A build walks every share under one index-store transaction, upserting
//! items as they are produced. Only a *complete* walk purges stale rows;
//! a capped walk leaves older rows in place so partial scans never shrink
//! the library. Commit failure rolls everything back and leaves the
//! previous cache untouched.

use std::time::{SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;

use sb_core::config::{BlacklistConfig, Share};
use sb_core::paths::{is_existing_dir, normalize};
use sb_core::{MediaItem, MediaKind, MediaResponse, Result};
use sb_db::queries::{media_items, scans};
use sb_db::{DbPool, ScanMeta};
use sb_scan::walk_shares;

/// Current instant as unix nanoseconds.
pub fn now_unix_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

/// Drop shares whose roots are missing; normalize the survivors' paths.
/// Returns the valid shares and their root strings.
fn valid_shares(shares: &[Share]) -> (Vec<Share>, Vec<String>) {
    let mut valid = Vec::with_capacity(shares.len());
    let mut roots = Vec::with_capacity(shares.len());
    for sh in shares {
        let root = normalize(&sh.path);
        if root.as_os_str().is_empty() || !is_existing_dir(&root) {
            continue;
        }
        let root_str = root.to_string_lossy().to_string();
        roots.push(root_str.clone());
        valid.push(Share {
            label: sh.label.clone(),
            path: root_str,
        });
    }
    (valid, roots)
}

/// Run a full indexing scan inside one transaction.
///
/// Returns `(scan_id, built_at_nanos, complete)`.
pub fn index_media_to_db(
    pool: &DbPool,
    cache_key: &str,
    shares: &[Share],
    blacklist: &BlacklistConfig,
    max_items: usize,
    cancel: &CancellationToken,
) -> Result<(i64, i64, bool)> {
    let built_at = now_unix_nanos();
    let scan_id = built_at;

    let (valid, roots) = valid_shares(shares);

    let conn = sb_db::get_conn(pool)?;
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| sb_core::Error::database(e.to_string()))?;

    let outcome = walk_shares(&valid, blacklist, max_items, cancel, &mut |item, path, root| {
        media_items::upsert_media_item(
            &tx,
            &item,
            &path.to_string_lossy(),
            scan_id,
            &root.to_string_lossy(),
        )
    })?;

    if outcome.complete {
        media_items::delete_stale_by_scan(&tx, scan_id, &roots)?;
        media_items::delete_by_share_roots_not_in(&tx, &roots)?;
    }

    scans::set_scan_meta(
        &tx,
        cache_key,
        ScanMeta {
            scan_id,
            built_at,
            complete: outcome.complete,
        },
    )?;

    tx.commit()
        .map_err(|e| sb_core::Error::database(e.to_string()))?;

    tracing::info!(
        items = outcome.produced,
        complete = outcome.complete,
        "media index scan committed"
    );
    Ok((scan_id, built_at, outcome.complete))
}

/// Assemble the listing response for a committed scan id.
pub fn load_media_response_from_scan(
    pool: &DbPool,
    scan_id: i64,
    shares: &[Share],
) -> Result<MediaResponse> {
    let conn = sb_db::get_conn(pool)?;
    Ok(MediaResponse {
        shares: shares.to_vec(),
        videos: media_items::query_media_items(&conn, scan_id, MediaKind::Video)?,
        audios: media_items::query_media_items(&conn, scan_id, MediaKind::Audio)?,
        images: media_items::query_media_items(&conn, scan_id, MediaKind::Image)?,
        others: media_items::query_media_items(&conn, scan_id, MediaKind::Other)?,
        ..Default::default()
    })
}

/// Hydrate a listing from the index without walking, if a committed scan
/// exists for this key. Returns the response and its build instant.
pub fn load_media_from_db(
    pool: &DbPool,
    cache_key: &str,
    shares: &[Share],
) -> Result<Option<(MediaResponse, i64)>> {
    let conn = sb_db::get_conn(pool)?;
    let meta = match scans::get_scan_meta(&conn, cache_key)? {
        Some(m) if m.scan_id > 0 && m.built_at > 0 => m,
        _ => return Ok(None),
    };
    drop(conn);
    let resp = load_media_response_from_scan(pool, meta.scan_id, shares)?;
    Ok(Some((resp, meta.built_at)))
}

/// Scan, commit, and read back in one step.
pub fn reindex_and_load(
    pool: &DbPool,
    cache_key: &str,
    shares: &[Share],
    blacklist: &BlacklistConfig,
    max_items: usize,
    cancel: &CancellationToken,
) -> Result<(MediaResponse, i64)> {
    let (scan_id, built_at, _complete) =
        index_media_to_db(pool, cache_key, shares, blacklist, max_items, cancel)?;
    let (valid, _) = valid_shares(shares);
    let resp = load_media_response_from_scan(pool, scan_id, &valid)?;
    Ok((resp, built_at))
}

/// Build the listing entirely in memory (no index store configured).
///
/// Items sort by kind, then share label, then case-folded name, matching
/// the ordering the store queries produce per kind.
pub fn build_media_response_in_memory(
    shares: &[Share],
    blacklist: &BlacklistConfig,
    max_items: usize,
    cancel: &CancellationToken,
) -> Result<MediaResponse> {
    let (valid, _) = valid_shares(shares);

    let mut items: Vec<MediaItem> = Vec::new();
    walk_shares(&valid, blacklist, max_items, cancel, &mut |item, _, _| {
        items.push(item);
        Ok(())
    })?;

    items.sort_by(|a, b| {
        a.kind
            .as_str()
            .cmp(b.kind.as_str())
            .then_with(|| a.share_label.cmp(&b.share_label))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });

    let mut resp = MediaResponse::empty(valid);
    for item in items {
        match item.kind {
            MediaKind::Video => resp.videos.push(item),
            MediaKind::Audio => resp.audios.push(item),
            MediaKind::Image => resp.images.push(item),
            MediaKind::Other => resp.others.push(item),
        }
    }
    Ok(resp)
}
