//! Integration tests for the stream endpoint: direct play, ranges,
//! authorization, and transcode gating.

mod common;

use common::TestHarness;

#[tokio::test]
async fn full_file_with_streaming_headers() {
    let h = TestHarness::new();
    let data: Vec<u8> = (0..=255u8).cycle().take(2048).collect();
    let clip = h.write_media("clip.mp4", &data);
    let addr = h.serve().await;

    let resp = reqwest::get(format!("http://{addr}/api/stream?id={}", h.id_for(&clip)))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "video/mp4");
    assert_eq!(resp.headers()["accept-ranges"], "bytes");
    assert_eq!(
        resp.headers()["content-disposition"].to_str().unwrap(),
        "inline; filename=\"clip.mp4\""
    );
    assert!(resp.headers().contains_key("last-modified"));
    assert_eq!(resp.bytes().await.unwrap().as_ref(), data.as_slice());
}

#[tokio::test]
async fn range_request_returns_exact_window() {
    let h = TestHarness::new();
    let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    let clip = h.write_media("clip.mp4", &data);
    let addr = h.serve().await;

    let resp = reqwest::Client::new()
        .get(format!("http://{addr}/api/stream?id={}", h.id_for(&clip)))
        .header("Range", "bytes=0-1023")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 206);
    assert_eq!(
        resp.headers()["content-range"].to_str().unwrap(),
        "bytes 0-1023/4096"
    );
    assert_eq!(resp.headers()["content-length"], "1024");
    assert_eq!(resp.bytes().await.unwrap().as_ref(), &data[..1024]);
}

#[tokio::test]
async fn mid_file_and_open_ranges() {
    let h = TestHarness::new();
    let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
    let clip = h.write_media("clip.mkv", &data);
    let addr = h.serve().await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/api/stream?id={}", h.id_for(&clip));

    let resp = client
        .get(&url)
        .header("Range", "bytes=100-199")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 206);
    assert_eq!(resp.headers()["content-type"], "video/x-matroska");
    assert_eq!(resp.bytes().await.unwrap().as_ref(), &data[100..200]);

    let resp = client
        .get(&url)
        .header("Range", "bytes=900-")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 206);
    assert_eq!(
        resp.headers()["content-range"].to_str().unwrap(),
        "bytes 900-999/1000"
    );
    assert_eq!(resp.bytes().await.unwrap().as_ref(), &data[900..]);
}

#[tokio::test]
async fn unsatisfiable_range_is_416() {
    let h = TestHarness::new();
    let clip = h.write_media("clip.mp4", &vec![0u8; 100]);
    let addr = h.serve().await;

    let resp = reqwest::Client::new()
        .get(format!("http://{addr}/api/stream?id={}", h.id_for(&clip)))
        .header("Range", "bytes=5000-")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 416);
    assert_eq!(
        resp.headers()["content-range"].to_str().unwrap(),
        "bytes */100"
    );
}

#[tokio::test]
async fn path_outside_shares_is_forbidden_with_no_bytes() {
    let h = TestHarness::new();
    let outside = tempfile::tempdir().unwrap();
    let secret = outside.path().join("secret.mp4");
    std::fs::write(&secret, b"forbidden-bytes").unwrap();
    let addr = h.serve().await;

    let resp = reqwest::get(format!(
        "http://{addr}/api/stream?id={}",
        h.id_for(&secret)
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 403);
    let body = resp.bytes().await.unwrap();
    assert!(!body
        .windows(b"forbidden-bytes".len())
        .any(|w| w == b"forbidden-bytes"));
}

#[tokio::test]
async fn malformed_and_missing_ids_are_rejected() {
    let h = TestHarness::new();
    let addr = h.serve().await;

    let resp = reqwest::get(format!("http://{addr}/api/stream?id=!!bad!!"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = reqwest::get(format!("http://{addr}/api/stream"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn missing_file_fails_containment() {
    let h = TestHarness::new();
    // Mint an id for a path inside the share that does not exist.
    let ghost = h.media.path().join("ghost.mp4");
    let addr = h.serve().await;

    let resp = reqwest::get(format!("http://{addr}/api/stream?id={}", h.id_for(&ghost)))
        .await
        .unwrap();
    // The containment check also requires the file to exist.
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn transcode_disallowed_by_config_is_403() {
    // Default config has transcoding off for both kinds.
    let h = TestHarness::new();
    let clip = h.write_media("clip.mkv", b"v");
    let addr = h.serve().await;

    let resp = reqwest::get(format!(
        "http://{addr}/api/stream?id={}&transcode=1",
        h.id_for(&clip)
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn lyrics_stream_is_plain_text() {
    let h = TestHarness::new();
    let lrc = h.write_media("song.lrc", "[00:01.00]line\n".as_bytes());
    h.write_media("song.mp3", b"a");
    let addr = h.serve().await;

    let resp = reqwest::get(format!("http://{addr}/api/stream?id={}", h.id_for(&lrc)))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["content-type"].to_str().unwrap(),
        "text/plain; charset=utf-8"
    );
}
