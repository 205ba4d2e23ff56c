//! Media-domain model: kinds, items, subtitles, and the listing response.
//!
//! Wire names are camelCase to match the web client. `MediaItem` carries
//! everything the listing needs; sidecar references are by encoded ID so
//! the response stays a forest (no back-pointers).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::Share;

/// Classification of a media file by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Image,
    Other,
}

impl MediaKind {
    /// Classify a lowercase extension of the form `.ext`.
    pub fn from_ext(ext: &str) -> Self {
        match ext {
            ".mp4" | ".webm" | ".mkv" | ".mov" | ".avi" | ".m4v" => MediaKind::Video,
            ".mp3" | ".aac" | ".wav" | ".flac" | ".m4a" | ".ogg" | ".opus" => MediaKind::Audio,
            ".jpg" | ".jpeg" | ".png" | ".gif" | ".webp" | ".bmp" | ".svg" => MediaKind::Image,
            _ => MediaKind::Other,
        }
    }

    /// Stable lowercase name, used as the DB column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Image => "image",
            MediaKind::Other => "other",
        }
    }

    /// Parse the DB column value back into a kind.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "video" => MediaKind::Video,
            "audio" => MediaKind::Audio,
            "image" => MediaKind::Image,
            _ => MediaKind::Other,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the extension names a subtitle sidecar (excluded from listings).
pub fn is_subtitle_ext(ext: &str) -> bool {
    matches!(ext, ".vtt" | ".srt")
}

/// Whether the extension names a lyrics sidecar (excluded from listings).
pub fn is_lyrics_ext(ext: &str) -> bool {
    ext == ".lrc"
}

/// A subtitle companion of a video item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtitle {
    pub id: String,
    pub label: String,
    pub lang: String,
    pub src: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub default: bool,
}

/// A file that passed classification and blacklists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub name: String,
    pub ext: String,
    pub kind: MediaKind,
    pub share_label: String,
    pub size: i64,
    pub mod_time: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtitles: Vec<Subtitle>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cover_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub lyrics_id: String,
}

/// The `/api/media` listing payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaResponse {
    pub shares: Vec<Share>,
    pub videos: Vec<MediaItem>,
    pub audios: Vec<MediaItem>,
    pub images: Vec<MediaItem>,
    pub others: Vec<MediaItem>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub videos_total: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub audios_total: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub images_total: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub others_total: usize,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub limited: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub scanning: bool,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl MediaResponse {
    /// An empty response carrying the given share list.
    pub fn empty(shares: Vec<Share>) -> Self {
        Self {
            shares,
            ..Self::default()
        }
    }
}
