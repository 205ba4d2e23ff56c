//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries
//! all sections the server and web client need. Every section defaults
//! sensibly so a completely empty `{}` file is valid; wire names are
//! camelCase to match the client.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A named directory root exposed to listing and streaming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub path: String,
}

/// Player feature toggles surfaced to the web client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Features {
    pub speed: bool,
    pub speed_options: Vec<f64>,
    pub quality: bool,
    pub captions: bool,
    pub playlist: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            speed: true,
            speed_options: vec![0.5, 0.75, 1.0, 1.25, 1.5, 2.0],
            quality: false,
            captions: true,
            playlist: true,
        }
    }
}

/// UI defaults for the web client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiConfig {
    pub default_tab: String,
    pub show_others: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_tab: "video".into(),
            show_others: false,
        }
    }
}

/// Audio playback behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackAudioConfig {
    pub enabled: bool,
    pub shuffle: bool,
    pub remember: bool,
    pub scope: String,
    pub transcode: bool,
}

impl Default for PlaybackAudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            shuffle: false,
            remember: true,
            scope: "all".into(),
            transcode: false,
        }
    }
}

/// Video playback behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackVideoConfig {
    pub enabled: bool,
    pub scope: String,
    pub transcode: bool,
    pub resume: bool,
}

impl Default for PlaybackVideoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scope: "folder".into(),
            transcode: false,
            resume: true,
        }
    }
}

/// Image viewing behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackImageConfig {
    pub enabled: bool,
    pub scope: String,
}

impl Default for PlaybackImageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scope: "folder".into(),
        }
    }
}

/// Per-kind playback configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub audio: PlaybackAudioConfig,
    pub video: PlaybackVideoConfig,
    pub image: PlaybackImageConfig,
}

/// Scan exclusion rules.
///
/// String rules match exactly (case-insensitive) or, when wrapped in
/// slashes (`/pattern/`), as a regular expression. The size rule is a
/// range or comparison expression like `100MB-2GB` or `>=500KB`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlacklistConfig {
    pub extensions: Vec<String>,
    pub filenames: Vec<String>,
    pub folders: Vec<String>,
    pub size_rule: String,
}

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub port: u16,
    pub shares: Vec<Share>,
    pub features: Features,
    pub ui: UiConfig,
    pub playback: PlaybackConfig,
    pub blacklist: BlacklistConfig,
    pub log_level: String,
    pub log_file: String,
    /// Scan item cap; 0 means no user-imposed cap (the walker still
    /// enforces an internal safety ceiling).
    pub max_items: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8099,
            shares: Vec::new(),
            features: Features::default(),
            ui: UiConfig::default(),
            playback: PlaybackConfig::default(),
            blacklist: BlacklistConfig::default(),
            log_level: "info".into(),
            log_file: String::new(),
            max_items: 0,
        }
    }
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Effective listen port (0 falls back to the default).
    pub fn effective_port(&self) -> u16 {
        if self.port == 0 {
            8099
        } else {
            self.port
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_valid() {
        let cfg = Config::from_json("{}").unwrap();
        assert_eq!(cfg.port, 8099);
        assert!(cfg.features.speed);
        assert_eq!(cfg.ui.default_tab, "video");
        assert_eq!(cfg.playback.video.scope, "folder");
        assert!(!cfg.playback.video.transcode);
        assert_eq!(cfg.max_items, 0);
    }

    #[test]
    fn camel_case_wire_names() {
        let cfg = Config::default();
        let v = serde_json::to_value(&cfg).unwrap();
        assert!(v.get("logLevel").is_some());
        assert!(v.get("maxItems").is_some());
        assert!(v["features"].get("speedOptions").is_some());
        assert!(v["blacklist"].get("sizeRule").is_some());
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let cfg = Config::from_json(r#"{"playback":{"video":{"transcode":true}}}"#).unwrap();
        assert!(cfg.playback.video.transcode);
        assert!(cfg.playback.video.enabled);
        assert!(cfg.playback.audio.remember);
    }

    #[test]
    fn malformed_json_is_validation_error() {
        let err = Config::from_json("{not json").unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn zero_port_falls_back() {
        let cfg = Config::from_json(r#"{"port":0}"#).unwrap();
        assert_eq!(cfg.effective_port(), 8099);
    }
}
