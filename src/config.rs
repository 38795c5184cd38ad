// ── Application config ────────────────────────────────────────────────────────
//
// Reads and writes `%APPDATA%\Slate\config.json`: the idle-screen knobs that
// are not user preferences in the registry sense.
// No `unsafe`: pure safe Rust + serde_json.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{error::Result, overlay::OverlayProfile};

// ── Format version ────────────────────────────────────────────────────────────

const CONFIG_VERSION: u32 = 1;

pub(crate) const DEFAULT_IDLE_TIMEOUT_MS: u32 = 5_000;
pub(crate) const DEFAULT_ANIMATION_INTERVAL_MS: u32 = 50;

// ── On-disk type ──────────────────────────────────────────────────────────────

/// Root of the JSON config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    pub(crate) version: u32,
    /// Milliseconds without input before the idle screen appears.
    pub(crate) idle_timeout_ms: u32,
    /// Milliseconds between sprite animation ticks.
    pub(crate) animation_interval_ms: u32,
    pub(crate) overlay_profile: OverlayProfile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            animation_interval_ms: DEFAULT_ANIMATION_INTERVAL_MS,
            overlay_profile: OverlayProfile::default(),
        }
    }
}

// ── Path ──────────────────────────────────────────────────────────────────────

/// Return the path to the config file: `%APPDATA%\Slate\config.json`.
///
/// Returns `None` if the `APPDATA` environment variable is not set.
pub(crate) fn config_path() -> Option<PathBuf> {
    let appdata = std::env::var_os("APPDATA")?;
    let mut p = PathBuf::from(appdata);
    p.push("Slate");
    p.push("config.json");
    Some(p)
}

// ── Load / save ───────────────────────────────────────────────────────────────

impl Config {
    /// Parse config bytes.  `None` on malformed JSON or an unknown version.
    fn parse(data: &[u8]) -> Option<Self> {
        let mut cfg: Self = match serde_json::from_slice(data) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("ignoring malformed config: {e}");
                return None;
            }
        };
        if cfg.version != CONFIG_VERSION {
            log::warn!("ignoring config version {}", cfg.version);
            return None;
        }
        // Zero intervals would spin the timers.
        if cfg.idle_timeout_ms == 0 {
            cfg.idle_timeout_ms = DEFAULT_IDLE_TIMEOUT_MS;
        }
        if cfg.animation_interval_ms == 0 {
            cfg.animation_interval_ms = DEFAULT_ANIMATION_INTERVAL_MS;
        }
        Some(cfg)
    }

    /// Write the config to `path`, creating the parent directory if needed.
    pub(crate) fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self).map_err(std::io::Error::other)?;
        Ok(())
    }

    /// Read the config at `path`.  Defaults if it is missing or unusable.
    pub(crate) fn load_from(path: &Path) -> Self {
        fs::read(path)
            .ok()
            .and_then(|data| Self::parse(&data))
            .unwrap_or_default()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let cfg = Config {
            idle_timeout_ms: 12_000,
            overlay_profile: OverlayProfile::Simple,
            ..Config::default()
        };
        let json = serde_json::to_vec(&cfg).expect("serialize");
        assert_eq!(Config::parse(&json), Some(cfg));
    }

    #[test]
    fn profile_is_lowercase_on_disk() {
        let json = serde_json::to_string(&Config::default()).expect("serialize");
        assert!(json.contains(r#""overlay_profile":"interactive""#), "{json}");
    }

    #[test]
    fn missing_fields_take_defaults() {
        let cfg = Config::parse(br#"{"version":1,"overlay_profile":"simple"}"#).expect("parse");
        assert_eq!(cfg.idle_timeout_ms, DEFAULT_IDLE_TIMEOUT_MS);
        assert_eq!(cfg.animation_interval_ms, DEFAULT_ANIMATION_INTERVAL_MS);
        assert_eq!(cfg.overlay_profile, OverlayProfile::Simple);
    }

    #[test]
    fn zero_intervals_are_replaced() {
        let cfg = Config::parse(br#"{"version":1,"idle_timeout_ms":0,"animation_interval_ms":0}"#)
            .expect("parse");
        assert_eq!(cfg.idle_timeout_ms, DEFAULT_IDLE_TIMEOUT_MS);
        assert_eq!(cfg.animation_interval_ms, DEFAULT_ANIMATION_INTERVAL_MS);
    }

    #[test]
    fn wrong_version_is_rejected() {
        assert_eq!(Config::parse(br#"{"version":99}"#), None);
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(Config::parse(b"not json"), None);
    }

    #[test]
    fn save_creates_directory_and_reloads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Slate").join("config.json");
        let cfg = Config { animation_interval_ms: 40, ..Config::default() };
        cfg.save_to(&path).expect("save");
        assert_eq!(Config::load_from(&path), cfg);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(Config::load_from(&dir.path().join("absent.json")), Config::default());
    }
}
