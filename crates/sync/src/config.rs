use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PRIMARY_URL: &str = "http://localhost:7070";
pub const DEFAULT_SHARING_URL: &str = "http://localhost:3000";
pub const DEFAULT_SAVE_FLASH_MS: u64 = 3_000;

/// Client settings, usually read from `schedule.toml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub share: ShareConfig,
    /// How long a successful save stays flagged.
    #[serde(default = "default_save_flash_ms")]
    pub save_flash_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            share: ShareConfig::default(),
            save_flash_ms: DEFAULT_SAVE_FLASH_MS,
        }
    }
}

/// Base URLs of the two services.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_primary")]
    pub primary: String,
    #[serde(default = "default_sharing")]
    pub sharing: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            sharing: default_sharing(),
        }
    }
}

/// Where share links point.
///
/// The externally reachable host is not known to the client, so the sharing
/// service hands out a path and the base is chosen here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Public tunnel URL, when one is running.
    #[serde(default)]
    pub public_base_url: Option<String>,
    #[serde(default = "default_sharing")]
    pub local_base_url: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            public_base_url: None,
            local_base_url: default_sharing(),
        }
    }
}

impl ShareConfig {
    /// The tunnel URL if set and non-blank, else the local default.
    pub fn base_url(&self) -> &str {
        self.public_base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.local_base_url)
    }

    /// Full link for a share path.
    pub fn link(&self, share_path: &str) -> String {
        let base = self.base_url().trim_end_matches('/');
        if share_path.starts_with('/') {
            format!("{base}{share_path}")
        } else {
            format!("{base}/{share_path}")
        }
    }
}

impl ClientConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: ClientConfig =
            toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn save_flash(&self) -> Duration {
        Duration::from_millis(self.save_flash_ms)
    }
}

fn default_primary() -> String {
    DEFAULT_PRIMARY_URL.to_string()
}

fn default_sharing() -> String {
    DEFAULT_SHARING_URL.to_string()
}

fn default_save_flash_ms() -> u64 {
    DEFAULT_SAVE_FLASH_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.endpoints.primary, DEFAULT_PRIMARY_URL);
        assert_eq!(cfg.endpoints.sharing, DEFAULT_SHARING_URL);
        assert_eq!(cfg.save_flash(), Duration::from_secs(3));
        assert_eq!(cfg.share.base_url(), DEFAULT_SHARING_URL);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg: ClientConfig = toml::from_str(
            r#"
            save_flash_ms = 500

            [share]
            public_base_url = "https://abc.ngrok.app/"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.endpoints, Endpoints::default());
        assert_eq!(cfg.save_flash_ms, 500);
        assert_eq!(cfg.share.link("/s/TOKEN"), "https://abc.ngrok.app/s/TOKEN");
    }

    #[test]
    fn blank_tunnel_falls_back_to_local() {
        let share = ShareConfig {
            public_base_url: Some("  ".into()),
            local_base_url: "http://localhost:3000".into(),
        };
        assert_eq!(share.link("s/abc"), "http://localhost:3000/s/abc");
    }

    #[test]
    fn round_trips_through_a_file() {
        let dir = std::env::temp_dir().join(format!("schedule-cfg-{}", uuid::Uuid::new_v4()));
        let path = dir.join("schedule.toml");
        let mut cfg = ClientConfig::default();
        cfg.endpoints.primary = "http://10.0.0.2:7070".into();
        cfg.save_to(&path).unwrap();
        assert_eq!(ClientConfig::load_from(&path).unwrap(), cfg);
        std::fs::remove_dir_all(&dir).ok();
    }
}
