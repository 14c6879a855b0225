use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::ledger::MatcherConfig;
use crate::data::model::ChannelConfig;

// ---------------------------------------------------------------------------
// Optional JSON configuration file
// ---------------------------------------------------------------------------

pub const CONFIG_FILENAME: &str = "fermcurve.json";

/// Site-specific overrides: channel markers, ledger matcher settings and
/// ledger refresh interval. Every field has a working default, so the
/// file is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub channels: ChannelConfig,
    pub matcher: MatcherConfig,
    /// How long a fetched ledger snapshot stays fresh, in seconds.
    pub ledger_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            channels: ChannelConfig::default(),
            matcher: MatcherConfig::default(),
            ledger_ttl_secs: 300,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Load the config next to the working directory, falling back to
    /// defaults when the file is absent or malformed.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(cfg) => {
                log::info!("loaded configuration from {}", path.display());
                cfg
            }
            Err(e) => {
                log::warn!("ignoring bad config {}: {e:#}", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Channel;

    #[test]
    fn empty_object_uses_all_defaults() {
        let cfg: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.ledger_ttl_secs, 300);
        assert_eq!(cfg.matcher.code_field, "Lote");
        assert_eq!(cfg.channels.markers.len(), 2);
    }

    #[test]
    fn markers_can_be_overridden() {
        let cfg: AppConfig = serde_json::from_str(
            r#"{
                "channels": {
                    "markers": [
                        { "channel": "Temperature", "substring": "T7.Out" }
                    ]
                }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.channels.markers.len(), 1);
        assert_eq!(cfg.channels.classify("X_T7.Out"), Some(Channel::Temperature));
    }
}
