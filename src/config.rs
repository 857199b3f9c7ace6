use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Process-wide settings for the screen services.
///
/// ```toml
/// storage_dir = "/data/app/identity"
/// ads_enabled_status = 1
/// attach_attribution_id = true
/// attribution_param_key = "attribution_id"
/// ad_token = "abcd1234"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Directory of the durable identity store. In-memory when unset.
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,

    /// Status value under which ads are presented.
    #[serde(default = "default_ads_enabled_status")]
    pub ads_enabled_status: i64,

    #[serde(default = "default_attach_attribution_id")]
    pub attach_attribution_id: bool,

    #[serde(default = "default_attribution_param_key")]
    pub attribution_param_key: String,

    /// Locally configured ad token. Takes precedence over the collector's.
    #[serde(default)]
    pub ad_token: Option<String>,
}

fn default_ads_enabled_status() -> i64 {
    1
}

fn default_attach_attribution_id() -> bool {
    true
}

fn default_attribution_param_key() -> String {
    "attribution_id".to_string()
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            ads_enabled_status: default_ads_enabled_status(),
            attach_attribution_id: default_attach_attribution_id(),
            attribution_param_key: default_attribution_param_key(),
            ad_token: None,
        }
    }
}

impl ServicesConfig {
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str(content)
            .context("Failed to parse services config")?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).with_context(|| {
            format!("Failed to read services config {}", path.display())
        })?;
        Self::from_toml_str(&content).with_context(|| {
            format!("Invalid services config {}", path.display())
        })
    }
}
