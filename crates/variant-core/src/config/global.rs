//! Optional process-wide config

use super::input::PartialInputConfig;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Default values applied when not given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalValues {
    /// Requested variant
    #[serde(default)]
    pub variant: Option<String>,
}

/// Global config (`config=<path>`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub values: GlobalValues,

    /// CLI-style tokens with lower priority than explicit ones
    #[serde(default)]
    pub options: Vec<String>,

    /// Fields merged underneath every input config
    #[serde(default)]
    pub overrides: PartialInputConfig,
}

impl GlobalConfig {
    /// Load a global config; `.yaml`/`.yml` files are parsed as YAML, anything else as JSON
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).await?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        if is_yaml {
            Ok(serde_yaml::from_str(&content)?)
        } else {
            Ok(serde_json::from_str(&content)?)
        }
    }
}
