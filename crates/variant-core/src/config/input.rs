//! Per-input config document and its resolution

use crate::encoding::TextEncoding;
use crate::error::{BuildError, ConfigError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::DEFAULT_MARKING;

/// `true`/`false` or a custom marking string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarkingValue {
    Flag(bool),
    Text(String),
}

/// `true`/`false` or an allow-list of global keywords
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GlobalReplacementValue {
    Flag(bool),
    Keywords(Vec<String>),
}

/// Config document as written on disk; every field optional
///
/// The same shape is used for the global config's `overrides`, which is
/// why `default` is optional here and only required after merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialInputConfig {
    /// Logical input name (defaults to the config's directory name)
    #[serde(default)]
    pub name: Option<String>,

    /// Output base-name template; `{name}`, `{marking}` and `{partN}` are substituted
    #[serde(default, alias = "filename")]
    pub output_name: Option<String>,

    /// Encoding used when rewriting keywords
    #[serde(default)]
    pub encoding: Option<String>,

    /// Output directory relative to the config's directory
    #[serde(default)]
    pub out_path: Option<String>,

    /// Variant used when nothing else resolves
    #[serde(default)]
    pub default: Option<String>,

    /// Variant -> variant bridge used when a requested variant has no file
    #[serde(default)]
    pub fallbacks: Option<HashMap<String, String>>,

    #[serde(default, alias = "useGlobalReplaces")]
    pub use_global_replacements: Option<GlobalReplacementValue>,

    #[serde(default)]
    pub marking: Option<MarkingValue>,

    /// Glob of sibling files that are never candidates
    #[serde(default)]
    pub exclude: Option<String>,
}

impl PartialInputConfig {
    /// Overlay `top` onto `self`; fields present in `top` win
    pub fn overlay(self, top: PartialInputConfig) -> PartialInputConfig {
        PartialInputConfig {
            name: top.name.or(self.name),
            output_name: top.output_name.or(self.output_name),
            encoding: top.encoding.or(self.encoding),
            out_path: top.out_path.or(self.out_path),
            default: top.default.or(self.default),
            fallbacks: top.fallbacks.or(self.fallbacks),
            use_global_replacements: top.use_global_replacements.or(self.use_global_replacements),
            marking: top.marking.or(self.marking),
            exclude: top.exclude.or(self.exclude),
        }
    }

    /// Resolve into a strict config for the document at `config_path`
    pub fn resolve(self, config_path: &Path) -> Result<InputConfig, ConfigError> {
        let default_variant = self.default.ok_or(ConfigError::MissingDefault)?;
        let dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let name = match self.name.filter(|n| !n.is_empty()) {
            Some(name) => name,
            None => dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        let marking = match self.marking {
            None | Some(MarkingValue::Flag(false)) => Marking::Absent,
            Some(MarkingValue::Flag(true)) => Marking::Default,
            Some(MarkingValue::Text(text)) if text.is_empty() => Marking::Absent,
            Some(MarkingValue::Text(text)) => Marking::Custom(text),
        };

        let use_global_replacements = match self.use_global_replacements {
            None | Some(GlobalReplacementValue::Flag(false)) => GlobalReplacementUse::Off,
            Some(GlobalReplacementValue::Flag(true)) => GlobalReplacementUse::All,
            Some(GlobalReplacementValue::Keywords(keywords)) => {
                GlobalReplacementUse::Only(keywords)
            }
        };

        Ok(InputConfig {
            name,
            dir,
            output_name: self.output_name.filter(|n| !n.is_empty()),
            encoding: self
                .encoding
                .filter(|e| !e.is_empty())
                .map(|e| TextEncoding::parse(&e))
                .unwrap_or_default(),
            out_path: self.out_path,
            default_variant,
            fallbacks: self.fallbacks.unwrap_or_default(),
            use_global_replacements,
            marking,
            exclude: self.exclude.filter(|e| !e.is_empty()),
        })
    }
}

/// Marking applied to the output name
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Marking {
    #[default]
    Absent,
    /// `marking: true`
    Default,
    Custom(String),
}

impl Marking {
    pub fn text(&self) -> Option<&str> {
        match self {
            Marking::Absent => None,
            Marking::Default => Some(DEFAULT_MARKING),
            Marking::Custom(text) => Some(text),
        }
    }
}

/// Which global replacements apply to an input
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GlobalReplacementUse {
    #[default]
    Off,
    All,
    /// Only the listed keywords (an empty list still enables the stage)
    Only(Vec<String>),
}

impl GlobalReplacementUse {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, GlobalReplacementUse::Off)
    }

    pub fn allows(&self, keyword: &str) -> bool {
        match self {
            GlobalReplacementUse::Off => false,
            GlobalReplacementUse::All => true,
            GlobalReplacementUse::Only(keywords) => keywords.iter().any(|k| k == keyword),
        }
    }
}

/// Effective configuration of one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputConfig {
    pub name: String,
    /// Directory holding the config document and the variant files
    pub dir: PathBuf,
    pub output_name: Option<String>,
    pub encoding: TextEncoding,
    pub out_path: Option<String>,
    pub default_variant: String,
    pub fallbacks: HashMap<String, String>,
    pub use_global_replacements: GlobalReplacementUse,
    pub marking: Marking,
    pub exclude: Option<String>,
}

/// Read the config at `config_path` and merge it over the global overrides
pub async fn load_input_config(
    config_path: &Path,
    global_overrides: &PartialInputConfig,
) -> Result<InputConfig, BuildError> {
    let read_error = |source: ConfigError| BuildError::ConfigRead {
        path: config_path.to_path_buf(),
        source,
    };

    let content = fs::read_to_string(config_path)
        .await
        .map_err(|e| read_error(e.into()))?;
    let document: PartialInputConfig =
        serde_json::from_str(&content).map_err(|e| read_error(e.into()))?;

    global_overrides
        .clone()
        .overlay(document)
        .resolve(config_path)
        .map_err(read_error)
}
