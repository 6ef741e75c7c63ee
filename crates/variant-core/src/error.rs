//! Error types for the per-input build pipeline

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a config document (per-input or global)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("missing required field `default`")]
    MissingDefault,
}

/// Failure of one input's pipeline
///
/// Every variant identifies the input (or the config path when the name is
/// not known yet) so failures stay attributable when inputs build concurrently.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Can't read config at {}, reason: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error("Did not create output for \"{name}\" because it wasn't included / was excluded")]
    InputFiltered { name: String },

    #[error("Searching for files in input \"{name}\" failed, reason: {reason}")]
    NoCandidates { name: String, reason: String },

    #[error("Can't find a file variant to use for input \"{name}\" (default \"{default}\" has no file)")]
    VariantUnresolved { name: String, default: String },

    #[error("Can't create directory at {} for input \"{name}\", reason: {source}", .path.display())]
    DirectoryCreate {
        name: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "Copying outputs of input \"{name}\" failed ({failed} of {total}), first failure {} -> {}: {source}",
        .src.display(),
        .dest.display()
    )]
    Copy {
        name: String,
        failed: usize,
        total: usize,
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid replacement keyword \"{keyword}\" for input \"{name}\": {source}")]
    InvalidKeyword {
        name: String,
        keyword: String,
        #[source]
        source: regex::Error,
    },

    #[error("Reading output of input \"{name}\" at {} failed, reason: {source}", .path.display())]
    Read {
        name: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Writing to output of input \"{name}\" at {} failed, reason: {source}", .path.display())]
    Write {
        name: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BuildError {
    /// Whether this is a skip signal (include/exclude filtering) rather than a failure
    pub fn is_skip(&self) -> bool {
        matches!(self, BuildError::InputFiltered { .. })
    }
}

/// Malformed command-line token
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgError {
    #[error("`{key}={value}` is malformed, expected {expected}")]
    Malformed {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}
