//! Input and global configuration documents
//!
//! Every input directory carries a JSON document named [`CONFIG_FILENAME`].
//! An optional global config supplies defaults that are merged underneath
//! each input document before it is resolved into an [`InputConfig`].

pub mod global;
pub mod input;

pub use global::{GlobalConfig, GlobalValues};
pub use input::{
    load_input_config, GlobalReplacementUse, InputConfig, Marking, PartialInputConfig,
};

/// File name of the per-input config document
pub const CONFIG_FILENAME: &str = "fvi.config.json";

/// Marking appended to output names when `marking` is `true`
pub const DEFAULT_MARKING: &str = ".fvo";
