//! Variant Core - file-variant resolution and output materialization
//!
//! Every input is a directory holding a config document ([`config::CONFIG_FILENAME`])
//! and one file per variant (`dev.json`, `prod.json`, `prod.left.txt`, ...). A build
//! picks one variant per input, copies its file(s) to a computed destination and
//! optionally rewrites keywords inside the copies.
//!
//! # Architecture
//!
//! - **Selection & planning** - Pure functions: [`variant::select`] and [`plan::plan_outputs`]
//! - **Filesystem stages** - [`materialize::materialize`] and [`replace::apply_all`] (async, tokio)
//! - **Orchestration** - [`build::build_input`] runs one input's pipeline,
//!   [`build::build_all`] fans out one task per input, [`run`] wires in CLI tokens,
//!   the global config and discovery
//!
//! # Example Usage
//!
//! ```ignore
//! use variant_core::{build_input, BuildContext, BuildOptions};
//!
//! let options = BuildOptions::parse(vec!["prod".into(), "verbose".into()])?;
//! let ctx = BuildContext::new(&options, Default::default());
//! let report = build_input(Path::new("inputs/app/fvi.config.json"), &ctx).await?;
//! ```

pub mod args;
pub mod build;
pub mod config;
pub mod discover;
pub mod encoding;
pub mod error;
pub mod log;
pub mod materialize;
pub mod plan;
pub mod replace;
pub mod runner;
pub mod variant;

// Re-export main types for convenience
pub use args::BuildOptions;
pub use build::{build_all, build_input, BuildContext, BuildReport, BuildStage, InputOutcome};
pub use config::{GlobalConfig, InputConfig, CONFIG_FILENAME, DEFAULT_MARKING};
pub use error::{ArgError, BuildError, ConfigError};
pub use plan::BuildPlan;
pub use runner::{run, RunSummary};
pub use variant::{Selection, SelectionReason, MAX_FALLBACK_STEPS};
