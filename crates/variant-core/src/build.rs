//! Per-input build pipeline and the fan-out over all inputs
//!
//! One input moves through load config -> select variant -> plan outputs ->
//! materialize -> apply replacements. The first failing stage ends that
//! input's pipeline; other inputs are unaffected.

use crate::args::BuildOptions;
use crate::config::{load_input_config, PartialInputConfig};
use crate::discover::list_candidates;
use crate::error::BuildError;
use crate::log::{self, Logger};
use crate::materialize::materialize;
use crate::plan::{plan_outputs, BuildPlan};
use crate::replace::{apply_all, ReplaceOutcome, ReplacementTable};
use crate::variant::{select, CandidateSet, Selection};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Read-only state shared by every input's pipeline
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    /// Requested variant
    pub variant: Option<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Input name -> variant
    pub overrides: HashMap<String, String>,
    pub replacements: ReplacementTable,
    /// Fields merged underneath every input config
    pub global_overrides: PartialInputConfig,
    pub log: Logger,
}

impl BuildContext {
    pub fn new(options: &BuildOptions, global_overrides: PartialInputConfig) -> Self {
        Self {
            variant: options.variant.clone(),
            include: options.include.clone(),
            exclude: options.exclude.clone(),
            overrides: options.overrides.iter().cloned().collect(),
            replacements: ReplacementTable::from_entries(
                &options.replacements,
                &options.global_replacements,
            ),
            global_overrides,
            log: Logger::new(options.verbose),
        }
    }

    /// Whether include/exclude filters let `name` through
    pub fn is_selected(&self, name: &str) -> bool {
        (self.include.is_empty() || self.include.iter().any(|n| n == name))
            && !self.exclude.iter().any(|n| n == name)
    }
}

/// Pipeline stages, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    LoadConfig,
    SelectVariant,
    PlanOutputs,
    Materialize,
    ApplyReplacements,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BuildStage::LoadConfig => "loading config",
            BuildStage::SelectVariant => "selecting variant",
            BuildStage::PlanOutputs => "planning outputs",
            BuildStage::Materialize => "copying outputs",
            BuildStage::ApplyReplacements => "applying replacements",
        };
        write!(f, "{}", label)
    }
}

/// Result of a successful pipeline
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub selection: Selection,
    pub plan: BuildPlan,
    pub replacements: ReplaceOutcome,
}

impl BuildReport {
    pub fn name(&self) -> &str {
        &self.plan.name
    }
}

/// Build the input whose config lives at `config_path`
pub async fn build_input(config_path: &Path, ctx: &BuildContext) -> Result<BuildReport, BuildError> {
    let log = &ctx.log;

    log.detail(format!(
        "{} at {}.",
        BuildStage::LoadConfig,
        log::path(config_path)
    ));
    let config = load_input_config(config_path, &ctx.global_overrides).await?;
    let name = config.name.clone();
    log.detail_success(format!(
        "Read config of input \"{}\" at {}.",
        name,
        log::path(config_path)
    ));

    if !ctx.is_selected(&name) {
        return Err(BuildError::InputFiltered { name });
    }

    log.detail(format!("Input \"{}\": {}.", name, BuildStage::SelectVariant));
    let paths = list_candidates(&config.dir, config.exclude.as_deref())
        .await
        .map_err(|e| BuildError::NoCandidates {
            name: name.clone(),
            reason: format!("{:#}", e),
        })?;
    let candidates = CandidateSet::from_paths(paths);
    let variants = candidates.variants();
    if variants.is_empty() {
        log.detail_error(format!("Did not find any variants for input \"{}\".", name));
    } else {
        log.detail(format!(
            "Found variant(s) {} for input \"{}\".",
            variants
                .iter()
                .map(|v| format!("\"{}\"", v))
                .collect::<Vec<_>>()
                .join(", "),
            name
        ));
    }

    let selection = select(
        &variants,
        ctx.variant.as_deref(),
        &name,
        &ctx.overrides,
        &config,
    )?;
    log.detail(format!(
        "Using variant \"{}\" ({}) to build for input \"{}\".",
        selection.variant, selection.reason, name
    ));

    log.detail(format!("Input \"{}\": {}.", name, BuildStage::PlanOutputs));
    let sources = candidates.for_variant(&selection.variant);
    let plan = plan_outputs(config, &sources);

    log.detail(format!("Input \"{}\": {}.", name, BuildStage::Materialize));
    materialize(&plan.name, &plan.dest_dir, &plan.src_dest_pairs, log).await?;

    log.detail(format!("Input \"{}\": {}.", name, BuildStage::ApplyReplacements));
    let replacements = apply_all(&plan, &ctx.replacements, log).await?;

    Ok(BuildReport {
        selection,
        plan,
        replacements,
    })
}

/// Outcome of one input's pipeline
#[derive(Debug)]
pub struct InputOutcome {
    pub config_path: PathBuf,
    pub result: Result<BuildReport, BuildError>,
}

/// Build every input concurrently, one task per input
///
/// `on_outcome` sees each outcome as soon as its pipeline finishes, so
/// completion order is not the order of `config_paths`. A task that panics
/// is logged and has no outcome.
pub async fn build_all<F>(
    config_paths: Vec<PathBuf>,
    ctx: Arc<BuildContext>,
    mut on_outcome: F,
) -> Vec<InputOutcome>
where
    F: FnMut(&InputOutcome),
{
    let mut pending: FuturesUnordered<_> = config_paths
        .into_iter()
        .map(|config_path| {
            let ctx = Arc::clone(&ctx);
            let task_path = config_path.clone();
            let handle = tokio::spawn(async move {
                let result = build_input(&task_path, &ctx).await;
                InputOutcome {
                    config_path: task_path,
                    result,
                }
            });
            async move { (config_path, handle.await) }
        })
        .collect();

    let mut outcomes = Vec::new();
    while let Some((config_path, joined)) = pending.next().await {
        match joined {
            Ok(outcome) => {
                on_outcome(&outcome);
                outcomes.push(outcome);
            }
            Err(e) => ctx.log.error(format!(
                "Build of input at {} did not complete, reason: {}.",
                log::path(&config_path),
                e
            )),
        }
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(tokens: &[&str]) -> BuildOptions {
        BuildOptions::parse(tokens.iter().map(|t| t.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_context_filters() {
        let ctx = BuildContext::new(&options(&["include=a,b", "exclude=b"]), Default::default());
        assert!(ctx.is_selected("a"));
        assert!(!ctx.is_selected("b"));
        assert!(!ctx.is_selected("c"));

        let ctx = BuildContext::new(&options(&[]), Default::default());
        assert!(ctx.is_selected("anything"));
    }

    #[test]
    fn test_context_later_override_wins() {
        let ctx = BuildContext::new(
            &options(&["override=app,dev", "override=app,prod"]),
            Default::default(),
        );
        assert_eq!(ctx.overrides.get("app").map(String::as_str), Some("prod"));
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(BuildStage::Materialize.to_string(), "copying outputs");
    }
}
