//! Top-level `run`: options, global config, discovery, and reporting

use crate::args::BuildOptions;
use crate::build::{build_all, BuildContext, InputOutcome};
use crate::config::GlobalConfig;
use crate::discover::find_config_files;
use crate::log::{self, Logger};
use crate::plan::normalize_path;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// Per-invocation counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub built: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Build every input found under `path=` (default: the current directory)
///
/// `tokens` are the raw command-line tokens (see [`BuildOptions::parse`]).
pub async fn run(tokens: Vec<String>) -> Result<RunSummary> {
    let explicit = BuildOptions::parse(tokens).context("Invalid arguments")?;

    let global = match &explicit.config {
        Some(path) => match GlobalConfig::load(path).await {
            Ok(global) => {
                Logger::default()
                    .instruction(format!("Read global config at {}.", log::path(path)));
                global
            }
            Err(e) => {
                Logger::default().error(format!(
                    "Can't read global config at {}, reason: {}.",
                    log::path(path),
                    e
                ));
                GlobalConfig::default()
            }
        },
        None => GlobalConfig::default(),
    };

    let global_options =
        BuildOptions::parse(global.options.clone()).context("Invalid options in global config")?;
    let mut options = explicit.layered_over(global_options);
    if options.variant.is_none() {
        options.variant = global.values.variant.clone();
    }

    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let root = normalize_path(&cwd.join(options.path.clone().unwrap_or_else(PathBuf::new)));

    let ctx = BuildContext::new(&options, global.overrides.clone());
    let logger = ctx.log;

    if logger.verbose {
        logger.blank();
        logger.plain("Script \"build\" is running with the following values (and options*):");
        logger.plain(format!("variant = {:?}", options.variant));
        logger.plain(format!("path* = {}", root.display()));
        logger.plain(format!("config* = {:?}", options.config));
        logger.plain(format!("include* = {:?}", options.include));
        logger.plain(format!("exclude* = {:?}", options.exclude));
        logger.plain(format!("overrides* = {:?}", ctx.overrides));
        logger.plain(format!("replaces* = {:?}", options.replacements));
        logger.plain(format!("global-replaces* = {:?}", options.global_replacements));
        logger.plain(format!("verbose* = {}", options.verbose));
        logger.blank();
    }

    if !options.ignored.is_empty() {
        logger.warning(format!("Ignoring extra argument(s): {}", options.ignored.join(" ")));
    }

    let config_paths = find_config_files(&root)?;
    if config_paths.is_empty() {
        logger.warning(format!("No input configs found under {}.", log::path(&root)));
        return Ok(RunSummary::default());
    }

    let total = config_paths.len();
    let mut summary = RunSummary::default();
    let outcomes = build_all(config_paths, Arc::new(ctx), |outcome| {
        report(&logger, outcome, &mut summary);
    })
    .await;

    summary.failed += total - outcomes.len();
    Ok(summary)
}

fn report(logger: &Logger, outcome: &InputOutcome, summary: &mut RunSummary) {
    match &outcome.result {
        Ok(report) => {
            summary.built += 1;
            for dest in report.plan.destinations() {
                logger.instruction(format!(
                    "Created file variant of \"{}\" at {}",
                    report.name(),
                    log::path(dest)
                ));
            }
        }
        Err(e) if e.is_skip() => {
            summary.skipped += 1;
            logger.detail(format!("Skipped: {}.", e));
        }
        Err(e) => {
            summary.failed += 1;
            logger.error(format!("Failed creating file variant, reason: {}.", e));
        }
    }
    if logger.verbose {
        logger.blank();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILENAME;
    use std::fs;
    use std::path::Path;

    fn input(root: &Path, name: &str, config: &str, files: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for (file, content) in files {
            fs::write(dir.join(file), content).unwrap();
        }
        fs::write(dir.join(CONFIG_FILENAME), config).unwrap();
    }

    fn tokens(root: &Path, extra: &[&str]) -> Vec<String> {
        std::iter::once(format!("path={}", root.display()))
            .chain(extra.iter().map(|t| t.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_run_counts_built_skipped_and_failed() {
        let root = tempfile::tempdir().unwrap();
        input(
            root.path(),
            "app",
            r#"{ "default": "prod" }"#,
            &[("dev.txt", "dev"), ("prod.txt", "prod")],
        );
        input(root.path(), "legacy", r#"{ "default": "prod" }"#, &[("prod.txt", "l")]);
        input(root.path(), "broken", r#"{ "default": "prod" }"#, &[("dev.txt", "b")]);

        let summary = run(tokens(root.path(), &["exclude=legacy"])).await.unwrap();

        assert_eq!(
            summary,
            RunSummary {
                built: 1,
                skipped: 1,
                failed: 1
            }
        );
        assert!(!summary.is_success());
        assert_eq!(fs::read_to_string(root.path().join("app.txt")).unwrap(), "prod");
        assert!(!root.path().join("legacy.txt").exists());
    }

    #[tokio::test]
    async fn test_run_continues_without_unreadable_global_config() {
        let root = tempfile::tempdir().unwrap();
        input(
            root.path(),
            "app",
            r#"{ "default": "prod" }"#,
            &[("dev.txt", "dev"), ("prod.txt", "prod")],
        );
        let missing = format!("config={}", root.path().join("missing.json").display());

        let summary = run(tokens(root.path(), &["dev", missing.as_str()])).await.unwrap();

        assert!(summary.is_success());
        assert_eq!(summary.built, 1);
        assert_eq!(fs::read_to_string(root.path().join("app.txt")).unwrap(), "dev");
    }

    #[tokio::test]
    async fn test_run_layers_global_config_under_explicit_tokens() {
        let root = tempfile::tempdir().unwrap();
        input(
            root.path(),
            "web",
            r#"{ "default": "prod" }"#,
            &[("dev.txt", "dev"), ("prod.txt", "prod")],
        );
        input(root.path(), "legacy", r#"{ "default": "prod" }"#, &[("prod.txt", "l")]);
        let global = root.path().join("global.json");
        fs::write(
            &global,
            r#"{ "values": { "variant": "dev" }, "options": ["exclude=legacy"] }"#,
        )
        .unwrap();
        let config = format!("config={}", global.display());

        // Global values and options apply when nothing explicit is given
        let summary = run(tokens(root.path(), &[config.as_str()])).await.unwrap();
        assert_eq!(summary.built, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(fs::read_to_string(root.path().join("web.txt")).unwrap(), "dev");
        assert!(!root.path().join("legacy.txt").exists());

        // Explicit tokens win over both
        let summary = run(tokens(root.path(), &[config.as_str(), "prod", "exclude=none"]))
            .await
            .unwrap();
        assert_eq!(summary.built, 2);
        assert_eq!(summary.skipped, 0);
        assert_eq!(fs::read_to_string(root.path().join("web.txt")).unwrap(), "prod");
        assert_eq!(fs::read_to_string(root.path().join("legacy.txt")).unwrap(), "l");
    }

    #[tokio::test]
    async fn test_run_without_inputs_is_an_empty_success() {
        let root = tempfile::tempdir().unwrap();
        let summary = run(tokens(root.path(), &[])).await.unwrap();
        assert_eq!(summary, RunSummary::default());
    }

    #[tokio::test]
    async fn test_run_rejects_malformed_tokens() {
        let root = tempfile::tempdir().unwrap();
        assert!(run(tokens(root.path(), &["override=app"])).await.is_err());
    }
}
