//! variant-build - build environment-specific outputs from file variants

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "variant-build")]
#[command(about = "Build environment-specific outputs from file variants")]
#[command(version)]
#[command(after_help = "\
Tokens (order-independent, each consumed once):
  <variant>                           requested variant
  path=<dir>                          root directory searched for inputs
  config=<file>                       global config (JSON, or YAML by extension)
  include=<a,b>  exclude=<a,b>        filter inputs by name
  override=<name>,<variant>           per-input variant (repeatable;
                                      override-variant= also accepted)
  replace=<name>,<keyword>,<text>     per-input replacement (repeatable)
  global-replace=<keyword>,<text>     global replacement (repeatable)
  verbose                             narrate every stage")]
pub struct Args {
    /// Raw build tokens
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub tokens: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Partial outputs are left as they are; just exit with the conventional code
    ctrlc::set_handler(move || {
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();

    let summary = variant_core::run(args.tokens).await?;

    if !summary.is_success() {
        eprintln!(
            "{} {} input(s) failed ({} built, {} skipped)",
            "Error:".red(),
            summary.failed,
            summary.built,
            summary.skipped
        );
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
