//! Console output
//!
//! Inputs build concurrently, so every line is printed whole with a single
//! `println!` and carries enough context (input name, path) to stand alone.

use colored::Colorize;
use std::fmt::Display;
use std::path::Path;

/// Render a path for console output
pub fn path(p: &Path) -> String {
    p.display().to_string().dimmed().to_string()
}

/// Console logger; `detail*` lines only print in verbose mode
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger {
    pub verbose: bool,
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn blank(&self) {
        println!();
    }

    pub fn plain(&self, msg: impl Display) {
        println!("{}", msg);
    }

    pub fn instruction(&self, msg: impl Display) {
        println!("{}", format!("> {}", msg).cyan());
    }

    pub fn success(&self, msg: impl Display) {
        println!("{}", format!("SUCCESS: {}", msg).green());
    }

    pub fn warning(&self, msg: impl Display) {
        println!("{}", format!("WARN: {}", msg).yellow());
    }

    pub fn error(&self, msg: impl Display) {
        println!("{}", format!("ERR: {}", msg).red());
    }

    pub fn detail(&self, msg: impl Display) {
        if self.verbose {
            self.plain(msg);
        }
    }

    pub fn detail_success(&self, msg: impl Display) {
        if self.verbose {
            self.success(msg);
        }
    }

    pub fn detail_error(&self, msg: impl Display) {
        if self.verbose {
            self.error(msg);
        }
    }
}
