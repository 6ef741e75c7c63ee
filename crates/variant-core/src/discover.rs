//! Discovery of input configs and of the variant files next to them

use crate::config::CONFIG_FILENAME;
use anyhow::{Context, Result};
use globset::Glob;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::{DirEntry, WalkDir};

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Recursively find every input config under `root`, sorted by path
///
/// Hidden directories (`.git`, `.cache`, ...) are not descended into.
pub fn find_config_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut configs = Vec::new();

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry
            .with_context(|| format!("Searching for config files in {} failed", root.display()))?;
        if entry.file_type().is_file() && entry.file_name() == CONFIG_FILENAME {
            configs.push(entry.into_path());
        }
    }

    Ok(configs)
}

/// List the candidate files of one input directory, sorted by file name
///
/// Only regular (or symlinked regular), non-hidden files are candidates; the config document and
/// files matching the optional `exclude` glob are left out.
pub async fn list_candidates(dir: &Path, exclude: Option<&str>) -> Result<Vec<PathBuf>> {
    let exclude = exclude
        .map(|pattern| {
            Glob::new(pattern)
                .map(|glob| glob.compile_matcher())
                .with_context(|| format!("Invalid exclude pattern \"{}\"", pattern))
        })
        .transpose()?;

    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;

    let mut candidates = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
    {
        // Follows symlinks; dangling links are not candidates
        match fs::metadata(entry.path()).await {
            Ok(metadata) if metadata.is_file() => {}
            _ => continue,
        }

        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if name == CONFIG_FILENAME || name.starts_with('.') {
            continue;
        }
        if exclude.as_ref().is_some_and(|m| m.is_match(name)) {
            continue;
        }

        candidates.push(entry.path());
    }

    candidates.sort();
    Ok(candidates)
}
