//! Candidate files and their variant/part tags

use std::collections::BTreeSet;
use std::path::PathBuf;

/// A file next to an input config, named `<variant>[.<part>...].<ext>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    /// Text before the first `.`
    pub variant: String,
    /// Dot-separated segments between the variant and the extension
    pub parts: Vec<String>,
    /// Extension including the leading `.`, or empty
    pub extension: String,
}

impl Candidate {
    pub fn parse(path: PathBuf) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut segments = stem.split('.').map(str::to_string);
        let variant = segments.next().unwrap_or_default();
        let parts = segments.collect();

        Self {
            path,
            variant,
            parts,
            extension,
        }
    }
}

/// All candidates of one input
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
}

impl CandidateSet {
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            candidates: paths.into_iter().map(Candidate::parse).collect(),
        }
    }

    /// Distinct variant tags, sorted
    pub fn variants(&self) -> BTreeSet<String> {
        self.candidates.iter().map(|c| c.variant.clone()).collect()
    }

    /// Every candidate tagged with `variant`, in discovery order
    pub fn for_variant(&self, variant: &str) -> Vec<&Candidate> {
        self.candidates
            .iter()
            .filter(|c| c.variant == variant)
            .collect()
    }
}
