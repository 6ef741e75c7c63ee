//! Output naming and destination paths

use crate::config::InputConfig;
use crate::encoding::TextEncoding;
use crate::variant::Candidate;
use std::path::{Component, Path, PathBuf};

/// Everything needed to materialize one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    pub name: String,
    /// Output base name after `{name}` and `{marking}` substitution
    pub output_name: String,
    pub encoding: TextEncoding,
    pub dest_dir: PathBuf,
    /// One destination per selected source, in source order
    pub src_dest_pairs: Vec<(PathBuf, PathBuf)>,
    pub config: InputConfig,
}

impl BuildPlan {
    pub fn destinations(&self) -> impl Iterator<Item = &Path> {
        self.src_dest_pairs.iter().map(|(_, dest)| dest.as_path())
    }
}

/// Output base name with `{name}` and `{marking}` substituted
///
/// Each token is substituted at its first occurrence. A marking without a
/// `{marking}` token is appended.
pub fn output_name(config: &InputConfig) -> String {
    let mut name = config
        .output_name
        .clone()
        .unwrap_or_else(|| config.name.clone());

    if name.contains("{name}") {
        name = name.replacen("{name}", &config.name, 1);
    }

    if let Some(marking) = config.marking.text() {
        if name.contains("{marking}") {
            name = name.replacen("{marking}", marking, 1);
        } else {
            name.push_str(marking);
        }
    }

    name
}

/// Directory outputs are written to
///
/// `outPath` is relative to the config's directory; an empty `outPath` means
/// that directory itself and a missing one means its parent.
pub fn dest_dir(config: &InputConfig) -> PathBuf {
    let out_path = config.out_path.as_deref().unwrap_or("..");
    normalize_path(&config.dir.join(out_path))
}

/// Plan the outputs of `sources`, the candidates of the selected variant
pub fn plan_outputs(config: InputConfig, sources: &[&Candidate]) -> BuildPlan {
    let base_name = output_name(&config);
    let dest_dir = dest_dir(&config);

    let src_dest_pairs = sources
        .iter()
        .map(|candidate| {
            let mut name = base_name.clone();
            for (i, part) in candidate.parts.iter().enumerate() {
                let token = format!("{{part{}}}", i);
                if name.contains(&token) {
                    name = name.replacen(&token, part, 1);
                }
            }
            let dest = dest_dir.join(format!("{}{}", name, candidate.extension));
            (candidate.path.clone(), dest)
        })
        .collect();

    BuildPlan {
        name: config.name.clone(),
        output_name: base_name,
        encoding: config.encoding.clone(),
        dest_dir,
        src_dest_pairs,
        config,
    }
}

/// Lexically resolve `.` and `..` components without touching the filesystem
///
/// `..` never climbs above the root of an absolute path.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            c => components.push(c),
        }
    }

    if components.is_empty() {
        PathBuf::from(".")
    } else {
        components.iter().collect()
    }
}
