//! Copying selected variant files to their destinations

use crate::error::BuildError;
use crate::log::{self, Logger};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Create `dest_dir` and copy every `(src, dest)` pair
///
/// All copies are attempted even when some fail; the input fails unless every
/// copy succeeded. Files copied before a failure are left in place.
pub async fn materialize(
    name: &str,
    dest_dir: &Path,
    src_dest_pairs: &[(PathBuf, PathBuf)],
    log: &Logger,
) -> Result<(), BuildError> {
    log.detail(format!(
        "Running mkdir (recursive) for output at {}.",
        log::path(dest_dir)
    ));
    if let Err(source) = fs::create_dir_all(dest_dir).await {
        log.detail_error(format!(
            "mkdir (recursive) for output at {} failed, reason: {}.",
            log::path(dest_dir),
            source
        ));
        return Err(BuildError::DirectoryCreate {
            name: name.to_string(),
            path: dest_dir.to_path_buf(),
            source,
        });
    }
    log.detail_success(format!(
        "mkdir (recursive) for output at {} succeeded.",
        log::path(dest_dir)
    ));

    let log = *log;
    let results = join_all(src_dest_pairs.iter().map(|(src, dest)| async move {
        log.detail(format!(
            "Running copy (file variant -> output) from {} to {}.",
            log::path(src),
            log::path(dest)
        ));
        match fs::copy(src, dest).await {
            Ok(_) => {
                log.detail_success(format!(
                    "copy from {} to {} succeeded.",
                    log::path(src),
                    log::path(dest)
                ));
                Ok(())
            }
            Err(e) => {
                log.detail_error(format!(
                    "copy from {} to {} failed, reason: {}.",
                    log::path(src),
                    log::path(dest),
                    e
                ));
                Err((src, dest, e))
            }
        }
    }))
    .await;

    let total = results.len();
    let mut failures = results.into_iter().filter_map(Result::err);
    match failures.next() {
        None => Ok(()),
        Some((src, dest, source)) => Err(BuildError::Copy {
            name: name.to_string(),
            failed: 1 + failures.count(),
            total,
            src: src.clone(),
            dest: dest.clone(),
            source,
        }),
    }
}
