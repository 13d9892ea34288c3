//! Idempotent zip extraction.
//!
//! Corpus inputs, truths, and embedding sidecars all ship as zip archives that
//! are extracted next to themselves exactly once. An existing target directory
//! means a previous extraction already happened and the archive is left alone.

use std::fs::File;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{DatasetError, DatasetResult};

/// Extract `archive_path` into `target_dir`, creating it and any parents.
///
/// A no-op if `target_dir` already exists, whatever its contents. The archive
/// must be a well-formed zip; anything else fails with
/// [`DatasetError::InvalidArchive`].
pub fn extract_zip(archive_path: &Path, target_dir: &Path) -> DatasetResult<()> {
    if target_dir.exists() {
        debug!(
            target = %target_dir.display(),
            "extraction target already exists, skipping"
        );
        return Ok(());
    }

    let file = File::open(archive_path).map_err(|e| DatasetError::Io {
        path: archive_path.to_path_buf(),
        source: e,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| DatasetError::InvalidArchive {
        path: archive_path.to_path_buf(),
        reason: e.to_string(),
    })?;

    std::fs::create_dir_all(target_dir).map_err(|e| DatasetError::Io {
        path: target_dir.to_path_buf(),
        source: e,
    })?;
    archive
        .extract(target_dir)
        .map_err(|e| DatasetError::InvalidArchive {
            path: archive_path.to_path_buf(),
            reason: e.to_string(),
        })?;

    info!(
        archive = %archive_path.display(),
        target = %target_dir.display(),
        entries = archive.len(),
        "extracted archive"
    );
    Ok(())
}
