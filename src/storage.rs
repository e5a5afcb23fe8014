//! Local persistence of backup artifacts.
//!
//! Decodes the base64 payloads retrieved from the appliances and writes them
//! under the configured output base path with deterministic names, so one
//! logical backup run is correlatable across all nodes of a target.

use crate::config::BackupSettings;
use crate::error::TargetError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::io;
use std::path::{Path, PathBuf};

/// Deterministic artifact name: `{runId}_{target}_{node}.tgz`.
pub fn backup_filename(run_id: &str, target: &str, node: &str) -> String {
    format!("{run_id}_{target}_{node}.tgz")
}

/// Create `path` if missing. Idempotent on an existing directory; fails when
/// the path exists as anything else.
pub fn ensure_directory(path: &Path) -> Result<(), TargetError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(TargetError::Filesystem {
            path: path.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::AlreadyExists,
                "path exists and is not a directory",
            ),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            std::fs::create_dir_all(path).map_err(|source| TargetError::Filesystem {
                path: path.to_path_buf(),
                source,
            })
        }
        Err(source) => Err(TargetError::Filesystem {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Decode one node's backup payload and write it to disk, creating the
/// per-target subdirectory on demand. Returns the written path.
pub fn persist(
    settings: &BackupSettings,
    target: &str,
    node: &str,
    run_id: &str,
    encoded: &str,
) -> Result<PathBuf, TargetError> {
    let dir = if settings.folder_per_target {
        settings.output_base_path.join(target)
    } else {
        settings.output_base_path.clone()
    };
    ensure_directory(&dir)?;

    // Appliances may wrap the base64 content in whitespace
    let cleaned: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(cleaned)
        .map_err(|source| TargetError::Decode {
            node: node.to_string(),
            source,
        })?;

    let path = dir.join(backup_filename(run_id, target, node));
    std::fs::write(&path, &bytes).map_err(|source| TargetError::Filesystem {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
