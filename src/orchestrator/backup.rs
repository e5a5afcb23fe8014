//! Backup lifecycle orchestration for one target.
//!
//! Sequence per target-run: resolve the primary, create one system backup on
//! it, then for every node in order download the artifact, persist it
//! locally, and delete the remote copy. A persist failure deliberately leaves
//! the remote copy in place.

use crate::config::{BackupSettings, BackupTarget};
use crate::error::TargetError;
use crate::nitro::ApplianceSession;
use crate::orchestrator::{primary::resolve_primary, remote_err, session_for};
use crate::storage;
use std::collections::HashMap;

/// Timestamp identifying one logical backup run, shared by every node
/// artifact of the target.
pub fn generate_run_id() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

pub async fn run_backup_target<S: ApplianceSession>(
    sessions: &HashMap<String, S>,
    target: &BackupTarget,
    settings: &BackupSettings,
    run_id: &str,
) -> Result<(), TargetError> {
    let primary = resolve_primary(sessions, target).await?;

    tracing::info!(
        node = %primary.name,
        run_id,
        level = %target.level,
        "creating system backup for {}",
        target.name
    );
    session_for(sessions, &primary.name)?
        .create_backup(run_id, target.level)
        .await
        .map_err(remote_err("create backup", &primary.name))?;

    let remote_name = format!("{run_id}.tgz");
    for node in &target.nodes {
        let session = session_for(sessions, &node.name)?;

        tracing::info!(node = %node.name, "downloading {remote_name} from {}", target.name);
        let encoded = session
            .download_file(&remote_name)
            .await
            .map_err(remote_err("download backup", &node.name))?;

        let path = storage::persist(settings, &target.name, &node.name, run_id, &encoded)?;
        tracing::info!(node = %node.name, "wrote {}", path.display());

        session
            .delete_backup(&remote_name)
            .await
            .map_err(remote_err("delete remote backup", &node.name))?;
    }

    Ok(())
}
