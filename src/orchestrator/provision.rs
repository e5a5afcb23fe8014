//! Provisioning of the least-privilege backup account.
//!
//! Install binds a fixed backup command allow-list to the target's configured
//! backup account; uninstall removes the account and policy again. Both
//! sequences run against the primary node only and are fail-fast.

use crate::config::BackupTarget;
use crate::credentials::SetupCredentials;
use crate::error::TargetError;
use crate::nitro::resources::{cmd_policy_spec, CMD_POLICY_BIND_PRIORITY, DEFAULT_CMD_POLICY_NAME};
use crate::nitro::ApplianceSession;
use crate::orchestrator::{primary::resolve_primary, remote_err, session_for};
use std::collections::HashMap;

/// A target plus the provisioning-run inputs: the administrative credentials
/// used to open the sessions and the command-policy name to manage.
#[derive(Debug, Clone)]
pub struct SetupTarget {
    pub target: BackupTarget,
    pub admin_username: String,
    pub admin_password: String,
    pub policy_name: String,
}

impl SetupTarget {
    pub fn new(target: BackupTarget, credentials: SetupCredentials) -> Self {
        let policy_name = if credentials.policy_name.trim().is_empty() {
            DEFAULT_CMD_POLICY_NAME.to_string()
        } else {
            credentials.policy_name
        };
        Self {
            target,
            admin_username: credentials.username,
            admin_password: credentials.password,
            policy_name,
        }
    }
}

pub async fn run_install_target<S: ApplianceSession>(
    sessions: &HashMap<String, S>,
    setup: &SetupTarget,
) -> Result<(), TargetError> {
    let target = &setup.target;
    let primary = resolve_primary(sessions, target).await?;
    let session = session_for(sessions, &primary.name)?;

    tracing::info!(
        node = %primary.name,
        policy = %setup.policy_name,
        user = %target.username,
        "installing backup account on {}",
        target.name
    );

    session
        .create_cmd_policy(&setup.policy_name, &cmd_policy_spec())
        .await
        .map_err(remote_err("create command policy", &primary.name))?;
    session
        .create_user(&target.username, &target.password)
        .await
        .map_err(remote_err("create user", &primary.name))?;
    session
        .bind_cmd_policy(&target.username, &setup.policy_name, CMD_POLICY_BIND_PRIORITY)
        .await
        .map_err(remote_err("bind command policy", &primary.name))?;
    session
        .save_config()
        .await
        .map_err(remote_err("save configuration", &primary.name))?;

    Ok(())
}

pub async fn run_uninstall_target<S: ApplianceSession>(
    sessions: &HashMap<String, S>,
    setup: &SetupTarget,
) -> Result<(), TargetError> {
    let target = &setup.target;
    let primary = resolve_primary(sessions, target).await?;
    let session = session_for(sessions, &primary.name)?;

    tracing::info!(
        node = %primary.name,
        policy = %setup.policy_name,
        user = %target.username,
        "removing backup account from {}",
        target.name
    );

    session
        .delete_user(&target.username)
        .await
        .map_err(remote_err("delete user", &primary.name))?;
    session
        .delete_cmd_policy(&setup.policy_name)
        .await
        .map_err(remote_err("delete command policy", &primary.name))?;
    session
        .save_config()
        .await
        .map_err(remote_err("save configuration", &primary.name))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackupLevel, BackupNode, TargetKind};
    use crate::nitro::testing::{MockSession, OpLog};
    use std::sync::{Arc, Mutex};

    fn standalone_target() -> BackupTarget {
        BackupTarget {
            name: "T1".to_string(),
            kind: TargetKind::Standalone,
            level: BackupLevel::Full,
            nodes: vec![BackupNode {
                name: "N1".to_string(),
                address: "https://n1.example.local".to_string(),
            }],
            use_ssl: true,
            validate_certificate: false,
            username: "nsbackup".to_string(),
            password: "secret".to_string(),
        }
    }

    fn setup(policy_name: &str) -> SetupTarget {
        SetupTarget::new(
            standalone_target(),
            SetupCredentials {
                username: "nsroot".to_string(),
                password: "adminpw".to_string(),
                policy_name: policy_name.to_string(),
            },
        )
    }

    fn new_log() -> OpLog {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn empty_policy_name_falls_back_to_default() {
        let setup = setup("");
        assert_eq!(setup.policy_name, "CMD_CITRIXADCBACKUP");
        assert_eq!(setup.admin_username, "nsroot");
    }

    #[tokio::test]
    async fn install_runs_policy_user_binding_save_in_order() {
        let ops = new_log();
        let sessions =
            HashMap::from([("N1".to_string(), MockSession::new("N1", ops.clone()))]);
        let setup = setup("");

        run_install_target(&sessions, &setup).await.unwrap();

        let log = ops.lock().unwrap().clone();
        assert_eq!(
            log,
            vec![
                "N1:create_cmd_policy:CMD_CITRIXADCBACKUP".to_string(),
                "N1:create_user:nsbackup".to_string(),
                "N1:bind_cmd_policy:nsbackup:CMD_CITRIXADCBACKUP:100".to_string(),
                "N1:save_config".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn install_aborts_sequence_on_user_creation_failure() {
        let ops = new_log();
        let sessions = HashMap::from([(
            "N1".to_string(),
            MockSession::new("N1", ops.clone()).failing("create_user"),
        )]);
        let setup = setup("CUSTOM_POLICY");

        let result = run_install_target(&sessions, &setup).await;

        assert!(matches!(
            result,
            Err(TargetError::Remote { action: "create user", .. })
        ));
        let log = ops.lock().unwrap().clone();
        assert!(!log.iter().any(|op| op.contains("bind_cmd_policy")));
        assert!(!log.iter().any(|op| op.contains("save_config")));
    }

    #[tokio::test]
    async fn uninstall_removes_user_then_policy_then_saves() {
        let ops = new_log();
        let sessions =
            HashMap::from([("N1".to_string(), MockSession::new("N1", ops.clone()))]);
        let setup = setup("CUSTOM_POLICY");

        run_uninstall_target(&sessions, &setup).await.unwrap();

        let log = ops.lock().unwrap().clone();
        assert_eq!(
            log,
            vec![
                "N1:delete_user:nsbackup".to_string(),
                "N1:delete_cmd_policy:CUSTOM_POLICY".to_string(),
                "N1:save_config".to_string(),
            ]
        );
    }
}
