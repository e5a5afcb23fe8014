//! Fan-out driver: one concurrent worker per target.
//!
//! All targets start simultaneously with no admission control; the driver
//! joins every worker and aggregates one outcome slot per target. Worker
//! failures never abort the process or other workers.

use crate::config::{BackupConfiguration, BackupSettings, BackupTarget};
use crate::error::TargetError;
use crate::orchestrator::backup;
use crate::orchestrator::provision::{self, SetupTarget};
use crate::orchestrator::sessions::SessionFactory;
use crate::storage;
use std::sync::Arc;
use tokio::task::JoinSet;

#[derive(Debug)]
pub struct TargetOutcome {
    pub target: String,
    pub result: Result<(), TargetError>,
}

#[derive(Debug)]
pub struct RunSummary {
    pub outcomes: Vec<TargetOutcome>,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// Run the backup lifecycle for every configured target concurrently.
pub async fn run_backup<F>(
    factory: Arc<F>,
    config: &BackupConfiguration,
) -> anyhow::Result<RunSummary>
where
    F: SessionFactory + 'static,
{
    storage::ensure_directory(&config.settings.output_base_path)?;

    let mut tasks = JoinSet::new();
    for target in config.targets.clone() {
        let factory = factory.clone();
        let settings = config.settings.clone();
        tasks.spawn(async move {
            let name = target.name.clone();
            let result = backup_worker(factory.as_ref(), &target, &settings).await;
            TargetOutcome {
                target: name,
                result,
            }
        });
    }

    Ok(join_outcomes(tasks).await)
}

async fn backup_worker<F: SessionFactory>(
    factory: &F,
    target: &BackupTarget,
    settings: &BackupSettings,
) -> Result<(), TargetError> {
    let sessions = factory
        .open(target, &target.username, &target.password)
        .await?;
    let run_id = backup::generate_run_id();
    backup::run_backup_target(&sessions, target, settings, &run_id).await
}

/// Run the install sequence for every setup target concurrently.
pub async fn run_install<F>(factory: Arc<F>, setups: Vec<SetupTarget>) -> RunSummary
where
    F: SessionFactory + 'static,
{
    let mut tasks = JoinSet::new();
    for setup in setups {
        let factory = factory.clone();
        tasks.spawn(async move {
            let name = setup.target.name.clone();
            let result = async {
                let sessions = factory
                    .open(&setup.target, &setup.admin_username, &setup.admin_password)
                    .await?;
                provision::run_install_target(&sessions, &setup).await
            }
            .await;
            TargetOutcome {
                target: name,
                result,
            }
        });
    }
    join_outcomes(tasks).await
}

/// Run the uninstall sequence for every setup target concurrently.
pub async fn run_uninstall<F>(factory: Arc<F>, setups: Vec<SetupTarget>) -> RunSummary
where
    F: SessionFactory + 'static,
{
    let mut tasks = JoinSet::new();
    for setup in setups {
        let factory = factory.clone();
        tasks.spawn(async move {
            let name = setup.target.name.clone();
            let result = async {
                let sessions = factory
                    .open(&setup.target, &setup.admin_username, &setup.admin_password)
                    .await?;
                provision::run_uninstall_target(&sessions, &setup).await
            }
            .await;
            TargetOutcome {
                target: name,
                result,
            }
        });
    }
    join_outcomes(tasks).await
}

async fn join_outcomes(mut tasks: JoinSet<TargetOutcome>) -> RunSummary {
    let mut outcomes = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => {
                match &outcome.result {
                    Ok(()) => tracing::info!("target {} completed", outcome.target),
                    Err(e) => tracing::error!("target {} failed: {e}", outcome.target),
                }
                outcomes.push(outcome);
            }
            Err(e) => tracing::error!("target worker panicked: {e}"),
        }
    }
    RunSummary { outcomes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackupLevel, BackupNode, TargetKind};
    use crate::credentials::SetupCredentials;
    use crate::nitro::testing::{MockSession, OpLog};
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    struct MockFactory {
        ops: OpLog,
        fail_download_for: HashSet<String>,
    }

    impl MockFactory {
        fn new(ops: OpLog) -> Self {
            Self {
                ops,
                fail_download_for: HashSet::new(),
            }
        }

        fn failing_download(mut self, target: &str) -> Self {
            self.fail_download_for.insert(target.to_string());
            self
        }
    }

    #[async_trait]
    impl SessionFactory for MockFactory {
        type Session = MockSession;

        async fn open(
            &self,
            target: &BackupTarget,
            _username: &str,
            _password: &str,
        ) -> Result<HashMap<String, MockSession>, TargetError> {
            Ok(target
                .nodes
                .iter()
                .map(|node| {
                    let mut session = MockSession::new(&node.name, self.ops.clone());
                    if self.fail_download_for.contains(&target.name) {
                        session = session.failing("download_file");
                    }
                    (node.name.clone(), session)
                })
                .collect())
        }
    }

    fn standalone(name: &str, node: &str) -> BackupTarget {
        BackupTarget {
            name: name.to_string(),
            kind: TargetKind::Standalone,
            level: BackupLevel::Full,
            nodes: vec![BackupNode {
                name: node.to_string(),
                address: format!("https://{node}.example.local"),
            }],
            use_ssl: true,
            validate_certificate: false,
            username: "nsbackup".to_string(),
            password: "secret".to_string(),
        }
    }

    fn configuration(tmp: &TempDir, targets: Vec<BackupTarget>) -> BackupConfiguration {
        BackupConfiguration {
            targets,
            settings: BackupSettings {
                output_base_path: tmp.path().to_path_buf(),
                folder_per_target: true,
                interval: 6,
            },
        }
    }

    fn new_log() -> OpLog {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[tokio::test]
    async fn standalone_run_produces_one_artifact_and_deletes_remote() {
        let tmp = TempDir::new().unwrap();
        let ops = new_log();
        let config = configuration(&tmp, vec![standalone("T1", "N1")]);
        let factory = Arc::new(MockFactory::new(ops.clone()));

        let summary = run_backup(factory, &config).await.unwrap();

        assert!(summary.all_succeeded());
        assert_eq!(summary.total(), 1);

        let entries: Vec<_> = std::fs::read_dir(tmp.path().join("T1"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].ends_with("_T1_N1.tgz"));

        let log = ops.lock().unwrap().clone();
        assert!(log.iter().any(|op| op.starts_with("N1:delete_backup:")));
    }

    #[tokio::test]
    async fn failure_in_one_target_does_not_stop_the_other() {
        let tmp = TempDir::new().unwrap();
        let ops = new_log();
        let config = configuration(
            &tmp,
            vec![standalone("A", "N1"), standalone("B", "N2")],
        );
        let factory = Arc::new(MockFactory::new(ops.clone()).failing_download("A"));

        let summary = run_backup(factory, &config).await.unwrap();

        assert_eq!(summary.total(), 2);
        assert_eq!(summary.failed_count(), 1);
        for outcome in &summary.outcomes {
            match outcome.target.as_str() {
                "A" => assert!(outcome.result.is_err()),
                "B" => assert!(outcome.result.is_ok()),
                other => panic!("unexpected target {other}"),
            }
        }

        // Target B still produced its artifact
        let entries: Vec<_> = std::fs::read_dir(tmp.path().join("B"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].ends_with("_B_N2.tgz"));
        assert!(!tmp.path().join("A").join(&entries[0]).exists());
    }

    #[tokio::test]
    async fn unusable_output_base_path_fails_before_spawning_workers() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("occupied");
        std::fs::write(&file, b"x").unwrap();

        let mut config = configuration(&tmp, vec![standalone("T1", "N1")]);
        config.settings.output_base_path = file;
        let ops = new_log();
        let factory = Arc::new(MockFactory::new(ops.clone()));

        assert!(run_backup(factory, &config).await.is_err());
        assert!(ops.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn install_runs_every_target_with_admin_credentials() {
        let ops = new_log();
        let factory = Arc::new(MockFactory::new(ops.clone()));
        let setups = vec![
            SetupTarget::new(
                standalone("A", "N1"),
                SetupCredentials {
                    username: "nsroot".to_string(),
                    password: "adminpw".to_string(),
                    policy_name: String::new(),
                },
            ),
            SetupTarget::new(
                standalone("B", "N2"),
                SetupCredentials {
                    username: "nsroot".to_string(),
                    password: "adminpw".to_string(),
                    policy_name: String::new(),
                },
            ),
        ];

        let summary = run_install(factory, setups).await;

        assert!(summary.all_succeeded());
        let log = ops.lock().unwrap().clone();
        assert!(log
            .iter()
            .any(|op| op == "N1:bind_cmd_policy:nsbackup:CMD_CITRIXADCBACKUP:100"));
        assert!(log
            .iter()
            .any(|op| op == "N2:bind_cmd_policy:nsbackup:CMD_CITRIXADCBACKUP:100"));
        assert_eq!(log.iter().filter(|op| op.contains("save_config")).count(), 2);
    }
}
