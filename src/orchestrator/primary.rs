//! Primary node resolution.

use crate::config::{BackupNode, BackupTarget, TargetKind};
use crate::error::TargetError;
use crate::nitro::ApplianceSession;
use std::collections::HashMap;

/// Determine the node authoritative for write operations on a target.
///
/// Standalone targets resolve to their single node without any network call.
/// For HA pairs each node's HA state is queried in list order; the first node
/// reporting `Primary` wins. A node whose query fails is skipped, but if no
/// node ever reports `Primary` the resolution fails explicitly rather than
/// returning a made-up node.
pub async fn resolve_primary<S: ApplianceSession>(
    sessions: &HashMap<String, S>,
    target: &BackupTarget,
) -> Result<BackupNode, TargetError> {
    if target.kind == TargetKind::Standalone {
        return Ok(target.nodes[0].clone());
    }

    tracing::info!("detecting primary node for {}", target.name);
    for node in &target.nodes {
        let session = super::session_for(sessions, &node.name)?;
        match session.ha_node_state().await {
            Ok(state) if state == "Primary" => {
                tracing::info!(node = %node.name, "primary node found for {}", target.name);
                return Ok(node.clone());
            }
            Ok(state) => {
                tracing::debug!(node = %node.name, state, "not primary");
            }
            Err(e) => {
                tracing::warn!(
                    node = %node.name,
                    "HA state query failed, skipping node: {e}"
                );
            }
        }
    }

    Err(TargetError::PrimaryResolution {
        target: target.name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackupLevel;
    use crate::nitro::testing::{MockSession, OpLog};
    use std::sync::{Arc, Mutex};

    fn target(name: &str, kind: TargetKind, nodes: &[&str]) -> BackupTarget {
        BackupTarget {
            name: name.to_string(),
            kind,
            level: BackupLevel::Full,
            nodes: nodes
                .iter()
                .map(|n| BackupNode {
                    name: n.to_string(),
                    address: format!("https://{n}.example.local"),
                })
                .collect(),
            use_ssl: true,
            validate_certificate: false,
            username: "nsbackup".to_string(),
            password: "secret".to_string(),
        }
    }

    fn new_log() -> OpLog {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[tokio::test]
    async fn standalone_resolves_first_node_without_network_calls() {
        let ops = new_log();
        let target = target("T1", TargetKind::Standalone, &["N1"]);
        let sessions =
            HashMap::from([("N1".to_string(), MockSession::new("N1", ops.clone()))]);

        let primary = resolve_primary(&sessions, &target).await.unwrap();

        assert_eq!(primary.name, "N1");
        assert!(ops.lock().unwrap().is_empty(), "no remote calls expected");
    }

    #[tokio::test]
    async fn ha_pair_resolves_node_reporting_primary() {
        let ops = new_log();
        let target = target("HA", TargetKind::HaPair, &["N1", "N2"]);
        let sessions = HashMap::from([
            (
                "N1".to_string(),
                MockSession::new("N1", ops.clone()).with_ha_state(Some("Secondary")),
            ),
            ("N2".to_string(), MockSession::new("N2", ops.clone())),
        ]);

        let primary = resolve_primary(&sessions, &target).await.unwrap();
        assert_eq!(primary.name, "N2");
    }

    #[tokio::test]
    async fn ha_pair_skips_nodes_with_failing_state_query() {
        let ops = new_log();
        let target = target("HA", TargetKind::HaPair, &["N1", "N2"]);
        let sessions = HashMap::from([
            (
                "N1".to_string(),
                MockSession::new("N1", ops.clone()).with_ha_state(None),
            ),
            ("N2".to_string(), MockSession::new("N2", ops.clone())),
        ]);

        let primary = resolve_primary(&sessions, &target).await.unwrap();
        assert_eq!(primary.name, "N2");
    }

    #[tokio::test]
    async fn ha_pair_without_primary_fails_explicitly() {
        let ops = new_log();
        let target = target("HA", TargetKind::HaPair, &["N1", "N2"]);
        let sessions = HashMap::from([
            (
                "N1".to_string(),
                MockSession::new("N1", ops.clone()).with_ha_state(Some("Secondary")),
            ),
            (
                "N2".to_string(),
                MockSession::new("N2", ops.clone()).with_ha_state(None),
            ),
        ]);

        match resolve_primary(&sessions, &target).await {
            Err(TargetError::PrimaryResolution { target }) => assert_eq!(target, "HA"),
            other => panic!("expected resolution failure, got {other:?}"),
        }
    }
}
