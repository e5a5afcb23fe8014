//! Session factory: one authenticated session per node of a target.

use crate::config::BackupTarget;
use crate::error::TargetError;
use crate::nitro::{ApplianceSession, NitroClient};
use async_trait::async_trait;
use std::collections::HashMap;

/// Opens the sessions a worker needs to drive one target.
///
/// Establishment is eager and fail-fast: every node is authenticated before
/// any orchestration step runs, and a single unreachable node abandons the
/// whole target.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: ApplianceSession + 'static;

    async fn open(
        &self,
        target: &BackupTarget,
        username: &str,
        password: &str,
    ) -> Result<HashMap<String, Self::Session>, TargetError>;
}

pub struct NitroSessionFactory;

#[async_trait]
impl SessionFactory for NitroSessionFactory {
    type Session = NitroClient;

    async fn open(
        &self,
        target: &BackupTarget,
        username: &str,
        password: &str,
    ) -> Result<HashMap<String, NitroClient>, TargetError> {
        let mut sessions = HashMap::with_capacity(target.nodes.len());
        for node in &target.nodes {
            let client = NitroClient::connect(
                &node.base_url(target.use_ssl),
                username,
                password,
                target.validate_certificate,
            )
            .await
            .map_err(|source| TargetError::Connection {
                node: node.name.clone(),
                source,
            })?;
            sessions.insert(node.name.clone(), client);
        }
        Ok(sessions)
    }
}
