//! Appliance management API surface.
//!
//! The orchestration core talks to appliances exclusively through the
//! [`ApplianceSession`] trait, one session per node. The production
//! implementation is [`NitroClient`]; tests substitute a scripted mock.

pub mod client;
pub mod resources;

pub use client::NitroClient;

use crate::config::BackupLevel;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NitroError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The appliance rejected the request.
    #[error("appliance error {errorcode}: {message}")]
    Api { errorcode: i64, message: String },

    #[error("unexpected appliance response: {0}")]
    UnexpectedResponse(String),
}

/// One authenticated session against one appliance node.
///
/// Every method maps to a single remote call, attempted exactly once; no
/// retries happen at this layer.
#[async_trait]
pub trait ApplianceSession: Send + Sync {
    /// Read the HA state of the well-known node object `0`.
    async fn ha_node_state(&self) -> Result<String, NitroError>;

    /// Create a system backup named `name` (no extension) at the given level.
    async fn create_backup(&self, name: &str, level: BackupLevel) -> Result<(), NitroError>;

    /// Fetch the base64-encoded content of a file in the backup storage
    /// directory.
    async fn download_file(&self, name: &str) -> Result<String, NitroError>;

    /// Remove a system backup file from the appliance.
    async fn delete_backup(&self, name: &str) -> Result<(), NitroError>;

    async fn create_cmd_policy(&self, name: &str, cmdspec: &str) -> Result<(), NitroError>;

    async fn create_user(&self, username: &str, password: &str) -> Result<(), NitroError>;

    async fn bind_cmd_policy(
        &self,
        username: &str,
        policy: &str,
        priority: u32,
    ) -> Result<(), NitroError>;

    async fn delete_user(&self, username: &str) -> Result<(), NitroError>;

    async fn delete_cmd_policy(&self, name: &str) -> Result<(), NitroError>;

    /// Persist the running configuration.
    async fn save_config(&self) -> Result<(), NitroError>;
}
