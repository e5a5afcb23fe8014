//! Citrix ADC Backup Utility
//!
//! Orchestrates system backups and backup-account provisioning across a fleet
//! of Citrix ADC appliances (standalone or HA pairs) over the NITRO REST API.

pub mod config;
pub mod credentials;
pub mod error;
pub mod nitro;
pub mod orchestrator;
pub mod storage;

// Re-export commonly used types
pub use config::{
    BackupConfiguration, BackupLevel, BackupNode, BackupSettings, BackupTarget, TargetKind,
};
pub use error::TargetError;
pub type Result<T> = std::result::Result<T, TargetError>;
