//! NITRO request payloads and fixed provisioning constants.

use serde::Serialize;

/// Policy name used when the operator supplies none during install.
pub const DEFAULT_CMD_POLICY_NAME: &str = "CMD_CITRIXADCBACKUP";

/// Server-side directory where the appliance stores system backups.
pub const BACKUP_FILE_LOCATION: &str = "/var/ns_sys_backup";

/// Identifier of the local HA state object on every appliance.
pub const HA_NODE_ID: &str = "0";

pub const CMD_POLICY_BIND_PRIORITY: u32 = 100;

const CMD_POLICY_HA_NODE_GET: &str = r"(^show\s+ha\s+node\s+0)";
const CMD_POLICY_BACKUP_GET: &str = r"(^show\s+system\s+backup\s+\d{8}_\d{6})";
const CMD_POLICY_BACKUP_CREATE: &str = r"(^create\s+system\s+backup\s+\d{8}_\d{6})";
const CMD_POLICY_BACKUP_DELETE: &str = r"(^rm\s+system\s+backup\s+\d{8}_\d{6}\.tgz)";
const CMD_POLICY_FILE_DOWNLOAD: &str =
    r#"(^show\s+system\s+file\s+\d{8}_\d{6}\.tgz\s+-fileLocation\s+"/var/ns_sys_backup")"#;

/// Command allow-list for the backup account: HA state read, backup
/// list/create/delete, and file download restricted to the backup storage
/// directory. Nothing broader.
pub fn cmd_policy_spec() -> String {
    [
        CMD_POLICY_HA_NODE_GET,
        CMD_POLICY_BACKUP_GET,
        CMD_POLICY_BACKUP_CREATE,
        CMD_POLICY_BACKUP_DELETE,
        CMD_POLICY_FILE_DOWNLOAD,
    ]
    .join("|")
}

#[derive(Debug, Serialize)]
pub struct SystemBackupCreate<'a> {
    pub filename: &'a str,
    pub level: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SystemCmdPolicy<'a> {
    pub policyname: &'a str,
    pub action: &'a str,
    pub cmdspec: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SystemUser<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub externalauth: &'a str,
    pub timeout: u32,
}

#[derive(Debug, Serialize)]
pub struct SystemCmdPolicyBinding<'a> {
    pub username: &'a str,
    pub policyname: &'a str,
    pub priority: u32,
}
