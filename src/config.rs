//! Configuration model for backup runs.
//!
//! Loaded once per run from a YAML file and treated as immutable afterwards.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfiguration {
    pub targets: Vec<BackupTarget>,
    pub settings: BackupSettings,
}

/// One logical backup unit: a standalone appliance or an HA pair sharing a
/// single configuration entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupTarget {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: TargetKind,

    /// Backup fullness level passed to the appliance.
    #[serde(default)]
    pub level: BackupLevel,

    pub nodes: Vec<BackupNode>,

    /// Scheme applied to node addresses that do not carry one.
    #[serde(default)]
    pub use_ssl: bool,

    #[serde(default)]
    pub validate_certificate: bool,

    /// Credentials of the dedicated backup account on the appliance. During
    /// `install`/`uninstall` this is the account being provisioned.
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Standalone,
    HaPair,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupLevel {
    #[default]
    Full,
    Basic,
}

impl fmt::Display for BackupLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupLevel::Full => write!(f, "full"),
            BackupLevel::Basic => write!(f, "basic"),
        }
    }
}

/// One appliance endpoint belonging to a target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupNode {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupSettings {
    pub output_base_path: PathBuf,

    /// Write artifacts into one subdirectory per target.
    #[serde(default)]
    pub folder_per_target: bool,

    /// Scheduling interval in hours, consumed by the external scheduler
    /// registration, not by the orchestration core.
    #[serde(default = "default_interval")]
    pub interval: u32,
}

fn default_interval() -> u32 {
    6
}

impl BackupConfiguration {
    /// Load and validate a configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration file {}", path.display()))?;
        let config: BackupConfiguration = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing configuration file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();
        for target in &self.targets {
            if !seen.insert(target.name.as_str()) {
                bail!("duplicate target name '{}'", target.name);
            }
            if target.nodes.is_empty() {
                bail!("target '{}' has no nodes", target.name);
            }
            if target.kind == TargetKind::Standalone && target.nodes.len() != 1 {
                bail!(
                    "standalone target '{}' must have exactly one node, found {}",
                    target.name,
                    target.nodes.len()
                );
            }
            let mut node_names = HashSet::new();
            for node in &target.nodes {
                if !node_names.insert(node.name.as_str()) {
                    bail!(
                        "duplicate node name '{}' in target '{}'",
                        node.name,
                        target.name
                    );
                }
            }
        }
        Ok(())
    }
}

impl BackupNode {
    /// Base URL for the node, applying the target's scheme preference when
    /// the configured address carries none.
    pub fn base_url(&self, use_ssl: bool) -> String {
        if self.address.contains("://") {
            self.address.trim_end_matches('/').to_string()
        } else if use_ssl {
            format!("https://{}", self.address)
        } else {
            format!("http://{}", self.address)
        }
    }
}
