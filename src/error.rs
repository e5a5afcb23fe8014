//! Target-scoped error types.
//!
//! Every failure in the orchestration core is attributed to exactly one
//! target and absorbed by that target's worker; nothing here may abort the
//! whole process.

use crate::nitro::NitroError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TargetError {
    /// Session establishment failed for at least one node of the target.
    #[error("could not open a session to node '{node}': {source}")]
    Connection {
        node: String,
        #[source]
        source: NitroError,
    },

    /// No node of an HA pair could be determined as primary.
    #[error("no primary node found for target '{target}'")]
    PrimaryResolution { target: String },

    /// A remote side-effecting call failed.
    #[error("{action} failed on node '{node}': {source}")]
    Remote {
        action: &'static str,
        node: String,
        #[source]
        source: NitroError,
    },

    /// Directory creation or file write failed.
    #[error("filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The downloaded backup payload could not be base64-decoded.
    #[error("backup payload from node '{node}' is not valid base64: {source}")]
    Decode {
        node: String,
        #[source]
        source: base64::DecodeError,
    },
}
