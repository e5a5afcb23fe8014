//! Target orchestration engine.
//!
//! One worker per target drives either the backup lifecycle or a
//! provisioning sequence; all remote calls within a worker are strictly
//! sequential, and every failure stays scoped to its own target.

pub mod backup;
pub mod primary;
pub mod provision;
pub mod runner;
pub mod sessions;

use crate::error::TargetError;
use crate::nitro::{ApplianceSession, NitroError};
use std::collections::HashMap;

/// Look up the session of a resolved node. The factory opens one session per
/// node up front, so a miss can only mean the resolver and the session map
/// disagree about the target's node list.
pub(crate) fn session_for<'a, S: ApplianceSession>(
    sessions: &'a HashMap<String, S>,
    node: &str,
) -> Result<&'a S, TargetError> {
    sessions.get(node).ok_or_else(|| TargetError::Connection {
        node: node.to_string(),
        source: NitroError::UnexpectedResponse("no session opened for node".to_string()),
    })
}

pub(crate) fn remote_err<'a>(
    action: &'static str,
    node: &'a str,
) -> impl FnOnce(NitroError) -> TargetError + 'a {
    move |source| TargetError::Remote {
        action,
        node: node.to_string(),
        source,
    }
}
