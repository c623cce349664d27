//! Role change events and their audit log rendering

use crate::role::RoleScope;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Actor recorded when the caller cannot identify who made a change.
pub const UNKNOWN_ACTOR: &str = "UNKNOWN";

/// Timestamp layout of audit log lines, e.g. `2024-03-05 00:00:00 +05:30`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";

/// What changed about a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeKind {
    RoleCreated {
        pattern: String,
        permissions: BTreeSet<String>,
    },
    RoleDeleted,
    PermissionAdded {
        permission: String,
    },
    PermissionRemoved {
        permission: String,
    },
    PrincipalAdded {
        sid: String,
    },
    PrincipalRemoved {
        sid: String,
    },
    PatternChanged {
        from: String,
        to: String,
    },
}

/// A single detected role change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub scope: RoleScope,
    pub role_name: String,
    pub kind: ChangeKind,
    /// Never empty; see [`UNKNOWN_ACTOR`]
    pub actor: String,
    pub timestamp: DateTime<FixedOffset>,
}

impl ChangeEvent {
    /// Create an event, substituting [`UNKNOWN_ACTOR`] for a missing or blank actor.
    pub fn new(
        scope: RoleScope,
        role_name: impl Into<String>,
        kind: ChangeKind,
        actor: Option<&str>,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            scope,
            role_name: role_name.into(),
            kind,
            actor: normalize_actor(actor),
            timestamp,
        }
    }

    /// Sentences describing this event, without timestamps.
    ///
    /// Role creation yields a creation sentence followed by a details
    /// sentence; every other change yields one sentence.
    pub fn sentences(&self) -> Vec<String> {
        let scope = self.scope.label();
        let role = &self.role_name;
        let actor = &self.actor;

        match &self.kind {
            ChangeKind::RoleCreated {
                pattern,
                permissions,
            } => vec![
                format!("New {} role created: '{}' by '{}'", scope, role, actor),
                format!(
                    "{} role details: '{}' | pattern: '{}' | permissions: [{}]",
                    scope,
                    role,
                    pattern,
                    permissions.iter().cloned().collect::<Vec<_>>().join(", ")
                ),
            ],
            ChangeKind::RoleDeleted => {
                vec![format!("{} role deleted: '{}' by '{}'", scope, role, actor)]
            }
            ChangeKind::PermissionAdded { permission } => vec![format!(
                "Permission '{}' added to {} role '{}' by '{}'",
                permission, scope, role, actor
            )],
            ChangeKind::PermissionRemoved { permission } => vec![format!(
                "Permission '{}' removed from {} role '{}' by '{}'",
                permission, scope, role, actor
            )],
            ChangeKind::PrincipalAdded { sid } => vec![format!(
                "SID '{}' added to {} role '{}' by '{}'",
                sid, scope, role, actor
            )],
            ChangeKind::PrincipalRemoved { sid } => vec![format!(
                "SID '{}' removed from {} role '{}' by '{}'",
                sid, scope, role, actor
            )],
            ChangeKind::PatternChanged { from, to } => vec![format!(
                "Pattern changed for {} role '{}' from '{}' to '{}' by '{}'",
                scope, role, from, to, actor
            )],
        }
    }

    /// Complete audit log lines, `[<timestamp>] <sentence>`, without newlines.
    pub fn render(&self) -> Vec<String> {
        let stamp = self.timestamp.format(TIMESTAMP_FORMAT);
        self.sentences()
            .into_iter()
            .map(|sentence| format!("[{}] {}", stamp, sentence))
            .collect()
    }
}

/// Render a batch of events into log lines, in order.
pub fn render_events(events: &[ChangeEvent]) -> Vec<String> {
    events.iter().flat_map(ChangeEvent::render).collect()
}

fn normalize_actor(actor: Option<&str>) -> String {
    match actor.map(str::trim) {
        Some(actor) if !actor.is_empty() => actor.to_string(),
        _ => UNKNOWN_ACTOR.to_string(),
    }
}
