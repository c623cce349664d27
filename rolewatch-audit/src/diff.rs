//! Role diff engine

use crate::event::{ChangeEvent, ChangeKind};
use crate::role::{RoleInfo, RoleMap, RoleScope};
use chrono::{DateTime, FixedOffset};

/// Compute the changes that turn `old` into `new`.
///
/// Scopes are reported global first, then project. Within a scope the
/// order is: created roles, deleted roles, then field changes of roles
/// present on both sides (permissions added, permissions removed, SIDs
/// added, SIDs removed, pattern). Each group is in role name order and set
/// elements are in lexicographic order, so the output is deterministic.
///
/// # Examples
///
/// ```
/// use chrono::Local;
/// use rolewatch_audit::{RoleInfo, RoleMap, diff};
///
/// let mut old = RoleMap::new();
/// old.insert("globalRoles", RoleInfo::new("admin", "").permission("read"));
///
/// let mut new = RoleMap::new();
/// new.insert("globalRoles", RoleInfo::new("admin", "").permission("read").permission("deploy"));
///
/// let events = diff(&old, &new, Some("alice"), Local::now().fixed_offset());
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].sentences()[0], "Permission 'deploy' added to global role 'admin' by 'alice'");
/// ```
pub fn diff(
    old: &RoleMap,
    new: &RoleMap,
    actor: Option<&str>,
    now: DateTime<FixedOffset>,
) -> Vec<ChangeEvent> {
    let mut events = Vec::new();

    for scope in RoleScope::ALL {
        let before = old.scope(scope);
        let after = new.scope(scope);
        let event = |role: &str, kind: ChangeKind| ChangeEvent::new(scope, role, kind, actor, now);

        for (name, role) in after.iter().filter(|(name, _)| !before.contains_key(*name)) {
            events.push(event(
                name,
                ChangeKind::RoleCreated {
                    pattern: role.pattern.clone(),
                    permissions: role.permissions.clone(),
                },
            ));
        }

        for name in before.keys().filter(|name| !after.contains_key(*name)) {
            events.push(event(name, ChangeKind::RoleDeleted));
        }

        for (name, old_role) in before {
            if let Some(new_role) = after.get(name) {
                events.extend(
                    field_changes(old_role, new_role)
                        .into_iter()
                        .map(|kind| event(name, kind)),
                );
            }
        }
    }

    events
}

fn field_changes(old: &RoleInfo, new: &RoleInfo) -> Vec<ChangeKind> {
    let mut changes = Vec::new();

    changes.extend(
        new.permissions
            .difference(&old.permissions)
            .map(|p| ChangeKind::PermissionAdded {
                permission: p.clone(),
            }),
    );
    changes.extend(
        old.permissions
            .difference(&new.permissions)
            .map(|p| ChangeKind::PermissionRemoved {
                permission: p.clone(),
            }),
    );
    changes.extend(
        new.principals
            .difference(&old.principals)
            .map(|s| ChangeKind::PrincipalAdded { sid: s.clone() }),
    );
    changes.extend(
        old.principals
            .difference(&new.principals)
            .map(|s| ChangeKind::PrincipalRemoved { sid: s.clone() }),
    );

    if old.pattern != new.pattern {
        changes.push(ChangeKind::PatternChanged {
            from: old.pattern.clone(),
            to: new.pattern.clone(),
        });
    }

    changes
}
