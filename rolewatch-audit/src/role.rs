//! Normalized role model

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Which role map a role belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleScope {
    /// Roles granted across the whole server
    Global,
    /// Roles granted on items matching a pattern
    Project,
}

impl RoleScope {
    /// Scopes in the order changes are reported.
    pub const ALL: [RoleScope; 2] = [RoleScope::Global, RoleScope::Project];

    /// `type` attribute value of the matching `roleMap` element
    pub fn type_key(&self) -> &'static str {
        match self {
            RoleScope::Global => "globalRoles",
            RoleScope::Project => "projectRoles",
        }
    }

    /// Label used in audit sentences
    pub fn label(&self) -> &'static str {
        match self {
            RoleScope::Global => "global",
            RoleScope::Project => "project",
        }
    }

    /// Scope for a `roleMap` type key, if tracked
    pub fn from_type_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|scope| scope.type_key() == key)
    }
}

impl fmt::Display for RoleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One role as declared in the configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleInfo {
    pub name: String,
    /// Item pattern; empty means no restriction
    pub pattern: String,
    pub permissions: BTreeSet<String>,
    /// Users and groups assigned to the role
    pub principals: BTreeSet<String>,
}

impl RoleInfo {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            ..Default::default()
        }
    }

    /// Add a permission.
    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    /// Add a principal.
    pub fn principal(mut self, sid: impl Into<String>) -> Self {
        self.principals.insert(sid.into());
        self
    }
}

/// Roles grouped by `roleMap` type key, then by role name.
///
/// Keys are kept as found, including untracked role types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMap {
    groups: BTreeMap<String, BTreeMap<String, RoleInfo>>,
}

impl RoleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a role into the group `type_key`, replacing a same-named role.
    pub fn insert(&mut self, type_key: impl Into<String>, role: RoleInfo) {
        self.groups
            .entry(type_key.into())
            .or_default()
            .insert(role.name.clone(), role);
    }

    /// Replace a whole group.
    pub fn insert_group(&mut self, type_key: impl Into<String>, roles: BTreeMap<String, RoleInfo>) {
        self.groups.insert(type_key.into(), roles);
    }

    /// Roles of `type_key`, if the group exists.
    pub fn group(&self, type_key: &str) -> Option<&BTreeMap<String, RoleInfo>> {
        self.groups.get(type_key)
    }

    /// Roles of a tracked scope, or an empty mapping.
    pub fn scope(&self, scope: RoleScope) -> &BTreeMap<String, RoleInfo> {
        static EMPTY: BTreeMap<String, RoleInfo> = BTreeMap::new();
        self.groups.get(scope.type_key()).unwrap_or(&EMPTY)
    }

    /// Look up one role.
    pub fn role(&self, scope: RoleScope, name: &str) -> Option<&RoleInfo> {
        self.scope(scope).get(name)
    }

    /// Group type keys in order.
    pub fn type_keys(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Total number of roles across all groups.
    pub fn role_count(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.role_count() == 0
    }
}
