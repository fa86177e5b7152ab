//! Role hierarchy and role → permission table.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};

use crate::permissions::{self, Permission};
use crate::roles::{Role, RoleSet};

static STANDARD: LazyLock<Arc<RbacPolicy>> = LazyLock::new(|| Arc::new(RbacPolicy::standard()));

/// RBAC policy: which roles a role implies and which permissions it grants.
///
/// The hierarchy closure is computed once at construction; lookups afterwards
/// are constant-time. Built once and shared (`Arc`) by every ability.
#[derive(Debug, Clone)]
pub struct RbacPolicy {
    /// Reflexive, transitive closure indexed by [`Role::index`].
    closure: [RoleSet; Role::COUNT],
    grants: HashMap<Role, HashSet<Permission>>,
}

impl RbacPolicy {
    /// The application's built-in policy.
    pub fn standard() -> Self {
        use permissions::*;

        Self::builder()
            .implies(Role::Admin, Role::Manager)
            .implies(Role::Manager, Role::User)
            .grant(Role::Admin, ALL)
            .grant(
                Role::Manager,
                [
                    DASHBOARD_READ,
                    INVENTORY_READ,
                    INVENTORY_WRITE,
                    USERS_READ,
                    DEPARTMENTS_READ,
                    DEPARTMENTS_WRITE,
                    APPROVAL_SEQUENCE_READ,
                    APPROVAL_SEQUENCE_WRITE,
                ],
            )
            .grant(Role::User, [DASHBOARD_READ, INVENTORY_READ])
            .build()
    }

    /// Process-wide handle to [`RbacPolicy::standard`].
    pub fn shared() -> Arc<RbacPolicy> {
        Arc::clone(&STANDARD)
    }

    pub fn builder() -> RbacPolicyBuilder {
        RbacPolicyBuilder::default()
    }

    /// Every role `role` implies, itself included.
    pub fn implied_roles(&self, role: Role) -> RoleSet {
        self.closure[role.index()]
    }

    pub fn implies(&self, role: Role, other: Role) -> bool {
        self.implied_roles(role).contains(other)
    }

    /// Whether `role`'s own table entry holds `permission`.
    ///
    /// A role without an entry grants nothing.
    pub fn grants(&self, role: Role, permission: &str) -> bool {
        self.grants
            .get(&role)
            .is_some_and(|perms| perms.contains(permission))
    }

    /// The permissions listed for `role`, sorted.
    pub fn permissions_for(&self, role: Role) -> Vec<Permission> {
        let mut perms: Vec<Permission> = self
            .grants
            .get(&role)
            .map(|perms| perms.iter().cloned().collect())
            .unwrap_or_default();
        perms.sort();
        perms
    }
}

impl Default for RbacPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Builder for [`RbacPolicy`].
#[derive(Debug, Default)]
pub struct RbacPolicyBuilder {
    edges: Vec<(Role, Role)>,
    grants: HashMap<Role, HashSet<Permission>>,
}

impl RbacPolicyBuilder {
    /// Declare that `higher` directly implies `lower`.
    pub fn implies(mut self, higher: Role, lower: Role) -> Self {
        self.edges.push((higher, lower));
        self
    }

    /// Add permissions to a role's table entry.
    pub fn grant(mut self, role: Role, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.grants.entry(role).or_default().extend(permissions);
        self
    }

    pub fn build(self) -> RbacPolicy {
        RbacPolicy {
            closure: close_hierarchy(&self.edges),
            grants: self.grants,
        }
    }
}

/// Reflexive-transitive closure of the direct edges, by fixed-point iteration.
fn close_hierarchy(edges: &[(Role, Role)]) -> [RoleSet; Role::COUNT] {
    let mut closure = Role::ALL.map(RoleSet::single);
    for (higher, lower) in edges {
        closure[higher.index()].insert(*lower);
    }

    let mut changed = true;
    while changed {
        changed = false;
        for role in Role::ALL {
            let current = closure[role.index()];
            let expanded = current
                .iter()
                .fold(current, |acc, implied| acc.union(closure[implied.index()]));
            if expanded != current {
                closure[role.index()] = expanded;
                changed = true;
            }
        }
    }
    closure
}
