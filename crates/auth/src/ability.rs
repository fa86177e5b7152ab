//! Authorization predicates derived from an [`Identity`].

use std::sync::Arc;

use crate::identity::Identity;
use crate::policy::RbacPolicy;
use crate::roles::Role;

/// Read-only authorization view over an identity (or its absence).
///
/// Cheap to build and never persisted; rebuild it whenever the identity
/// changes. Every predicate is pure and answers `false` for an anonymous
/// caller, except [`Ability::can_access_all`] on an empty list.
#[derive(Debug, Clone)]
pub struct Ability {
    identity: Option<Arc<Identity>>,
    policy: Arc<RbacPolicy>,
}

impl Ability {
    /// Ability under the built-in policy.
    pub fn new(identity: Option<Arc<Identity>>) -> Self {
        Self::with_policy(identity, RbacPolicy::shared())
    }

    pub fn with_policy(identity: Option<Arc<Identity>>, policy: Arc<RbacPolicy>) -> Self {
        Self { identity, policy }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.identity.as_ref().map(|identity| identity.primary_role())
    }

    /// Explicit grant on the identity, or an entry in its primary role's table.
    pub fn can(&self, permission: impl AsRef<str>) -> bool {
        let Some(identity) = self.identity.as_deref() else {
            return false;
        };
        let permission = permission.as_ref();
        identity.has_explicit_permission(permission)
            || self.policy.grants(identity.primary_role(), permission)
    }

    /// Whether the primary role implies `role` (reflexive).
    pub fn has_role(&self, role: Role) -> bool {
        self.identity
            .as_deref()
            .is_some_and(|identity| self.policy.implies(identity.primary_role(), role))
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.has_role(*role))
    }

    /// AND over [`Ability::can`]; vacuously `true` for an empty list.
    pub fn can_access_all<P: AsRef<str>>(&self, permissions: &[P]) -> bool {
        permissions.iter().all(|permission| self.can(permission))
    }

    /// OR over [`Ability::can`]; `false` for an empty list.
    pub fn can_access_any<P: AsRef<str>>(&self, permissions: &[P]) -> bool {
        permissions.iter().any(|permission| self.can(permission))
    }
}

impl From<Option<Identity>> for Ability {
    fn from(identity: Option<Identity>) -> Self {
        Self::new(identity.map(Arc::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{self, Permission};
    use proptest::prelude::*;
    use tollgate_core::PrincipalId;

    fn ability_for(role: Role) -> Ability {
        let identity = Identity::builder(PrincipalId::new("1").unwrap(), "t@t.io")
            .roles([role])
            .build();
        Ability::from(Some(identity))
    }

    #[test]
    fn anonymous_is_denied_everything() {
        let ability = Ability::anonymous();
        assert!(!ability.is_authenticated());
        assert!(!ability.can("dashboard:read"));
        assert!(!ability.has_role(Role::User));
        assert!(!ability.has_any_role(&[Role::User, Role::Admin]));
        assert!(!ability.can_access_any(&["dashboard:read"]));
        assert_eq!(ability.role(), None);
    }

    #[test]
    fn role_permissions_follow_primary_role() {
        let admin = ability_for(Role::Admin);
        let user = ability_for(Role::User);
        assert!(admin.can("users:write"));
        assert!(!user.can("users:write"));
        assert!(user.can(permissions::INVENTORY_READ));
    }

    #[test]
    fn explicit_permission_grants_outside_role_table() {
        let identity = Identity::builder(PrincipalId::new("1").unwrap(), "t@t.io")
            .roles([Role::User])
            .permissions([Permission::parse("reports:export").unwrap(), permissions::USERS_DELETE])
            .build();
        let ability = Ability::from(Some(identity));
        assert!(ability.can("reports:export"));
        assert!(ability.can("users:delete"));
        assert!(!ability.can("users:write"));
    }

    #[test]
    fn hierarchy_is_applied_to_roles_not_permissions() {
        let manager = ability_for(Role::Manager);
        assert!(manager.has_role(Role::Manager));
        assert!(manager.has_role(Role::User));
        assert!(!manager.has_role(Role::Admin));
        assert!(manager.has_any_role(&[Role::Admin, Role::User]));
        assert!(!manager.has_any_role(&[]));
    }

    #[test]
    fn list_predicates_on_empty_input() {
        let ability = ability_for(Role::User);
        let empty: [&str; 0] = [];
        assert!(ability.can_access_all(&empty));
        assert!(!ability.can_access_any(&empty));
        assert!(Ability::anonymous().can_access_all(&empty));
    }

    #[test]
    fn list_predicates_combine_can() {
        let ability = ability_for(Role::Manager);
        assert!(ability.can_access_all(&["inventory:read", "inventory:write"]));
        assert!(!ability.can_access_all(&["inventory:read", "inventory:delete"]));
        assert!(ability.can_access_any(&["inventory:delete", "inventory:write"]));
        assert!(!ability.can_access_any(&["inventory:delete", "users:delete"]));
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn has_role_is_reflexive(role in any_role()) {
            prop_assert!(ability_for(role).has_role(role));
        }

        #[test]
        fn has_role_is_transitive(a in any_role(), b in any_role(), c in any_role()) {
            let policy = RbacPolicy::shared();
            if policy.implies(a, b) && policy.implies(b, c) {
                prop_assert!(ability_for(a).has_role(c));
            }
        }
    }
}
