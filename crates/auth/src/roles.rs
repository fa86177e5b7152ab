//! Closed role vocabulary, alias normalization and primary-role selection.

use serde::{Deserialize, Serialize};

/// Canonical role.
///
/// The set is closed: raw role claims that do not map onto one of these
/// variants are dropped during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Operational management.
    Manager,
    /// Base role; also the default when no role could be resolved.
    User,
}

impl Role {
    pub const COUNT: usize = 3;

    /// Every role, in declaration order.
    pub const ALL: [Role; Role::COUNT] = [Role::Admin, Role::Manager, Role::User];

    /// Authority order used by [`select_primary`], highest first.
    ///
    /// Hand-authored; kept separate from the hierarchy edges in the policy.
    pub const PRECEDENCE: [Role; Role::COUNT] = [Role::Admin, Role::Manager, Role::User];

    /// Lowest-privilege role, used when nothing else applies.
    pub const DEFAULT: Role = Role::User;

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::User => "User",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Role::Admin => 0,
            Role::Manager => 1,
            Role::User => 2,
        }
    }

    const fn bit(self) -> u8 {
        1 << self.index()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alias table, keyed by the folded form produced by [`fold`].
const ALIASES: &[(&str, Role)] = &[
    ("admin", Role::Admin),
    ("administrator", Role::Admin),
    ("superadmin", Role::Admin),
    ("root", Role::Admin),
    ("manager", Role::Manager),
    ("supervisor", Role::Manager),
    ("user", Role::User),
    ("enduser", Role::User),
    ("member", Role::User),
];

/// Lowercase and keep only ASCII letters ("Super_Admin" -> "superadmin").
fn fold(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Map a raw role claim onto the canonical vocabulary.
///
/// Unknown strings yield `None`; they are never an error.
pub fn normalize(raw: &str) -> Option<Role> {
    let folded = fold(raw);
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == folded)
        .map(|(_, role)| *role)
}

/// Normalize every raw claim, dropping the unknown ones.
pub fn normalize_all<I, S>(raws: I) -> RoleSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut set = RoleSet::empty();
    for raw in raws {
        let raw = raw.as_ref();
        match normalize(raw) {
            Some(role) => set.insert(role),
            None => tracing::warn!(role_claim = %raw, "dropping unrecognized role claim"),
        }
    }
    set
}

/// Pick the single highest-authority role from `roles`.
///
/// Depends only on set membership, never on insertion order. An empty set
/// resolves to [`Role::DEFAULT`].
pub fn select_primary(roles: RoleSet) -> Role {
    Role::PRECEDENCE
        .into_iter()
        .find(|role| roles.contains(*role))
        .unwrap_or(Role::DEFAULT)
}

/// Fixed-size set of roles.
///
/// Iteration always follows [`Role::PRECEDENCE`], so two sets with the same
/// members are indistinguishable regardless of how they were built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn single(role: Role) -> Self {
        Self(role.bit())
    }

    pub fn insert(&mut self, role: Role) {
        self.0 |= role.bit();
    }

    pub const fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn union(self, other: RoleSet) -> RoleSet {
        Self(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> {
        let set = *self;
        Role::PRECEDENCE.into_iter().filter(move |role| set.contains(*role))
    }

    pub fn to_vec(&self) -> Vec<Role> {
        self.iter().collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        let mut set = RoleSet::empty();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

impl Serialize for RoleSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let roles = Vec::<Role>::deserialize(deserializer)?;
        Ok(roles.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn every_alias_maps_to_its_canonical_role() {
        let expected = [
            ("admin", Role::Admin),
            ("Administrator", Role::Admin),
            ("SuperAdmin", Role::Admin),
            ("super_admin", Role::Admin),
            ("super-admin", Role::Admin),
            ("ROOT", Role::Admin),
            ("manager", Role::Manager),
            ("Supervisor", Role::Manager),
            ("user", Role::User),
            ("EndUser", Role::User),
            ("end user", Role::User),
            ("member", Role::User),
        ];
        for (raw, role) in expected {
            assert_eq!(normalize(raw), Some(role), "alias {raw}");
        }
        for (alias, role) in ALIASES {
            assert_eq!(normalize(alias), Some(*role));
        }
    }

    #[test]
    fn unknown_strings_normalize_to_none() {
        for raw in ["", "guest", "admins", "42", "!!!", "Supplier"] {
            assert_eq!(normalize(raw), None, "{raw}");
        }
    }

    #[test]
    fn normalize_all_drops_unknown_and_dedups() {
        let set = normalize_all(["admin", "SuperAdmin", "guest", "user"]);
        assert_eq!(set.to_vec(), vec![Role::Admin, Role::User]);
        assert!(normalize_all(["guest"]).is_empty());
    }

    #[test]
    fn select_primary_of_empty_is_default() {
        assert_eq!(select_primary(RoleSet::empty()), Role::User);
    }

    #[test]
    fn select_primary_prefers_top_role() {
        let a: RoleSet = [Role::Admin, Role::Manager].into_iter().collect();
        let b: RoleSet = [Role::Manager, Role::Admin].into_iter().collect();
        assert_eq!(select_primary(a), Role::Admin);
        assert_eq!(select_primary(b), Role::Admin);
        assert_eq!(select_primary(RoleSet::single(Role::Manager)), Role::Manager);
    }

    #[test]
    fn role_set_serializes_in_precedence_order() {
        let set: RoleSet = [Role::User, Role::Admin].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["Admin","User"]"#);
        let back: RoleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    proptest! {
        /// Re-normalizing canonical names is a fixed point.
        #[test]
        fn normalize_all_is_idempotent(raws in prop::collection::vec("[A-Za-z_ -]{0,14}", 0..8)) {
            let once = normalize_all(&raws);
            let names: Vec<&str> = once.iter().map(|r| r.as_str()).collect();
            prop_assert_eq!(normalize_all(names), once);
        }

        /// Primary role ignores insertion order.
        #[test]
        fn select_primary_is_order_independent(mut roles in prop::collection::vec(any_role(), 0..6)) {
            let forward: RoleSet = roles.iter().copied().collect();
            roles.reverse();
            let backward: RoleSet = roles.iter().copied().collect();
            prop_assert_eq!(select_primary(forward), select_primary(backward));
            if let Some(top) = Role::PRECEDENCE.into_iter().find(|r| roles.contains(r)) {
                prop_assert_eq!(select_primary(forward), top);
            }
        }
    }
}
