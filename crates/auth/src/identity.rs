use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use tollgate_core::PrincipalId;

use crate::claims::{self, ClaimMap};
use crate::permissions::Permission;
use crate::roles::{self, Role, RoleSet};

/// The resolved caller, built from token claims.
///
/// Immutable: a change in claims produces a new `Identity`. Serializable for
/// display, never deserializable; `primary_role` is always
/// `select_primary(roles)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    id: PrincipalId,
    email: String,
    primary_role: Role,
    roles: RoleSet,
    first_name: Option<String>,
    last_name: Option<String>,
    explicit_permissions: HashSet<Permission>,
    /// Display only; never used to reject a session.
    expires_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Build an identity from a decoded claim payload.
    ///
    /// Returns `None` when no subject is present. Unknown role claims are
    /// dropped, so the role set may be empty; the primary role then falls
    /// back to [`Role::DEFAULT`].
    pub fn from_claims(claims: &ClaimMap) -> Option<Self> {
        let subject = claims::first_string(claims, claims::SUBJECT_KEYS)?;
        let id = PrincipalId::new(subject).ok()?;

        let raw_roles = claims::extract_raw_roles(Some(claims));
        let roles = roles::normalize_all(&raw_roles);
        if roles.is_empty() && !raw_roles.is_empty() {
            tracing::warn!(principal = %id, ?raw_roles, "no recognized roles in token");
        }

        let explicit_permissions = claims::PERMISSION_KEYS
            .iter()
            .flat_map(|key| claims::claim_strings(claims, key))
            .filter_map(|raw| match Permission::parse(&raw) {
                Ok(permission) => Some(permission),
                Err(err) => {
                    tracing::debug!(error = %err, "ignoring explicit permission claim");
                    None
                }
            })
            .collect();

        Some(Self {
            id,
            email: claims::first_string(claims, claims::EMAIL_KEYS).unwrap_or_default(),
            primary_role: roles::select_primary(roles),
            roles,
            first_name: claims::first_string(claims, claims::FIRST_NAME_KEYS),
            last_name: claims::first_string(claims, claims::LAST_NAME_KEYS),
            explicit_permissions,
            expires_at: claims::numeric_date(claims, claims::EXPIRY_KEY)
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        })
    }

    /// Decode `token` and build an identity from it in one step.
    pub fn from_token(token: &str) -> Option<Self> {
        claims::decode(token).and_then(|claims| Self::from_claims(&claims))
    }

    /// Start an identity by hand (fixtures, service principals).
    ///
    /// The primary role is derived from the roles added, as in
    /// [`Identity::from_claims`].
    pub fn builder(id: PrincipalId, email: impl Into<String>) -> IdentityBuilder {
        IdentityBuilder {
            identity: Self {
                id,
                email: email.into(),
                primary_role: Role::DEFAULT,
                roles: RoleSet::empty(),
                first_name: None,
                last_name: None,
                explicit_permissions: HashSet::new(),
                expires_at: None,
            },
        }
    }

    pub fn id(&self) -> &PrincipalId {
        &self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn primary_role(&self) -> Role {
        self.primary_role
    }

    /// Canonical roles carried by the token (possibly empty).
    pub fn roles(&self) -> RoleSet {
        self.roles
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    pub fn explicit_permissions(&self) -> &HashSet<Permission> {
        &self.explicit_permissions
    }

    pub fn has_explicit_permission(&self, permission: &str) -> bool {
        self.explicit_permissions.contains(permission)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// "First Last", else the email, else `"User"`.
    pub fn display_name(&self) -> String {
        let full = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        );
        let full = full.trim();
        if !full.is_empty() {
            full.to_string()
        } else if !self.email.is_empty() {
            self.email.clone()
        } else {
            "User".to_string()
        }
    }
}

/// Builder returned by [`Identity::builder`].
#[derive(Debug, Clone)]
pub struct IdentityBuilder {
    identity: Identity,
}

impl IdentityBuilder {
    /// Add canonical roles; the primary role is re-selected.
    pub fn roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        let mut set = self.identity.roles;
        for role in roles {
            set.insert(role);
        }
        self.identity.roles = set;
        self.identity.primary_role = roles::select_primary(set);
        self
    }

    pub fn name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.identity.first_name = Some(first.into());
        self.identity.last_name = Some(last.into());
        self
    }

    pub fn permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.identity.explicit_permissions.extend(permissions);
        self
    }

    pub fn build(self) -> Identity {
        self.identity
    }
}
