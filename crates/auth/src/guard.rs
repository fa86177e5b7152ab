//! Route guard: one requirement type, one evaluation function.
//!
//! Guards hold no state. Every evaluation starts from the current ability
//! and a static [`Requirement`], and always lands in one of three states.

use serde::{Deserialize, Serialize};

use crate::ability::Ability;
use crate::permissions::Permission;
use crate::roles::Role;

/// Static access requirement for a protected region.
///
/// An empty requirement only demands authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_roles: Option<Vec<Role>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_permissions: Option<Vec<Permission>>,
    /// AND (`true`) or OR (`false`) over `required_permissions`.
    #[serde(default = "default_require_all")]
    pub require_all: bool,
}

fn default_require_all() -> bool {
    true
}

impl Default for Requirement {
    fn default() -> Self {
        Self::authenticated()
    }
}

impl Requirement {
    /// Any signed-in caller.
    pub fn authenticated() -> Self {
        Self {
            required_roles: None,
            required_permissions: None,
            require_all: default_require_all(),
        }
    }

    /// Caller must hold at least one of `roles` (hierarchy applies).
    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self::authenticated().with_roles(roles)
    }

    /// Caller must hold `permissions` (all of them unless relaxed with
    /// [`Requirement::require_all`]).
    pub fn permissions(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self::authenticated().with_permissions(permissions)
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.required_roles = Some(roles.into_iter().collect());
        self
    }

    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.required_permissions = Some(permissions.into_iter().collect());
        self
    }

    pub fn require_all(mut self, require_all: bool) -> Self {
        self.require_all = require_all;
        self
    }
}

/// Result of evaluating a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    Unauthenticated,
    Unauthorized,
    Authorized,
}

/// Classify the caller against `requirement`.
pub fn evaluate(ability: &Ability, requirement: &Requirement) -> GuardState {
    if !ability.is_authenticated() {
        return GuardState::Unauthenticated;
    }

    if let Some(roles) = &requirement.required_roles {
        if !ability.has_any_role(roles) {
            return GuardState::Unauthorized;
        }
    }

    if let Some(permissions) = &requirement.required_permissions {
        let allowed = if requirement.require_all {
            ability.can_access_all(permissions)
        } else {
            ability.can_access_any(permissions)
        };
        if !allowed {
            return GuardState::Unauthorized;
        }
    }

    GuardState::Authorized
}

/// Where guard redirects point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardRoutes {
    /// Login entry point for anonymous callers.
    pub login: String,
    /// Authenticated landing route for callers lacking privilege.
    pub unauthorized: String,
}

impl Default for GuardRoutes {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            unauthorized: "/unauthorized".to_string(),
        }
    }
}

/// What the rendering layer should do with a guarded region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GuardOutcome {
    /// Render the protected content.
    Render,
    /// Render the caller-supplied fallback in place of the content.
    RenderFallback,
    /// Navigate away, replacing the current history entry.
    Redirect {
        to: String,
        /// Location to return to after login, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        return_to: Option<String>,
    },
}

/// Turn a guard state into a navigable outcome.
///
/// Anonymous callers go to the login route carrying `location`. Callers who
/// are signed in but lack privilege see the fallback if one exists, and are
/// otherwise sent to the unauthorized landing route, never back to login.
pub fn resolve(
    state: GuardState,
    location: &str,
    has_fallback: bool,
    routes: &GuardRoutes,
) -> GuardOutcome {
    match state {
        GuardState::Authorized => GuardOutcome::Render,
        GuardState::Unauthenticated => GuardOutcome::Redirect {
            to: routes.login.clone(),
            return_to: Some(location.to_string()),
        },
        GuardState::Unauthorized if has_fallback => GuardOutcome::RenderFallback,
        GuardState::Unauthorized => GuardOutcome::Redirect {
            to: routes.unauthorized.clone(),
            return_to: None,
        },
    }
}

/// [`evaluate`] then [`resolve`].
pub fn check(
    ability: &Ability,
    requirement: &Requirement,
    location: &str,
    has_fallback: bool,
    routes: &GuardRoutes,
) -> GuardOutcome {
    let state = evaluate(ability, requirement);
    if state != GuardState::Authorized {
        tracing::debug!(?state, location, "guard denied access");
    }
    resolve(state, location, has_fallback, routes)
}
