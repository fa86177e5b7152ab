use std::borrow::{Borrow, Cow};

use serde::{Deserialize, Serialize};

use tollgate_core::{CoreError, CoreResult};

/// Permission identifier of the form `resource:action` (e.g. `"inventory:read"`).
///
/// Permissions are atomic: there is no wildcard and no prefix matching. A role
/// or identity either holds the exact string or it does not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    /// Build a permission from a compile-time literal without validation.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Parse and validate a `resource:action` string.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let raw = raw.trim();
        match raw.split_once(':') {
            Some((resource, action))
                if !resource.is_empty() && !action.is_empty() && !action.contains(':') =>
            {
                Ok(Self(Cow::Owned(raw.to_string())))
            }
            _ => Err(CoreError::validation(format!(
                "permission '{raw}' is not of the form resource:action"
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Permission {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets permission sets be queried with a plain `&str`.
impl Borrow<str> for Permission {
    fn borrow(&self) -> &str {
        &self.0
    }
}

pub const DASHBOARD_READ: Permission = Permission::from_static("dashboard:read");
pub const INVENTORY_READ: Permission = Permission::from_static("inventory:read");
pub const INVENTORY_WRITE: Permission = Permission::from_static("inventory:write");
pub const INVENTORY_DELETE: Permission = Permission::from_static("inventory:delete");
pub const USERS_READ: Permission = Permission::from_static("users:read");
pub const USERS_WRITE: Permission = Permission::from_static("users:write");
pub const USERS_DELETE: Permission = Permission::from_static("users:delete");
pub const DEPARTMENTS_READ: Permission = Permission::from_static("departments:read");
pub const DEPARTMENTS_WRITE: Permission = Permission::from_static("departments:write");
pub const DEPARTMENTS_DELETE: Permission = Permission::from_static("departments:delete");
pub const APPROVAL_SEQUENCE_READ: Permission = Permission::from_static("approval-sequence:read");
pub const APPROVAL_SEQUENCE_WRITE: Permission = Permission::from_static("approval-sequence:write");
pub const APPROVAL_SEQUENCE_DELETE: Permission =
    Permission::from_static("approval-sequence:delete");

/// Every permission known to the application.
pub const ALL: [Permission; 13] = [
    DASHBOARD_READ,
    INVENTORY_READ,
    INVENTORY_WRITE,
    INVENTORY_DELETE,
    USERS_READ,
    USERS_WRITE,
    USERS_DELETE,
    DEPARTMENTS_READ,
    DEPARTMENTS_WRITE,
    DEPARTMENTS_DELETE,
    APPROVAL_SEQUENCE_READ,
    APPROVAL_SEQUENCE_WRITE,
    APPROVAL_SEQUENCE_DELETE,
];
