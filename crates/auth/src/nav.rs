//! Navigation filtering.

use serde::{Deserialize, Serialize};

use crate::ability::Ability;
use crate::permissions::Permission;
use crate::roles::Role;

/// A navigation entry, optionally gated by a permission and/or roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<Permission>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<Role>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavItem>,
}

impl NavItem {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            permission: None,
            roles: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn permission(mut self, permission: Permission) -> Self {
        self.permission = Some(permission);
        self
    }

    pub fn roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = NavItem>) -> Self {
        self.children = children.into_iter().collect();
        self
    }

    /// Visible when the permission (if any) is held and, when roles are
    /// listed, at least one of them is.
    pub fn is_visible(&self, ability: &Ability) -> bool {
        let permission_ok = self.permission.as_ref().is_none_or(|p| ability.can(p));
        let roles_ok = self.roles.is_empty() || ability.has_any_role(&self.roles);
        permission_ok && roles_ok
    }
}

/// Keep the entries `ability` may see, filtering children recursively.
///
/// A visible parent is kept even when all of its children are filtered out.
pub fn filter_nav(items: &[NavItem], ability: &Ability) -> Vec<NavItem> {
    items
        .iter()
        .filter(|item| item.is_visible(ability))
        .map(|item| NavItem {
            children: filter_nav(&item.children, ability),
            ..item.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::permissions::{DASHBOARD_READ, INVENTORY_READ, INVENTORY_WRITE, USERS_READ};
    use tollgate_core::PrincipalId;

    fn ability_for(role: Role) -> Ability {
        let identity = Identity::builder(PrincipalId::new("1").unwrap(), "t@t.io")
            .roles([role])
            .build();
        Ability::from(Some(identity))
    }

    fn menu() -> Vec<NavItem> {
        vec![
            NavItem::new("Dashboard", "/dashboard").permission(DASHBOARD_READ),
            NavItem::new("Inventory", "/inventory")
                .permission(INVENTORY_READ)
                .children([
                    NavItem::new("Stock", "/inventory/stock"),
                    NavItem::new("Adjust", "/inventory/adjust").permission(INVENTORY_WRITE),
                ]),
            NavItem::new("Users", "/users").permission(USERS_READ),
            NavItem::new("Approvals", "/approvals").roles([Role::Admin]),
            NavItem::new("Help", "/help"),
        ]
    }

    fn titles(items: &[NavItem]) -> Vec<&str> {
        items.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn user_sees_read_only_entries() {
        let filtered = filter_nav(&menu(), &ability_for(Role::User));
        assert_eq!(titles(&filtered), vec!["Dashboard", "Inventory", "Help"]);
        assert_eq!(titles(&filtered[1].children), vec!["Stock"]);
    }

    #[test]
    fn manager_sees_more_but_not_admin_only() {
        let filtered = filter_nav(&menu(), &ability_for(Role::Manager));
        assert_eq!(titles(&filtered), vec!["Dashboard", "Inventory", "Users", "Help"]);
        assert_eq!(titles(&filtered[1].children), vec!["Stock", "Adjust"]);
    }

    #[test]
    fn anonymous_sees_only_ungated_entries() {
        let filtered = filter_nav(&menu(), &Ability::anonymous());
        assert_eq!(titles(&filtered), vec!["Help"]);
    }
}
