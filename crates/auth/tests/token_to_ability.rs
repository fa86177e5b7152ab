//! Token in, authorization decisions out.

use serde_json::json;

use tollgate_auth::claims::encode_unsigned;
use tollgate_auth::{
    Ability, GuardOutcome, GuardRoutes, GuardState, Identity, NavItem, Requirement, Role, decode,
    extract_raw_roles, filter_nav, guard, permissions,
};

fn ability_from(claims: serde_json::Value) -> Ability {
    Ability::from(Identity::from_token(&encode_unsigned(&claims)))
}

#[test]
fn admin_alias_resolves_to_top_role() {
    let ability = ability_from(json!({"sub": "42", "email": "a@b.com", "role": "admin"}));

    let identity = ability.identity().expect("identity");
    assert_eq!(identity.primary_role(), Role::Admin);
    assert!(ability.can("users:write"));
    assert!(ability.has_role(Role::User));
}

#[test]
fn base_role_cannot_write_users() {
    let ability = ability_from(json!({"sub": "43", "email": "u@b.com", "role": "user"}));
    assert_eq!(ability.role(), Some(Role::User));
    assert!(!ability.can("users:write"));
    assert!(ability.can("dashboard:read"));
}

#[test]
fn multiple_role_claims_pick_highest_precedence() {
    let ability = ability_from(json!({
        "sub": "1",
        "role": "User",
        "roles": ["manager"],
        "http://schemas.microsoft.com/ws/2008/06/identity/claims/role": "Supervisor",
    }));
    assert_eq!(ability.role(), Some(Role::Manager));
    assert!(ability.can("departments:write"));
    assert!(!ability.can("departments:delete"));
}

#[test]
fn malformed_token_is_anonymous() {
    assert!(decode("not-a-token").is_none());
    assert!(extract_raw_roles(None).is_empty());

    let ability = Ability::from(Identity::from_token("not-a-token"));
    assert!(!ability.is_authenticated());
    assert_eq!(
        guard::evaluate(&ability, &Requirement::authenticated()),
        GuardState::Unauthenticated
    );
}

#[test]
fn guard_and_nav_agree_for_manager() {
    let ability = ability_from(json!({"sub": "5", "roles": ["Manager"]}));
    let routes = GuardRoutes::default();

    let users_admin = Requirement::roles([Role::Admin]);
    assert_eq!(
        guard::check(&ability, &users_admin, "/users", false, &routes),
        GuardOutcome::Redirect { to: "/unauthorized".into(), return_to: None }
    );

    let menu = vec![
        NavItem::new("Departments", "/departments").permission(permissions::DEPARTMENTS_READ),
        NavItem::new("Users", "/users").roles([Role::Admin]),
    ];
    let visible = filter_nav(&menu, &ability);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].url, "/departments");
}
