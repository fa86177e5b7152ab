//! `tollgate-inspect` — show what the session derives from a token.
//!
//! Usage:
//!   tollgate-inspect <token>   inspect the given token
//!   tollgate-inspect           inspect the persisted token

use anyhow::Context;
use serde_json::json;

use tollgate_auth::{Ability, Identity, Permission, RbacPolicy, claims};
use tollgate_session::{AuthSession, SessionConfig};

fn main() -> anyhow::Result<()> {
    tollgate_observability::init();

    let config = SessionConfig::from_env();
    let token = match std::env::args().nth(1) {
        Some(token) => Some(token),
        None => {
            let session = AuthSession::open(config)
                .context("failed to open session from persisted storage")?;
            session.snapshot().token().map(str::to_string)
        }
    };

    let Some(token) = token else {
        println!("{}", json!({ "token": null, "authenticated": false }));
        return Ok(());
    };

    let raw_roles = claims::extract_raw_roles(claims::decode(&token).as_ref());
    let policy = RbacPolicy::shared();
    let ability = Ability::with_policy(Identity::from_token(&token).map(Into::into), policy.clone());

    let report = match ability.identity() {
        None => json!({ "authenticated": false, "raw_roles": raw_roles }),
        Some(identity) => {
            let role_permissions = policy.permissions_for(identity.primary_role());
            let mut granted: Vec<Permission> = role_permissions
                .iter()
                .chain(identity.explicit_permissions())
                .cloned()
                .collect();
            granted.sort();
            granted.dedup();
            json!({
                "authenticated": true,
                "raw_roles": raw_roles,
                "identity": identity,
                "display_name": identity.display_name(),
                "role_permissions": role_permissions,
                "granted": granted,
            })
        }
    };

    let rendered = serde_json::to_string_pretty(&report).context("failed to render report")?;
    println!("{rendered}");
    Ok(())
}
