//! `tollgate-auth` — who is the caller and what may they do.
//!
//! Pure decisions only: this crate does no I/O and never verifies token
//! signatures. Persistence and session lifecycle live in `tollgate-session`.

pub mod ability;
pub mod claims;
pub mod guard;
pub mod identity;
pub mod nav;
pub mod permissions;
pub mod policy;
pub mod roles;

pub use ability::Ability;
pub use claims::{ClaimMap, decode, extract_raw_roles};
pub use guard::{GuardOutcome, GuardRoutes, GuardState, Requirement, evaluate};
pub use identity::{Identity, IdentityBuilder};
pub use nav::{NavItem, filter_nav};
pub use permissions::Permission;
pub use policy::{RbacPolicy, RbacPolicyBuilder};
pub use roles::{Role, RoleSet, normalize, normalize_all, select_primary};
