//! `tollgate-session` — the process-wide auth session and its token storage.

pub mod config;
pub mod error;
pub mod session;
pub mod store;

pub use config::SessionConfig;
pub use error::{SessionError, StoreError};
pub use session::{AuthSession, SessionSnapshot};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
