//! Process-wide authentication session.
//!
//! The session owns one immutable [`SessionSnapshot`] at a time. Every
//! transition builds a complete new snapshot and swaps it in under a single
//! write lock, so readers see either the old `(token, roles, identity)`
//! triple or the new one, never a mix.

use std::sync::{Arc, PoisonError, RwLock};

use tollgate_auth::{Ability, GuardRoutes, Identity, RbacPolicy, Role};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::store::TokenStore;

/// One consistent view of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    token: Option<String>,
    roles: Vec<Role>,
    identity: Option<Arc<Identity>>,
}

impl SessionSnapshot {
    /// The signed-out state: `(None, [], None)`.
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Derive roles and identity from `token`.
    ///
    /// A token that does not decode keeps its raw value but yields no roles
    /// and no identity.
    pub fn from_token(token: String) -> Self {
        let identity = Identity::from_token(&token).map(Arc::new);
        let roles = identity
            .as_ref()
            .map(|identity| identity.roles().to_vec())
            .unwrap_or_default();
        Self {
            token: Some(token),
            roles,
            identity,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Canonical roles, highest precedence first.
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn identity(&self) -> Option<&Arc<Identity>> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// The auth session: token storage plus the current snapshot.
///
/// Mutated only through [`AuthSession::initialize`], [`AuthSession::login`],
/// [`AuthSession::logout`] and [`AuthSession::on_storage_changed`]. Pass it
/// (or an `Arc` of it) to the places that need an [`Ability`].
pub struct AuthSession {
    store: Arc<dyn TokenStore>,
    config: SessionConfig,
    policy: Arc<RbacPolicy>,
    state: RwLock<Arc<SessionSnapshot>>,
}

impl core::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("AuthSession")
            .field("storage_key", &self.config.storage_key)
            .field("authenticated", &snapshot.is_authenticated())
            .field("roles", &snapshot.roles())
            .finish()
    }
}

impl AuthSession {
    /// A signed-out session over `store`. Call [`AuthSession::initialize`]
    /// to pick up a persisted token.
    pub fn new(store: Arc<dyn TokenStore>, config: SessionConfig) -> Self {
        Self::with_policy(store, config, RbacPolicy::shared())
    }

    pub fn with_policy(
        store: Arc<dyn TokenStore>,
        config: SessionConfig,
        policy: Arc<RbacPolicy>,
    ) -> Self {
        Self {
            store,
            config,
            policy,
            state: RwLock::new(Arc::new(SessionSnapshot::signed_out())),
        }
    }

    /// Open the configured store and restore any persisted token.
    pub fn open(config: SessionConfig) -> anyhow::Result<Self> {
        let store = config.open_store()?;
        let session = Self::new(store, config);
        session.initialize()?;
        Ok(session)
    }

    pub fn routes(&self) -> GuardRoutes {
        self.config.routes()
    }

    /// Rebuild the whole snapshot from persisted storage.
    ///
    /// No network round-trip: expiry and signature are enforced by the server
    /// on later requests.
    pub fn initialize(&self) -> Result<Arc<SessionSnapshot>, SessionError> {
        let snapshot = match self.restore() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                // Storage can no longer vouch for the current state.
                self.commit(SessionSnapshot::signed_out());
                tracing::warn!(error = %err, "session storage unavailable; signed out");
                return Err(err);
            }
        };

        let snapshot = self.commit(snapshot);
        log_transition("initialize", &snapshot);
        Ok(snapshot)
    }

    fn restore(&self) -> Result<SessionSnapshot, SessionError> {
        let Some(token) = self.store.read()? else {
            return Ok(SessionSnapshot::signed_out());
        };

        let snapshot = SessionSnapshot::from_token(token);
        if snapshot.is_authenticated() {
            Ok(snapshot)
        } else if self.config.clear_malformed_token {
            tracing::warn!("persisted token is unusable; clearing it");
            self.store.clear()?;
            Ok(SessionSnapshot::signed_out())
        } else {
            tracing::warn!("persisted token is unusable; session stays signed out");
            Ok(snapshot)
        }
    }

    /// Persist `token` and switch the session over to it.
    ///
    /// A blank token is rejected. If persisting fails, the current snapshot
    /// is left untouched.
    pub fn login(&self, token: impl Into<String>) -> Result<Arc<SessionSnapshot>, SessionError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(SessionError::BlankToken);
        }
        self.store.write(&token)?;

        let snapshot = self.commit(SessionSnapshot::from_token(token));
        log_transition("login", &snapshot);
        Ok(snapshot)
    }

    /// Clear persisted state and reset to `(None, [], None)`.
    ///
    /// The in-memory reset happens even if clearing storage fails; that
    /// failure is still returned.
    pub fn logout(&self) -> Result<(), SessionError> {
        let cleared = self.store.clear();
        self.commit(SessionSnapshot::signed_out());
        tracing::info!("session signed out");
        cleared.map_err(SessionError::from)
    }

    /// Another context changed the shared storage: recompute everything.
    pub fn on_storage_changed(&self) -> Result<Arc<SessionSnapshot>, SessionError> {
        tracing::debug!("storage changed externally; re-initializing session");
        self.initialize()
    }

    /// The current snapshot. Hold on to it for a whole render pass.
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn identity(&self) -> Option<Arc<Identity>> {
        self.snapshot().identity.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }

    /// Ability over the current identity.
    pub fn ability(&self) -> Ability {
        Ability::with_policy(self.identity(), Arc::clone(&self.policy))
    }

    fn commit(&self, snapshot: SessionSnapshot) -> Arc<SessionSnapshot> {
        let snapshot = Arc::new(snapshot);
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::clone(&snapshot);
        snapshot
    }
}

fn log_transition(transition: &str, snapshot: &SessionSnapshot) {
    match snapshot.identity() {
        Some(identity) => tracing::info!(
            transition,
            principal = %identity.id(),
            primary_role = %identity.primary_role(),
            "session authenticated"
        ),
        None if snapshot.token().is_some() => {
            tracing::info!(transition, "session holds an undecodable token")
        }
        None => tracing::info!(transition, "session signed out"),
    }
}
