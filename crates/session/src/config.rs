//! Session configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tollgate_auth::GuardRoutes;

use crate::store::{FileTokenStore, MemoryTokenStore, TokenStore};

pub const DEFAULT_STORAGE_KEY: &str = "psms_token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// The single key the raw token is persisted under.
    pub storage_key: String,
    pub login_route: String,
    /// Landing route for signed-in callers who fail a guard.
    pub unauthorized_route: String,
    /// Clear a persisted token that no longer decodes during `initialize`.
    pub clear_malformed_token: bool,
    /// Directory for the file-backed store; the platform data directory
    /// (see [`default_token_dir`]) when unset.
    pub token_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let routes = GuardRoutes::default();
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            login_route: routes.login,
            unauthorized_route: routes.unauthorized,
            clear_malformed_token: false,
            token_dir: None,
        }
    }
}

impl SessionConfig {
    /// Read `TOLLGATE_*` environment variables over the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`SessionConfig::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(key) = lookup("TOLLGATE_STORAGE_KEY").filter(|v| !v.trim().is_empty()) {
            config.storage_key = key;
        }
        if let Some(route) = lookup("TOLLGATE_LOGIN_ROUTE") {
            config.login_route = route;
        }
        if let Some(route) = lookup("TOLLGATE_UNAUTHORIZED_ROUTE") {
            config.unauthorized_route = route;
        }
        if let Some(raw) = lookup("TOLLGATE_CLEAR_MALFORMED_TOKEN") {
            match parse_flag(&raw) {
                Some(flag) => config.clear_malformed_token = flag,
                None => tracing::warn!(
                    value = %raw,
                    "TOLLGATE_CLEAR_MALFORMED_TOKEN is not a boolean; keeping default"
                ),
            }
        }
        if let Some(dir) = lookup("TOLLGATE_TOKEN_DIR").filter(|v| !v.trim().is_empty()) {
            config.token_dir = Some(PathBuf::from(dir));
        }

        config
    }

    pub fn routes(&self) -> GuardRoutes {
        GuardRoutes {
            login: self.login_route.clone(),
            unauthorized: self.unauthorized_route.clone(),
        }
    }

    /// `token_dir`, or the platform default when unset.
    pub fn resolved_token_dir(&self) -> Option<PathBuf> {
        self.token_dir.clone().or_else(default_token_dir)
    }

    /// Open the store this configuration describes.
    ///
    /// Falls back to an in-memory store only when no data directory can be
    /// resolved at all.
    pub fn open_store(&self) -> anyhow::Result<Arc<dyn TokenStore>> {
        match self.resolved_token_dir() {
            Some(dir) => {
                ensure_dir(&dir)?;
                Ok(Arc::new(FileTokenStore::new(&dir, &self.storage_key)))
            }
            None => {
                tracing::warn!("no data directory available; token will not outlive the process");
                Ok(Arc::new(MemoryTokenStore::new()))
            }
        }
    }
}

/// `<data dir>/tollgate`, with `~/.local/share` standing in for platforms
/// without a data directory.
pub fn default_token_dir() -> Option<PathBuf> {
    dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut home| {
                home.push(".local");
                home.push("share");
                home
            })
        })
        .map(|base| base.join("tollgate"))
}

fn ensure_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create token directory at {:?}", dir))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = SessionConfig::from_lookup(|_| None);
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.storage_key, "psms_token");
        assert_eq!(config.routes(), GuardRoutes::default());
        assert!(!config.clear_malformed_token);
    }

    #[test]
    fn env_overrides() {
        let config = SessionConfig::from_lookup(lookup(&[
            ("TOLLGATE_STORAGE_KEY", "app_token"),
            ("TOLLGATE_LOGIN_ROUTE", "/signin"),
            ("TOLLGATE_UNAUTHORIZED_ROUTE", "/home"),
            ("TOLLGATE_CLEAR_MALFORMED_TOKEN", "yes"),
            ("TOLLGATE_TOKEN_DIR", "/tmp/tollgate"),
        ]));
        assert_eq!(config.storage_key, "app_token");
        assert_eq!(config.routes().login, "/signin");
        assert_eq!(config.routes().unauthorized, "/home");
        assert!(config.clear_malformed_token);
        assert_eq!(config.token_dir, Some(PathBuf::from("/tmp/tollgate")));
    }

    #[test]
    fn bad_flag_keeps_default() {
        let config =
            SessionConfig::from_lookup(lookup(&[("TOLLGATE_CLEAR_MALFORMED_TOKEN", "maybe")]));
        assert!(!config.clear_malformed_token);
    }

    #[test]
    fn deserializes_partial_config() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"unauthorized_route":"/dashboard"}"#).unwrap();
        assert_eq!(config.unauthorized_route, "/dashboard");
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn explicit_token_dir_wins_over_default() {
        let config = SessionConfig { token_dir: Some(PathBuf::from("/srv/tokens")), ..SessionConfig::default() };
        assert_eq!(config.resolved_token_dir(), Some(PathBuf::from("/srv/tokens")));

        let defaulted = SessionConfig::default().resolved_token_dir();
        assert_eq!(defaulted, default_token_dir());
        if let Some(dir) = defaulted {
            assert!(dir.ends_with("tollgate"));
        }
    }

    #[test]
    fn open_store_creates_token_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("tokens");
        let config = SessionConfig { token_dir: Some(dir.clone()), ..SessionConfig::default() };
        let store = config.open_store().unwrap();
        assert!(dir.is_dir());
        store.write("abc").unwrap();
        assert_eq!(store.read().unwrap().as_deref(), Some("abc"));
    }
}
