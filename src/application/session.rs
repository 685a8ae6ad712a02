//! Process-wide authentication context.
//!
//! The token lives in a [`TokenStore`] under [`AUTH_TOKEN_KEY`]. The store is
//! read once when the context is created; afterwards every component reads
//! the current [`Identity`] from the context, and sign-in/sign-out publish
//! the change to all subscribers. Absence of the key means "unauthenticated".

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::claims::{Claims, extract_claims};

pub const AUTH_TOKEN_KEY: &str = "auth_token";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access token storage at {path}: {message}")]
    Access { path: String, message: String },
    #[error("token storage at {path} is corrupt: {message}")]
    Corrupt { path: String, message: String },
}

/// Persistent key/value storage for client-side session data.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// A signed-in account: the bearer token plus whatever its payload decodes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    token: String,
    claims: Option<Claims>,
}

impl Identity {
    pub fn from_token(token: impl Into<String>) -> Self {
        let token = token.into();
        let claims = extract_claims(&token);
        Self { token, claims }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    pub fn subject(&self) -> Option<&str> {
        self.claims.as_ref()?.subject.as_deref()
    }
}

pub struct AuthContext {
    store: Arc<dyn TokenStore>,
    current: watch::Sender<Option<Identity>>,
}

impl AuthContext {
    /// Read the persisted token once and start publishing identity changes.
    ///
    /// Unreadable contents start the context signed out; the next sign-in or
    /// sign-out rewrites the store.
    pub fn load(store: Arc<dyn TokenStore>) -> Result<Self, StoreError> {
        let stored = match store.get(AUTH_TOKEN_KEY) {
            Ok(stored) => stored,
            Err(err @ StoreError::Corrupt { .. }) => {
                warn!(
                    target = "folio::session",
                    error = %err,
                    "ignoring unreadable session; starting signed out"
                );
                None
            }
            Err(err) => return Err(err),
        };
        let identity = stored
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .map(Identity::from_token);
        debug!(
            target = "folio::session",
            signed_in = identity.is_some(),
            "loaded session"
        );
        let (current, _) = watch::channel(identity);
        Ok(Self { store, current })
    }

    pub fn current(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    pub fn claims(&self) -> Option<Claims> {
        self.current.borrow().as_ref().and_then(|id| id.claims.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }

    /// Persist `token` and publish the identity it carries.
    pub fn sign_in(&self, token: impl Into<String>) -> Result<Identity, StoreError> {
        let identity = Identity::from_token(token);
        self.store.set(AUTH_TOKEN_KEY, identity.token())?;
        info!(
            target = "folio::session",
            subject = identity.subject().unwrap_or("-"),
            "signed in"
        );
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    /// Remove the persisted token and publish "no identity".
    pub fn sign_out(&self) -> Result<(), StoreError> {
        self.store.remove(AUTH_TOKEN_KEY)?;
        info!(target = "folio::session", "signed out");
        self.current.send_replace(None);
        Ok(())
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("signed_in", &self.is_signed_in())
            .finish_non_exhaustive()
    }
}

/// In-process store, used where nothing needs to outlive the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::default();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(AUTH_TOKEN_KEY.to_string(), token.into());
        }
        store
    }

    fn poisoned() -> StoreError {
        StoreError::Access {
            path: "memory".into(),
            message: "lock poisoned".into(),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::claims::token_with_payload;
    use serde_json::json;

    #[test]
    fn missing_key_means_signed_out() {
        let ctx = AuthContext::load(Arc::new(MemoryTokenStore::default())).expect("ctx");
        assert!(!ctx.is_signed_in());
        assert_eq!(ctx.claims(), None);
    }

    struct CorruptStore {
        inner: MemoryTokenStore,
    }

    impl TokenStore for CorruptStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            if key == AUTH_TOKEN_KEY && self.inner.get(key)?.is_none() {
                return Err(StoreError::Corrupt {
                    path: "session.json".into(),
                    message: "EOF while parsing a string".into(),
                });
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn corrupt_store_means_signed_out() {
        let store = Arc::new(CorruptStore {
            inner: MemoryTokenStore::default(),
        });
        let ctx = AuthContext::load(store.clone()).expect("ctx");
        assert!(!ctx.is_signed_in());

        ctx.sign_in("a.b.c").expect("sign in overwrites");
        assert_eq!(
            store.get(AUTH_TOKEN_KEY).expect("get").as_deref(),
            Some("a.b.c")
        );
    }

    #[test]
    fn access_errors_still_surface() {
        struct Unreachable;
        impl TokenStore for Unreachable {
            fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
                Err(StoreError::Access {
                    path: "session.json".into(),
                    message: "permission denied".into(),
                })
            }
            fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
                Ok(())
            }
            fn remove(&self, _key: &str) -> Result<(), StoreError> {
                Ok(())
            }
        }

        let err = AuthContext::load(Arc::new(Unreachable)).expect_err("access error");
        assert!(matches!(err, StoreError::Access { .. }));
    }

    #[test]
    fn blank_token_means_signed_out() {
        let ctx = AuthContext::load(Arc::new(MemoryTokenStore::with_token("   "))).expect("ctx");
        assert!(ctx.current().is_none());
    }

    #[test]
    fn undecodable_token_is_signed_in_without_claims() {
        let ctx = AuthContext::load(Arc::new(MemoryTokenStore::with_token("abc"))).expect("ctx");
        let identity = ctx.current().expect("identity");
        assert_eq!(identity.token(), "abc");
        assert_eq!(identity.claims(), None);
        assert_eq!(identity.subject(), None);
    }

    #[test]
    fn sign_in_persists_and_notifies_subscribers() {
        let store = Arc::new(MemoryTokenStore::default());
        let ctx = AuthContext::load(store.clone()).expect("ctx");
        let mut rx = ctx.subscribe();

        let token = token_with_payload(&json!({ "sub": "acct-1", "account_name": "yasir" }));
        ctx.sign_in(token.clone()).expect("sign in");

        assert!(rx.has_changed().expect("sender alive"));
        let seen = rx.borrow_and_update().clone().expect("identity");
        assert_eq!(seen.subject(), Some("acct-1"));
        assert_eq!(
            store.get(AUTH_TOKEN_KEY).expect("get"),
            Some(token.clone())
        );
    }

    #[test]
    fn sign_out_removes_the_auth_token_key() {
        let store = Arc::new(MemoryTokenStore::with_token("a.b.c"));
        store.set("theme", "dark").expect("set");
        let ctx = AuthContext::load(store.clone()).expect("ctx");
        let rx = ctx.subscribe();

        ctx.sign_out().expect("sign out");

        assert_eq!(store.get(AUTH_TOKEN_KEY).expect("get"), None);
        assert_eq!(store.get("theme").expect("get").as_deref(), Some("dark"));
        assert!(rx.borrow().is_none());
        assert!(!ctx.is_signed_in());
    }
}
