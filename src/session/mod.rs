//! Session and credential store.
//!
//! The [`SessionStore`] is the single source of truth for whether a user is
//! logged in. It keeps the bearer token and the user profile in memory and
//! mirrors the token into a [`CredentialStorage`] backend so the session
//! survives process restarts.

mod storage;

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

pub use storage::{
    CredentialStorage, FileStorage, KeyringStorage, MemoryStorage, StorageError, KEYRING_SERVICE,
};

use crate::api::types::User;

/// The fixed key the credential is persisted under.
pub const CREDENTIAL_KEY: &str = "auth_token";

#[derive(Default)]
struct SessionState {
    token: Option<String>,
    /// Whether durable storage has been consulted (or overridden) yet.
    loaded: bool,
    user: Option<User>,
}

struct Inner {
    storage: Arc<dyn CredentialStorage>,
    state: RwLock<SessionState>,
}

/// Holder of the current credential and user profile.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    /// Create a session store over the given storage backend.
    ///
    /// Nothing is read from storage until the credential is first requested.
    pub fn new(storage: Arc<dyn CredentialStorage>) -> Self {
        Self {
            inner: Arc::new(Inner {
                storage,
                state: RwLock::new(SessionState::default()),
            }),
        }
    }

    /// Create a session store that only lives for this process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Set or clear the credential.
    ///
    /// `None` means logged out. Storage failures are logged; the in-memory
    /// state always reflects the call.
    pub fn set_credential(&self, token: Option<&str>) {
        {
            let mut state = self.write_state();
            state.token = token.map(str::to_string);
            state.loaded = true;
        }

        let persisted = match token {
            Some(token) => self.inner.storage.store(CREDENTIAL_KEY, token),
            None => self.inner.storage.remove(CREDENTIAL_KEY),
        };
        if let Err(e) = persisted {
            warn!("Failed to persist credential change: {}", e);
        }
    }

    /// Get the current credential.
    ///
    /// The first call without a prior [`set_credential`](Self::set_credential)
    /// loads the token from durable storage; the result is cached for the
    /// rest of the process lifetime.
    pub fn credential(&self) -> Option<String> {
        {
            let state = self.read_state();
            if state.loaded {
                return state.token.clone();
            }
        }

        let mut state = self.write_state();
        if !state.loaded {
            state.token = match self.inner.storage.load(CREDENTIAL_KEY) {
                Ok(token) => token,
                Err(e) => {
                    warn!("Failed to load stored credential: {}", e);
                    None
                }
            };
            state.loaded = true;
            debug!(found = state.token.is_some(), "Loaded credential from storage");
        }
        state.token.clone()
    }

    /// Record a completed login: the user profile and its credential.
    pub fn set_auth(&self, user: User, token: &str) {
        info!(user_id = user.id, "Session established");
        self.set_credential(Some(token));
        self.write_state().user = Some(user);
    }

    /// Forget both the user profile and the credential.
    pub fn clear_auth(&self) {
        self.write_state().user = None;
        self.set_credential(None);
        info!("Session cleared");
    }

    /// The logged-in user's profile, if the login handshake completed.
    pub fn user(&self) -> Option<User> {
        self.read_state().user.clone()
    }

    /// Whether a credential is present.
    pub fn is_authenticated(&self) -> bool {
        self.credential().is_some()
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read_state();
        f.debug_struct("SessionStore")
            .field("storage", &self.inner.storage)
            .field("has_token", &state.token.is_some())
            .field("loaded", &state.loaded)
            .field("user", &state.user.as_ref().map(|u| u.id))
            .finish()
    }
}
