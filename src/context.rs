//! The application context.
//!
//! [`AppContext`] is built once at start-up and handed to everything that
//! needs the API. It owns the settings, the session, the client and the
//! navigator, and it is the single place that turns an authentication
//! failure into a redirect to the login screen.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

use crate::api::{ApiError, FarmClient, LogoutOutcome, User};
use crate::config::{CredentialBackend, Role, Settings};
use crate::error::Result;
use crate::session::{CredentialStorage, FileStorage, KeyringStorage, MemoryStorage, SessionStore};

/// A navigation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The login entry point.
    Login,
    /// The owner dashboard.
    Owner,
    /// The worker dashboard.
    Worker,
}

impl Route {
    /// The home route for a role.
    pub fn home(role: Role) -> Self {
        match role {
            Role::Owner => Route::Owner,
            Role::Worker => Route::Worker,
        }
    }

    /// The path of this route.
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Owner => "/owner",
            Route::Worker => "/worker",
        }
    }
}

/// Performs navigation on behalf of the error boundary.
pub trait Navigator: Send + Sync {
    /// Navigate to `route`.
    fn navigate(&self, route: Route);
}

/// A navigator that only records where it was sent.
///
/// Used by front ends with no navigation of their own (the CLI reports the
/// last route instead) and by tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    routes: Arc<Mutex<Vec<Route>>>,
}

impl RecordingNavigator {
    /// Create a navigator with an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every route navigated to, oldest first.
    pub fn history(&self) -> Vec<Route> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent route, if any.
    pub fn current(&self) -> Option<Route> {
        self.history().last().copied()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route);
    }
}

/// Shared state for one running application.
#[derive(Clone)]
pub struct AppContext {
    settings: Settings,
    session: SessionStore,
    client: FarmClient,
    navigator: Arc<dyn Navigator>,
}

impl AppContext {
    /// Build the context over an explicit storage backend.
    ///
    /// The credential is rehydrated from storage before this returns.
    pub fn new(
        settings: Settings,
        storage: Arc<dyn CredentialStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        settings.validate()?;

        let session = SessionStore::new(storage);
        let rehydrated = session.credential().is_some();
        let client = FarmClient::new(&settings.api_url, session.clone())?;

        info!(
            api_url = %client.base_url(),
            rehydrated,
            "Application context ready"
        );

        Ok(Self {
            settings,
            session,
            client,
            navigator,
        })
    }

    /// Build the context using the storage backend named in the settings.
    pub fn from_settings(settings: Settings, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let storage: Arc<dyn CredentialStorage> = match settings.credential_store {
            CredentialBackend::Keyring => Arc::new(KeyringStorage::new()),
            CredentialBackend::File => Arc::new(FileStorage::default_location()?),
            CredentialBackend::Memory => Arc::new(MemoryStorage::new()),
        };
        Self::new(settings, storage, navigator)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn client(&self) -> &FarmClient {
        &self.client
    }

    /// Where a logged-in user lands.
    pub fn home_route(&self) -> Route {
        Route::home(self.settings.default_role)
    }

    /// Log in and navigate home.
    pub async fn login(
        &self,
        identifier: &str,
        secret: &str,
    ) -> std::result::Result<User, ApiError> {
        let user = self.client.sign_in(identifier, secret).await?;
        self.navigator.navigate(self.home_route());
        Ok(user)
    }

    /// Log out and navigate to the login screen.
    pub async fn logout(&self) -> LogoutOutcome {
        let outcome = self.client.logout().await;
        self.navigator.navigate(Route::Login);
        outcome
    }

    /// The error boundary.
    ///
    /// An authentication failure has already cleared the session inside the
    /// client; here it is turned into a single redirect to the login screen.
    /// Returns whether the error ended the session.
    pub fn handle_error(&self, error: &ApiError) -> bool {
        if error.is_unauthenticated() {
            warn!("Session expired, redirecting to login");
            self.navigator.navigate(Route::Login);
            true
        } else {
            false
        }
    }

    /// Pass `result` through the error boundary.
    pub fn guard<T>(
        &self,
        result: std::result::Result<T, ApiError>,
    ) -> std::result::Result<T, ApiError> {
        if let Err(ref e) = result {
            self.handle_error(e);
        }
        result
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("settings", &self.settings)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
