#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use koimeret::api::FarmClient;
use koimeret::config::Settings;
use koimeret::context::{AppContext, Navigator, RecordingNavigator, Route};
use koimeret::session::{CredentialStorage, MemoryStorage, SessionStore, StorageError};
use wiremock::MockServer;

pub const API_PREFIX: &str = "/api/v1";

/// Full path of an endpoint on the stub backend.
pub fn api(endpoint: &str) -> String {
    format!("{}{}", API_PREFIX, endpoint)
}

pub fn base_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), API_PREFIX)
}

/// A client over in-memory storage, optionally already holding a token.
pub fn client(server: &MockServer, token: Option<&str>) -> FarmClient {
    let session = SessionStore::in_memory();
    session.set_credential(token);
    FarmClient::new(&base_url(server), session).unwrap()
}

pub fn context(
    server: &MockServer,
    storage: Arc<dyn CredentialStorage>,
    navigator: Arc<dyn Navigator>,
) -> AppContext {
    let settings = Settings {
        api_url: base_url(server),
        ..Settings::default()
    };
    AppContext::new(settings, storage, navigator).unwrap()
}

/// A context whose storage already holds `token`.
pub fn logged_in_context(
    server: &MockServer,
    token: &str,
) -> (AppContext, MemoryStorage, RecordingNavigator) {
    let storage = MemoryStorage::new();
    storage.store("auth_token", token).unwrap();
    let navigator = RecordingNavigator::new();
    let ctx = context(server, Arc::new(storage.clone()), Arc::new(navigator.clone()));
    (ctx, storage, navigator)
}

/// Shared, ordered record of side effects.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Storage that records removals in an [`EventLog`].
#[derive(Debug, Clone)]
pub struct LoggingStorage {
    pub inner: MemoryStorage,
    pub log: EventLog,
}

impl CredentialStorage for LoggingStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.load(key)
    }

    fn store(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.store(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.log.push(format!("remove {}", key));
        self.inner.remove(key)
    }
}

/// Navigator that records navigations in an [`EventLog`].
#[derive(Debug, Clone)]
pub struct LoggingNavigator {
    pub log: EventLog,
}

impl Navigator for LoggingNavigator {
    fn navigate(&self, route: Route) {
        self.log.push(format!("navigate {}", route.path()));
    }
}
