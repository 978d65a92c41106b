//! Shared fixtures for app integration tests.
//!
//! Not every test binary uses every fixture.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use treehost_auth::{ApiClient, ApiTransport, AuthExchangeError};
use treehost_core::Identity;
use treehost_session::{
    LoginManager, MemorySessionStore, SessionManager, SessionObserver, SessionStore,
    SessionStoreError,
};
use treehost_views::{ViewActivationError, ViewCapability, ViewContext, ViewMetadata};

/// Endpoint accepted by the API client's policy check.
pub const TEST_ENDPOINT: &str = "https://api.genealogy.test/api.php";

/// Server body for an accepted exchange.
pub const ACCEPTED_BODY: &str = r#"[{"status":0,"user":{"id":42,"name":"Doe-42","displayName":"Jane Doe"}}]"#;

/// Server body for a rejected exchange.
pub const REJECTED_BODY: &str = r#"[{"status":1}]"#;

/// Creates the deterministic identity matching [`ACCEPTED_BODY`].
pub fn fixture_identity() -> Identity {
    serde_json::from_str(r#"{"id":42,"name":"Doe-42","displayName":"Jane Doe"}"#)
        .expect("identity fixture should decode")
}

/// Transport returning one fixed body and recording every form it sends.
pub struct StaticTransport {
    body: Result<String, String>,
    calls: Mutex<Vec<Vec<(String, String)>>>,
}

impl StaticTransport {
    /// Transport answering every request with `body`.
    pub fn responding(body: &str) -> Self {
        Self {
            body: Ok(body.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Transport failing every request with a transport error.
    pub fn failing(detail: &str) -> Self {
        Self {
            body: Err(detail.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of requests sent.
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("call log lock").len()
    }

    /// Returns the form fields of the first request.
    pub fn first_form(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .expect("call log lock")
            .first()
            .cloned()
            .expect("at least one request should have been sent")
    }
}

impl ApiTransport for StaticTransport {
    fn post_form(
        &self,
        _endpoint: &str,
        fields: &[(String, String)],
    ) -> Result<String, AuthExchangeError> {
        self.calls
            .lock()
            .expect("call log lock")
            .push(fields.to_vec());

        match &self.body {
            Ok(body) => Ok(body.clone()),
            Err(detail) => Err(AuthExchangeError::Transport(detail.clone())),
        }
    }
}

/// Session store wrapper counting mutations.
pub struct CountingStore {
    inner: MemorySessionStore,
    saves: Mutex<usize>,
    clears: Mutex<usize>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: MemorySessionStore::new(),
            saves: Mutex::new(0),
            clears: Mutex::new(0),
        }
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().expect("save counter lock")
    }

    pub fn clear_count(&self) -> usize {
        *self.clears.lock().expect("clear counter lock")
    }
}

impl SessionStore for CountingStore {
    fn load(&self) -> Option<Identity> {
        self.inner.load()
    }

    fn save(&self, identity: &Identity) -> Result<(), SessionStoreError> {
        *self.saves.lock().expect("save counter lock") += 1;
        self.inner.save(identity)
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        *self.clears.lock().expect("clear counter lock") += 1;
        self.inner.clear()
    }
}

/// One recorded lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn(String),
    Unlogged,
}

/// Observer recording every notification it receives.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().expect("event log lock").clone()
    }
}

impl SessionObserver for RecordingObserver {
    fn on_logged_in(&self, identity: &Identity) {
        self.events
            .lock()
            .expect("event log lock")
            .push(SessionEvent::LoggedIn(identity.name.clone()));
    }

    fn on_unlogged(&self) {
        self.events
            .lock()
            .expect("event log lock")
            .push(SessionEvent::Unlogged);
    }
}

/// View recording activations, optionally failing or disabled.
pub struct ProbeView {
    metadata: ViewMetadata,
    fail: bool,
    activations: Arc<Mutex<usize>>,
}

impl ProbeView {
    pub fn enabled(title: &str) -> Self {
        Self {
            metadata: ViewMetadata::new(title, "probe view"),
            fail: false,
            activations: Arc::new(Mutex::new(0)),
        }
    }

    pub fn disabled(title: &str) -> Self {
        Self {
            metadata: ViewMetadata::new(title, "probe view").disabled(),
            fail: false,
            activations: Arc::new(Mutex::new(0)),
        }
    }

    pub fn failing(title: &str) -> Self {
        Self {
            metadata: ViewMetadata::new(title, "probe view"),
            fail: true,
            activations: Arc::new(Mutex::new(0)),
        }
    }

    /// Shared activation counter, readable after the view is moved into a
    /// catalog.
    pub fn activation_counter(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.activations)
    }
}

impl ViewCapability for ProbeView {
    fn meta(&self) -> ViewMetadata {
        self.metadata.clone()
    }

    fn activate(&self, _context: &ViewContext) -> Result<(), ViewActivationError> {
        *self.activations.lock().expect("activation counter lock") += 1;
        if self.fail {
            return Err(ViewActivationError::Mount("probe failure".to_string()));
        }
        Ok(())
    }
}

/// Builds a session manager over an unlogged in-memory login manager.
pub fn unlogged_session() -> Arc<SessionManager> {
    let transport = Arc::new(StaticTransport::responding(REJECTED_BODY));
    let client =
        ApiClient::new(TEST_ENDPOINT, "TA-test", transport).expect("client should build");

    let mut login = LoginManager::new(Arc::new(MemorySessionStore::new()));
    login.init();

    Arc::new(SessionManager::new(client, Arc::new(Mutex::new(login))))
}
