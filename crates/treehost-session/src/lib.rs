#![warn(missing_docs)]
//! # treehost-session
//!
//! ## Purpose
//! Implements the session cache and login lifecycle handling for `treehost`.
//!
//! ## Responsibilities
//! - Persist the authenticated identity through a [`SessionStore`]
//!   abstraction with durable and in-memory implementations.
//! - Model the login/logout state machine with explicit legal transitions
//!   and a typed multi-subscriber notification interface.
//! - Couple login state to the API client handle through [`SessionManager`]
//!   so views never touch the store or manager directly.
//!
//! ## Data flow
//! Credential bridge persists an identity -> [`LoginManager::init`] reads
//! the store and notifies subscribers -> views query
//! [`SessionManager::identity`] per call, so a later logout is observed
//! immediately.
//!
//! ## Ownership and lifetimes
//! Identity values are owned snapshots; the login manager is shared behind
//! `Arc<Mutex<_>>` so the session manager and host controls observe one
//! state without borrowing across the view boundary.
//!
//! ## Error model
//! Storage write failures surface as [`SessionStoreError`] to callers of the
//! store; the login manager itself never fails — degraded writes are logged
//! and the state transition proceeds.
//!
//! ## Security and privacy notes
//! Log lines record failure categories only, never identity payloads or
//! tokens. A corrupt stored record is treated as logged-out, not an error.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use treehost_core::SessionState;
//! use treehost_session::{LoginManager, MemorySessionStore};
//!
//! let mut manager = LoginManager::new(Arc::new(MemorySessionStore::new()));
//! manager.init();
//! assert!(matches!(manager.state(), SessionState::Unlogged));
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, warn};
use treehost_auth::ApiClient;
use treehost_core::{IDENTITY_STORAGE_KEY, Identity, SessionState};

/// File name of the durable identity record inside the profile directory.
///
/// Derived from [`IDENTITY_STORAGE_KEY`]; stored sessions written under the
/// old key remain readable across upgrades.
pub const SESSION_FILE_NAME: &str = "wikitreeUser.json";

/// Process-wide cache of the current authenticated identity.
///
/// `save` and `clear` are the only mutators; both are synchronous and
/// idempotent. `load` treats corrupt or absent records as "no identity".
pub trait SessionStore: Send + Sync {
    /// Loads the persisted identity, or `None` when absent or corrupt.
    fn load(&self) -> Option<Identity>;

    /// Persists one identity, replacing any previous record.
    ///
    /// # Errors
    /// Returns [`SessionStoreError`] on encode or I/O failure.
    fn save(&self, identity: &Identity) -> Result<(), SessionStoreError>;

    /// Removes the persisted identity. Clearing an absent record succeeds.
    ///
    /// # Errors
    /// Returns [`SessionStoreError::Io`] on I/O failure.
    fn clear(&self) -> Result<(), SessionStoreError>;
}

/// Durable store writing one JSON document into a profile directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Creates a store rooted at `profile_dir`.
    pub fn new(profile_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: profile_dir.into().join(SESSION_FILE_NAME),
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<Identity> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return None,
            Err(error) => {
                debug!(kind = %error.kind(), "identity record unreadable; treating as logged out");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(identity) => Some(identity),
            Err(_) => {
                debug!("identity record corrupt; treating as logged out");
                None
            }
        }
    }

    fn save(&self, identity: &Identity) -> Result<(), SessionStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| SessionStoreError::Io(error.to_string()))?;
        }

        let encoded = serde_json::to_string(identity)?;
        fs::write(&self.path, encoded).map_err(|error| SessionStoreError::Io(error.to_string()))
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(SessionStoreError::Io(error.to_string())),
        }
    }
}

/// Deterministic in-process store for tests and CI.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    identity: Mutex<Option<Identity>>,
}

impl MemorySessionStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with one identity.
    pub fn with_identity(identity: Identity) -> Self {
        Self {
            identity: Mutex::new(Some(identity)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<Identity> {
        self.identity
            .lock()
            .map(|slot| slot.clone())
            .unwrap_or(None)
    }

    fn save(&self, identity: &Identity) -> Result<(), SessionStoreError> {
        let mut slot = self
            .identity
            .lock()
            .map_err(|_| SessionStoreError::Io("session slot lock poisoned".to_string()))?;
        *slot = Some(identity.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        let mut slot = self
            .identity
            .lock()
            .map_err(|_| SessionStoreError::Io("session slot lock poisoned".to_string()))?;
        *slot = None;
        Ok(())
    }
}

/// Handle identifying one registered session observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Lifecycle notifications emitted by the login manager.
///
/// Each transition notifies every subscriber exactly once with the
/// post-transition state; implementations must not assume they are safe to
/// call twice per transition.
pub trait SessionObserver: Send + Sync {
    /// The manager reached `LoggedIn` with the given identity.
    fn on_logged_in(&self, identity: &Identity);

    /// The manager reached `Unlogged`.
    fn on_unlogged(&self);
}

/// Login/logout state machine owning the session state.
///
/// Transitions through this type are the only legal mutation path for
/// [`SessionState`].
pub struct LoginManager {
    store: Arc<dyn SessionStore>,
    state: SessionState,
    subscribers: Vec<(SubscriberId, Arc<dyn SessionObserver>)>,
    next_subscriber: u64,
}

impl LoginManager {
    /// Creates a manager in `Unlogged` state over the given store.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            state: SessionState::Unlogged,
            subscribers: Vec::new(),
            next_subscriber: 0,
        }
    }

    /// Returns the current session state snapshot.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Returns the active identity, if any.
    pub fn identity(&self) -> Option<&Identity> {
        self.state.identity()
    }

    /// Registers one observer; notification order is registration order.
    pub fn subscribe(&mut self, observer: Arc<dyn SessionObserver>) -> SubscriberId {
        let id = SubscriberId(self.next_subscriber);
        self.next_subscriber += 1;
        self.subscribers.push((id, observer));
        id
    }

    /// Removes one observer; returns `false` when the id is unknown.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    /// Initializes state from the session store and notifies subscribers.
    ///
    /// Reads local storage only; never touches the network. A persisted
    /// identity transitions to `LoggedIn`, otherwise the manager stays
    /// `Unlogged`. Fires exactly one lifecycle notification either way.
    pub fn init(&mut self) {
        match self.store.load() {
            Some(identity) => {
                self.state = SessionState::LoggedIn(identity);
                self.notify_logged_in();
            }
            None => {
                self.state = SessionState::Unlogged;
                self.notify_unlogged();
            }
        }
    }

    /// Completes an external login after a successful credential exchange.
    ///
    /// Persists the identity and transitions to `LoggedIn`. Supplying the
    /// identity already active skips the redundant store write; the UI
    /// refresh notification still fires once.
    pub fn complete_external_login(&mut self, identity: Identity) {
        let unchanged = matches!(
            &self.state,
            SessionState::LoggedIn(current) if *current == identity
        );

        if !unchanged && let Err(error) = self.store.save(&identity) {
            warn!(%error, "identity persistence failed; session remains in-memory only");
        }

        self.state = SessionState::LoggedIn(identity);
        self.notify_logged_in();
    }

    /// Clears the session store, transitions to `Unlogged`, and notifies.
    ///
    /// Never fails: a storage failure is logged and the transition proceeds,
    /// so no consumer keeps observing a stale identity.
    pub fn logout(&mut self) {
        if let Err(error) = self.store.clear() {
            warn!(%error, "session clear failed; proceeding with logout transition");
        }

        self.state = SessionState::Unlogged;
        self.notify_unlogged();
    }

    fn notify_logged_in(&self) {
        if let SessionState::LoggedIn(identity) = &self.state {
            for (_, observer) in &self.subscribers {
                observer.on_logged_in(identity);
            }
        }
    }

    fn notify_unlogged(&self) {
        for (_, observer) in &self.subscribers {
            observer.on_unlogged();
        }
    }
}

/// Thin coupling object handed to views.
///
/// A view never talks to the login manager or session store directly; it
/// asks this handle, so login state may change after the view has mounted
/// without the view re-subscribing to raw storage events.
#[derive(Clone)]
pub struct SessionManager {
    api: ApiClient,
    login: Arc<Mutex<LoginManager>>,
}

impl SessionManager {
    /// Creates the coupling over a shared login manager and API client.
    pub fn new(api: ApiClient, login: Arc<Mutex<LoginManager>>) -> Self {
        Self { api, login }
    }

    /// Returns a snapshot of the current identity, if logged in.
    ///
    /// A poisoned lock is recovered; session state stays readable after a
    /// panicked observer.
    pub fn identity(&self) -> Option<Identity> {
        self.login
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .identity()
            .cloned()
    }

    /// Returns `true` when an identity is currently active.
    pub fn is_logged_in(&self) -> bool {
        self.identity().is_some()
    }

    /// Returns the API client handle for authenticated calls.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Requests a logout transition on the shared login manager.
    ///
    /// A poisoned lock is recovered so the transition always happens.
    pub fn logout(&self) {
        self.login
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .logout();
    }
}

/// Errors produced by session store mutations.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// Filesystem or lock failure.
    #[error("session store io failure: {0}")]
    Io(String),
    /// Identity serialization failure.
    #[error("session store encode failure: {0}")]
    Encode(#[from] serde_json::Error),
}
