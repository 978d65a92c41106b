#![warn(missing_docs)]
//! # treehost-app
//!
//! ## Purpose
//! Orchestrates the page-load bootstrap: credential exchange, session
//! initialization, catalog filtering, and activation of exactly one view.
//!
//! ## Responsibilities
//! - Consume a one-time authorization code from the host URL at most once
//!   per bootstrap and scrub it after a successful exchange.
//! - Initialize the login manager from the session store, after the
//!   exchange has fully completed, and project lifecycle events into UI
//!   state.
//! - Construct the filtered view catalog and the registry over the session
//!   manager, then render the selected view.
//!
//! ## Data flow
//! Host URL + config -> [`bootstrap`] -> [`TreeHost`] application context ->
//! [`TreeHost::render_initial_view`] mounts the resolved view and projects
//! the outcome into [`treehost_ui::UiState`].
//!
//! ## Ownership and lifetimes
//! The returned [`TreeHost`] owns the registry and shares the login manager
//! and UI state behind `Arc`, replacing the original's global registry
//! variable with an explicit context object.
//!
//! ## Error model
//! Exchange and storage failures degrade to a logged-out bootstrap with a
//! warning; catalog construction and view activation failures surface as
//! [`AppError`] because no safe fallback view exists.
//!
//! ## Security and privacy notes
//! Authorization codes are consumed, stripped from the URL, and never
//! logged; UI projection retains only the public display name.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{info, warn};
use treehost_auth::{
    ApiClient, ApiTransport, AuthExchangeError, CredentialBridge, extract_auth_code,
    strip_auth_code,
};
use treehost_core::Identity;
use treehost_session::{
    FileSessionStore, LoginManager, SessionManager, SessionObserver, SessionStore,
};
use treehost_ui::UiState;
use treehost_views::{
    ActiveView, CatalogError, FileViewPreferences, ViewCapability, ViewCatalog, ViewPreferences,
    ViewRegistry, ViewRegistryError,
};
use url::Url;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("TREEHOST_VERSION");

/// Default remote genealogy API endpoint.
pub const DEFAULT_API_ENDPOINT: &str = "https://api.wikitree.com/api.php";

/// Fixed application identifier sent with every API action.
pub const DEFAULT_APP_ID: &str = "TA-wt-dynamic-tree";

/// Environment variable overriding the API endpoint.
pub const API_ENDPOINT_ENV_VAR: &str = "TREEHOST_API_ENDPOINT";

/// Environment variable overriding the profile directory.
pub const PROFILE_DIR_ENV_VAR: &str = "TREEHOST_PROFILE_DIR";

/// URL query parameter naming the requested view.
pub const VIEW_KEYWORD_PARAM: &str = "view";

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Host configuration resolved before bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Remote identity-exchange endpoint.
    pub api_endpoint: String,
    /// Fixed application identifier.
    pub app_id: String,
    /// Directory holding the identity record and view preference.
    pub profile_dir: PathBuf,
}

impl HostConfig {
    /// Creates a config with default endpoint and app id over the given
    /// profile directory.
    pub fn new(profile_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            app_id: DEFAULT_APP_ID.to_string(),
            profile_dir: profile_dir.into(),
        }
    }

    /// Resolves configuration from the environment.
    ///
    /// `TREEHOST_API_ENDPOINT` overrides the exchange endpoint and
    /// `TREEHOST_PROFILE_DIR` the storage directory; the default profile
    /// directory is `treehost/` under the platform data dir.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] when no profile directory can be
    /// determined.
    pub fn from_env() -> Result<Self, AppError> {
        let profile_dir = match std::env::var(PROFILE_DIR_ENV_VAR) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => dirs::data_dir()
                .map(|dir| dir.join("treehost"))
                .ok_or_else(|| {
                    AppError::Config(format!(
                        "no platform data directory; set {PROFILE_DIR_ENV_VAR}"
                    ))
                })?,
        };

        let mut config = Self::new(profile_dir);
        if let Ok(endpoint) = std::env::var(API_ENDPOINT_ENV_VAR)
            && !endpoint.trim().is_empty()
        {
            config.api_endpoint = endpoint;
        }

        Ok(config)
    }
}

/// Extracts the requested view keyword from the host URL.
pub fn view_keyword_from_url(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == VIEW_KEYWORD_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|keyword| !keyword.trim().is_empty())
}

/// Consumes a one-time authorization code from the host URL, at most once.
///
/// When a code is present, performs the exchange and persists the resulting
/// identity **before** returning, so a subsequent
/// [`LoginManager::init`] read observes it. On success the returned URL has
/// the code stripped; on failure the bootstrap continues logged-out and the
/// session store is untouched.
pub fn consume_auth_code(
    bridge: &CredentialBridge,
    store: &dyn SessionStore,
    page_url: &Url,
) -> Url {
    let Some(code) = extract_auth_code(page_url) else {
        return page_url.clone();
    };

    match bridge.exchange_auth_code(&code) {
        Ok(identity) => {
            if let Err(error) = store.save(&identity) {
                warn!(%error, "identity persistence failed after exchange");
            }
            info!("authorization code exchange succeeded");
            strip_auth_code(page_url)
        }
        Err(error) => {
            warn!(%error, "authorization code exchange failed; continuing logged out");
            page_url.clone()
        }
    }
}

/// Session observer projecting lifecycle events into shared UI state.
pub struct UiSessionObserver {
    ui: Arc<Mutex<UiState>>,
}

impl UiSessionObserver {
    /// Creates an observer over the shared UI state.
    pub fn new(ui: Arc<Mutex<UiState>>) -> Self {
        Self { ui }
    }
}

impl SessionObserver for UiSessionObserver {
    fn on_logged_in(&self, identity: &Identity) {
        let mut ui = self.ui.lock().unwrap_or_else(PoisonError::into_inner);
        ui.apply_logged_in(identity.display());
    }

    fn on_unlogged(&self) {
        let mut ui = self.ui.lock().unwrap_or_else(PoisonError::into_inner);
        ui.apply_unlogged();
    }
}

/// Application context returned by [`bootstrap`].
///
/// Replaces the original's global registry variable: everything the host
/// page needs (UI state, session handle, logout control, the scrubbed URL)
/// hangs off this explicit object.
pub struct TreeHost {
    ui: Arc<Mutex<UiState>>,
    session: Arc<SessionManager>,
    login: Arc<Mutex<LoginManager>>,
    registry: ViewRegistry,
    page_url: Url,
}

impl TreeHost {
    /// Returns the shared UI state handle.
    pub fn ui(&self) -> Arc<Mutex<UiState>> {
        Arc::clone(&self.ui)
    }

    /// Returns an owned snapshot of the current UI state.
    pub fn ui_snapshot(&self) -> UiState {
        self.ui
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the session handle supplied to views.
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Returns the registry over the filtered catalog.
    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    /// Returns the host URL with any consumed authorization code removed.
    pub fn page_url(&self) -> &Url {
        &self.page_url
    }

    /// Logout control action: clears the session and notifies subscribers.
    ///
    /// A poisoned lock is recovered so the transition always happens.
    pub fn logout(&self) {
        self.login
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .logout();
    }

    /// Renders the single initial view, called once after bootstrap.
    ///
    /// The requested keyword is read from the host URL; resolution falls
    /// back to the persisted last-used view, then the catalog default. The
    /// outcome is projected into UI state either way.
    ///
    /// # Errors
    /// Returns [`AppError::View`] when activation fails; no second view is
    /// attempted and the failure is visible in the UI error banner.
    pub fn render_initial_view(&self) -> Result<ActiveView, AppError> {
        let requested = view_keyword_from_url(&self.page_url);

        match self.registry.render(requested.as_deref()) {
            Ok(active) => {
                let mut ui = self.ui.lock().unwrap_or_else(PoisonError::into_inner);
                ui.apply_view_active(active.keyword.clone());
                Ok(active)
            }
            Err(error) => {
                let mut ui = self.ui.lock().unwrap_or_else(PoisonError::into_inner);
                ui.apply_view_failure(error.to_string());
                Err(AppError::View(error))
            }
        }
    }
}

/// Bootstraps the host with durable profile-directory stores.
///
/// # Errors
/// Returns [`AppError::Auth`] for an invalid endpoint/app id and
/// [`AppError::Catalog`] when the view registration is malformed.
pub fn bootstrap(
    config: &HostConfig,
    page_url: &Url,
    views: Vec<(String, Arc<dyn ViewCapability>)>,
    transport: Arc<dyn ApiTransport>,
) -> Result<TreeHost, AppError> {
    let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(&config.profile_dir));
    let preferences: Arc<dyn ViewPreferences> =
        Arc::new(FileViewPreferences::new(&config.profile_dir));
    bootstrap_with_stores(config, page_url, views, transport, store, preferences)
}

/// Bootstraps the host over caller-supplied stores.
///
/// Control flow, in order: at-most-once credential exchange (persisting the
/// identity before anything reads it), login-manager initialization with
/// the UI observer subscribed, catalog filtering, registry construction.
/// No view activates before the login manager reaches its terminal initial
/// state; call [`TreeHost::render_initial_view`] afterwards.
///
/// # Errors
/// Returns [`AppError::Auth`] for an invalid endpoint/app id and
/// [`AppError::Catalog`] when the view registration is malformed.
pub fn bootstrap_with_stores(
    config: &HostConfig,
    page_url: &Url,
    views: Vec<(String, Arc<dyn ViewCapability>)>,
    transport: Arc<dyn ApiTransport>,
    store: Arc<dyn SessionStore>,
    preferences: Arc<dyn ViewPreferences>,
) -> Result<TreeHost, AppError> {
    let client = ApiClient::new(&config.api_endpoint, &config.app_id, transport)?;
    let bridge = CredentialBridge::new(client.clone());

    // Exchange and persistence complete before init() reads the store.
    let page_url = consume_auth_code(&bridge, store.as_ref(), page_url);

    let ui = Arc::new(Mutex::new(UiState::new(APP_VERSION)));

    let mut login = LoginManager::new(store);
    login.subscribe(Arc::new(UiSessionObserver::new(Arc::clone(&ui))));
    login.init();
    let login = Arc::new(Mutex::new(login));

    let session = Arc::new(SessionManager::new(client, Arc::clone(&login)));
    let catalog = ViewCatalog::from_entries(views)?;
    let registry = ViewRegistry::new(catalog, Arc::clone(&session), preferences);

    Ok(TreeHost {
        ui,
        session,
        login,
        registry,
        page_url,
    })
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Host configuration could not be resolved.
    #[error("config error: {0}")]
    Config(String),
    /// Credential bridge or API client error.
    #[error("auth error: {0}")]
    Auth(#[from] AuthExchangeError),
    /// View catalog construction error.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    /// View registry resolution/activation error.
    #[error("view error: {0}")]
    View(#[from] ViewRegistryError),
}
