#![warn(missing_docs)]
//! # treehost-views
//!
//! ## Purpose
//! Defines the pluggable view contract, the filtered view catalog, and the
//! registry that selects and activates exactly one view per host load.
//!
//! ## Responsibilities
//! - Describe views through a polymorphic [`ViewCapability`] interface.
//! - Build the catalog once, pruning entries whose metadata reports
//!   `disabled`.
//! - Resolve the active view by precedence (requested keyword, then
//!   persisted last-used keyword, then first catalog entry) and activate it.
//! - Persist the last-used keyword only after the view activates.
//!
//! ## Data flow
//! Host registers keyword/instance pairs -> [`ViewCatalog::from_entries`]
//! filters them -> [`ViewRegistry::render`] resolves one descriptor and
//! activates it with a [`ViewContext`] carrying the session handle.
//!
//! ## Ownership and lifetimes
//! View instances are shared `Arc<dyn ViewCapability>` values; descriptors
//! own their keyword and metadata so the catalog is immutable after
//! construction.
//!
//! ## Error model
//! Duplicate keywords fail construction with [`CatalogError`]; activation
//! failures surface as [`ViewRegistryError::Activation`] with no automatic
//! fallback to a second view.
//!
//! ## Security and privacy notes
//! Views obtain identity exclusively through the supplied session handle;
//! this crate stores no credentials and logs keywords only.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::warn;
use treehost_session::SessionManager;

/// File name of the persisted last-used-view preference.
pub const PREFERENCE_FILE_NAME: &str = "lastView.json";

/// Self-description a view returns before activation.
///
/// `meta()` must be pure: no side effects, safe to call on a never-activated
/// instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewMetadata {
    /// Short human-readable view title.
    pub title: String,
    /// One-line description shown in host chrome.
    pub description: String,
    /// When `true`, the view is pruned from the catalog at construction.
    pub disabled: bool,
}

impl ViewMetadata {
    /// Creates enabled metadata.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            disabled: false,
        }
    }

    /// Marks this metadata as disabled.
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// Context supplied to a view at activation time.
///
/// The session handle is the only sanctioned path to the current identity
/// and the API client.
#[derive(Clone)]
pub struct ViewContext {
    session: Arc<SessionManager>,
    keyword: String,
}

impl ViewContext {
    /// Creates an activation context for the resolved keyword.
    pub fn new(session: Arc<SessionManager>, keyword: impl Into<String>) -> Self {
        Self {
            session,
            keyword: keyword.into(),
        }
    }

    /// Returns the session handle for identity and API access.
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Returns the keyword this view was activated under.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }
}

/// Capability interface implemented by each view variant.
pub trait ViewCapability: Send + Sync {
    /// Returns the view's self-description. Must be side-effect free.
    fn meta(&self) -> ViewMetadata;

    /// Mounts the view using the supplied session context.
    ///
    /// # Errors
    /// Returns [`ViewActivationError`] when the view cannot mount; the
    /// registry surfaces this without trying another view.
    fn activate(&self, context: &ViewContext) -> Result<(), ViewActivationError>;
}

/// One catalog entry: keyword, metadata snapshot, and the view instance.
///
/// Immutable after catalog construction.
#[derive(Clone)]
pub struct ViewDescriptor {
    keyword: String,
    metadata: ViewMetadata,
    instance: Arc<dyn ViewCapability>,
}

impl ViewDescriptor {
    /// Returns the unique catalog keyword.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Returns the metadata captured at construction time.
    pub fn metadata(&self) -> &ViewMetadata {
        &self.metadata
    }

    /// Returns the view instance.
    pub fn instance(&self) -> &Arc<dyn ViewCapability> {
        &self.instance
    }
}

/// Ordered keyword -> descriptor mapping; insertion order defines the
/// default view.
pub struct ViewCatalog {
    entries: Vec<ViewDescriptor>,
}

impl ViewCatalog {
    /// Builds the filtered catalog from ordered keyword/instance pairs.
    ///
    /// Each instance's `meta()` is queried exactly once; entries reporting
    /// `disabled` are dropped and stay unavailable for the host lifetime.
    ///
    /// # Errors
    /// Returns [`CatalogError::EmptyKeyword`] for a blank keyword and
    /// [`CatalogError::DuplicateKeyword`] when two enabled entries share
    /// one keyword.
    pub fn from_entries(
        entries: Vec<(String, Arc<dyn ViewCapability>)>,
    ) -> Result<Self, CatalogError> {
        let mut filtered: Vec<ViewDescriptor> = Vec::with_capacity(entries.len());

        for (keyword, instance) in entries {
            if keyword.trim().is_empty() {
                return Err(CatalogError::EmptyKeyword);
            }

            let metadata = instance.meta();
            if metadata.disabled {
                continue;
            }

            if filtered.iter().any(|existing| existing.keyword == keyword) {
                return Err(CatalogError::DuplicateKeyword(keyword));
            }

            filtered.push(ViewDescriptor {
                keyword,
                metadata,
                instance,
            });
        }

        Ok(Self { entries: filtered })
    }

    /// Returns the descriptor registered under `keyword`.
    pub fn get(&self, keyword: &str) -> Option<&ViewDescriptor> {
        self.entries.iter().find(|entry| entry.keyword == keyword)
    }

    /// Returns `true` when `keyword` resolves to an enabled view.
    pub fn contains(&self, keyword: &str) -> bool {
        self.get(keyword).is_some()
    }

    /// Returns the default descriptor (first insertion-order entry).
    pub fn first(&self) -> Option<&ViewDescriptor> {
        self.entries.first()
    }

    /// Returns the enabled keywords in insertion order.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.keyword.as_str())
    }

    /// Returns the number of enabled views.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no enabled view survived filtering.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Persisted "last used view" preference.
pub trait ViewPreferences: Send + Sync {
    /// Returns the last remembered keyword, or `None` when absent/corrupt.
    fn last_used(&self) -> Option<String>;

    /// Remembers one keyword for future visits without an explicit request.
    ///
    /// # Errors
    /// Returns [`PreferenceError`] on encode or I/O failure.
    fn remember(&self, keyword: &str) -> Result<(), PreferenceError>;
}

/// Durable preference store writing one JSON document into a profile
/// directory.
#[derive(Debug, Clone)]
pub struct FileViewPreferences {
    path: PathBuf,
}

impl FileViewPreferences {
    /// Creates a preference store rooted at `profile_dir`.
    pub fn new(profile_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: profile_dir.into().join(PREFERENCE_FILE_NAME),
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ViewPreferences for FileViewPreferences {
    fn last_used(&self) -> Option<String> {
        let raw = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    fn remember(&self, keyword: &str) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| PreferenceError::Io(error.to_string()))?;
        }

        let encoded = serde_json::to_string(keyword)?;
        fs::write(&self.path, encoded).map_err(|error| PreferenceError::Io(error.to_string()))
    }
}

/// Deterministic in-process preference store for tests and CI.
#[derive(Debug, Default)]
pub struct MemoryViewPreferences {
    keyword: Mutex<Option<String>>,
}

impl MemoryViewPreferences {
    /// Creates an empty preference store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with one keyword.
    pub fn with_keyword(keyword: impl Into<String>) -> Self {
        Self {
            keyword: Mutex::new(Some(keyword.into())),
        }
    }
}

impl ViewPreferences for MemoryViewPreferences {
    fn last_used(&self) -> Option<String> {
        self.keyword.lock().map(|slot| slot.clone()).unwrap_or(None)
    }

    fn remember(&self, keyword: &str) -> Result<(), PreferenceError> {
        let mut slot = self
            .keyword
            .lock()
            .map_err(|_| PreferenceError::Io("preference slot lock poisoned".to_string()))?;
        *slot = Some(keyword.to_string());
        Ok(())
    }
}

/// Which precedence rule selected the active view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// The explicitly requested (URL) keyword was enabled.
    Requested,
    /// The persisted last-used keyword was enabled.
    LastUsed,
    /// Fell back to the catalog's first insertion-order entry.
    Default,
}

/// Outcome of one successful resolution/activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveView {
    /// Keyword of the activated view.
    pub keyword: String,
    /// Precedence rule that selected it.
    pub matched_by: MatchRule,
}

/// Selects one view from the filtered catalog and activates it.
pub struct ViewRegistry {
    catalog: ViewCatalog,
    session: Arc<SessionManager>,
    preferences: Arc<dyn ViewPreferences>,
}

impl ViewRegistry {
    /// Creates a registry over an already-filtered catalog.
    pub fn new(
        catalog: ViewCatalog,
        session: Arc<SessionManager>,
        preferences: Arc<dyn ViewPreferences>,
    ) -> Self {
        Self {
            catalog,
            session,
            preferences,
        }
    }

    /// Returns the filtered catalog.
    pub fn catalog(&self) -> &ViewCatalog {
        &self.catalog
    }

    /// Resolves the target keyword without activating anything.
    ///
    /// Precedence: `requested` when present in the catalog, else the
    /// persisted last-used keyword when present, else the first catalog
    /// entry. A requested keyword naming a removed or unknown entry falls
    /// through the chain rather than erroring.
    ///
    /// # Errors
    /// Returns [`ViewRegistryError::EmptyCatalog`] when filtering left no
    /// enabled view.
    pub fn resolve(&self, requested: Option<&str>) -> Result<ActiveView, ViewRegistryError> {
        self.resolve_descriptor(requested)
            .map(|(descriptor, matched_by)| ActiveView {
                keyword: descriptor.keyword().to_string(),
                matched_by,
            })
    }

    /// Renders the host's single view: resolve, activate, then persist the
    /// keyword as last-used.
    ///
    /// The preference write happens only after the view activates, never
    /// speculatively; a write failure is logged and does not undo the
    /// activation.
    ///
    /// # Errors
    /// Returns [`ViewRegistryError::EmptyCatalog`] when no view is enabled
    /// and [`ViewRegistryError::Activation`] when the resolved view fails to
    /// mount. No second view is attempted.
    pub fn render(&self, requested: Option<&str>) -> Result<ActiveView, ViewRegistryError> {
        let (descriptor, matched_by) = self.resolve_descriptor(requested)?;
        let keyword = descriptor.keyword().to_string();

        let context = ViewContext::new(Arc::clone(&self.session), keyword.clone());
        descriptor
            .instance()
            .activate(&context)
            .map_err(|source| ViewRegistryError::Activation {
                keyword: keyword.clone(),
                source,
            })?;

        if let Err(error) = self.preferences.remember(&keyword) {
            warn!(%error, keyword, "last-used view preference write failed");
        }

        Ok(ActiveView {
            keyword,
            matched_by,
        })
    }

    fn resolve_descriptor(
        &self,
        requested: Option<&str>,
    ) -> Result<(&ViewDescriptor, MatchRule), ViewRegistryError> {
        if let Some(keyword) = requested
            && let Some(descriptor) = self.catalog.get(keyword)
        {
            return Ok((descriptor, MatchRule::Requested));
        }

        if let Some(keyword) = self.preferences.last_used()
            && let Some(descriptor) = self.catalog.get(&keyword)
        {
            return Ok((descriptor, MatchRule::LastUsed));
        }

        self.catalog
            .first()
            .map(|descriptor| (descriptor, MatchRule::Default))
            .ok_or(ViewRegistryError::EmptyCatalog)
    }
}

/// Catalog construction errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Keywords must be non-blank.
    #[error("view keyword must be non-empty")]
    EmptyKeyword,
    /// Two enabled entries registered the same keyword.
    #[error("duplicate view keyword: {0}")]
    DuplicateKeyword(String),
}

/// Failure reported by a view during activation.
#[derive(Debug, Error)]
pub enum ViewActivationError {
    /// The view failed while mounting into the host surface.
    #[error("view failed to mount: {0}")]
    Mount(String),
    /// The view requires an authenticated session it did not receive.
    #[error("view requires an authenticated session")]
    AuthenticationRequired,
}

/// Registry-level failures surfaced to the host.
#[derive(Debug, Error)]
pub enum ViewRegistryError {
    /// Filtering removed every registered view.
    #[error("view catalog is empty after filtering")]
    EmptyCatalog,
    /// The resolved view failed to activate; no fallback is attempted.
    #[error("view {keyword} failed to activate: {source}")]
    Activation {
        /// Keyword of the failing view.
        keyword: String,
        /// Underlying activation failure.
        #[source]
        source: ViewActivationError,
    },
}

/// Preference store errors.
#[derive(Debug, Error)]
pub enum PreferenceError {
    /// Filesystem or lock failure.
    #[error("preference io failure: {0}")]
    Io(String),
    /// Keyword serialization failure.
    #[error("preference encode failure: {0}")]
    Encode(#[from] serde_json::Error),
}
