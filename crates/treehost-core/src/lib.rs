#![warn(missing_docs)]
//! # treehost-core
//!
//! ## Purpose
//! Defines the pure data model used across the `treehost` workspace.
//!
//! ## Responsibilities
//! - Represent the authenticated user identity returned by the remote API.
//! - Parse the versioned client-login response envelope.
//! - Model the session state owned by the login manager.
//!
//! ## Data flow
//! The credential bridge receives a raw exchange response and calls
//! [`parse_client_login_response`]; an accepted envelope yields an
//! [`Identity`] which flows into session storage and the login manager's
//! [`SessionState`].
//!
//! ## Ownership and lifetimes
//! Identities own their backing strings and extras map so session state,
//! storage records, and view snapshots never borrow transient network
//! buffers.
//!
//! ## Error model
//! Decode failures and envelope contract violations return [`CoreError`]
//! variants with caller-actionable categorization.
//!
//! ## Security and privacy notes
//! This crate never logs identity payloads or authorization material.
//! Server-supplied extra fields are treated as opaque values and are never
//! transformed.
//!
//! ## Example
//! ```rust
//! use treehost_core::{parse_client_login_response, ClientLoginOutcome};
//!
//! let raw = r#"[{"status":0,"user":{"id":42,"name":"Jane Doe"}}]"#;
//! let outcome = parse_client_login_response(raw).expect("envelope should parse");
//! assert!(matches!(outcome, ClientLoginOutcome::Accepted(identity) if identity.name == "Jane Doe"));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Durable storage key under which the identity record is persisted.
pub const IDENTITY_STORAGE_KEY: &str = "wikitreeUser";

/// Authenticated user record returned by the remote genealogy API.
///
/// The host reads only `name` (for display); every other field is opaque.
/// Unknown server fields are preserved in `extra` so a stored identity
/// round-trips without loss when the server adds fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Numeric account identifier assigned by the remote API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Unique account name used for display and API lookups.
    pub name: String,
    /// Optional human-readable display name.
    #[serde(default, rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Server fields the host does not interpret, preserved round-trip.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Identity {
    /// Constructs a minimal validated identity.
    ///
    /// # Errors
    /// Returns [`CoreError::MissingName`] when `name` is blank.
    pub fn new(name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CoreError::MissingName);
        }

        Ok(Self {
            id: None,
            name,
            display_name: None,
            extra: serde_json::Map::new(),
        })
    }

    /// Returns the name shown in the host UI.
    ///
    /// Falls back to the account `name` when no display name is set.
    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Session state owned exclusively by the login manager.
///
/// Transitions through the login manager are the only legal mutation path;
/// no other component may set this directly.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No authenticated identity exists.
    Unlogged,
    /// An identity is active; replaced wholesale on a new login.
    LoggedIn(Identity),
}

impl SessionState {
    /// Returns the active identity, if any.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Unlogged => None,
            Self::LoggedIn(identity) => Some(identity),
        }
    }
}

/// One element of the client-login response array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ClientLoginEnvelope {
    /// Server status code; `0` means the exchange was accepted.
    status: i64,
    /// Identity embedded on success.
    #[serde(default)]
    user: Option<Identity>,
}

/// Parsed outcome of one identity-exchange response.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientLoginOutcome {
    /// Exchange accepted; the embedded identity is authoritative.
    Accepted(Identity),
    /// Exchange rejected with a non-zero server status.
    Rejected {
        /// Raw server status code for diagnostics.
        status: i64,
    },
}

/// Parses the JSON array envelope returned by the identity-exchange call.
///
/// The contract is an array whose first element carries
/// `{status: number, user?: Identity}`; additional elements are ignored.
///
/// # Errors
/// Returns [`CoreError::Decode`] for invalid JSON.
/// Returns [`CoreError::InvalidEnvelope`] when the array is empty, when an
/// accepted envelope lacks a user record, or when the embedded identity has
/// a blank name.
pub fn parse_client_login_response(raw: &str) -> Result<ClientLoginOutcome, CoreError> {
    let envelopes: Vec<ClientLoginEnvelope> =
        serde_json::from_str(raw).map_err(CoreError::Decode)?;

    let first = envelopes
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::InvalidEnvelope("response array is empty".to_string()))?;

    if first.status != 0 {
        return Ok(ClientLoginOutcome::Rejected {
            status: first.status,
        });
    }

    let identity = first.user.ok_or_else(|| {
        CoreError::InvalidEnvelope("accepted envelope is missing user record".to_string())
    })?;

    if identity.name.trim().is_empty() {
        return Err(CoreError::InvalidEnvelope(
            "accepted identity has blank name".to_string(),
        ));
    }

    Ok(ClientLoginOutcome::Accepted(identity))
}

/// Error type for core model validation and codec failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Identity name cannot be blank.
    #[error("identity name is empty")]
    MissingName,
    /// JSON decode failure.
    #[error("envelope decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Parsed payload violates the exchange contract.
    #[error("envelope contract violation: {0}")]
    InvalidEnvelope(String),
}
