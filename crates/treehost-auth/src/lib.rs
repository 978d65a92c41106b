#![warn(missing_docs)]
//! # treehost-auth
//!
//! ## Purpose
//! Implements the credential bridge that exchanges a one-time authorization
//! code for a session identity.
//!
//! ## Responsibilities
//! - Validate API endpoint policy (HTTPS, `/api.php` suffix).
//! - Execute the `clientLogin` exchange through an injectable transport
//!   abstraction.
//! - Extract and strip the one-time `authcode` URL parameter so it cannot be
//!   resubmitted on refresh or back-navigation.
//!
//! ## Data flow
//! Host URL carries an auth code -> [`CredentialBridge::exchange_auth_code`]
//! sends the form request through [`ApiTransport`] -> the response envelope
//! is parsed into a [`treehost_core::Identity`] consumed by the session
//! layer.
//!
//! ## Ownership and lifetimes
//! Exchange results are owned values to decouple transport buffers from
//! session-state lifetimes.
//!
//! ## Error model
//! Endpoint policy violations, transport failures, rejected exchanges, and
//! malformed responses are surfaced as [`AuthExchangeError`], letting the
//! host degrade gracefully to a logged-out state.
//!
//! ## Security and privacy notes
//! This crate does not log auth codes, cookies, or identity payloads.
//! [`AuthExchangeError`] keeps the raw server payload in fields rather than
//! `Display` output so diagnostics never leak into log lines by default.
//!
//! ## Example
//! ```rust
//! use treehost_auth::validate_api_endpoint;
//!
//! assert!(validate_api_endpoint("https://api.wikitree.com/api.php").is_ok());
//! assert!(validate_api_endpoint("http://api.wikitree.com/api.php").is_err());
//! ```

use std::sync::Arc;

use thiserror::Error;
use treehost_core::{ClientLoginOutcome, Identity, parse_client_login_response};
use url::Url;

/// Required API path suffix for the remote genealogy endpoint.
pub const REQUIRED_API_PATH: &str = "/api.php";

/// Action field value for the identity-exchange call.
pub const CLIENT_LOGIN_ACTION: &str = "clientLogin";

/// URL query parameter carrying the one-time authorization code.
pub const AUTH_CODE_PARAM: &str = "authcode";

/// Abstract form-POST transport used by the API client.
///
/// Implementations must include ambient cookies so the remote service can
/// correlate the exchange with the user's browser session.
pub trait ApiTransport: Send + Sync {
    /// Sends one `application/x-www-form-urlencoded` POST and returns the
    /// raw response body.
    ///
    /// # Errors
    /// Returns [`AuthExchangeError::Transport`] for connection or HTTP
    /// status failures.
    fn post_form(
        &self,
        endpoint: &str,
        fields: &[(String, String)],
    ) -> Result<String, AuthExchangeError>;
}

/// API client that validates endpoint policy and tags requests with the
/// fixed application identifier.
#[derive(Clone)]
pub struct ApiClient {
    endpoint: String,
    app_id: String,
    transport: Arc<dyn ApiTransport>,
}

impl ApiClient {
    /// Creates a validated API client.
    ///
    /// # Errors
    /// Returns [`AuthExchangeError::InvalidEndpoint`] when the URL is not
    /// HTTPS or does not end with [`REQUIRED_API_PATH`].
    /// Returns [`AuthExchangeError::InvalidAppId`] when `app_id` is blank.
    pub fn new(
        endpoint: impl Into<String>,
        app_id: impl Into<String>,
        transport: Arc<dyn ApiTransport>,
    ) -> Result<Self, AuthExchangeError> {
        let endpoint = endpoint.into();
        validate_api_endpoint(&endpoint)?;

        let app_id = app_id.into();
        if app_id.trim().is_empty() {
            return Err(AuthExchangeError::InvalidAppId);
        }

        Ok(Self {
            endpoint,
            app_id,
            transport,
        })
    }

    /// Returns the configured API endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the fixed application identifier sent with every action.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Posts one named action with the standard `action`/`appId` fields
    /// prepended.
    ///
    /// # Errors
    /// Propagates transport errors as-is for caller retry/prompt behavior.
    pub fn post_action(
        &self,
        action: &str,
        fields: &[(String, String)],
    ) -> Result<String, AuthExchangeError> {
        let mut form = Vec::with_capacity(fields.len() + 2);
        form.push(("action".to_string(), action.to_string()));
        form.push(("appId".to_string(), self.app_id.clone()));
        form.extend(fields.iter().cloned());

        self.transport.post_form(&self.endpoint, &form)
    }
}

/// Validates remote API endpoint constraints.
///
/// # Errors
/// Returns [`AuthExchangeError::InvalidEndpoint`] for non-HTTPS URLs or a
/// path that does not end with [`REQUIRED_API_PATH`].
pub fn validate_api_endpoint(endpoint: &str) -> Result<(), AuthExchangeError> {
    let parsed = Url::parse(endpoint)
        .map_err(|error| AuthExchangeError::InvalidEndpoint(format!("invalid api url: {error}")))?;

    if parsed.scheme() != "https" {
        return Err(AuthExchangeError::InvalidEndpoint(
            "api endpoint must use https".to_string(),
        ));
    }

    if !parsed.path().ends_with(REQUIRED_API_PATH) {
        return Err(AuthExchangeError::InvalidEndpoint(format!(
            "api endpoint path must end with {REQUIRED_API_PATH}"
        )));
    }

    Ok(())
}

/// Credential bridge executing the one-time authorization-code exchange.
#[derive(Clone)]
pub struct CredentialBridge {
    client: ApiClient,
}

impl CredentialBridge {
    /// Creates a bridge over a validated API client.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Exchanges a one-time authorization code for an identity.
    ///
    /// Issues exactly one network request. The caller is responsible for
    /// persisting the identity and for stripping the consumed code from the
    /// host URL.
    ///
    /// # Errors
    /// Returns [`AuthExchangeError::EmptyAuthCode`] for a blank code.
    /// Returns [`AuthExchangeError::Rejected`] for a non-zero server status,
    /// [`AuthExchangeError::MalformedResponse`] for an undecodable envelope,
    /// and propagates transport failures as-is. The session remains
    /// untouched on every failure path.
    pub fn exchange_auth_code(&self, code: &str) -> Result<Identity, AuthExchangeError> {
        if code.trim().is_empty() {
            return Err(AuthExchangeError::EmptyAuthCode);
        }

        let raw = self.client.post_action(
            CLIENT_LOGIN_ACTION,
            &[(AUTH_CODE_PARAM.to_string(), code.to_string())],
        )?;

        match parse_client_login_response(&raw) {
            Ok(ClientLoginOutcome::Accepted(identity)) => Ok(identity),
            Ok(ClientLoginOutcome::Rejected { status }) => {
                Err(AuthExchangeError::Rejected { status, raw })
            }
            Err(error) => Err(AuthExchangeError::MalformedResponse {
                detail: error.to_string(),
                raw,
            }),
        }
    }

    /// Returns the underlying API client.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

/// Extracts a non-blank authorization code from the host URL.
pub fn extract_auth_code(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == AUTH_CODE_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.trim().is_empty())
}

/// Returns the host URL with the consumed authorization code removed.
///
/// All other query parameters and the fragment are preserved; when
/// `authcode` was the only parameter the query separator is dropped
/// entirely.
pub fn strip_auth_code(url: &Url) -> Url {
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != AUTH_CODE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut scrubbed = url.clone();
    if retained.is_empty() {
        scrubbed.set_query(None);
    } else {
        let mut pairs = scrubbed.query_pairs_mut();
        pairs.clear();
        for (key, value) in &retained {
            pairs.append_pair(key, value);
        }
    }

    scrubbed
}

/// Production transport backed by a blocking HTTP client with a cookie
/// store, so ambient cookies accompany the exchange.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Builds the HTTP transport.
    ///
    /// # Errors
    /// Returns [`AuthExchangeError::Transport`] when client construction
    /// fails.
    pub fn new() -> Result<Self, AuthExchangeError> {
        let client = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|error| AuthExchangeError::Transport(error.to_string()))?;

        Ok(Self { client })
    }
}

impl ApiTransport for HttpTransport {
    fn post_form(
        &self,
        endpoint: &str,
        fields: &[(String, String)],
    ) -> Result<String, AuthExchangeError> {
        let response = self
            .client
            .post(endpoint)
            .form(fields)
            .send()
            .map_err(|error| AuthExchangeError::Transport(error.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|error| AuthExchangeError::Transport(error.to_string()))?;

        response
            .text()
            .map_err(|error| AuthExchangeError::Transport(error.to_string()))
    }
}

/// Errors produced by the credential bridge and API client.
#[derive(Debug, Error)]
pub enum AuthExchangeError {
    /// Endpoint violates security or contract requirements.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Application identifier is blank.
    #[error("application id must be non-empty")]
    InvalidAppId,
    /// Authorization code is blank.
    #[error("authorization code must be non-empty")]
    EmptyAuthCode,
    /// Connection or HTTP status failure from the remote API.
    #[error("exchange transport failure: {0}")]
    Transport(String),
    /// Server rejected the exchange with a non-zero status.
    #[error("identity exchange rejected with status {status}")]
    Rejected {
        /// Non-zero server status code.
        status: i64,
        /// Raw server payload retained for diagnostics.
        raw: String,
    },
    /// Response payload violated the exchange contract.
    #[error("malformed identity exchange response: {detail}")]
    MalformedResponse {
        /// Human-readable decode failure description.
        detail: String,
        /// Raw server payload retained for diagnostics.
        raw: String,
    },
}

impl AuthExchangeError {
    /// Returns the raw server payload attached to protocol failures.
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            Self::Rejected { raw, .. } | Self::MalformedResponse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}
