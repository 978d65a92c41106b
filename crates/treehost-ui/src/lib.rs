#![warn(missing_docs)]
//! # treehost-ui
//!
//! ## Purpose
//! Defines the UI-facing runtime state model for the `treehost` shell.
//!
//! ## Responsibilities
//! - Represent login status, the active view, and the host error banner.
//! - Project session lifecycle events into display-safe status text.
//! - Expose the logout-control visibility guard.
//!
//! ## Data flow
//! App orchestration events mutate [`UiState`], which drives the rendered
//! host chrome around whichever view is active.
//!
//! ## Ownership and lifetimes
//! `UiState` owns all string/status values to simplify event reducers and
//! avoid borrowing across the observer boundary.
//!
//! ## Error model
//! This crate favors explicit state over recoverable errors; the error
//! banner is plain display text, never a structured error value.
//!
//! ## Security and privacy notes
//! UI state intentionally excludes secrets (auth codes, cookies, raw
//! identity payloads); only the public display name is retained.

use treehost_core::SessionState;

/// UI login-state projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiLoginState {
    /// No authenticated session.
    Unlogged,
    /// Authenticated session for the named user.
    LoggedIn {
        /// Display name shown in the login banner.
        display_name: String,
    },
}

/// Aggregate UI runtime state for the host chrome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    /// App version string sourced from root `VERSION`.
    pub version: String,
    /// Current login status.
    pub login: UiLoginState,
    /// Keyword of the active view, once one has mounted.
    pub active_view: Option<String>,
    /// Visible host-level failure text, if any.
    pub error_banner: Option<String>,
}

impl UiState {
    /// Creates default UI state.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            login: UiLoginState::Unlogged,
            active_view: None,
            error_banner: None,
        }
    }

    /// Applies a logged-in lifecycle event.
    pub fn apply_logged_in(&mut self, display_name: impl Into<String>) {
        self.login = UiLoginState::LoggedIn {
            display_name: display_name.into(),
        };
    }

    /// Applies an unlogged lifecycle event.
    pub fn apply_unlogged(&mut self) {
        self.login = UiLoginState::Unlogged;
    }

    /// Projects a session-state snapshot into the login projection.
    pub fn project_session(&mut self, state: &SessionState) {
        match state.identity() {
            Some(identity) => self.apply_logged_in(identity.display()),
            None => self.apply_unlogged(),
        }
    }

    /// Records the successfully mounted view and clears any error banner.
    pub fn apply_view_active(&mut self, keyword: impl Into<String>) {
        self.active_view = Some(keyword.into());
        self.error_banner = None;
    }

    /// Records a visible view-activation failure; no view is active.
    pub fn apply_view_failure(&mut self, message: impl Into<String>) {
        self.active_view = None;
        self.error_banner = Some(message.into());
    }

    /// Returns the login banner text.
    pub fn login_banner(&self) -> String {
        match &self.login {
            UiLoginState::LoggedIn { display_name } => {
                format!("Logged into Apps: {display_name}")
            }
            UiLoginState::Unlogged => "Apps Login".to_string(),
        }
    }

    /// Returns `true` when the logout control should be shown.
    pub fn logout_control_visible(&self) -> bool {
        matches!(self.login, UiLoginState::LoggedIn { .. })
    }
}
