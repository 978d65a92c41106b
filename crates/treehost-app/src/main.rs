#![warn(missing_docs)]
//! # treehost-app binary
//!
//! Command-line entry point for the host bootstrap. Takes the page URL as
//! its single argument, runs the bootstrap flow against the configured
//! remote API, and prints the resulting host status.

use std::sync::Arc;

use treehost_app::{HostConfig, TreeHost, app_version, bootstrap};
use treehost_auth::HttpTransport;
use treehost_views::{ViewActivationError, ViewCapability, ViewContext, ViewMetadata};

/// Built-in placeholder view shown until real tree views are linked in.
struct WelcomeView;

impl ViewCapability for WelcomeView {
    fn meta(&self) -> ViewMetadata {
        ViewMetadata::new("Welcome", "Host status and session summary")
    }

    fn activate(&self, context: &ViewContext) -> Result<(), ViewActivationError> {
        match context.session().identity() {
            Some(identity) => println!("[{}] logged in as {}", context.keyword(), identity.display()),
            None => println!("[{}] browsing without a session", context.keyword()),
        }
        Ok(())
    }
}

fn run() -> Result<TreeHost, Box<dyn std::error::Error>> {
    let page_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://apps.treehost.dev/index.html".to_string());
    let page_url = url::Url::parse(&page_url)?;

    let config = HostConfig::from_env()?;
    let transport = Arc::new(HttpTransport::new()?);

    let views: Vec<(String, Arc<dyn ViewCapability>)> =
        vec![("welcome".to_string(), Arc::new(WelcomeView))];

    let host = bootstrap(&config, &page_url, views, transport)?;
    let active = host.render_initial_view()?;

    let ui = host.ui_snapshot();
    println!("treehost {} | {}", app_version(), ui.login_banner());
    println!("active view: {}", active.keyword);

    Ok(host)
}

/// CLI entry point.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(error) = run() {
        eprintln!("failed to start treehost: {error}");
        std::process::exit(1);
    }
}
