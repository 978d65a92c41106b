//! Integration tests for view resolution precedence and preference writes.

mod common;

use std::sync::Arc;

use common::{ProbeView, unlogged_session};
use treehost_views::{
    MatchRule, MemoryViewPreferences, ViewCapability, ViewCatalog, ViewPreferences, ViewRegistry,
};

fn three_view_catalog() -> ViewCatalog {
    ViewCatalog::from_entries(vec![
        (
            "tree".to_string(),
            Arc::new(ProbeView::enabled("Dynamic Tree")) as Arc<dyn ViewCapability>,
        ),
        (
            "fanchart".to_string(),
            Arc::new(ProbeView::enabled("Fan Chart")) as Arc<dyn ViewCapability>,
        ),
        (
            "timeline".to_string(),
            Arc::new(ProbeView::enabled("Timeline")) as Arc<dyn ViewCapability>,
        ),
    ])
    .expect("catalog should build")
}

#[test]
fn view_resolution_tests_requested_keyword_beats_last_used() {
    let preferences = Arc::new(MemoryViewPreferences::with_keyword("timeline"));
    let registry = ViewRegistry::new(three_view_catalog(), unlogged_session(), preferences);

    let active = registry
        .render(Some("fanchart"))
        .expect("render should succeed");

    assert_eq!(active.keyword, "fanchart");
    assert_eq!(active.matched_by, MatchRule::Requested);
}

#[test]
fn view_resolution_tests_last_used_beats_first_entry() {
    let preferences = Arc::new(MemoryViewPreferences::with_keyword("timeline"));
    let registry = ViewRegistry::new(three_view_catalog(), unlogged_session(), preferences);

    let active = registry.render(None).expect("render should succeed");

    assert_eq!(active.keyword, "timeline");
    assert_eq!(active.matched_by, MatchRule::LastUsed);
}

#[test]
fn view_resolution_tests_falls_back_to_first_insertion_order_entry() {
    let preferences = Arc::new(MemoryViewPreferences::with_keyword("retired-view"));
    let registry = ViewRegistry::new(three_view_catalog(), unlogged_session(), preferences);

    let active = registry.render(None).expect("render should succeed");

    assert_eq!(active.keyword, "tree");
    assert_eq!(active.matched_by, MatchRule::Default);
}

#[test]
fn view_resolution_tests_render_persists_resolved_keyword_as_last_used() {
    let preferences = Arc::new(MemoryViewPreferences::new());
    let registry = ViewRegistry::new(
        three_view_catalog(),
        unlogged_session(),
        Arc::clone(&preferences) as Arc<dyn ViewPreferences>,
    );

    registry
        .render(Some("fanchart"))
        .expect("render should succeed");

    assert_eq!(preferences.last_used().as_deref(), Some("fanchart"));
}

#[test]
fn view_resolution_tests_resolve_never_writes_the_preference() {
    let preferences = Arc::new(MemoryViewPreferences::new());
    let registry = ViewRegistry::new(
        three_view_catalog(),
        unlogged_session(),
        Arc::clone(&preferences) as Arc<dyn ViewPreferences>,
    );

    let active = registry
        .resolve(Some("fanchart"))
        .expect("resolve should succeed");

    assert_eq!(active.keyword, "fanchart");
    assert_eq!(preferences.last_used(), None);
}
