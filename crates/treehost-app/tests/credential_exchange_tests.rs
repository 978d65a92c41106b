//! Integration tests for the authorization-code exchange contract.

mod common;

use std::sync::Arc;

use common::{ACCEPTED_BODY, REJECTED_BODY, StaticTransport, TEST_ENDPOINT, fixture_identity};
use treehost_auth::{ApiClient, AuthExchangeError, CredentialBridge};

fn bridge_over(transport: Arc<StaticTransport>) -> CredentialBridge {
    let client =
        ApiClient::new(TEST_ENDPOINT, "TA-test", transport).expect("client should build");
    CredentialBridge::new(client)
}

#[test]
fn credential_exchange_tests_accepted_envelope_yields_identity() {
    let transport = Arc::new(StaticTransport::responding(ACCEPTED_BODY));
    let bridge = bridge_over(Arc::clone(&transport));

    let identity = bridge
        .exchange_auth_code("one-time-code")
        .expect("exchange should succeed");

    assert_eq!(identity, fixture_identity());
    assert_eq!(transport.call_count(), 1);
}

#[test]
fn credential_exchange_tests_sends_client_login_form_fields() {
    let transport = Arc::new(StaticTransport::responding(ACCEPTED_BODY));
    let bridge = bridge_over(Arc::clone(&transport));

    bridge
        .exchange_auth_code("one-time-code")
        .expect("exchange should succeed");

    let form = transport.first_form();
    assert!(form.contains(&("action".to_string(), "clientLogin".to_string())));
    assert!(form.contains(&("appId".to_string(), "TA-test".to_string())));
    assert!(form.contains(&("authcode".to_string(), "one-time-code".to_string())));
}

#[test]
fn credential_exchange_tests_rejected_status_attaches_raw_payload() {
    let transport = Arc::new(StaticTransport::responding(REJECTED_BODY));
    let bridge = bridge_over(transport);

    let error = bridge
        .exchange_auth_code("one-time-code")
        .expect_err("exchange should be rejected");

    assert!(matches!(error, AuthExchangeError::Rejected { status: 1, .. }));
    assert_eq!(error.raw_payload(), Some(REJECTED_BODY));
}

#[test]
fn credential_exchange_tests_malformed_body_reports_contract_failure() {
    let transport = Arc::new(StaticTransport::responding("<html>maintenance</html>"));
    let bridge = bridge_over(transport);

    let error = bridge
        .exchange_auth_code("one-time-code")
        .expect_err("exchange should fail");

    assert!(matches!(error, AuthExchangeError::MalformedResponse { .. }));
}

#[test]
fn credential_exchange_tests_blank_code_never_reaches_transport() {
    let transport = Arc::new(StaticTransport::responding(ACCEPTED_BODY));
    let bridge = bridge_over(Arc::clone(&transport));

    let error = bridge
        .exchange_auth_code("   ")
        .expect_err("blank code should fail");

    assert!(matches!(error, AuthExchangeError::EmptyAuthCode));
    assert_eq!(transport.call_count(), 0);
}
