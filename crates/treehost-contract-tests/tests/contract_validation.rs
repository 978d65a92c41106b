//! Validates contract fixtures against frozen JSON schemas.

use jsonschema::JSONSchema;
use serde_json::Value;
use treehost_core::Identity;

fn load_json(path: &str) -> Value {
    let raw = std::fs::read_to_string(path).expect("json file should be readable");
    serde_json::from_str(&raw).expect("json file should be valid")
}

fn compile_validator(schema_path: &str) -> JSONSchema {
    let schema = load_json(schema_path);
    JSONSchema::compile(&schema).expect("schema should compile")
}

#[test]
fn accepted_login_fixture_matches_schema() {
    let validator = compile_validator(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/client-login-response.schema.json"
    ));
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/client-login-response.valid.json"
    ));
    assert!(
        validator.is_valid(&fixture),
        "accepted login fixture should validate against schema"
    );
}

#[test]
fn rejected_login_fixture_matches_schema() {
    let validator = compile_validator(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/client-login-response.schema.json"
    ));
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/client-login-rejected.valid.json"
    ));
    assert!(
        validator.is_valid(&fixture),
        "rejected login fixture should validate against schema"
    );
}

#[test]
fn stored_identity_fixture_matches_schema() {
    let validator = compile_validator(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/stored-identity.schema.json"
    ));
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/stored-identity.valid.json"
    ));
    assert!(
        validator.is_valid(&fixture),
        "stored identity fixture should validate against schema"
    );
}

#[test]
fn reencoded_identity_without_id_matches_schema() {
    let validator = compile_validator(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/stored-identity.schema.json"
    ));

    // Server responses may omit id; the stored record must stay valid.
    let identity: Identity =
        serde_json::from_str(r#"{"name":"Doe-42"}"#).expect("identity should decode");
    let encoded = serde_json::to_value(&identity).expect("identity should encode");

    assert!(
        validator.is_valid(&encoded),
        "re-encoded identity should validate against schema"
    );
}

#[test]
fn login_response_without_status_is_rejected() {
    let validator = compile_validator(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/client-login-response.schema.json"
    ));
    let fixture: Value =
        serde_json::from_str(r#"[{"user":{"name":"Doe-42"}}]"#).expect("literal should parse");
    assert!(
        !validator.is_valid(&fixture),
        "envelope missing status must not validate"
    );
}
