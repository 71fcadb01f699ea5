//! Token codec and credential adapter tests.

mod common;

use aad_gate::SigningCredential;
use aad_gate::jwt::{decode_unverified, expected_issuer, verify};
use serde_json::json;

fn published_credential() -> SigningCredential {
    SigningCredential::new(common::TEST_CERT_X5C)
}

#[test]
fn decode_unverified_returns_none_for_malformed_tokens() {
    assert!(decode_unverified("not-a-jwt").is_none());
    assert!(decode_unverified("a.b.c").is_none());
}

#[test]
fn decode_unverified_reads_tenant_without_keys() {
    let token = common::sign_token(&common::contoso_claims());
    let claims = decode_unverified(&token).expect("structurally valid token decodes");
    assert_eq!(claims.tenant_id(), Some("contoso"));
    assert_eq!(claims.sub.as_deref(), Some("user-123"));
}

#[test]
fn decode_unverified_ignores_the_signature() {
    // Signed by a key nobody published; decoding still succeeds.
    let token = common::sign_token_foreign(&common::contoso_claims());
    assert!(decode_unverified(&token).is_some());
}

#[test]
fn verify_accepts_matching_key_and_issuer() {
    let token = common::sign_token(&common::contoso_claims());
    let result = verify(&token, &published_credential(), "contoso");

    assert!(result.valid);
    let claims = result.claims.expect("claims decoded");
    assert_eq!(claims.iss.as_deref(), Some("https://sts.windows.net/contoso/"));
    assert_eq!(claims.tenant_id(), Some("contoso"));
}

#[test]
fn verify_rejects_foreign_signer() {
    let token = common::sign_token_foreign(&common::contoso_claims());
    let result = verify(&token, &published_credential(), "contoso");

    assert!(!result.valid);
    // Claims still come back for caller convenience.
    assert_eq!(
        result.claims.expect("claims decoded").tenant_id(),
        Some("contoso")
    );
}

#[test]
fn verify_checks_issuer_against_configured_tenant() {
    // Signed by the published key, but for another tenant: the issuer
    // check uses the configured tenant, not the token's own tid.
    let token = common::sign_token(&common::claims_for("fabrikam"));
    let result = verify(&token, &published_credential(), "contoso");

    assert!(!result.valid);
    assert_eq!(
        result.claims.expect("claims decoded").tenant_id(),
        Some("fabrikam")
    );
}

#[test]
fn verify_rejects_expired_tokens() {
    let now = chrono::Utc::now().timestamp();
    let claims = json!({
        "iss": "https://sts.windows.net/contoso/",
        "tid": "contoso",
        "sub": "user-123",
        "exp": now - 7200,
        "iat": now - 10_800,
    });
    let token = common::sign_token(&claims);
    let result = verify(&token, &published_credential(), "contoso");

    assert!(!result.valid);
    assert!(result.claims.expect("claims decoded").is_expired());
}

#[test]
fn verify_treats_unusable_credential_as_invalid() {
    let token = common::sign_token(&common::contoso_claims());
    let result = verify(&token, &SigningCredential::new("@@@"), "contoso");

    assert!(!result.valid);
    assert!(result.claims.is_some());
}

#[test]
fn verify_is_idempotent() {
    let token = common::sign_token(&common::contoso_claims());
    let credential = published_credential();

    let first = verify(&token, &credential, "contoso");
    let second = verify(&token, &credential, "contoso");
    assert_eq!(first, second);
    assert!(first.valid);
}

#[test]
fn adapter_produces_decoding_key_for_published_cert() {
    assert!(published_credential().decoding_key().is_ok());
}

#[test]
fn expected_issuer_matches_provider_format() {
    assert_eq!(expected_issuer("contoso"), "https://sts.windows.net/contoso/");
}
