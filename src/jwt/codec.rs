//! Token codec: unverified decoding and full verification.
//!
//! Verification failure is a normal outcome, not an error: `verify`
//! always returns a [`Verification`], and the decoded claims travel with
//! it whether or not the signature checked out.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use crate::cert::SigningCredential;
use crate::jwt::claims::Claims;

/// Outcome of one verification attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    /// Whether signature and claim validation succeeded
    pub valid: bool,
    /// The unverified decoded claims, when the token is structurally
    /// sound. Present independently of `valid`.
    pub claims: Option<Claims>,
}

impl Verification {
    pub(crate) fn invalid() -> Self {
        Self {
            valid: false,
            claims: None,
        }
    }
}

/// The issuer a verified token must carry for the given tenant.
#[must_use]
pub fn expected_issuer(tenant: &str) -> String {
    format!("https://sts.windows.net/{tenant}/")
}

/// Decodes a token's claim set without checking the signature.
///
/// Returns `None` for structurally malformed tokens. The header
/// algorithm is not checked here; `verify` enforces RS256. Never an
/// error.
#[must_use]
pub fn decode_unverified(token: &str) -> Option<Claims> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .map(|data| data.claims)
}

/// Verifies a token against one signing credential.
///
/// RS256 only. The issuer must equal `https://sts.windows.net/{tenant}/`
/// for the *configured* tenant and the token must not be expired. Any
/// failure (bad signature, wrong issuer, expired, unusable credential)
/// yields `valid: false`.
#[must_use]
pub fn verify(token: &str, credential: &SigningCredential, tenant: &str) -> Verification {
    let claims = decode_unverified(token);

    let key = match credential.decoding_key() {
        Ok(key) => key,
        Err(_) => return Verification { valid: false, claims },
    };

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_issuer(&[expected_issuer(tenant)]);
    validation.validate_aud = false;

    let valid = decode::<Claims>(token, &key, &validation).is_ok();
    Verification { valid, claims }
}
