//! Decoded token claims.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Claim set of an Azure AD token.
///
/// The well-known fields are modeled directly; everything else lands in
/// `custom`. All fields are optional because decoding is also performed
/// on tokens that have not been (or cannot be) verified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Subject
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Tenant identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tid: Option<String>,
    /// Expiry (seconds since epoch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Issued-at (seconds since epoch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Any further claims
    #[serde(flatten)]
    pub custom: HashMap<String, serde_json::Value>,
}

impl Claims {
    /// The tenant identifier, when present.
    ///
    /// Untrusted until the token verifies: it locates keys, it never
    /// authorizes anything.
    #[must_use]
    pub fn tenant_id(&self) -> Option<&str> {
        self.tid.as_deref()
    }

    /// Whether the expiry claim lies in the past. Tokens without an
    /// expiry are not considered expired here; the codec requires `exp`
    /// during verification.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        match self.exp {
            Some(exp) => exp < chrono::Utc::now().timestamp(),
            None => false,
        }
    }
}
