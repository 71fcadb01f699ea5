//! Key directory resolution.
//!
//! A tenant's signing keys live behind two levels of indirection: the
//! well-known OpenID metadata document, whose `jwks_uri` field points at
//! the key-publication endpoint. Deriving the metadata URL is a pure
//! string template; resolving `jwks_uri` is one network round trip.

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::GateError;

/// The subset of the OpenID metadata document the gate consumes.
#[derive(Debug, Deserialize)]
struct OpenIdMetadata {
    jwks_uri: String,
}

/// Derives the tenant's metadata-discovery URL. No network call.
pub fn metadata_url(authority: &Url, tenant: &str) -> String {
    format!(
        "{}/{}/.well-known/openid-configuration",
        authority.as_str().trim_end_matches('/'),
        tenant
    )
}

/// Resolves the metadata document to the tenant's key-publication URL.
///
/// Fails with [`GateError::Discovery`] if the request errors, returns a
/// non-2xx status, or the body lacks a `jwks_uri` field.
pub async fn resolve_jwks_uri(
    client: &reqwest::Client,
    metadata_url: &str,
) -> Result<String, GateError> {
    let response = client
        .get(metadata_url)
        .send()
        .await
        .map_err(|e| GateError::discovery(format!("request to {metadata_url} failed: {e}")))?;

    if !response.status().is_success() {
        return Err(GateError::discovery(format!(
            "{metadata_url} returned {}",
            response.status()
        )));
    }

    let metadata: OpenIdMetadata = response
        .json()
        .await
        .map_err(|e| GateError::discovery(format!("invalid discovery document: {e}")))?;

    debug!(jwks_uri = %metadata.jwks_uri, "resolved key-publication endpoint");
    Ok(metadata.jwks_uri)
}
