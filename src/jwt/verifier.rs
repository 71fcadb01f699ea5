//! The verification pipeline.
//!
//! Orchestrates decode → key acquisition → per-credential verification.
//! Key-acquisition failures are hard errors and propagate; everything
//! token-shaped comes back as a [`Verification`].

use std::sync::Arc;

use tracing::{instrument, warn};

use crate::cert::SigningCredential;
use crate::error::GateError;
use crate::jwt::codec::{self, Verification};
use crate::keyset::KeySetCache;

/// Verifies bearer tokens against a tenant's cached key set.
pub struct TokenVerifier {
    cache: Arc<KeySetCache>,
    tenant: String,
}

impl TokenVerifier {
    /// Creates a verifier for the given tenant over an injected cache.
    pub fn new(cache: Arc<KeySetCache>, tenant: impl Into<String>) -> Self {
        Self {
            cache,
            tenant: tenant.into(),
        }
    }

    /// Runs the full pipeline for one token.
    ///
    /// When every cached credential fails and the set was not fetched
    /// during this call, the key set is refreshed once and the
    /// credentials retried. This is how the gate recovers from key
    /// rotation without a TTL. At most one extra round trip per call.
    ///
    /// A failed refresh does not escalate: the cached credentials
    /// already produced a verdict, and that verdict stands.
    #[instrument(skip(self, token), fields(tenant = %self.tenant))]
    pub async fn verify(&self, token: &str) -> Result<Verification, GateError> {
        if codec::decode_unverified(token).is_none() {
            return Ok(Verification::invalid());
        }

        let (credentials, fetched_now) = self.cache.get_or_fetch().await?;
        let mut outcome = self.try_credentials(&credentials, token);

        if !outcome.valid && !fetched_now {
            warn!("no cached credential verified the token, refreshing key set");
            match self.cache.refresh().await {
                Ok(fresh) => outcome = self.try_credentials(&fresh, token),
                Err(err) => {
                    warn!(error = %err, "key set refresh failed, keeping cached verdict");
                }
            }
        }

        Ok(outcome)
    }

    /// Tries credentials in endpoint order. The first valid result wins;
    /// otherwise the last attempt is surfaced. An empty set yields an
    /// invalid result with no claims.
    fn try_credentials(&self, credentials: &[SigningCredential], token: &str) -> Verification {
        let mut last = Verification::invalid();
        for credential in credentials {
            let result = codec::verify(token, credential, &self.tenant);
            if result.valid {
                return result;
            }
            last = result;
        }
        last
    }
}
