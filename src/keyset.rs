//! Key set cache with single-flight population.
//!
//! Holds one tenant's signing credentials in process. The set starts
//! empty and is populated on the first verification that needs it; the
//! whole collection is replaced atomically on every successful fetch, so
//! concurrent readers never observe a partially-filled set. Concurrent
//! first-populations collapse into a single network round trip shared by
//! all waiting callers.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::info;
use url::Url;

use crate::cert::SigningCredential;
use crate::config::{ConfigError, GateConfig};
use crate::discovery;
use crate::error::GateError;

/// The key-publication document: a collection of keys, each optionally
/// carrying a certificate chain.
#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<JwksKey>,
}

#[derive(Debug, Deserialize)]
struct JwksKey {
    x5c: Option<Vec<String>>,
}

type InflightFetch = Shared<BoxFuture<'static, Result<Arc<Vec<SigningCredential>>, GateError>>>;

/// Process-local cache of one tenant's signing credentials.
///
/// Own an `Arc<KeySetCache>` per tenant and inject it into the pipeline;
/// nothing here is global, so independent tenants coexist in one process
/// and tests can seed a fake set via [`KeySetCache::populate`].
pub struct KeySetCache {
    authority: Url,
    tenant: String,
    http: reqwest::Client,
    credentials: Arc<ArcSwap<Vec<SigningCredential>>>,
    inflight: Mutex<Option<InflightFetch>>,
}

impl KeySetCache {
    /// Creates an empty cache for the configured tenant.
    pub fn new(config: &GateConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .map_err(|e| ConfigError::HttpClient {
                reason: e.to_string(),
            })?;

        Ok(Self {
            authority: config.authority.clone(),
            tenant: config.tenant.clone(),
            http,
            credentials: Arc::new(ArcSwap::from_pointee(Vec::new())),
            inflight: Mutex::new(None),
        })
    }

    /// Replaces the cached set without a network fetch.
    ///
    /// Intended for tests and pre-warming.
    pub fn populate(&self, credentials: Vec<SigningCredential>) {
        self.credentials.store(Arc::new(credentials));
    }

    /// Whether the cache has been populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.credentials.load().is_empty()
    }

    /// Number of cached credentials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.credentials.load().len()
    }

    /// Returns the cached credential set, fetching it first if empty.
    ///
    /// The boolean is `true` when the set was fetched during this call,
    /// which tells the pipeline a failed verification cannot be cured by
    /// refreshing again. On fetch failure the cache is left unchanged.
    pub async fn get_or_fetch(
        &self,
    ) -> Result<(Arc<Vec<SigningCredential>>, bool), GateError> {
        let cached = self.credentials.load_full();
        if !cached.is_empty() {
            return Ok((cached, false));
        }
        let fresh = self.fetch_single_flight().await?;
        Ok((fresh, true))
    }

    /// Forces a refetch, replacing the cached set on success.
    ///
    /// A refresh racing an in-flight fetch joins that fetch instead of
    /// issuing another one.
    pub async fn refresh(&self) -> Result<Arc<Vec<SigningCredential>>, GateError> {
        self.fetch_single_flight().await
    }

    async fn fetch_single_flight(&self) -> Result<Arc<Vec<SigningCredential>>, GateError> {
        let mut guard = self.inflight.lock().await;

        if let Some(fut) = guard.as_ref() {
            let fut = fut.clone();
            drop(guard);
            return fut.await;
        }

        let authority = self.authority.clone();
        let tenant = self.tenant.clone();
        let client = self.http.clone();
        let slot = Arc::clone(&self.credentials);

        let fut: BoxFuture<'static, Result<Arc<Vec<SigningCredential>>, GateError>> =
            Box::pin(async move {
                let metadata_url = discovery::metadata_url(&authority, &tenant);
                let jwks_uri = discovery::resolve_jwks_uri(&client, &metadata_url).await?;
                let credentials = fetch_credentials(&client, &jwks_uri).await?;

                let published = Arc::new(credentials);
                slot.store(Arc::clone(&published));
                info!(count = published.len(), %jwks_uri, "key set published");
                Ok(published)
            });

        let shared = fut.shared();
        *guard = Some(shared.clone());
        drop(guard);

        let result = shared.await;
        self.inflight.lock().await.take();
        result
    }
}

/// Fetches the key-publication document and flattens every key's
/// certificate-chain entries, preserving endpoint order.
async fn fetch_credentials(
    client: &reqwest::Client,
    jwks_uri: &str,
) -> Result<Vec<SigningCredential>, GateError> {
    let response = client
        .get(jwks_uri)
        .send()
        .await
        .map_err(|e| GateError::key_set_fetch(format!("request to {jwks_uri} failed: {e}")))?;

    if !response.status().is_success() {
        return Err(GateError::key_set_fetch(format!(
            "{jwks_uri} returned {}",
            response.status()
        )));
    }

    let document: JwksDocument = response
        .json()
        .await
        .map_err(|e| GateError::key_set_fetch(format!("invalid key set document: {e}")))?;

    // Keys without an x5c member carry no verifiable certificate.
    Ok(document
        .keys
        .into_iter()
        .filter_map(|key| key.x5c)
        .flatten()
        .map(SigningCredential::new)
        .collect())
}
