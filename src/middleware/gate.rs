//! The admission gate: a tower layer deciding admit/reject per request.
//!
//! The gate requires exactly one bearer-scheme credential in the
//! `authorization` header, runs the verification pipeline on it, and
//! either admits the request (attaching [`VerifiedClaims`] to the
//! request extensions) or rejects it. What a rejection *does* depends on
//! [`RejectMode`]: `Strict` produces a `401`/`503` response, `FailOpen`
//! forwards the request unauthenticated.

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use http::{HeaderValue, Request, Response, StatusCode};
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::config::{ConfigError, GateConfig, RejectMode};
use crate::error::GateError;
use crate::jwt::claims::Claims;
use crate::jwt::verifier::TokenVerifier;
use crate::keyset::KeySetCache;

/// Why the gate refused to authenticate a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No `authorization` header was present
    MissingHeader,
    /// The header was not exactly `<scheme> <credential>`
    MalformedHeader,
    /// The scheme was not `Bearer` (case-insensitive)
    InvalidScheme,
    /// The credential failed verification
    InvalidToken,
}

impl RejectReason {
    /// The rejection message. Malformed headers and failed tokens share
    /// one message by contract.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingHeader => "No authorization header",
            Self::MalformedHeader | Self::InvalidToken => "Invalid authorization header",
            Self::InvalidScheme => "Invalid scheme in authorization header",
        }
    }

    fn challenge(self) -> &'static str {
        match self {
            Self::MissingHeader => {
                "Bearer error=\"invalid_token\", error_description=\"No authorization header\""
            }
            Self::MalformedHeader | Self::InvalidToken => {
                "Bearer error=\"invalid_token\", error_description=\"Invalid authorization header\""
            }
            Self::InvalidScheme => {
                "Bearer error=\"invalid_token\", error_description=\"Invalid scheme in authorization header\""
            }
        }
    }
}

/// Verified identity claims, attached to admitted requests' extensions.
#[derive(Debug, Clone)]
pub struct VerifiedClaims(
    /// The decoded, verified claim set
    pub Arc<Claims>,
);

/// Extracts the bearer credential from an authorization header value.
pub fn parse_bearer(value: &str) -> Result<&str, RejectReason> {
    let parts: Vec<&str> = value.split(' ').collect();
    if parts.len() != 2 {
        return Err(RejectReason::MalformedHeader);
    }
    if !parts[0].eq_ignore_ascii_case("bearer") {
        return Err(RejectReason::InvalidScheme);
    }
    Ok(parts[1])
}

/// Layer that wraps a service with the admission gate.
pub struct AuthGateLayer {
    verifier: Arc<TokenVerifier>,
    mode: RejectMode,
}

impl AuthGateLayer {
    /// Creates a gate layer with its own key set cache.
    ///
    /// Fails immediately on invalid configuration, in particular a
    /// missing tenant.
    pub fn new(config: GateConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let cache = Arc::new(KeySetCache::new(&config)?);
        Self::with_key_set(config, cache)
    }

    /// Creates a gate layer over an injected cache.
    ///
    /// Lets several gates share one cache, or tests supply a
    /// pre-populated one.
    pub fn with_key_set(
        config: GateConfig,
        cache: Arc<KeySetCache>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            verifier: Arc::new(TokenVerifier::new(cache, config.tenant)),
            mode: config.reject_mode,
        })
    }
}

impl<S> Layer<S> for AuthGateLayer {
    type Service = AuthGate<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthGate {
            inner,
            verifier: Arc::clone(&self.verifier),
            mode: self.mode,
        }
    }
}

/// The per-request admission service.
pub struct AuthGate<S> {
    inner: S,
    verifier: Arc<TokenVerifier>,
    mode: RejectMode,
}

impl<S: Clone> Clone for AuthGate<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            verifier: Arc::clone(&self.verifier),
            mode: self.mode,
        }
    }
}

/// Terminal states of the per-request decision.
enum Admission {
    Admit(Claims),
    Reject(RejectReason),
    Unavailable(GateError),
}

async fn decide(verifier: &TokenVerifier, header: Option<&HeaderValue>) -> Admission {
    let Some(value) = header else {
        return Admission::Reject(RejectReason::MissingHeader);
    };
    let Ok(value) = value.to_str() else {
        return Admission::Reject(RejectReason::MalformedHeader);
    };
    let token = match parse_bearer(value) {
        Ok(token) => token,
        Err(reason) => return Admission::Reject(reason),
    };

    match verifier.verify(token).await {
        Ok(outcome) => match (outcome.valid, outcome.claims) {
            (true, Some(claims)) => Admission::Admit(claims),
            (true, None) | (false, _) => Admission::Reject(RejectReason::InvalidToken),
        },
        Err(err) => Admission::Unavailable(err),
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AuthGate<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Default + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let verifier = Arc::clone(&self.verifier);
        let mode = self.mode;
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            // Bind before matching so the header borrow ends here.
            let decision = decide(&verifier, req.headers().get(AUTHORIZATION)).await;
            match decision {
                Admission::Admit(claims) => {
                    req.extensions_mut().insert(VerifiedClaims(Arc::new(claims)));
                    inner.call(req).await
                }
                Admission::Reject(reason) => match mode {
                    RejectMode::Strict => Ok(unauthorized(reason)),
                    RejectMode::FailOpen => {
                        debug!(reason = reason.as_str(), "authentication failed, failing open");
                        inner.call(req).await
                    }
                },
                Admission::Unavailable(err) => match mode {
                    RejectMode::Strict => {
                        warn!(error = %err, "key acquisition failed");
                        Ok(unavailable())
                    }
                    RejectMode::FailOpen => {
                        warn!(error = %err, "key acquisition failed, failing open");
                        inner.call(req).await
                    }
                },
            }
        })
    }
}

fn unauthorized<B: Default>(reason: RejectReason) -> Response<B> {
    let mut response = Response::new(B::default());
    *response.status_mut() = StatusCode::UNAUTHORIZED;
    response
        .headers_mut()
        .insert(WWW_AUTHENTICATE, HeaderValue::from_static(reason.challenge()));
    response
}

fn unavailable<B: Default>() -> Response<B> {
    let mut response = Response::new(B::default());
    *response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_messages_match_contract() {
        assert_eq!(RejectReason::MissingHeader.as_str(), "No authorization header");
        assert_eq!(
            RejectReason::MalformedHeader.as_str(),
            "Invalid authorization header"
        );
        assert_eq!(RejectReason::InvalidToken.as_str(), "Invalid authorization header");
        assert_eq!(
            RejectReason::InvalidScheme.as_str(),
            "Invalid scheme in authorization header"
        );
    }

    #[test]
    fn parse_bearer_extracts_credential() {
        assert_eq!(parse_bearer("Bearer abc.def.ghi"), Ok("abc.def.ghi"));
        assert_eq!(parse_bearer("bearer tok"), Ok("tok"));
        assert_eq!(parse_bearer("BEARER tok"), Ok("tok"));
    }

    #[test]
    fn parse_bearer_requires_two_parts() {
        assert_eq!(parse_bearer(""), Err(RejectReason::MalformedHeader));
        assert_eq!(parse_bearer("Bearer"), Err(RejectReason::MalformedHeader));
        assert_eq!(parse_bearer("Bearer a b"), Err(RejectReason::MalformedHeader));
        // A double space splits into three parts.
        assert_eq!(parse_bearer("Bearer  tok"), Err(RejectReason::MalformedHeader));
    }

    #[test]
    fn parse_bearer_rejects_other_schemes() {
        assert_eq!(parse_bearer("Basic dXNlcg=="), Err(RejectReason::InvalidScheme));
        assert_eq!(parse_bearer("Digest tok"), Err(RejectReason::InvalidScheme));
    }

    #[test]
    fn challenges_carry_the_reason() {
        for reason in [
            RejectReason::MissingHeader,
            RejectReason::MalformedHeader,
            RejectReason::InvalidScheme,
            RejectReason::InvalidToken,
        ] {
            assert!(reason.challenge().contains(reason.as_str()));
        }
    }
}
