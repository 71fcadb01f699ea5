//! Azure AD bearer-token admission gate.
//!
//! This crate authenticates incoming HTTP requests against a tenant's
//! Azure AD signing keys. It extracts the bearer token from the
//! `authorization` header, discovers the tenant's key-publication
//! endpoint through the OpenID metadata document, caches the published
//! signing certificates in process, and verifies the token signature and
//! issuer against every candidate credential.
//!
//! The gate is a [`tower`] layer, so it slots into any tower-compatible
//! HTTP stack. Admitted requests carry their decoded claims in the
//! request extensions as [`VerifiedClaims`].
//!
//! # Reject modes
//!
//! [`RejectMode::FailOpen`] is the default: requests that fail
//! authentication proceed down the stack **unauthenticated**, with no
//! claims attached. This mirrors the behavior services relied on before
//! strict enforcement and has obvious security implications. Switch to
//! [`RejectMode::Strict`] to turn rejections into `401` responses.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cert;
pub mod config;
pub mod discovery;
pub mod error;
pub mod jwt;
pub mod keyset;
pub mod middleware;

pub use cert::SigningCredential;
pub use config::{ConfigError, GateConfig, RejectMode};
pub use error::GateError;
pub use jwt::{Claims, TokenVerifier, Verification};
pub use keyset::KeySetCache;
pub use middleware::{AuthGate, AuthGateLayer, RejectReason, VerifiedClaims};
