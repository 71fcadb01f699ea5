//! Error taxonomy for key acquisition.
//!
//! Token-level failures (bad signature, wrong issuer, expired, malformed)
//! are never errors; they are ordinary invalid outcomes carried by
//! [`crate::jwt::Verification`]. The variants here cover the network and
//! parse failures that abort an admission decision entirely.

use thiserror::Error;

/// Failures while acquiring a tenant's signing keys.
///
/// Cloneable so a single in-flight fetch can report the same failure to
/// every request awaiting it.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum GateError {
    /// The OpenID metadata document could not be fetched or was missing
    /// the key-publication endpoint.
    #[error("Key discovery failed: {reason}")]
    Discovery {
        /// Description of the discovery failure
        reason: String,
    },

    /// The key-publication endpoint could not be fetched or returned a
    /// malformed key collection.
    #[error("Key set fetch failed: {reason}")]
    KeySetFetch {
        /// Description of the fetch failure
        reason: String,
    },
}

impl GateError {
    /// Builds a [`GateError::Discovery`] from anything displayable.
    pub fn discovery(reason: impl std::fmt::Display) -> Self {
        Self::Discovery {
            reason: reason.to_string(),
        }
    }

    /// Builds a [`GateError::KeySetFetch`] from anything displayable.
    pub fn key_set_fetch(reason: impl std::fmt::Display) -> Self {
        Self::KeySetFetch {
            reason: reason.to_string(),
        }
    }
}
