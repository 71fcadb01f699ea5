//! Token decoding, verification, and the verification pipeline.

pub mod claims;
pub mod codec;
pub mod verifier;

pub use claims::Claims;
pub use codec::{Verification, decode_unverified, expected_issuer, verify};
pub use verifier::TokenVerifier;
