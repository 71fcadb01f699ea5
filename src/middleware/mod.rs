//! Tower middleware.

pub mod gate;

pub use gate::{AuthGate, AuthGateLayer, RejectReason, VerifiedClaims, parse_bearer};
