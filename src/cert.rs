//! Signing credential adaptation.
//!
//! Azure AD publishes signing certificates as bare base64 DER strings in
//! the `x5c` member of each JWKS key. [`SigningCredential`] wraps one
//! such entry and adapts it into the forms the verifier needs: the
//! delimited PEM block, and a [`DecodingKey`] extracted from the
//! certificate's public key.

use jsonwebtoken::DecodingKey;
use thiserror::Error;
use x509_parser::certificate::X509Certificate;
use x509_parser::oid_registry::OID_PKCS1_RSAENCRYPTION;
// Selective import: the prelude glob would shadow the `pem` crate with
// x509-parser's own `pem` module.
use x509_parser::prelude::FromDer;

/// Failures while turning a published certificate into a decoding key.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// The payload is not valid base64/PEM
    #[error("Invalid certificate encoding: {0}")]
    Encoding(String),

    /// The DER certificate structure could not be parsed
    #[error("Certificate parse failed: {0}")]
    Parse(String),

    /// The certificate carries a non-RSA public key
    #[error("Unsupported public key algorithm")]
    UnsupportedKey,
}

/// One signing certificate from a tenant's key-publication endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningCredential {
    x5c: String,
}

impl SigningCredential {
    /// Wraps a raw `x5c` payload.
    pub fn new(x5c: impl Into<String>) -> Self {
        Self { x5c: x5c.into() }
    }

    /// Wraps the payload in the standard delimited certificate block.
    ///
    /// Pure and total: the payload is not inspected here, only framed.
    pub fn to_pem(&self) -> String {
        format!(
            "-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----",
            self.x5c
        )
    }

    /// Extracts an RSA decoding key from the certificate.
    ///
    /// Parses the PEM block, then the DER certificate, and rejects any
    /// certificate whose SubjectPublicKeyInfo is not RSA. Only RS256-class
    /// verification is supported.
    pub fn decoding_key(&self) -> Result<DecodingKey, CredentialError> {
        let block =
            pem::parse(self.to_pem()).map_err(|e| CredentialError::Encoding(e.to_string()))?;
        let (_, certificate) = X509Certificate::from_der(block.contents())
            .map_err(|e| CredentialError::Parse(e.to_string()))?;

        let spki = certificate.public_key();
        if spki.algorithm.algorithm != OID_PKCS1_RSAENCRYPTION {
            return Err(CredentialError::UnsupportedKey);
        }

        // The BIT STRING payload of an RSA SPKI is the PKCS#1 key.
        Ok(DecodingKey::from_rsa_der(&spki.subject_public_key.data))
    }
}
