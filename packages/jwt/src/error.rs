//! Error types for key loading, token signing and token verification

use std::path::PathBuf;
use thiserror::Error;

/// Result of loading a private key or building a handler from one
pub type KeyLoadResult<T> = Result<T, KeyLoadError>;

/// Result of verifying a token
pub type TokenResult<T> = Result<T, TokenError>;

/// Result of signing a token
pub type SignResult<T> = Result<T, SignError>;

/// Construction-time failures. Fatal to the handler being built.
#[derive(Debug, Error)]
pub enum KeyLoadError {
    /// The key file could not be read
    #[error("failed to read private key {}: {source}", path.display())]
    Read {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The file holds no decodable PEM block
    #[error("failed to read private key: {0}")]
    Pem(String),

    /// The PEM block was recognised but the key inside does not parse
    #[error("failed to read {kind} private key: {reason}")]
    MalformedKey {
        /// Container that was being parsed
        kind: &'static str,
        /// Parser diagnostic
        reason: String,
    },

    /// The PEM label or the PKCS#8 algorithm is not RSA or Ed25519
    #[error("unsupported server private key type")]
    UnsupportedKeyType,
}

impl KeyLoadError {
    /// Create a malformed key error
    #[inline]
    #[must_use]
    pub fn malformed(kind: &'static str, reason: impl ToString) -> Self {
        KeyLoadError::MalformedKey {
            kind,
            reason: reason.to_string(),
        }
    }
}

/// Verification failures.
///
/// Every parse, crypto or claim failure collapses into one of these two
/// values so nothing about the rejected token leaks through the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum TokenError {
    /// Signature is valid but the token is past its expiry
    #[error("jwt: token expired")]
    Expired,

    /// Malformed, forged, wrong algorithm or missing required claims
    #[error("jwt: token invalid")]
    Invalid,
}

/// Signing failures
#[derive(Debug, Error)]
pub enum SignError {
    /// Header or claims could not be serialized
    #[error("failed to serialize token: {0}")]
    Serialization(String),

    /// The signing backend rejected the input
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<serde_json::Error> for SignError {
    fn from(err: serde_json::Error) -> Self {
        SignError::Serialization(err.to_string())
    }
}
