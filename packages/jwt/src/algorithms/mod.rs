//! Signature algorithms a handler can be bound to.
//!
//! Each algorithm is one [`Signer`](crate::traits::Signer) implementation
//! holding a single private key and key id. Adding an algorithm means
//! adding a variant here and a signer next to the existing ones.

mod eddsa;
mod rs256;
pub(crate) mod utils;

use std::fmt;

pub use eddsa::Ed25519Signer;
pub use rs256::Rs256Signer;

/// Algorithms understood by this crate, named as in the JWS `alg` header.
///
/// RSA keys sign with `RS256` only but verify the whole RSASSA-PKCS1-v1_5
/// family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// RSASSA-PKCS1-v1_5 with SHA-256
    Rs256,
    /// RSASSA-PKCS1-v1_5 with SHA-384
    Rs384,
    /// RSASSA-PKCS1-v1_5 with SHA-512
    Rs512,
    /// Ed25519
    EdDsa,
}

impl Algorithm {
    /// Header `alg` value
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Algorithm::Rs256 => "RS256",
            Algorithm::Rs384 => "RS384",
            Algorithm::Rs512 => "RS512",
            Algorithm::EdDsa => "EdDSA",
        }
    }

    /// Whether this is one of the RSASSA-PKCS1-v1_5 variants
    #[inline]
    #[must_use]
    pub const fn is_rsa(self) -> bool {
        matches!(self, Algorithm::Rs256 | Algorithm::Rs384 | Algorithm::Rs512)
    }

    /// Parse a header `alg` value. Matching is exact and case-sensitive.
    #[must_use]
    pub fn from_header(alg: &str) -> Option<Self> {
        match alg {
            "RS256" => Some(Algorithm::Rs256),
            "RS384" => Some(Algorithm::Rs384),
            "RS512" => Some(Algorithm::Rs512),
            "EdDSA" => Some(Algorithm::EdDsa),
            _ => None,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
