//! Core signing and handler traits.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::algorithms::Algorithm;
use crate::claims::Claims;
use crate::error::{SignResult, TokenResult};
use crate::key_id::KeyId;
use crate::token::Token;

/// Signing algorithm interface.
///
/// One implementation per algorithm, each bound to exactly one private key
/// and key id for its whole lifetime. Implementations hold no per-call
/// state and must be thread-safe.
pub trait Signer: Send + Sync + 'static {
    /// Header `alg` value of tokens this signer produces.
    fn algorithm(&self) -> Algorithm;

    /// Whether a token whose header names `alg` may be checked by this
    /// signer. Defaults to the signing algorithm only.
    fn accepts(&self, alg: Algorithm) -> bool {
        alg == self.algorithm()
    }

    /// Key id embedded in every token this signer produces.
    fn key_id(&self) -> KeyId;

    /// Sign `base64url(header).base64url(payload)` and return raw signature bytes.
    fn sign(&self, message: &[u8]) -> SignResult<Vec<u8>>;

    /// Check raw signature bytes over the signing input under `alg`.
    ///
    /// Returns false for any `alg` the signer does not accept.
    fn verify(&self, alg: Algorithm, message: &[u8], signature: &[u8]) -> bool;
}

/// Implementation of Signer for Arc<T> to allow shared ownership.
impl<T: Signer> Signer for Arc<T> {
    fn algorithm(&self) -> Algorithm {
        (**self).algorithm()
    }

    fn accepts(&self, alg: Algorithm) -> bool {
        (**self).accepts(alg)
    }

    fn key_id(&self) -> KeyId {
        (**self).key_id()
    }

    fn sign(&self, message: &[u8]) -> SignResult<Vec<u8>> {
        (**self).sign(message)
    }

    fn verify(&self, alg: Algorithm, message: &[u8], signature: &[u8]) -> bool {
        (**self).verify(alg, message, signature)
    }
}

/// JWT generator/verifier.
///
/// This is the contract the rest of the identity service depends on. Key
/// and algorithm are fixed when the handler is built.
pub trait Handler: Send + Sync {
    /// Sign `claims` into a compact token carrying this handler's key id.
    fn to_jwt(&self, claims: &Claims) -> SignResult<String>;

    /// Parse and verify `token` against the current time.
    ///
    /// Returns [`TokenError::Expired`](crate::TokenError::Expired) when the
    /// token is authentic but expired and
    /// [`TokenError::Invalid`](crate::TokenError::Invalid) for everything
    /// else that fails (malformed, bad signature, wrong algorithm, missing
    /// required claims).
    fn from_jwt(&self, token: &str) -> TokenResult<Token> {
        self.from_jwt_at(token, Utc::now())
    }

    /// Same as [`Handler::from_jwt`] with an explicit verification time.
    fn from_jwt_at(&self, token: &str, now: DateTime<Utc>) -> TokenResult<Token>;

    /// Key id this handler signs with.
    fn key_id(&self) -> KeyId;

    /// Algorithm this handler signs with.
    fn algorithm(&self) -> Algorithm;
}
