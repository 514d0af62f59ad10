//! EdDSA over Ed25519

use std::fmt;

use ed25519_dalek::{Signature, Signer as _, SigningKey, VerifyingKey, SIGNATURE_LENGTH};

use super::Algorithm;
use crate::error::SignResult;
use crate::key_id::KeyId;
use crate::traits::Signer;

/// Signs with one Ed25519 key and verifies with its public half
#[derive(Clone)]
pub struct Ed25519Signer {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    key_id: KeyId,
}

impl Ed25519Signer {
    /// Bind an Ed25519 signing key and its id
    #[must_use]
    pub fn new(signing_key: SigningKey, key_id: KeyId) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
            key_id,
        }
    }
}

impl Signer for Ed25519Signer {
    fn algorithm(&self) -> Algorithm {
        Algorithm::EdDsa
    }

    fn key_id(&self) -> KeyId {
        self.key_id
    }

    fn sign(&self, message: &[u8]) -> SignResult<Vec<u8>> {
        Ok(self.signing_key.sign(message).to_bytes().to_vec())
    }

    fn verify(&self, alg: Algorithm, message: &[u8], signature: &[u8]) -> bool {
        if alg != Algorithm::EdDsa {
            return false;
        }
        let Ok(bytes) = <[u8; SIGNATURE_LENGTH]>::try_from(signature) else {
            return false;
        };
        let signature = Signature::from_bytes(&bytes);
        self.verifying_key.verify_strict(message, &signature).is_ok()
    }
}

impl fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("key_id", &self.key_id)
            .field("verifying_key", &self.verifying_key)
            .finish_non_exhaustive()
    }
}
