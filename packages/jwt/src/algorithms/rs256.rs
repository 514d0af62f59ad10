//! RSASSA-PKCS1-v1_5 signatures.
//!
//! Tokens are always issued as RS256. Verification accepts the whole
//! family (RS256, RS384, RS512) under the same key, with the digest picked
//! from the header `alg`.

use std::fmt;

use rand::rngs::OsRng;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::sha2::{Sha256, Sha384, Sha512};
use rsa::signature::{RandomizedSigner as _, SignatureEncoding, Verifier as _};
use rsa::RsaPrivateKey;

use super::Algorithm;
use crate::error::{SignError, SignResult};
use crate::key_id::KeyId;
use crate::traits::Signer;

/// Signs with one RSA private key and verifies with its public half
#[derive(Clone)]
pub struct Rs256Signer {
    signing_key: SigningKey<Sha256>,
    rs256: VerifyingKey<Sha256>,
    rs384: VerifyingKey<Sha384>,
    rs512: VerifyingKey<Sha512>,
    key_id: KeyId,
}

impl Rs256Signer {
    /// Bind an RSA private key and its id
    #[must_use]
    pub fn new(private_key: RsaPrivateKey, key_id: KeyId) -> Self {
        let public_key = private_key.to_public_key();
        Self {
            signing_key: SigningKey::<Sha256>::new(private_key),
            rs256: VerifyingKey::new(public_key.clone()),
            rs384: VerifyingKey::new(public_key.clone()),
            rs512: VerifyingKey::new(public_key),
            key_id,
        }
    }
}

impl Signer for Rs256Signer {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Rs256
    }

    fn accepts(&self, alg: Algorithm) -> bool {
        alg.is_rsa()
    }

    fn key_id(&self) -> KeyId {
        self.key_id
    }

    fn sign(&self, message: &[u8]) -> SignResult<Vec<u8>> {
        // Blinded private-key operation; PKCS#1 v1.5 output stays deterministic
        let signature = self
            .signing_key
            .try_sign_with_rng(&mut OsRng, message)
            .map_err(|e| SignError::Signing(format!("RS256: {e}")))?;
        Ok(signature.to_vec())
    }

    fn verify(&self, alg: Algorithm, message: &[u8], signature: &[u8]) -> bool {
        let Ok(signature) = Signature::try_from(signature) else {
            return false;
        };
        match alg {
            Algorithm::Rs256 => self.rs256.verify(message, &signature).is_ok(),
            Algorithm::Rs384 => self.rs384.verify(message, &signature).is_ok(),
            Algorithm::Rs512 => self.rs512.verify(message, &signature).is_ok(),
            Algorithm::EdDsa => false,
        }
    }
}

impl fmt::Debug for Rs256Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rs256Signer")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}
