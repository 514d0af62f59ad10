//! Private key loading and handler construction.
//!
//! A key file holds one PEM block. Its label selects the decoder:
//!
//! - `RSA PRIVATE KEY`: PKCS#1, always RSA
//! - `PRIVATE KEY`: PKCS#8, classified by the algorithm OID into RSA or
//!   Ed25519
//!
//! Anything else is rejected as an unsupported key type. The file is read
//! once and no handle is kept; the handler owns only the decoded key.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use const_oid::db::rfc5912::RSA_ENCRYPTION;
use const_oid::db::rfc8410::ID_ED_25519;
use ed25519_dalek::pkcs8::DecodePrivateKey as _;
use rsa::pkcs1::DecodeRsaPrivateKey as _;
use rsa::pkcs8::{DecodePrivateKey as _, PrivateKeyInfo};
use rsa::RsaPrivateKey;
use zeroize::Zeroizing;

use crate::algorithms::{Algorithm, Ed25519Signer, Rs256Signer};
use crate::error::{KeyLoadError, KeyLoadResult};
use crate::handler::JwtHandler;
use crate::key_id::{key_id_from_path, KeyId};
use crate::traits::Handler;
use crate::validation::ValidationOptions;

const PEM_LABEL_PKCS1: &str = "RSA PRIVATE KEY";
const PEM_LABEL_PKCS8: &str = "PRIVATE KEY";

/// A decoded private key. Exactly one algorithm per key.
#[derive(Clone)]
pub enum PrivateKeyMaterial {
    /// RSA key, signs RS256
    Rsa(RsaPrivateKey),
    /// Ed25519 key, signs EdDSA
    Ed25519(ed25519_dalek::SigningKey),
}

impl PrivateKeyMaterial {
    /// Algorithm tokens signed with this key use
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        match self {
            PrivateKeyMaterial::Rsa(_) => Algorithm::Rs256,
            PrivateKeyMaterial::Ed25519(_) => Algorithm::EdDsa,
        }
    }
}

impl fmt::Debug for PrivateKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrivateKeyMaterial")
            .field(&self.algorithm())
            .finish()
    }
}

/// Read and decode the private key at `path`.
pub fn load_private_key(path: impl AsRef<Path>) -> KeyLoadResult<PrivateKeyMaterial> {
    let path = path.as_ref();
    let contents = Zeroizing::new(fs::read(path).map_err(|source| {
        tracing::warn!(path = %path.display(), error = %source, "failed to read private key");
        KeyLoadError::Read {
            path: path.to_path_buf(),
            source,
        }
    })?);

    parse_private_key_pem(&contents).inspect_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "failed to load private key");
    })
}

/// Decode the first PEM block of `input` into a private key.
pub fn parse_private_key_pem(input: &[u8]) -> KeyLoadResult<PrivateKeyMaterial> {
    let block = pem::parse(input).map_err(|e| KeyLoadError::Pem(e.to_string()))?;
    let label = block.tag().to_owned();
    let der = Zeroizing::new(block.into_contents());

    match label.as_str() {
        PEM_LABEL_PKCS1 => parse_pkcs1(&der),
        PEM_LABEL_PKCS8 => parse_pkcs8(&der),
        _ => {
            tracing::debug!(label = %label, "unrecognised PEM label");
            Err(KeyLoadError::UnsupportedKeyType)
        }
    }
}

fn parse_pkcs1(der: &[u8]) -> KeyLoadResult<PrivateKeyMaterial> {
    let key = RsaPrivateKey::from_pkcs1_der(der)
        .map_err(|e| KeyLoadError::malformed("PKCS#1 RSA", e))?;
    validated_rsa(key, "PKCS#1 RSA")
}

fn parse_pkcs8(der: &[u8]) -> KeyLoadResult<PrivateKeyMaterial> {
    let info = PrivateKeyInfo::try_from(der).map_err(|e| KeyLoadError::malformed("PKCS#8", e))?;
    let oid = info.algorithm.oid;

    if oid == RSA_ENCRYPTION {
        let key = RsaPrivateKey::from_pkcs8_der(der)
            .map_err(|e| KeyLoadError::malformed("PKCS#8 RSA", e))?;
        validated_rsa(key, "PKCS#8 RSA")
    } else if oid == ID_ED_25519 {
        let key = ed25519_dalek::SigningKey::from_pkcs8_der(der)
            .map_err(|e| KeyLoadError::malformed("PKCS#8 Ed25519", e))?;
        Ok(PrivateKeyMaterial::Ed25519(key))
    } else {
        tracing::debug!(%oid, "unsupported PKCS#8 key algorithm");
        Err(KeyLoadError::UnsupportedKeyType)
    }
}

fn validated_rsa(key: RsaPrivateKey, kind: &'static str) -> KeyLoadResult<PrivateKeyMaterial> {
    key.validate()
        .map_err(|e| KeyLoadError::malformed(kind, e))?;
    Ok(PrivateKeyMaterial::Rsa(key))
}

/// Wrap decoded key material in the handler for its algorithm.
#[must_use]
pub fn handler_from_material(
    material: PrivateKeyMaterial,
    key_id: KeyId,
    options: ValidationOptions,
) -> Arc<dyn Handler> {
    match material {
        PrivateKeyMaterial::Rsa(key) => Arc::new(
            JwtHandler::new(Rs256Signer::new(key, key_id)).with_validation_options(options),
        ),
        PrivateKeyMaterial::Ed25519(key) => Arc::new(
            JwtHandler::new(Ed25519Signer::new(key, key_id)).with_validation_options(options),
        ),
    }
}

/// Build a handler from the private key at `path`.
///
/// The key id is derived from the file name with `filename_pattern`, see
/// [`key_id_from_path`].
pub fn new_jwt_handler(
    path: impl AsRef<Path>,
    filename_pattern: &str,
) -> KeyLoadResult<Arc<dyn Handler>> {
    new_jwt_handler_with_options(path, filename_pattern, ValidationOptions::default())
}

/// [`new_jwt_handler`] with explicit validation options.
pub fn new_jwt_handler_with_options(
    path: impl AsRef<Path>,
    filename_pattern: &str,
    options: ValidationOptions,
) -> KeyLoadResult<Arc<dyn Handler>> {
    let path = path.as_ref();
    let material = load_private_key(path)?;
    let key_id = key_id_from_path(path, filename_pattern);
    if key_id.is_zero() {
        tracing::warn!(
            path = %path.display(),
            pattern = filename_pattern,
            "private key file name carries no key id, signing with kid 0"
        );
    }

    tracing::info!(
        path = %path.display(),
        alg = %material.algorithm(),
        key_id = %key_id,
        "loaded server private key"
    );

    Ok(handler_from_material(material, key_id, options))
}
