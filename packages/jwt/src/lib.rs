//! Token issuing and verification core for a multi-tenant identity service.
//!
//! This crate provides:
//! - RS256 and EdDSA (Ed25519) signing, one algorithm per private key
//! - PEM key loading (PKCS#1 and PKCS#8) with numeric key ids taken from
//!   the key file name
//! - The platform's claims model with a compile-time checked builder
//! - A two-valued verification outcome: expired or invalid
//! - Pre-trust `kid` extraction and a key ring for multi-key verification
//!
//! ```no_run
//! use chrono::Duration;
//! use devauth_jwt::{new_jwt_handler, Claims, DEFAULT_PRIVATE_KEY_FILENAME_PATTERN};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = new_jwt_handler(
//!     "/etc/useradm/rsa/private.id.1.pem",
//!     DEFAULT_PRIVATE_KEY_FILENAME_PATTERN,
//! )?;
//!
//! let claims = Claims::builder()
//!     .issuer("useradm")
//!     .subject("user-1")
//!     .expires_in(Duration::hours(1))
//!     .tenant("t1")
//!     .user()
//!     .build();
//!
//! let token = handler.to_jwt(&claims)?;
//! let verified = handler.from_jwt(&token)?;
//! assert_eq!(verified.sub, "user-1");
//! # Ok(())
//! # }
//! ```

pub mod algorithms;
pub mod claims;
pub mod config;
mod error;
pub mod handler;
pub mod key_id;
pub mod keyring;
pub mod keys;
pub mod token;
pub mod traits;
mod types;
pub mod validation;

pub use algorithms::{Algorithm, Ed25519Signer, Rs256Signer};
pub use claims::{Claims, ClaimsBuilder};
pub use config::HandlerConfig;
pub use error::*;
pub use handler::JwtHandler;
pub use key_id::{
    get_key_id, key_id_from_path, key_id_of, KeyId, DEFAULT_PRIVATE_KEY_FILENAME_PATTERN,
    KEY_ID_ZERO,
};
pub use keyring::KeyRing;
pub use keys::{
    handler_from_material, load_private_key, new_jwt_handler, new_jwt_handler_with_options,
    parse_private_key_pem, PrivateKeyMaterial,
};
pub use token::Token;
pub use traits::{Handler, Signer};
pub use validation::ValidationOptions;
