//! Multi-key verification support.
//!
//! A service that rotates keys keeps every handler whose tokens may still be
//! in flight. [`KeyRing`] indexes them by key id, signs with the newest
//! one and routes each incoming token to the handler its `kid` names,
//! falling back to the [`KEY_ID_ZERO`] handler for tokens issued before
//! key ids existed.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{KeyLoadResult, TokenError, TokenResult};
use crate::key_id::{key_id_of, KeyId, KEY_ID_ZERO};
use crate::keys::new_jwt_handler;
use crate::token::Token;
use crate::traits::Handler;

/// Handlers indexed by key id.
#[derive(Clone, Default)]
pub struct KeyRing {
    handlers: BTreeMap<KeyId, Arc<dyn Handler>>,
}

impl KeyRing {
    /// Empty key ring.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Key ring over already built handlers. Later handlers replace earlier
    /// ones with the same key id.
    pub fn from_handlers(handlers: impl IntoIterator<Item = Arc<dyn Handler>>) -> Self {
        let mut ring = Self::new();
        for handler in handlers {
            ring.insert(handler);
        }
        ring
    }

    /// Load one handler per key file.
    ///
    /// Fails on the first file that does not load.
    pub fn load<P: AsRef<Path>>(
        paths: impl IntoIterator<Item = P>,
        filename_pattern: &str,
    ) -> KeyLoadResult<Self> {
        let mut ring = Self::new();
        for path in paths {
            ring.insert(new_jwt_handler(path, filename_pattern)?);
        }
        tracing::info!(keys = ring.len(), "loaded key ring");
        Ok(ring)
    }

    /// Add a handler, returning the one it replaced.
    pub fn insert(&mut self, handler: Arc<dyn Handler>) -> Option<Arc<dyn Handler>> {
        let key_id = handler.key_id();
        let previous = self.handlers.insert(key_id, handler);
        if previous.is_some() {
            tracing::warn!(%key_id, "replacing handler with duplicate key id");
        }
        previous
    }

    /// Handler for exactly `key_id`.
    pub fn get(&self, key_id: KeyId) -> Option<&Arc<dyn Handler>> {
        self.handlers.get(&key_id)
    }

    /// Number of handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the ring holds no handlers.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Key ids held, ascending.
    pub fn key_ids(&self) -> impl Iterator<Item = KeyId> + '_ {
        self.handlers.keys().copied()
    }

    /// Handler new tokens are signed with: the highest key id.
    pub fn signing_handler(&self) -> Option<&Arc<dyn Handler>> {
        self.handlers.values().next_back()
    }

    /// Handler an incoming token should be verified with.
    ///
    /// Uses the token's `kid` when a handler holds it, else the
    /// [`KEY_ID_ZERO`] handler.
    pub fn handler_for(&self, token: &str) -> Option<&Arc<dyn Handler>> {
        key_id_of(token)
            .and_then(|key_id| self.handlers.get(&key_id))
            .or_else(|| self.handlers.get(&KEY_ID_ZERO))
    }

    /// Verify `token` with the handler its `kid` selects.
    pub fn verify(&self, token: &str) -> TokenResult<Token> {
        self.verify_at(token, Utc::now())
    }

    /// [`KeyRing::verify`] with an explicit verification time.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> TokenResult<Token> {
        let Some(handler) = self.handler_for(token) else {
            tracing::debug!("no handler for token key id");
            return Err(TokenError::Invalid);
        };
        handler.from_jwt_at(token, now)
    }
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRing")
            .field("key_ids", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::Ed25519Signer;
    use crate::claims::Claims;
    use crate::handler::JwtHandler;
    use chrono::Duration;
    use ed25519_dalek::SigningKey;

    fn handler(seed: u8, kid: u64) -> Arc<dyn Handler> {
        Arc::new(JwtHandler::new(Ed25519Signer::new(
            SigningKey::from_bytes(&[seed; 32]),
            KeyId(kid),
        )))
    }

    fn claims() -> Claims {
        Claims::builder()
            .issuer("useradm")
            .subject("user-1")
            .expires_in(Duration::hours(1))
            .build()
    }

    #[test]
    fn test_signs_with_highest_key_id() {
        let ring = KeyRing::from_handlers([handler(1, 1), handler(3, 3), handler(2, 2)]);
        let signing = ring.signing_handler().map(|h| h.key_id());
        assert_eq!(signing, Some(KeyId(3)));
        assert_eq!(ring.key_ids().collect::<Vec<_>>(), [KeyId(1), KeyId(2), KeyId(3)]);
    }

    #[test]
    fn test_routes_by_kid() -> Result<(), Box<dyn std::error::Error>> {
        let ring = KeyRing::from_handlers([handler(1, 1), handler(2, 2)]);
        for kid in [1, 2] {
            let token = ring.get(KeyId(kid)).ok_or("missing")?.to_jwt(&claims())?;
            assert_eq!(ring.verify(&token)?.sub, "user-1");
        }
        Ok(())
    }

    #[test]
    fn test_unknown_kid_falls_back_to_zero() -> Result<(), Box<dyn std::error::Error>> {
        let ring = KeyRing::from_handlers([handler(9, 0), handler(1, 1)]);

        // Same key as the zero handler but advertising an unknown id
        let relabelled = JwtHandler::new(Ed25519Signer::new(
            SigningKey::from_bytes(&[9; 32]),
            KeyId(42),
        ));
        let token = relabelled.to_jwt(&claims())?;
        assert!(ring.verify(&token).is_ok());
        Ok(())
    }

    #[test]
    fn test_no_handler_is_invalid() -> Result<(), Box<dyn std::error::Error>> {
        let token = handler(1, 1).to_jwt(&claims())?;
        assert_eq!(KeyRing::new().verify(&token), Err(TokenError::Invalid));

        let ring = KeyRing::from_handlers([handler(2, 2)]);
        assert_eq!(ring.verify(&token), Err(TokenError::Invalid));
        Ok(())
    }

    #[test]
    fn test_insert_replaces_duplicate() {
        let mut ring = KeyRing::new();
        assert!(ring.insert(handler(1, 5)).is_none());
        assert!(ring.insert(handler(2, 5)).is_some());
        assert_eq!(ring.len(), 1);
    }
}
