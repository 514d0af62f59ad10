//! Compact JWS codec shared by every signing algorithm.
//!
//! [`JwtHandler`] wraps one [`Signer`] and turns it into a [`Handler`]:
//!
//! - Header: `{"alg":<alg>,"kid":<key id>,"typ":"JWT"}`
//! - Payload: [`Claims`] as JSON
//! - Signature: the signer's output over `base64url(header).base64url(payload)`
//!
//! Verification checks, in order: three segments, a JSON header whose
//! `alg` the signer accepts, the signature, the payload shape,
//! and finally the claims at verification time. Claims of a token whose
//! signature does not verify are never looked at, so a forged expired
//! token is reported invalid rather than expired.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::algorithms::utils::{base64_url_decode, base64_url_encode};
use crate::algorithms::Algorithm;
use crate::claims::Claims;
use crate::error::{SignResult, TokenError, TokenResult};
use crate::key_id::KeyId;
use crate::token::Token;
use crate::traits::{Handler, Signer};
use crate::types::JwtHeader;
use crate::validation::ValidationOptions;

/// Handler bound to a single signer.
#[derive(Debug, Clone)]
pub struct JwtHandler<S: Signer> {
    signer: S,
    validation_options: ValidationOptions,
}

impl<S: Signer> JwtHandler<S> {
    /// Create a new handler with the given signer.
    pub fn new(signer: S) -> Self {
        Self {
            signer,
            validation_options: ValidationOptions::default(),
        }
    }

    /// Set custom validation options.
    #[must_use]
    pub fn with_validation_options(mut self, options: ValidationOptions) -> Self {
        self.validation_options = options;
        self
    }

    /// Get a reference to the validation options.
    pub fn validation_options(&self) -> &ValidationOptions {
        &self.validation_options
    }

    /// Get a reference to the signer.
    pub fn signer(&self) -> &S {
        &self.signer
    }

    fn encode(&self, claims: &Claims) -> SignResult<String> {
        let header = JwtHeader::new(self.signer.algorithm(), self.signer.key_id());
        let header_b64 = base64_url_encode(&serde_json::to_vec(&header)?);
        let claims_b64 = base64_url_encode(&serde_json::to_vec(claims)?);

        let mut token = String::with_capacity(header_b64.len() + claims_b64.len() + 2);
        token.push_str(&header_b64);
        token.push('.');
        token.push_str(&claims_b64);

        let signature = self.signer.sign(token.as_bytes())?;
        token.push('.');
        token.push_str(&base64_url_encode(&signature));

        Ok(token)
    }

    fn decode(&self, token: &str, now: DateTime<Utc>) -> TokenResult<Claims> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(self.reject("token does not have three segments"));
        };

        let header: Map<String, Value> = base64_url_decode(header_b64)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(|| self.reject("header is not a base64url JSON object"))?;

        let Some(alg) = header
            .get("alg")
            .and_then(Value::as_str)
            .and_then(Algorithm::from_header)
            .filter(|alg| self.signer.accepts(*alg))
        else {
            return Err(self.reject("header alg is not accepted by the handler"));
        };

        let signature = base64_url_decode(signature_b64)
            .map_err(|_| self.reject("signature is not base64url"))?;

        // Signing input is the first two segments as they appear on the wire
        let signing_input = &token[..header_b64.len() + 1 + payload_b64.len()];
        if !self.signer.verify(alg, signing_input.as_bytes(), &signature) {
            return Err(self.reject("signature verification failed"));
        }

        let claims: Claims = base64_url_decode(payload_b64)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(|| self.reject("payload is not a valid claims object"))?;

        claims
            .validate(now, &self.validation_options)
            .inspect_err(|e| {
                tracing::debug!(
                    key_id = %self.signer.key_id(),
                    alg = %self.signer.algorithm(),
                    error = %e,
                    "rejecting token claims"
                );
            })?;

        Ok(claims)
    }

    fn reject(&self, reason: &'static str) -> TokenError {
        tracing::debug!(
            key_id = %self.signer.key_id(),
            alg = %self.signer.algorithm(),
            reason,
            "rejecting token"
        );
        TokenError::Invalid
    }
}

impl<S: Signer> Handler for JwtHandler<S> {
    fn to_jwt(&self, claims: &Claims) -> SignResult<String> {
        self.encode(claims).inspect_err(|e| {
            tracing::error!(key_id = %self.signer.key_id(), error = %e, "failed to sign token");
        })
    }

    fn from_jwt_at(&self, token: &str, now: DateTime<Utc>) -> TokenResult<Token> {
        self.decode(token, now).map(Token::new)
    }

    fn key_id(&self) -> KeyId {
        self.signer.key_id()
    }

    fn algorithm(&self) -> Algorithm {
        self.signer.algorithm()
    }
}
