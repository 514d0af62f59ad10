//! Verified token wrapper

use chrono::{DateTime, Utc};
use std::ops::Deref;

use crate::claims::Claims;

/// Claims plus in-memory metadata the identity service attaches to a token.
///
/// Only `claims` are ever signed; `name` and `last_used` are bookkeeping for
/// personal access tokens and never appear on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Signed payload.
    pub claims: Claims,
    /// Human-readable token name.
    pub name: Option<String>,
    /// Last time the token was presented.
    pub last_used: Option<DateTime<Utc>>,
}

impl Token {
    /// Wrap claims with no metadata.
    #[must_use]
    pub fn new(claims: Claims) -> Self {
        Self {
            claims,
            name: None,
            last_used: None,
        }
    }

    /// Attach a name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Record a use at `at`.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.last_used = Some(at);
    }

    /// Unwrap the claims.
    #[must_use]
    pub fn into_claims(self) -> Claims {
        self.claims
    }
}

impl From<Claims> for Token {
    fn from(claims: Claims) -> Self {
        Self::new(claims)
    }
}

impl Deref for Token {
    type Target = Claims;

    fn deref(&self) -> &Claims {
        &self.claims
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_metadata_stays_off_the_claims() -> Result<(), serde_json::Error> {
        let claims = Claims::builder()
            .issuer("useradm")
            .subject("user-1")
            .expires_in(Duration::days(30))
            .build();
        let used_at = Utc::now();

        let mut token = Token::from(claims.clone()).with_name("ci-runner");
        token.touch(used_at);

        assert_eq!(token.name.as_deref(), Some("ci-runner"));
        assert_eq!(token.last_used, Some(used_at));
        assert_eq!(token.sub, "user-1");

        let wire = serde_json::to_value(&token.claims)?;
        assert!(wire.get("name").is_none());
        assert_eq!(token.into_claims(), claims);
        Ok(())
    }
}
