//! Key identifiers: derivation from key file names and pre-trust
//! extraction from token headers.
//!
//! Every issued token carries the numeric id of the key that signed it in
//! the `kid` header. A service holding several keys reads that id with
//! [`get_key_id`] before verification to pick which handler gets the
//! token. The id grants no trust on its own.

use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::algorithms::utils::base64_url_decode;

/// Default pattern matching key files named `private.id.<n>.pem`
pub const DEFAULT_PRIVATE_KEY_FILENAME_PATTERN: &str = r"private\.id\.([0-9]+)\.pem";

/// The zero/unknown key identifier
pub const KEY_ID_ZERO: KeyId = KeyId(0);

/// Numeric identifier of a signing key
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct KeyId(pub u64);

impl KeyId {
    /// Whether this is [`KEY_ID_ZERO`]
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for KeyId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derive a key id from the file name of `path`.
///
/// The file name is matched against `pattern`; when the first capture
/// group matches and parses as an integer that is the id. Everything else,
/// including an invalid pattern, yields [`KEY_ID_ZERO`].
pub fn key_id_from_path(path: impl AsRef<Path>, pattern: &str) -> KeyId {
    let re = match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!(pattern, error = %e, "invalid private key filename pattern");
            return KEY_ID_ZERO;
        }
    };

    let Some(file_name) = path.as_ref().file_name().and_then(OsStr::to_str) else {
        return KEY_ID_ZERO;
    };

    re.captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map_or(KEY_ID_ZERO, KeyId)
}

/// Read the `kid` header of an unverified token.
///
/// Returns `None` when the token does not have three segments, the header
/// is not a base64url JSON object, or `kid` is absent or not a usable
/// number. The signature is never checked.
#[must_use]
pub fn key_id_of(token: &str) -> Option<KeyId> {
    let segments: Vec<&str> = token.splitn(4, '.').collect();
    if segments.len() != 3 {
        return None;
    }

    let header_bytes = base64_url_decode(segments[0]).ok()?;
    let header: Map<String, Value> = serde_json::from_slice(&header_bytes).ok()?;

    match header.get("kid")? {
        Value::Number(n) => key_id_from_number(n),
        _ => None,
    }
}

/// Read the `kid` header of an unverified token, or [`KEY_ID_ZERO`].
///
/// Never fails: it runs before any trust is established.
#[must_use]
pub fn get_key_id(token: &str) -> KeyId {
    key_id_of(token).unwrap_or(KEY_ID_ZERO)
}

// A JSON number is exactly one of unsigned, negative or float.
fn key_id_from_number(n: &Number) -> Option<KeyId> {
    if let Some(id) = n.as_u64() {
        return Some(KeyId(id));
    }
    if let Some(id) = n.as_i64() {
        return u64::try_from(id).ok().map(KeyId);
    }
    n.as_f64()
        .filter(|f| f.is_finite() && *f >= 0.0)
        .map(|f| KeyId(f as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::utils::base64_url_encode;

    fn token_with_header(header: &str) -> String {
        format!(
            "{}.{}.{}",
            base64_url_encode(header.as_bytes()),
            base64_url_encode(b"{}"),
            base64_url_encode(b"sig")
        )
    }

    #[test]
    fn test_key_id_from_default_pattern() {
        let id = key_id_from_path(
            "/etc/useradm/rsa/private.id.1234.pem",
            DEFAULT_PRIVATE_KEY_FILENAME_PATTERN,
        );
        assert_eq!(id, KeyId(1234));
    }

    #[test]
    fn test_key_id_from_path_without_match() {
        assert_eq!(
            key_id_from_path("/etc/useradm/rsa/private.pem", DEFAULT_PRIVATE_KEY_FILENAME_PATTERN),
            KEY_ID_ZERO
        );
        // Only the file name is matched, never the directories
        assert_eq!(
            key_id_from_path("/keys/private.id.5.pem/server.pem", DEFAULT_PRIVATE_KEY_FILENAME_PATTERN),
            KEY_ID_ZERO
        );
    }

    #[test]
    fn test_key_id_from_path_with_invalid_pattern() {
        assert_eq!(key_id_from_path("private.id.3.pem", "private.id.(["), KEY_ID_ZERO);
    }

    #[test]
    fn test_zero_key_id() {
        assert!(KEY_ID_ZERO.is_zero());
        assert!(KeyId::default().is_zero());
        assert!(!KeyId(1).is_zero());
        assert!(key_id_from_path("server.pem", DEFAULT_PRIVATE_KEY_FILENAME_PATTERN).is_zero());
    }

    #[test]
    fn test_key_id_from_path_is_deterministic() {
        let a = key_id_from_path("keys/key-42.pem", r"key-(\d+)\.pem");
        let b = key_id_from_path("keys/key-42.pem", r"key-(\d+)\.pem");
        assert_eq!(a, b);
        assert_eq!(a, KeyId(42));
    }

    #[test]
    fn test_kid_integer() {
        let token = token_with_header(r#"{"alg":"RS256","kid":7,"typ":"JWT"}"#);
        assert_eq!(key_id_of(&token), Some(KeyId(7)));
        assert_eq!(get_key_id(&token), KeyId(7));
    }

    #[test]
    fn test_kid_float() {
        let token = token_with_header(r#"{"alg":"EdDSA","kid":7.0,"typ":"JWT"}"#);
        assert_eq!(get_key_id(&token), KeyId(7));

        let token = token_with_header(r#"{"alg":"EdDSA","kid":7e0}"#);
        assert_eq!(get_key_id(&token), KeyId(7));
    }

    #[test]
    fn test_kid_large_integer() {
        let token = token_with_header(r#"{"alg":"RS256","kid":18446744073709551615}"#);
        assert_eq!(get_key_id(&token), KeyId(u64::MAX));
    }

    #[test]
    fn test_kid_unusable_values() {
        for header in [
            r#"{"alg":"RS256","kid":-3}"#,
            r#"{"alg":"RS256","kid":-1.5}"#,
            r#"{"alg":"RS256","kid":"7"}"#,
            r#"{"alg":"RS256","kid":null}"#,
            r#"{"alg":"RS256","kid":[7]}"#,
            r#"{"alg":"RS256"}"#,
            r#"[7]"#,
            "not json",
        ] {
            let token = token_with_header(header);
            assert_eq!(key_id_of(&token), None, "header {header}");
            assert_eq!(get_key_id(&token), KEY_ID_ZERO, "header {header}");
        }
    }

    #[test]
    fn test_kid_malformed_tokens() {
        for token in ["", ".", "..", "...", "abc", "a.b", "a.b.c.d", "!!!.e30.e30"] {
            assert_eq!(get_key_id(token), KEY_ID_ZERO, "token {token:?}");
        }
    }

    #[test]
    fn test_kid_wrong_segment_count() {
        let token = token_with_header(r#"{"kid":7}"#);
        assert_eq!(get_key_id(&format!("{token}.extra")), KEY_ID_ZERO);
    }
}
