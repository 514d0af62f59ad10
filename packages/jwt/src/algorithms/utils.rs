//! Base64url helpers for the compact token form (RFC 7515, unpadded)

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

/// Base64 URL-safe encoding without padding
#[inline]
pub(crate) fn base64_url_encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Base64 URL-safe decoding without padding.
///
/// Rejects padding and non-canonical trailing bits.
#[inline]
pub(crate) fn base64_url_decode(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(input)
}
