//! JWT header structure

use serde::Serialize;

use crate::algorithms::Algorithm;
use crate::key_id::KeyId;

/// Header written into every issued token.
///
/// `kid` is always present and serialized as a bare JSON integer.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct JwtHeader {
    pub alg: &'static str,
    pub kid: KeyId,
    pub typ: &'static str,
}

impl JwtHeader {
    pub(crate) fn new(alg: Algorithm, kid: KeyId) -> Self {
        Self {
            alg: alg.as_str(),
            kid,
            typ: "JWT",
        }
    }
}
