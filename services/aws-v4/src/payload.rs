//! Payload hashing.

use crate::constants::UNSIGNED_PAYLOAD;
use loadreport_core::hash::{hex_sha256, HexDigest};
use loadreport_core::{Error, Result};
use std::fmt;

/// Hash the exact bytes that will be transmitted as the request body.
///
/// An empty payload hashes the empty byte string.
pub fn hash_payload(payload: &[u8]) -> HexDigest {
    hex_sha256(payload)
}

/// Value of `x-amz-content-sha256`, which is also the last line of the
/// canonical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadHash {
    /// The body is covered by the signature.
    Signed(HexDigest),
    /// The literal `UNSIGNED-PAYLOAD`.
    Unsigned,
}

impl PayloadHash {
    /// Decide the payload hash of a request.
    ///
    /// Without a caller-supplied header the body is hashed. A supplied
    /// header must be either `UNSIGNED-PAYLOAD` or exactly the digest of the
    /// body; anything else would make the store reject the request, so it is
    /// refused here.
    pub fn resolve(payload: &[u8], header: Option<&str>) -> Result<Self> {
        let computed = hash_payload(payload);
        match header {
            None => Ok(PayloadHash::Signed(computed)),
            Some(UNSIGNED_PAYLOAD) => Ok(PayloadHash::Unsigned),
            Some(v) => {
                let supplied = HexDigest::parse(v.trim())?;
                if supplied != computed {
                    return Err(Error::request_invalid(format!(
                        "x-amz-content-sha256 {supplied} does not match payload digest {computed}"
                    )));
                }
                Ok(PayloadHash::Signed(supplied))
            }
        }
    }

    /// Borrow as str.
    pub fn as_str(&self) -> &str {
        match self {
            PayloadHash::Signed(v) => v.as_str(),
            PayloadHash::Unsigned => UNSIGNED_PAYLOAD,
        }
    }
}

impl fmt::Display for PayloadHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
