// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Hash related utils.
//!
//! SHA-256 and HMAC-SHA256 outputs come in two shapes that must never be
//! mixed up: [`RawDigest`] holds the 32 raw bytes and is what gets fed back
//! into HMAC as a key, [`HexDigest`] holds the 64 lowercase hex characters
//! that appear in headers and in the string to sign. Converting raw to hex is
//! explicit via [`RawDigest::to_hex`]; there is no way to turn a `HexDigest`
//! into key material other than [`HexDigest::decode`].

use crate::{Error, Result};
use hmac::Hmac;
use hmac::Mac;
use sha2::Digest;
use sha2::Sha256;
use std::fmt;

/// Length in bytes of a SHA-256 output.
pub const SHA256_OUTPUT_LEN: usize = 32;

/// Raw bytes of a SHA-256 or HMAC-SHA256 output.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawDigest([u8; SHA256_OUTPUT_LEN]);

impl RawDigest {
    /// Wrap raw digest bytes.
    pub fn new(bytes: [u8; SHA256_OUTPUT_LEN]) -> Self {
        Self(bytes)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; SHA256_OUTPUT_LEN] {
        &self.0
    }

    /// Hex encode into the lowercase textual form.
    pub fn to_hex(&self) -> HexDigest {
        HexDigest(hex::encode(self.0))
    }
}

impl AsRef<[u8]> for RawDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// Raw digests double as key material, never print them.
impl fmt::Debug for RawDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawDigest(***)")
    }
}

/// Lowercase hex text of a SHA-256 or HMAC-SHA256 output, always 64 characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HexDigest(String);

impl HexDigest {
    /// Validate a string as a hex digest.
    ///
    /// Only lowercase input is accepted since that is the only form the
    /// protocol ever produces.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() != SHA256_OUTPUT_LEN * 2 {
            return Err(Error::request_invalid(format!(
                "hex digest must be {} characters, got {}",
                SHA256_OUTPUT_LEN * 2,
                s.len()
            )));
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(Error::request_invalid(
                "hex digest must only contain lowercase hex characters",
            ));
        }

        Ok(Self(s.to_string()))
    }

    /// Decode back into raw bytes.
    pub fn decode(&self) -> Result<RawDigest> {
        let mut bytes = [0; SHA256_OUTPUT_LEN];
        hex::decode_to_slice(&self.0, &mut bytes)
            .map_err(|e| Error::unexpected("hex decode failed").with_source(e))?;
        Ok(RawDigest(bytes))
    }

    /// Borrow as str.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for HexDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for HexDigest {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for HexDigest {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// SHA256 hash.
pub fn sha256(content: &[u8]) -> RawDigest {
    RawDigest(Sha256::digest(content).into())
}

/// Hex encoded SHA256 hash.
pub fn hex_sha256(content: &[u8]) -> HexDigest {
    sha256(content).to_hex()
}

/// HMAC with SHA256 hash.
pub fn hmac_sha256(key: &[u8], content: &[u8]) -> RawDigest {
    // SAFETY: HMAC's new_from_slice always returns Ok - it handles any key length
    let mut h = Hmac::<Sha256>::new_from_slice(key).unwrap();
    h.update(content);

    RawDigest(h.finalize().into_bytes().into())
}

/// Hex encoded HMAC with SHA256 hash.
pub fn hex_hmac_sha256(key: &[u8], content: &[u8]) -> HexDigest {
    hmac_sha256(key, content).to_hex()
}
