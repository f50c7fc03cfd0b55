//! Canonical request construction.
//!
//! - [Create a canonical request](https://docs.aws.amazon.com/IAM/latest/UserGuide/create-signed-request.html#create-canonical-request)

use crate::constants::{AWS_QUERY_ENCODE_SET, AWS_URI_ENCODE_SET, X_AMZ_CONTENT_SHA_256, X_AMZ_DATE};
use http::header::AUTHORIZATION;
use http::{HeaderMap, Method};
use loadreport_core::{Error, Result};
use percent_encoding::{percent_decode_str, utf8_percent_encode};
use std::fmt::Write;

/// Headers that every canonical request must sign.
const REQUIRED_HEADERS: [&str; 3] = ["host", X_AMZ_CONTENT_SHA_256, X_AMZ_DATE];

/// Canonicalize the absolute path of a request.
///
/// The path is decoded first and encoded again, so an already canonical path
/// comes out unchanged instead of being double-encoded. An empty path is `/`.
pub fn canonical_uri(path: &str) -> Result<String> {
    if path.is_empty() {
        return Ok("/".to_string());
    }

    let decoded = percent_decode_str(path).decode_utf8().map_err(|e| {
        Error::request_invalid(format!("path is not valid utf-8 once decoded: {path}"))
            .with_source(e)
    })?;
    let encoded = utf8_percent_encode(&decoded, &AWS_URI_ENCODE_SET).to_string();

    if encoded.starts_with('/') {
        Ok(encoded)
    } else {
        Ok(format!("/{encoded}"))
    }
}

/// Canonicalize decoded query parameters.
///
/// Returns an empty string for no parameters. Otherwise keys and values are
/// encoded, sorted by key then value, and joined as `k=v` with `&`; an empty
/// value keeps its `=`.
pub fn canonical_query(query: &[(String, String)]) -> String {
    if query.is_empty() {
        return String::new();
    }

    let mut pairs = query
        .iter()
        .map(|(k, v)| {
            (
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET).to_string(),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect::<Vec<_>>();
    // Sort by param name
    pairs.sort();

    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Trim a header value and collapse inner runs of whitespace into one space.
pub fn normalize_header_value(value: &str) -> String {
    value.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased, normalized, name-sorted headers that take part in the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalHeaders(Vec<(String, String)>);

impl CanonicalHeaders {
    /// Collect the headers to sign.
    ///
    /// Repeated headers are joined with `,` in the order they were added.
    /// `authorization` is never signed.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        let mut entries = Vec::with_capacity(headers.keys_len());
        for name in headers.keys() {
            if name == AUTHORIZATION {
                continue;
            }

            let mut values = Vec::new();
            for value in headers.get_all(name) {
                let value = value.to_str().map_err(|e| {
                    Error::request_invalid(format!("header {name} is not visible ascii"))
                        .with_source(e)
                })?;
                values.push(normalize_header_value(value));
            }
            // HeaderName is always lowercase.
            entries.push((name.as_str().to_string(), values.join(",")));
        }
        entries.sort();

        Ok(Self(entries))
    }

    /// Get a header value by lowercase name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Signed header names joined by `;`.
    pub fn signed_headers(&self) -> String {
        self.0
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Iterate over `(name, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Build the canonical request text.
///
/// ```text
/// <method>\n
/// <canonical uri>\n
/// <canonical query>\n
/// <name>:<value>\n ... (one line per signed header)
/// \n
/// <signed headers>\n
/// <payload hash>
/// ```
///
/// `host`, `x-amz-date` and `x-amz-content-sha256` must be present; a missing
/// one is reported, never filled in here.
pub fn canonical_request(
    method: &Method,
    canonical_uri: &str,
    canonical_query: &str,
    headers: &CanonicalHeaders,
    payload_hash: &str,
) -> Result<String> {
    let method = method.as_str();
    if method.is_empty() || !method.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(Error::request_invalid(format!(
            "method must be an uppercase verb, got {method:?}"
        )));
    }
    for required in REQUIRED_HEADERS {
        match headers.get(required) {
            Some(v) if !v.is_empty() => {}
            _ => {
                return Err(Error::request_invalid(format!(
                    "required header {required} is missing"
                )))
            }
        }
    }

    // 512 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(512);
    writeln!(f, "{method}")?;
    writeln!(f, "{canonical_uri}")?;
    writeln!(f, "{canonical_query}")?;
    for (name, value) in headers.iter() {
        writeln!(f, "{name}:{value}")?;
    }
    writeln!(f)?;
    writeln!(f, "{}", headers.signed_headers())?;
    write!(f, "{payload_hash}")?;

    Ok(f)
}
