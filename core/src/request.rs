use std::mem;

use bytes::Bytes;
use http::header::{HeaderName, HOST};
use http::request::Parts;
use http::{HeaderMap, HeaderValue, Method};

use crate::{Error, Result};

/// Description of one HTTP request to be signed.
///
/// The descriptor is immutable for the duration of a signing operation: the
/// signer only reads from it and returns the headers to attach.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// HTTP method.
    pub method: Method,
    /// Host (and optional port) the request is sent to.
    pub host: String,
    /// Absolute path, as it appears on the wire (may be percent-encoded).
    pub path: String,
    /// Decoded query parameters in their original order.
    pub query: Vec<(String, String)>,
    /// HTTP headers.
    pub headers: HeaderMap,
    /// The exact bytes that will be transmitted as the body.
    pub payload: Bytes,
}

impl RequestDescriptor {
    /// Create a descriptor with no query, no headers and an empty payload.
    pub fn new(method: Method, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method,
            host: host.into(),
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            payload: Bytes::new(),
        }
    }

    /// Append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Parse a raw query string (`a=b&c=d`) and append its parameters.
    pub fn with_query_string(mut self, query: &str) -> Self {
        self.query.extend(parse_query(query));
        self
    }

    /// Insert a header, replacing any existing value.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Set the payload.
    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Build a descriptor from `http::request::Parts` and the body to be sent.
    ///
    /// Headers are moved out of `parts` to avoid a copy; hand them back with
    /// [`RequestDescriptor::apply`].
    pub fn from_parts(parts: &mut Parts, body: &Bytes) -> Result<Self> {
        let host = match parts.uri.authority() {
            Some(authority) => authority.as_str().to_string(),
            None => match parts.headers.get(HOST) {
                Some(v) => v.to_str()?.to_string(),
                None => {
                    return Err(Error::request_invalid(
                        "request without authority or host header is invalid for signing",
                    ))
                }
            },
        };

        Ok(RequestDescriptor {
            method: parts.method.clone(),
            host,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(parse_query).unwrap_or_default(),

            // Take the headers out of the request to avoid copy.
            // We will return it back when apply the descriptor.
            headers: mem::take(&mut parts.headers),
            payload: body.clone(),
        })
    }

    /// Give the (possibly extended) headers back to `http::request::Parts`.
    pub fn apply(mut self, parts: &mut Parts) {
        mem::swap(&mut parts.headers, &mut self.headers);
    }

    /// Get header value by name.
    ///
    /// Returns `None` if header not found.
    pub fn header_get(&self, key: &str) -> Result<Option<&str>> {
        match self.headers.get(key) {
            Some(v) => Ok(Some(v.to_str()?)),
            None => Ok(None),
        }
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_parts_takes_authority_and_query() -> Result<()> {
        let (mut parts, _) = http::Request::get(
            "http://127.0.0.1:9000/hello?list-type=2&prefix=CI%2F&empty",
        )
        .header("x-amz-meta-a", "b")
        .body(())?
        .into_parts();

        let desc = RequestDescriptor::from_parts(&mut parts, &Bytes::from_static(b"data"))?;
        assert_eq!(desc.method, Method::GET);
        assert_eq!(desc.host, "127.0.0.1:9000");
        assert_eq!(desc.path, "/hello");
        assert_eq!(
            desc.query,
            vec![
                ("list-type".to_string(), "2".to_string()),
                ("prefix".to_string(), "CI/".to_string()),
                ("empty".to_string(), "".to_string()),
            ]
        );
        assert_eq!(desc.header_get("x-amz-meta-a")?, Some("b"));
        assert_eq!(desc.payload, Bytes::from_static(b"data"));
        assert!(parts.headers.is_empty());

        desc.apply(&mut parts);
        assert_eq!(parts.headers["x-amz-meta-a"], "b");
        Ok(())
    }

    #[test]
    fn test_from_parts_falls_back_to_host_header() -> Result<()> {
        let (mut parts, _) = http::Request::put("/bucket/key")
            .header(HOST, "minio.example.com")
            .body(())?
            .into_parts();

        let desc = RequestDescriptor::from_parts(&mut parts, &Bytes::new())?;
        assert_eq!(desc.host, "minio.example.com");
        Ok(())
    }

    #[test]
    fn test_from_parts_without_host_is_invalid() -> Result<()> {
        let (mut parts, _) = http::Request::put("/bucket/key").body(())?.into_parts();

        let err = RequestDescriptor::from_parts(&mut parts, &Bytes::new())
            .expect_err("must fail without host");
        assert_eq!(err.kind(), crate::ErrorKind::RequestInvalid);
        Ok(())
    }

    #[test]
    fn test_builder() -> Result<()> {
        let desc = RequestDescriptor::new(Method::PUT, "minio.example.com", "/my-bucket/a.txt")
            .with_query_string("tagging&versionId=1")
            .with_header("Content-Type", "text/plain")?
            .with_payload("hello");

        assert_eq!(desc.query.len(), 2);
        assert_eq!(desc.header_get("content-type")?, Some("text/plain"));
        assert_eq!(desc.payload.as_ref(), b"hello");
        Ok(())
    }
}
