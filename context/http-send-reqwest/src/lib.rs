//! Reqwest-based HTTP sending for loadreport.
//!
//! ```no_run
//! use loadreport_core::Context;
//! use loadreport_http_send_reqwest::ReqwestHttpSend;
//!
//! let client = reqwest::Client::builder()
//!     .use_rustls_tls()
//!     .build()
//!     .expect("client must build");
//! let ctx = Context::new().with_http_send(ReqwestHttpSend::new(client));
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::BodyExt;
use loadreport_core::{Error, HttpSend, Result};
use reqwest::{Client, Request};

/// `HttpSend` on top of a `reqwest::Client`.
///
/// Build the client yourself to add root certificates or default timeouts.
#[derive(Debug, Default, Clone)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let uri = req.uri().to_string();
        let req = Request::try_from(req).map_err(|e| {
            Error::request_invalid(format!("failed to convert request to {uri}")).with_source(e)
        })?;
        let resp: http::Response<_> = self
            .client
            .execute(req)
            .await
            .map_err(|e| Error::unexpected(format!("failed to send request to {uri}")).with_source(e))?
            .into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| {
                Error::unexpected(format!("failed to read response body from {uri}")).with_source(e)
            })?;
        Ok(http::Response::from_parts(parts, bs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadreport_core::ErrorKind;

    #[tokio::test]
    async fn test_unreachable_host_is_unexpected() -> Result<()> {
        let req = http::Request::get("http://127.0.0.1:1/unreachable").body(Bytes::new())?;

        let err = ReqwestHttpSend::default()
            .http_send(req)
            .await
            .expect_err("nothing listens on port 1");
        assert_eq!(err.kind(), ErrorKind::Unexpected);
        Ok(())
    }
}
