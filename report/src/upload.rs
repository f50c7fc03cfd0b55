//! Signed upload of the summary to an S3-compatible store.

use crate::constants::S3_SERVICE;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, Request, StatusCode};
use loadreport_aws_v4::{Credential, RequestSigner, SigningKeyCache, StaticCredentialProvider};
use loadreport_core::{Context, Error, ErrorKind, Result, Signer};
use log::{debug, info};
use std::sync::Arc;

/// Puts objects into one bucket.
#[derive(Debug, Clone)]
pub struct Uploader {
    signer: Signer<Credential>,
    endpoint: String,
    bucket: String,
}

impl Uploader {
    /// Create an uploader that signs with `credential` for `region`.
    pub fn new(
        ctx: Context,
        credential: Credential,
        region: &str,
        endpoint: &str,
        bucket: &str,
    ) -> Self {
        let builder = RequestSigner::new(S3_SERVICE, region)
            .with_key_cache(Arc::new(SigningKeyCache::new()));

        Self {
            signer: Signer::new(ctx, StaticCredentialProvider::from(credential), builder),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
        }
    }

    /// Path-style URL of an object.
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{key}", self.endpoint, self.bucket)
    }

    /// `PUT` a text object.
    ///
    /// Only `200` counts as success. Nothing is retried.
    pub async fn upload(&self, key: &str, body: Bytes) -> Result<()> {
        let url = self.object_url(key);
        let (mut parts, _) = Request::builder()
            .method(Method::PUT)
            .uri(&url)
            .header(CONTENT_TYPE, "text/plain")
            .body(())?
            .into_parts();

        self.signer.sign(&mut parts, &body).await?;
        let req = Request::from_parts(parts, body);
        debug!("signed upload request: {req:?}");

        let resp = self.signer.context().http_send(req).await.map_err(|e| {
            if e.kind() == ErrorKind::Unexpected {
                Error::upload_failed(format!("failed to send {url}")).with_source(e)
            } else {
                e
            }
        })?;

        match resp.status() {
            StatusCode::OK => {
                info!("uploaded summary to {url}");
                Ok(())
            }
            status => Err(Error::upload_failed(format!(
                "upload to {url} got {status}: {}",
                String::from_utf8_lossy(resp.body())
            ))),
        }
    }
}
