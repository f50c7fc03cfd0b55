use crate::canonical::{canonical_query, canonical_request, canonical_uri, CanonicalHeaders};
use crate::constants::{AWS4_HMAC_SHA256, AWS4_REQUEST, X_AMZ_CONTENT_SHA_256, X_AMZ_DATE};
use crate::key::{SigningKey, SigningKeyCache};
use crate::payload::PayloadHash;
use crate::Credential;
use async_trait::async_trait;
use bytes::Bytes;
use http::header::{AUTHORIZATION, HOST};
use http::request::Parts;
use http::{HeaderMap, HeaderValue};
use loadreport_core::hash::{hex_sha256, HexDigest};
use loadreport_core::time::{format_date, format_iso8601, now, parse_iso8601, truncate_to_seconds, DateTime};
use loadreport_core::{Context, Error, RequestDescriptor, Result, SignRequest, SigningCredential};
use log::debug;
use std::fmt::Write;
use std::sync::Arc;

/// The one instant a request is signed at.
///
/// Sampled once per request: the canonical request, the string to sign, the
/// credential scope and the `x-amz-date` header all read from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningContext {
    timestamp: DateTime,
}

impl SigningContext {
    /// Create a context from an instant; sub-second precision is dropped.
    pub fn new(timestamp: DateTime) -> Self {
        Self {
            timestamp: truncate_to_seconds(timestamp),
        }
    }

    /// Sample the clock.
    pub fn now() -> Self {
        Self::new(now())
    }

    /// Create a context from an `x-amz-date` value like `20130524T000000Z`.
    pub fn from_iso8601(s: &str) -> Result<Self> {
        Ok(Self::new(parse_iso8601(s)?))
    }

    /// The signing instant.
    pub fn timestamp(&self) -> DateTime {
        self.timestamp
    }

    /// `YYYYMMDDTHHMMSSZ`
    pub fn amz_date(&self) -> String {
        format_iso8601(self.timestamp)
    }

    /// `YYYYMMDD`
    pub fn date_stamp(&self) -> String {
        format_date(self.timestamp)
    }
}

/// Scope: `20130524/us-east-1/s3/aws4_request`
pub fn credential_scope(date_stamp: &str, region: &str, service: &str) -> String {
    format!("{date_stamp}/{region}/{service}/{AWS4_REQUEST}")
}

/// StringToSign:
///
/// ```text
/// AWS4-HMAC-SHA256
/// 20130524T000000Z
/// 20130524/us-east-1/s3/aws4_request
/// <hex sha256 of canonical request>
/// ```
pub fn string_to_sign(amz_date: &str, scope: &str, canonical_request: &str) -> Result<String> {
    let mut f = String::with_capacity(128 + scope.len());
    writeln!(f, "{AWS4_HMAC_SHA256}")?;
    writeln!(f, "{amz_date}")?;
    writeln!(f, "{scope}")?;
    write!(f, "{}", hex_sha256(canonical_request.as_bytes()))?;
    Ok(f)
}

/// Hex of the raw HMAC of the string to sign under the derived key.
pub fn compute_signature(signing_key: &SigningKey, string_to_sign: &str) -> HexDigest {
    signing_key.sign(string_to_sign)
}

/// `AWS4-HMAC-SHA256 Credential=<ak>/<scope>, SignedHeaders=<names>, Signature=<sig>`
pub fn authorization_header(
    access_key_id: &str,
    scope: &str,
    signed_headers: &str,
    signature: &HexDigest,
) -> String {
    format!(
        "{AWS4_HMAC_SHA256} Credential={access_key_id}/{scope}, SignedHeaders={signed_headers}, Signature={signature}"
    )
}

/// Everything produced by one signing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureResult {
    /// Lowercase hex signature.
    pub signature: HexDigest,
    /// Value of the `Authorization` header.
    pub authorization: String,
    /// `;`-joined names of the signed headers.
    pub signed_headers: String,
    /// Value of the `x-amz-date` header.
    pub x_amz_date: String,
    /// Value of the `x-amz-content-sha256` header.
    pub content_sha256: String,
    /// The canonical request that was hashed.
    pub canonical_request: String,
    /// The string that was signed.
    pub string_to_sign: String,
}

impl SignatureResult {
    /// Attach `Authorization`, `x-amz-date` and `x-amz-content-sha256`.
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<()> {
        headers.insert(X_AMZ_DATE, HeaderValue::from_str(&self.x_amz_date)?);
        headers.insert(
            X_AMZ_CONTENT_SHA_256,
            HeaderValue::from_str(&self.content_sha256)?,
        );

        let mut authorization = HeaderValue::from_str(&self.authorization)?;
        // Keep the value out of debug output.
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);

        Ok(())
    }
}

/// Sign a request.
///
/// The descriptor is only read. `host`, `x-amz-date` and
/// `x-amz-content-sha256` are added to the signed headers when the
/// descriptor lacks them; if it carries `x-amz-date` already, that value must
/// be the signing context's timestamp.
///
/// With a `cache`, the signing key is looked up there first.
pub fn sign(
    req: &RequestDescriptor,
    cred: &Credential,
    ctx: &SigningContext,
    region: &str,
    service: &str,
    cache: Option<&SigningKeyCache>,
) -> Result<SignatureResult> {
    if !cred.is_valid() {
        return Err(Error::credential_invalid(
            "access key id and secret access key must not be empty",
        ));
    }
    if region.is_empty() || service.is_empty() {
        return Err(Error::request_invalid("region and service must not be empty"));
    }
    if req.host.is_empty() {
        return Err(Error::request_invalid("host must not be empty"));
    }

    let amz_date = ctx.amz_date();
    let date_stamp = ctx.date_stamp();

    let mut headers = req.headers.clone();
    if !headers.contains_key(HOST) {
        headers.insert(HOST, HeaderValue::from_str(&req.host)?);
    }
    match req.header_get(X_AMZ_DATE)? {
        Some(v) if v.trim() != amz_date => {
            return Err(Error::request_invalid(format!(
                "x-amz-date {v} does not match signing time {amz_date}"
            )))
        }
        Some(_) => {}
        None => {
            headers.insert(X_AMZ_DATE, HeaderValue::from_str(&amz_date)?);
        }
    }
    let payload_hash = PayloadHash::resolve(&req.payload, req.header_get(X_AMZ_CONTENT_SHA_256)?)?;
    headers.insert(
        X_AMZ_CONTENT_SHA_256,
        HeaderValue::from_str(payload_hash.as_str())?,
    );

    let canonical_headers = CanonicalHeaders::from_headers(&headers)?;
    let signed_headers = canonical_headers.signed_headers();
    let creq = canonical_request(
        &req.method,
        &canonical_uri(&req.path)?,
        &canonical_query(&req.query),
        &canonical_headers,
        payload_hash.as_str(),
    )?;
    debug!("calculated canonical request: {creq}");

    let scope = credential_scope(&date_stamp, region, service);
    debug!("calculated scope: {scope}");

    let sts = string_to_sign(&amz_date, &scope, &creq)?;
    debug!("calculated string to sign: {sts}");

    let signing_key = match cache {
        Some(cache) => cache.get_or_derive(
            &cred.secret_access_key,
            &date_stamp,
            region,
            service,
            ctx.timestamp(),
        ),
        None => SigningKey::derive(&cred.secret_access_key, &date_stamp, region, service),
    };
    let signature = compute_signature(&signing_key, &sts);
    let authorization =
        authorization_header(&cred.access_key_id, &scope, &signed_headers, &signature);

    Ok(SignatureResult {
        signature,
        authorization,
        signed_headers,
        x_amz_date: amz_date,
        content_sha256: payload_hash.to_string(),
        canonical_request: creq,
        string_to_sign: sts,
    })
}

/// RequestSigner that implement AWS SigV4.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
#[derive(Debug)]
pub struct RequestSigner {
    service: String,
    region: String,
    key_cache: Option<Arc<SigningKeyCache>>,

    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new builder for AWS V4 signer.
    pub fn new(service: &str, region: &str) -> Self {
        Self {
            service: service.into(),
            region: region.into(),
            key_cache: None,

            time: None,
        }
    }

    /// Share a signing key cache with this signer.
    pub fn with_key_cache(mut self, cache: Arc<SigningKeyCache>) -> Self {
        self.key_cache = Some(cache);
        self
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    #[cfg(test)]
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(
        &self,
        _: &Context,
        req: &mut Parts,
        body: &Bytes,
        credential: Option<&Self::Credential>,
    ) -> Result<()> {
        let Some(cred) = credential else {
            return Err(Error::credential_invalid(
                "no credential available to sign request",
            ));
        };

        let ctx = SigningContext::new(self.time.unwrap_or_else(now));
        let mut desc = RequestDescriptor::from_parts(req, body)?;
        // Pin the Host header so the wire value is the signed one.
        if !desc.headers.contains_key(HOST) {
            let host = HeaderValue::from_str(&desc.host)?;
            desc.headers.insert(HOST, host);
        }

        let signed = sign(
            &desc,
            cred,
            &ctx,
            &self.region,
            &self.service,
            self.key_cache.as_deref(),
        );
        match signed {
            Ok(result) => {
                result.apply(&mut desc.headers)?;
                desc.apply(req);
                Ok(())
            }
            Err(err) => {
                // Hand the headers back untouched.
                desc.apply(req);
                Err(err)
            }
        }
    }
}
