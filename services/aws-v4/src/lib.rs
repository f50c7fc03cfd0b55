//! AWS SigV4 signer for S3-compatible object stores.
//!
//! ## Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use loadreport_aws_v4::{EnvCredentialProvider, RequestSigner};
//! use loadreport_core::{Context, OsEnv, Result, Signer};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let ctx = Context::new().with_env(OsEnv);
//!     let signer = Signer::new(
//!         ctx,
//!         EnvCredentialProvider::new(),
//!         RequestSigner::new("s3", "us-east-1"),
//!     );
//!
//!     let body = Bytes::from_static(b"hello");
//!     let (mut parts, _) = http::Request::put("http://127.0.0.1:9000/bucket/hello.txt")
//!         .body(())?
//!         .into_parts();
//!     signer.sign(&mut parts, &body).await?;
//!     Ok(())
//! }
//! ```
//!
//! The pure pipeline is exposed as well: [`hash_payload`],
//! [`canonical_request`], [`SigningKey::derive`], [`string_to_sign`],
//! [`compute_signature`] and [`sign`].

#![warn(missing_docs)]

mod constants;
pub use constants::{EMPTY_STRING_SHA256, UNSIGNED_PAYLOAD};

mod credential;
pub use credential::Credential;

mod payload;
pub use payload::{hash_payload, PayloadHash};

mod canonical;
pub use canonical::{
    canonical_query, canonical_request, canonical_uri, normalize_header_value, CanonicalHeaders,
};

mod key;
pub use key::{DateKey, RegionKey, ServiceKey, SigningKey, SigningKeyCache};

mod sign_request;
pub use sign_request::{
    authorization_header, compute_signature, credential_scope, sign, string_to_sign,
    RequestSigner, SignatureResult, SigningContext,
};

mod provide_credential;
pub use provide_credential::{EnvCredentialProvider, StaticCredentialProvider};
