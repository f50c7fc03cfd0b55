use super::{init_live_test, send_signed_request};
use anyhow::Result;
use bytes::Bytes;
use http::{Method, Request, StatusCode};
use log::warn;

#[tokio::test]
async fn test_head_missing_object() -> Result<()> {
    let Some((ctx, signer, cred, url)) = init_live_test() else {
        warn!("LOADREPORT_S3_TEST is not set, skipped");
        return Ok(());
    };

    let req = Request::builder()
        .method(Method::HEAD)
        .uri(format!("{url}/not_exist_file"))
        .body(Bytes::new())?;

    let (status, _) = send_signed_request(&ctx, &signer, req, &cred).await?;
    assert_eq!(StatusCode::NOT_FOUND, status);
    Ok(())
}

#[tokio::test]
async fn test_put_summary_object() -> Result<()> {
    let Some((ctx, signer, cred, url)) = init_live_test() else {
        warn!("LOADREPORT_S3_TEST is not set, skipped");
        return Ok(());
    };

    let req = Request::builder()
        .method(Method::PUT)
        .uri(format!("{url}/live-test-summary.txt"))
        .header(http::header::CONTENT_TYPE, "text/plain")
        .body(Bytes::from_static(b"\nk6 Test Summary for Test ID: live-test\n\n"))?;

    let (status, body) = send_signed_request(&ctx, &signer, req, &cred).await?;
    assert_eq!(StatusCode::OK, status, "body: {body}");
    Ok(())
}

#[tokio::test]
async fn test_wrong_secret_is_rejected() -> Result<()> {
    let Some((ctx, signer, mut cred, url)) = init_live_test() else {
        warn!("LOADREPORT_S3_TEST is not set, skipped");
        return Ok(());
    };
    cred.secret_access_key.push('x');

    let req = Request::builder()
        .method(Method::GET)
        .uri(format!("{url}/not_exist_file"))
        .body(Bytes::new())?;

    let (status, _) = send_signed_request(&ctx, &signer, req, &cred).await?;
    assert_eq!(StatusCode::FORBIDDEN, status);
    Ok(())
}
