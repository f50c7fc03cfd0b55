//! Wait for a k6 `TestRun` to finish, summarize its Prometheus metrics and
//! upload the summary to an S3-compatible store with a SigV4 signature.
//!
//! The binary wires [`run`] to the real file system, environment and a
//! reqwest client; everything goes through [`Context`] so the whole pipeline
//! can run against in-memory doubles.

mod constants;

mod config;
pub use config::Config;

mod poll;
pub use poll::{TestRunPoller, TestRunStatus};

mod metrics;
pub use metrics::{MetricSpec, MetricValue, PrometheusClient, Reduce, TimeRange, K6_METRICS};

mod summary;
pub use summary::Summary;

mod upload;
pub use upload::Uploader;

#[cfg(test)]
mod testing;

use bytes::Bytes;
use loadreport_aws_v4::EnvCredentialProvider;
use loadreport_core::time::now;
use loadreport_core::{Context, Error, ProvideCredential, Result};
use log::{error, info};

/// Run the whole report pipeline once.
///
/// A poll that fails for good is logged and the report is still produced,
/// since the metrics are already in Prometheus by then.
pub async fn run(ctx: Context, config: &Config) -> Result<Summary> {
    // Credentials must be present before polling starts.
    let credential = EnvCredentialProvider::new()
        .provide_credential(&ctx)
        .await?
        .ok_or_else(|| {
            Error::config_invalid(
                "object store credentials are required: set MINIO_ACCESS_KEY and MINIO_SECRET_KEY",
            )
        })?;

    let poller = TestRunPoller::from_service_account(
        ctx.clone(),
        &config.k8s_api_url,
        &config.service_account_dir,
    )
    .await?
    .with_interval(config.poll_interval)
    .with_timeout(config.poll_timeout);

    info!(
        "waiting for TestRun {} in namespace {}",
        config.target_test_run_name,
        poller.namespace()
    );
    if let Err(err) = poller
        .wait_for_completion(&config.target_test_run_name)
        .await
    {
        error!(
            "failed to wait for TestRun {}: {err}",
            config.target_test_run_name
        );
    }

    let range = TimeRange::last_hours(now(), config.duration_hours)?;
    let prometheus = PrometheusClient::new(ctx.clone(), &config.prometheus_url);
    let metrics = prometheus
        .collect(&K6_METRICS, &config.test_id, &range)
        .await?;
    let summary = Summary::new(config.test_id.clone(), metrics);
    info!("{summary}");

    let uploader = Uploader::new(
        ctx,
        credential,
        &config.minio_region,
        &config.minio_url,
        &config.minio_bucket,
    );
    uploader
        .upload(&config.summary_key(), Bytes::from(summary.to_string()))
        .await?;

    Ok(summary)
}
