use crate::constants::*;
use crate::metrics::TimeRange;
use loadreport_core::time::now;
use loadreport_core::{Context, Error, Result};
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration, read from environment variables.
///
/// Object store credentials are not part of it: they are loaded through
/// `EnvCredentialProvider` so they never sit in a plain struct field.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Prometheus base URL, without trailing slash.
    pub prometheus_url: String,
    /// The k6 `testid` tag every metric is filtered by.
    pub test_id: String,
    /// Look-back window of the metrics query, in hours.
    pub duration_hours: f64,
    /// Object store endpoint, without trailing slash.
    pub minio_url: String,
    /// Bucket the summary is uploaded to.
    pub minio_bucket: String,
    /// Region used in the signature scope.
    pub minio_region: String,
    /// Name of the `TestRun` resource to wait for.
    pub target_test_run_name: String,
    /// Kubernetes API base URL.
    pub k8s_api_url: String,
    /// Directory holding the mounted service account `token`, `namespace` and `ca.crt`.
    pub service_account_dir: String,
    /// Delay between two status polls.
    pub poll_interval: Duration,
    /// Upper bound of one status poll.
    pub poll_timeout: Duration,
}

impl Config {
    /// Load config from environment variables.
    pub fn from_env(ctx: &Context) -> Result<Self> {
        let duration_hours = parse_or(ctx, DURATION_HOURS, DEFAULT_DURATION_HOURS)?;
        if !(duration_hours.is_finite() && duration_hours > 0.0) {
            return Err(Error::config_invalid(format!(
                "{DURATION_HOURS} must be a positive number of hours, got {duration_hours}"
            )));
        }
        TimeRange::last_hours(now(), duration_hours).map_err(|e| {
            Error::config_invalid(format!("{DURATION_HOURS} is too large")).with_source(e)
        })?;

        Ok(Self {
            prometheus_url: trim_url(required(ctx, PROMETHEUS_URL)?),
            test_id: required(ctx, TESTID)?,
            duration_hours,
            minio_url: trim_url(required(ctx, MINIO_URL)?),
            minio_bucket: required(ctx, MINIO_BUCKET)?,
            minio_region: ctx
                .env_var_non_empty(MINIO_REGION)
                .unwrap_or_else(|| DEFAULT_MINIO_REGION.to_string()),
            target_test_run_name: required(ctx, TARGET_TEST_RUN_NAME)?,
            k8s_api_url: trim_url(
                ctx.env_var_non_empty(K8S_API_URL)
                    .unwrap_or_else(|| DEFAULT_K8S_API_URL.to_string()),
            ),
            service_account_dir: ctx
                .env_var_non_empty(K8S_SERVICE_ACCOUNT_DIR)
                .unwrap_or_else(|| DEFAULT_SERVICE_ACCOUNT_DIR.to_string()),
            poll_interval: Duration::from_secs(parse_or(
                ctx,
                POLL_INTERVAL_SECS,
                DEFAULT_POLL_INTERVAL_SECS,
            )?),
            poll_timeout: Duration::from_secs(parse_or(
                ctx,
                POLL_TIMEOUT_SECS,
                DEFAULT_POLL_TIMEOUT_SECS,
            )?),
        })
    }

    /// Object key of the uploaded summary: `<testid>-summary.txt`.
    pub fn summary_key(&self) -> String {
        format!("{}-summary.txt", self.test_id)
    }
}

fn required(ctx: &Context, key: &str) -> Result<String> {
    ctx.env_var_non_empty(key)
        .map(|v| v.trim().to_string())
        .ok_or_else(|| Error::config_invalid(format!("env {key} is required")))
}

fn parse_or<T>(ctx: &Context, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match ctx.env_var_non_empty(key) {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|e| {
            Error::config_invalid(format!("env {key} has invalid value {v:?}")).with_source(e)
        }),
    }
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
