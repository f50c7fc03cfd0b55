//! Wait for a k6 `TestRun` resource to finish and be cleaned up.

use crate::constants::{DEFAULT_POLL_INTERVAL_SECS, DEFAULT_POLL_TIMEOUT_SECS, TESTRUN_API_PATH};
use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION};
use http::{HeaderValue, Method, Request, StatusCode};
use loadreport_core::{Context, Error, ErrorKind, Result};
use log::{debug, info, warn};
use serde::Deserialize;
use std::time::Duration;

/// Observed state of a `TestRun`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRunStatus {
    /// `false` once the resource is gone.
    pub exists: bool,
    /// `status.phase` of the resource, if reported.
    pub phase: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TestRunObject {
    #[serde(default)]
    status: Option<TestRunObjectStatus>,
}

#[derive(Debug, Deserialize)]
struct TestRunObjectStatus {
    #[serde(default)]
    phase: Option<String>,
}

/// Polls the Kubernetes API for one namespace.
#[derive(Debug, Clone)]
pub struct TestRunPoller {
    ctx: Context,
    api_url: String,
    namespace: String,
    token: String,
    interval: Duration,
    timeout: Duration,
}

impl TestRunPoller {
    /// Create a poller with the default interval and timeout.
    pub fn new(ctx: Context, api_url: &str, namespace: &str, token: &str) -> Self {
        Self {
            ctx,
            api_url: api_url.trim_end_matches('/').to_string(),
            namespace: namespace.to_string(),
            token: token.to_string(),
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
        }
    }

    /// Create a poller from the mounted service account directory.
    ///
    /// `token` and `namespace` are read and trimmed; a missing or empty file
    /// is a config error.
    pub async fn from_service_account(ctx: Context, api_url: &str, dir: &str) -> Result<Self> {
        let dir = dir.trim_end_matches('/');
        let token = read_service_account_file(&ctx, &format!("{dir}/token")).await?;
        let namespace = read_service_account_file(&ctx, &format!("{dir}/namespace")).await?;
        debug!("loaded service account for namespace {namespace}");

        Ok(Self::new(ctx, api_url, &namespace, &token))
    }

    /// Set the delay between polls.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the upper bound of one poll.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Namespace the poller looks in.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn testrun_url(&self, name: &str) -> String {
        format!(
            "{}/{TESTRUN_API_PATH}/namespaces/{}/testruns/{name}",
            self.api_url, self.namespace
        )
    }

    /// Fetch the current status of a `TestRun`.
    ///
    /// - `404` means the resource is gone.
    /// - Any other non-`200` status is [`ErrorKind::PollFatal`].
    /// - A timeout or transport failure is [`ErrorKind::PollTransient`].
    pub async fn get_status(&self, name: &str) -> Result<TestRunStatus> {
        let mut token = HeaderValue::from_str(&format!("Bearer {}", self.token))?;
        token.set_sensitive(true);

        let req = Request::builder()
            .method(Method::GET)
            .uri(self.testrun_url(name))
            .header(AUTHORIZATION, token)
            .header(ACCEPT, "application/json")
            .body(Bytes::new())?;

        let resp = match tokio::time::timeout(self.timeout, self.ctx.http_send(req)).await {
            Err(_) => {
                return Err(Error::poll_transient(format!(
                    "get TestRun {name} timed out after {:?}",
                    self.timeout
                )))
            }
            Ok(Err(e)) if e.kind() == ErrorKind::Unexpected => {
                return Err(
                    Error::poll_transient(format!("get TestRun {name} failed")).with_source(e)
                )
            }
            Ok(Err(e)) => return Err(e),
            Ok(Ok(resp)) => resp,
        };

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(TestRunStatus {
                exists: false,
                phase: None,
            }),
            StatusCode::OK => {
                let obj: TestRunObject = serde_json::from_slice(resp.body()).map_err(|e| {
                    Error::unexpected(format!("TestRun {name} response is not valid json"))
                        .with_source(e)
                })?;
                Ok(TestRunStatus {
                    exists: true,
                    phase: obj.status.and_then(|s| s.phase),
                })
            }
            status => Err(Error::poll_fatal(format!(
                "failed to get the status of TestRun {name}: {status} {}",
                String::from_utf8_lossy(resp.body())
            ))),
        }
    }

    /// Poll until the `TestRun` no longer exists.
    ///
    /// Transient failures are logged and retried on the interval; any other
    /// error ends the wait and is returned.
    pub async fn wait_for_completion(&self, name: &str) -> Result<()> {
        loop {
            match self.get_status(name).await {
                Ok(TestRunStatus { exists: false, .. }) => {
                    info!("TestRun {name} has been cleaned up and no longer exists");
                    return Ok(());
                }
                Ok(TestRunStatus { phase, .. }) => {
                    info!(
                        "waiting for TestRun {name} to complete and be cleaned up, current status: {}",
                        phase.as_deref().unwrap_or("unknown")
                    );
                }
                Err(err) if err.is_retryable() => {
                    warn!("poll of TestRun {name} failed, will retry: {err}");
                }
                Err(err) => return Err(err),
            }

            tokio::time::sleep(self.interval).await;
        }
    }
}

async fn read_service_account_file(ctx: &Context, path: &str) -> Result<String> {
    let content = ctx.file_read_trimmed(path).await.map_err(|e| {
        Error::config_invalid(format!("failed to read service account file {path}")).with_source(e)
    })?;
    if content.is_empty() {
        return Err(Error::config_invalid(format!(
            "service account file {path} is empty"
        )));
    }
    Ok(content)
}
