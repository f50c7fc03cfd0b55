//! Prometheus range queries and the k6 metric table.

use crate::constants::{QUERY_RANGE_PATH, QUERY_STEP};
use bytes::Bytes;
use chrono::TimeDelta;
use http::header::ACCEPT;
use http::{Method, Request, StatusCode};
use loadreport_core::time::{format_rfc3339, DateTime};
use loadreport_core::{Context, Error, Result};
use log::debug;
use serde::Deserialize;

/// How a series is reduced to one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduce {
    /// Sum of all samples, `0` when there are none.
    Sum,
    /// Smallest sample.
    Min,
    /// Largest sample.
    Max,
}

impl Reduce {
    /// Reduce a series. Min and max of an empty series are `None`.
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        match self {
            Reduce::Sum => Some(values.iter().sum()),
            Reduce::Min => values.iter().copied().reduce(f64::min),
            Reduce::Max => values.iter().copied().reduce(f64::max),
        }
    }
}

/// One row of the report.
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    /// Name printed in the summary.
    pub name: &'static str,
    /// PromQL with `$testid` standing for the test id.
    pub query: &'static str,
    /// Reducer over the returned series.
    pub reduce: Reduce,
    /// Appended to the rendered value.
    pub suffix: &'static str,
}

impl MetricSpec {
    const fn new(name: &'static str, query: &'static str, reduce: Reduce) -> Self {
        Self {
            name,
            query,
            reduce,
            suffix: "",
        }
    }

    /// PromQL for one test id.
    pub fn promql(&self, test_id: &str) -> String {
        self.query.replace("$testid", test_id)
    }
}

/// Metrics of a k6 run, in report order.
pub const K6_METRICS: [MetricSpec; 12] = [
    MetricSpec::new(
        "http_reqs_total",
        r#"sum(k6_http_reqs_total{testid="$testid"})"#,
        Reduce::Sum,
    ),
    MetricSpec::new(
        "requests_per_second",
        r#"sum(irate(k6_http_reqs_total{testid="$testid"}[1m]))"#,
        Reduce::Sum,
    ),
    MetricSpec::new(
        "http_req_duration_avg",
        r#"histogram_sum(k6_http_req_duration_seconds{testid="$testid"}) / histogram_count(k6_http_req_duration_seconds{testid="$testid"})"#,
        Reduce::Sum,
    ),
    MetricSpec::new(
        "http_req_duration_min",
        r#"histogram_quantile(0.0, rate(k6_http_req_duration_seconds{testid="$testid"}[1m]))"#,
        Reduce::Min,
    ),
    MetricSpec::new(
        "http_req_duration_max",
        r#"histogram_quantile(1.0, rate(k6_http_req_duration_seconds{testid="$testid"}[1m]))"#,
        Reduce::Max,
    ),
    MetricSpec::new(
        "http_req_duration_90th",
        r#"histogram_quantile(0.90, sum(rate(k6_http_req_duration_seconds{testid="$testid"}[1m])) by (le))"#,
        Reduce::Sum,
    ),
    MetricSpec::new(
        "http_req_duration_95th",
        r#"histogram_quantile(0.95, sum(rate(k6_http_req_duration_seconds{testid="$testid"}[1m])) by (le))"#,
        Reduce::Sum,
    ),
    MetricSpec::new(
        "http_req_duration_99th",
        r#"histogram_quantile(0.99, sum(rate(k6_http_req_duration_seconds{testid="$testid"}[1m])) by (le))"#,
        Reduce::Sum,
    ),
    MetricSpec::new(
        "vus_max",
        r#"max(k6_vus{testid="$testid"})"#,
        Reduce::Max,
    ),
    MetricSpec::new(
        "iterations_total",
        r#"sum(k6_iterations_total{testid="$testid"})"#,
        Reduce::Sum,
    ),
    MetricSpec::new(
        "request_failures",
        r#"sum(k6_http_reqs_total{testid="$testid", expected_response="false"})"#,
        Reduce::Sum,
    ),
    MetricSpec {
        suffix: "%",
        ..MetricSpec::new(
            "checks_success_rate",
            r#"round(k6_checks_rate{testid="$testid"} * 100, 0.1)"#,
            Reduce::Sum,
        )
    },
];

/// A reduced metric ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricValue {
    /// Metric name.
    pub name: &'static str,
    /// Reduced value, `None` when there was nothing to reduce.
    pub value: Option<f64>,
    /// Unit suffix.
    pub suffix: &'static str,
}

/// Query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    /// Inclusive start.
    pub start: DateTime,
    /// Inclusive end.
    pub end: DateTime,
}

impl TimeRange {
    /// The `hours` leading up to `end`.
    ///
    /// A window that does not fit in the calendar is a config error.
    pub fn last_hours(end: DateTime, hours: f64) -> Result<Self> {
        let millis = (hours * 3_600_000.0).round();
        let start = if millis.is_finite() && millis >= 0.0 && millis < i64::MAX as f64 {
            TimeDelta::try_milliseconds(millis as i64).and_then(|d| end.checked_sub_signed(d))
        } else {
            None
        };

        match start {
            Some(start) => Ok(Self { start, end }),
            None => Err(Error::config_invalid(format!(
                "look-back window of {hours} hours before {end} is out of range"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryRangeResponse {
    data: QueryRangeData,
}

#[derive(Debug, Deserialize)]
struct QueryRangeData {
    #[serde(default)]
    result: Vec<QueryRangeSeries>,
}

#[derive(Debug, Deserialize)]
struct QueryRangeSeries {
    #[serde(default)]
    values: Vec<(f64, String)>,
}

/// Client of the Prometheus HTTP API.
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    ctx: Context,
    base_url: String,
}

impl PrometheusClient {
    /// Create a client for the Prometheus at `base_url`.
    pub fn new(ctx: Context, base_url: &str) -> Self {
        Self {
            ctx,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Run a range query and return the sample values of the first series.
    ///
    /// No series at all gives an empty vector.
    pub async fn range_query(
        &self,
        query: &str,
        range: &TimeRange,
        step: &str,
    ) -> Result<Vec<f64>> {
        let params = form_urlencoded::Serializer::new(String::new())
            .append_pair("query", query)
            .append_pair("start", &format_rfc3339(range.start))
            .append_pair("end", &format_rfc3339(range.end))
            .append_pair("step", step)
            .finish();
        let url = format!("{}/{QUERY_RANGE_PATH}?{params}", self.base_url);
        debug!("prometheus range query: {query}");

        let req = Request::builder()
            .method(Method::GET)
            .uri(url)
            .header(ACCEPT, "application/json")
            .body(Bytes::new())?;
        let resp = self.ctx.http_send(req).await?;

        if resp.status() != StatusCode::OK {
            return Err(Error::unexpected(format!(
                "prometheus query failed: {} {}",
                resp.status(),
                String::from_utf8_lossy(resp.body())
            )));
        }

        let parsed: QueryRangeResponse = serde_json::from_slice(resp.body()).map_err(|e| {
            Error::unexpected("prometheus response is not a valid range query result")
                .with_source(e)
        })?;

        let Some(series) = parsed.data.result.into_iter().next() else {
            return Ok(Vec::new());
        };
        series
            .values
            .into_iter()
            .map(|(_, v)| {
                v.parse::<f64>().map_err(|e| {
                    Error::unexpected(format!("prometheus sample {v:?} is not a number"))
                        .with_source(e)
                })
            })
            .collect()
    }

    /// Query and reduce every metric of `specs` for one test id.
    pub async fn collect(
        &self,
        specs: &[MetricSpec],
        test_id: &str,
        range: &TimeRange,
    ) -> Result<Vec<MetricValue>> {
        let mut out = Vec::with_capacity(specs.len());
        for spec in specs {
            let values = self
                .range_query(&spec.promql(test_id), range, QUERY_STEP)
                .await?;
            let value = spec.reduce.apply(&values);
            debug!("metric {} reduced {} samples to {value:?}", spec.name, values.len());

            out.push(MetricValue {
                name: spec.name,
                value,
                suffix: spec.suffix,
            });
        }
        Ok(out)
    }
}
