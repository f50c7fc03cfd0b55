use crate::metrics::MetricValue;
use std::fmt;

/// Width of the dotted name column, colon excluded.
const NAME_WIDTH: usize = 29;

/// Plain text report of one test run.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    test_id: String,
    metrics: Vec<MetricValue>,
}

impl Summary {
    /// Create a summary.
    pub fn new(test_id: impl Into<String>, metrics: Vec<MetricValue>) -> Self {
        Self {
            test_id: test_id.into(),
            metrics,
        }
    }

    /// The test id the summary is about.
    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    /// The reduced metrics, in report order.
    pub fn metrics(&self) -> &[MetricValue] {
        &self.metrics
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "k6 Test Summary for Test ID: {}", self.test_id)?;
        writeln!(f)?;
        for m in &self.metrics {
            write!(f, "{:.<width$}: ", m.name, width = NAME_WIDTH)?;
            match m.value {
                // f64's Display already drops the fraction of integral values.
                Some(v) => writeln!(f, "{v}{}", m.suffix)?,
                None => writeln!(f, "n/a")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::K6_METRICS;
    use pretty_assertions::assert_eq;

    fn metric(name: &'static str, value: Option<f64>) -> MetricValue {
        MetricValue {
            name,
            value,
            suffix: "",
        }
    }

    #[test]
    fn test_render_layout() {
        let summary = Summary::new(
            "test123",
            vec![
                metric("http_reqs_total", Some(1200.0)),
                metric("http_req_duration_avg", Some(0.0421)),
                metric("vus_max", None),
                MetricValue {
                    name: "checks_success_rate",
                    value: Some(99.5),
                    suffix: "%",
                },
            ],
        );

        assert_eq!(
            summary.to_string(),
            concat!(
                "\n",
                "k6 Test Summary for Test ID: test123\n",
                "\n",
                "http_reqs_total..............: 1200\n",
                "http_req_duration_avg........: 0.0421\n",
                "vus_max......................: n/a\n",
                "checks_success_rate..........: 99.5%\n",
            )
        );
    }

    #[test]
    fn test_every_metric_name_fits_the_column() {
        for spec in K6_METRICS {
            assert!(spec.name.len() < NAME_WIDTH, "{} is too long", spec.name);
        }
    }

    #[test]
    fn test_full_table_renders_in_order() {
        let metrics = K6_METRICS
            .iter()
            .map(|spec| MetricValue {
                name: spec.name,
                value: Some(1.0),
                suffix: spec.suffix,
            })
            .collect();
        let text = Summary::new("t", metrics).to_string();

        let lines = text.lines().skip(3).collect::<Vec<_>>();
        assert_eq!(lines.len(), 12);
        assert_eq!(lines[0], "http_reqs_total..............: 1");
        assert_eq!(lines[11], "checks_success_rate..........: 1%");
        assert!(text.ends_with("%\n"));
    }
}
