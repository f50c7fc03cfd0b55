// Env values used by the report.
pub const PROMETHEUS_URL: &str = "PROMETHEUS_URL";
pub const TESTID: &str = "TESTID";
pub const DURATION_HOURS: &str = "DURATION_HOURS";
pub const MINIO_URL: &str = "MINIO_URL";
pub const MINIO_BUCKET: &str = "MINIO_BUCKET";
pub const MINIO_REGION: &str = "MINIO_REGION";
pub const TARGET_TEST_RUN_NAME: &str = "TARGET_TEST_RUN_NAME";
pub const K8S_API_URL: &str = "K8S_API_URL";
pub const K8S_SERVICE_ACCOUNT_DIR: &str = "K8S_SERVICE_ACCOUNT_DIR";
pub const POLL_INTERVAL_SECS: &str = "POLL_INTERVAL_SECS";
pub const POLL_TIMEOUT_SECS: &str = "POLL_TIMEOUT_SECS";

pub const DEFAULT_DURATION_HOURS: f64 = 1.0;
pub const DEFAULT_MINIO_REGION: &str = "us-east-1";
pub const DEFAULT_K8S_API_URL: &str = "https://kubernetes.default.svc";
pub const DEFAULT_SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 60;

// Kubernetes.
pub const TESTRUN_API_PATH: &str = "apis/k6.io/v1alpha1";

// Prometheus.
pub const QUERY_RANGE_PATH: &str = "api/v1/query_range";
pub const QUERY_STEP: &str = "1m";

/// The S3 service name in the signature scope.
pub const S3_SERVICE: &str = "s3";
