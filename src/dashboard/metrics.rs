//! Deep work hours, pulled from a spreadsheet-backed endpoint.
//!
//! The endpoint answers with `{"daily_data": [{"Deep Work Hours": 3.25, ...}, ...]}`. Only the
//! last record matters. Any failure along the way ends up as [MetricsError] and is shown as
//! [FALLBACK_TEXT]. Nothing is retried.

use std::fmt::Display;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, instrument};

/// Build-time endpoint, used when none is passed on the command line.
pub const DEFAULT_ENDPOINT: Option<&str> = option_env!("DAYBRIEF_METRICS_URL");

pub const RECORDS_FIELD: &str = "daily_data";
pub const VALUE_FIELD: &str = "Deep Work Hours";
pub const UNIT_SUFFIX: &str = " hrs";
pub const FALLBACK_TEXT: &str = "Connection Error";

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("No metrics endpoint configured")]
    NoEndpoint,
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Response is not valid json: {0}")]
    Body(#[from] serde_json::Error),
    #[error("Response has no `{0}` array")]
    MissingRecords(&'static str),
    #[error("`{0}` array is empty")]
    NoRecords(&'static str),
    #[error("Latest record has no `{0}` value")]
    MissingValue(&'static str),
    /// `null`, objects and arrays can't be shown as hours.
    #[error("Unsupported value {0}")]
    UnsupportedValue(Value),
}

/// Value of the latest record. Numbers are shown with one decimal, anything else as is.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Number(v) => write!(f, "{}{UNIT_SUFFIX}", format_one_decimal(*v)),
            MetricValue::Text(v) => write!(f, "{v}{UNIT_SUFFIX}"),
        }
    }
}

/// Rounds the stored value to one decimal. Only exact ties (3.25) round away from zero; 1.45 is
/// stored as 1.4499.. and shows as 1.4.
fn format_one_decimal(value: f64) -> String {
    let twentieths = value * 20.;
    // `{:.1}` sends exact ties to even.
    let exact = value.mul_add(20., -twentieths) == 0.;
    if exact && twentieths.fract() == 0. && twentieths % 2. != 0. {
        return format!("{:.1}", (twentieths + twentieths.signum()) / 20.);
    }
    format!("{value:.1}")
}

/// Anything able to produce the latest metric. Lets the dashboard be tested without a network.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn latest(&self) -> Result<MetricValue, MetricsError>;
}

/// Extracts the value of [VALUE_FIELD] from the last element of [RECORDS_FIELD].
pub fn latest_value(payload: &Value) -> Result<MetricValue, MetricsError> {
    let records = payload
        .get(RECORDS_FIELD)
        .and_then(Value::as_array)
        .ok_or(MetricsError::MissingRecords(RECORDS_FIELD))?;
    let latest = records
        .last()
        .ok_or(MetricsError::NoRecords(RECORDS_FIELD))?;
    let value = latest
        .get(VALUE_FIELD)
        .ok_or(MetricsError::MissingValue(VALUE_FIELD))?;

    match value {
        Value::Number(v) => v
            .as_f64()
            .map(MetricValue::Number)
            .ok_or_else(|| MetricsError::UnsupportedValue(value.clone())),
        Value::String(v) => Ok(MetricValue::Text(v.clone())),
        Value::Bool(v) => Ok(MetricValue::Text(v.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => {
            Err(MetricsError::UnsupportedValue(value.clone()))
        }
    }
}

/// Text for the deep work display. Errors are logged and replaced by [FALLBACK_TEXT].
pub async fn display_text(source: &dyn MetricsSource) -> String {
    match source.latest().await {
        Ok(value) => value.to_string(),
        Err(e) => {
            error!("Error fetching or processing metrics: {e}");
            FALLBACK_TEXT.into()
        }
    }
}

/// The main realization of [MetricsSource]. Issues a single GET per call without a timeout.
pub struct MetricsFetcher {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl MetricsFetcher {
    pub fn new(endpoint: Option<String>) -> Result<Self, MetricsError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl MetricsSource for MetricsFetcher {
    #[instrument(skip(self))]
    async fn latest(&self) -> Result<MetricValue, MetricsError> {
        let endpoint = self.endpoint.as_deref().ok_or(MetricsError::NoEndpoint)?;
        debug!("Fetching metrics from {endpoint}");
        // The status code is not checked. An error page fails when parsed as json.
        let body = self.client.get(endpoint).send().await?.text().await?;
        debug!("Received {} bytes", body.len());
        let payload = serde_json::from_str::<Value>(&body)?;
        latest_value(&payload)
    }
}
