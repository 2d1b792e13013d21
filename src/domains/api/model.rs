//! Request and result types shared by the API domain.
//!
//! `CanonicalResult` is the single record every call produces, whatever the
//! outcome and whatever output format the caller asked for.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Sentinel rendered when no response time could be measured.
pub const NOT_AVAILABLE: &str = "N/A";

/// HTTP methods accepted by the tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    /// The uppercase wire token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Whether a request body is sent for this method.
    pub fn carries_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    /// Parses the exact uppercase token.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unsupported HTTP method '{}'", s))
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Options => reqwest::Method::OPTIONS,
        }
    }
}

/// Output encoding requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

/// A fully validated outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    /// Present only for body-carrying methods with meaningful data.
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            params: BTreeMap::new(),
            body: None,
        }
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_params(mut self, params: BTreeMap<String, String>) -> Self {
        self.params = params;
        self
    }

    /// Attach `data` as the body if the method sends one and the data is not empty.
    pub fn with_body(mut self, data: Option<Value>) -> Self {
        self.body = data.filter(|d| self.method.carries_body() && has_content(d));
        self
    }
}

/// `null`, `""`, `{}` and `[]` count as "no data".
pub fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// Status line, headers and decoded body of a received response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub data: Value,
}

/// Wall-clock markers around a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestTiming {
    pub started: Option<Instant>,
    pub finished: Option<Instant>,
}

impl RequestTiming {
    pub fn completed(started: Instant, finished: Instant) -> Self {
        Self {
            started: Some(started),
            finished: Some(finished),
        }
    }

    /// Timing for a call that never produced a response.
    pub fn abandoned(started: Instant) -> Self {
        Self {
            started: Some(started),
            finished: None,
        }
    }

    pub fn response_time(&self) -> ResponseTime {
        match (self.started, self.finished) {
            (Some(start), Some(end)) => {
                let elapsed = end.saturating_duration_since(start).as_millis();
                ResponseTime::Millis(u64::try_from(elapsed).unwrap_or(u64::MAX))
            }
            _ => ResponseTime::Unavailable,
        }
    }
}

/// Elapsed milliseconds, or the `"N/A"` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseTime {
    Millis(u64),
    Unavailable,
}

impl Serialize for ResponseTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Millis(ms) => serializer.serialize_u64(*ms),
            Self::Unavailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

impl fmt::Display for ResponseTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Millis(ms) => write!(f, "{}ms", ms),
            Self::Unavailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

/// The normalized description of one HTTP call.
///
/// Success-shaped records carry `status`, `status_text`, `headers` and
/// `data` and never `error`/`code`. Failure-shaped records always carry
/// `error` and `code`, plus the response fields when the failure came with
/// a response. Built only by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalResult {
    pub success: bool,
    pub method: HttpMethod,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub response_time: ResponseTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_data: Option<Value>,
}

impl CanonicalResult {
    pub fn is_failure(&self) -> bool {
        !self.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_method_tokens_round_trip() {
        for method in HttpMethod::ALL {
            assert_eq!(method.as_str().parse::<HttpMethod>(), Ok(method));
        }
        assert!("get".parse::<HttpMethod>().is_err());
        assert!("TRACE".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_body_only_for_body_methods() {
        let data = Some(json!({"name": "x"}));

        let post = ApiRequest::new(HttpMethod::Post, "http://h/").with_body(data.clone());
        assert_eq!(post.body, data);

        let get = ApiRequest::new(HttpMethod::Get, "http://h/").with_body(data);
        assert_eq!(get.body, None);
    }

    #[test]
    fn test_empty_data_is_not_a_body() {
        for empty in [json!(null), json!(""), json!({}), json!([])] {
            let req = ApiRequest::new(HttpMethod::Put, "http://h/").with_body(Some(empty));
            assert_eq!(req.body, None);
        }
        let req = ApiRequest::new(HttpMethod::Patch, "http://h/").with_body(Some(json!(0)));
        assert_eq!(req.body, Some(json!(0)));
    }

    #[test]
    fn test_response_time() {
        let start = Instant::now();
        let end = start + Duration::from_millis(42);
        assert_eq!(
            RequestTiming::completed(start, end).response_time(),
            ResponseTime::Millis(42)
        );
        assert_eq!(
            RequestTiming::abandoned(start).response_time(),
            ResponseTime::Unavailable
        );
        assert_eq!(serde_json::to_value(ResponseTime::Unavailable).unwrap(), json!("N/A"));
        assert_eq!(serde_json::to_value(ResponseTime::Millis(7)).unwrap(), json!(7));
    }

    #[test]
    fn test_format_default_is_json() {
        assert_eq!(OutputFormat::default(), OutputFormat::Json);
        let fmt: OutputFormat = serde_json::from_value(json!("csv")).unwrap();
        assert_eq!(fmt, OutputFormat::Csv);
    }
}
