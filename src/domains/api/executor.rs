//! Outbound HTTP execution.
//!
//! `RequestExecutor` is the seam between the dispatcher and the network.
//! `HttpExecutor` is the production implementation over `reqwest`, built from
//! an explicit [`HttpClientConfig`].

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::io;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode, redirect};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use super::model::{ApiRequest, RawResponse, RequestTiming};
use crate::core::config::HttpClientConfig;

/// A response the transport accepted as successful.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSuccess {
    pub response: RawResponse,
    pub timing: RequestTiming,
}

/// A call the transport reported as failed.
///
/// `response` is set when a response arrived before the failure was raised
/// (e.g. a rejected 4xx/5xx status) and empty for timeouts, DNS and
/// connection errors.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct RequestFailure {
    pub message: String,
    pub code: Option<String>,
    pub response: Option<RawResponse>,
    pub timing: RequestTiming,
    /// Messages of the underlying error sources, outermost first.
    pub causes: Vec<String>,
}

impl RequestFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            response: None,
            timing: RequestTiming::default(),
            causes: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_response(mut self, response: RawResponse) -> Self {
        self.response = Some(response);
        self
    }

    pub fn with_timing(mut self, timing: RequestTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Message followed by its causes, one per line.
    pub fn trace(&self) -> String {
        let mut trace = self.message.clone();
        for cause in &self.causes {
            trace.push_str("\n    caused by: ");
            trace.push_str(cause);
        }
        trace
    }

    fn from_transport(err: reqwest::Error, timing: RequestTiming) -> Self {
        let mut failure = Self::new(err.to_string()).with_timing(timing);
        failure.code = transport_error_code(&err).map(str::to_string);
        failure.causes = source_chain(&err);
        failure
    }

    fn from_status(response: RawResponse, timing: RequestTiming) -> Self {
        let mut failure = Self::new(format!(
            "Request failed with status code {}",
            response.status
        ))
        .with_timing(timing);
        failure.code = status_error_code(response.status).map(str::to_string);
        failure.response = Some(response);
        failure
    }
}

/// Executes one outbound HTTP call per invocation.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, request: &ApiRequest) -> Result<RequestSuccess, RequestFailure>;
}

/// `reqwest`-backed executor with a fixed timeout and redirect policy.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    reject_error_status: bool,
}

impl HttpExecutor {
    pub fn new(config: &HttpClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .redirect(redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            reject_error_status: config.reject_error_status,
        })
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    #[instrument(skip_all, fields(method = %request.method, url = %request.url))]
    async fn execute(&self, request: &ApiRequest) -> Result<RequestSuccess, RequestFailure> {
        let mut builder = self.client.request(request.method.into(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        builder = match &request.body {
            Some(Value::String(text)) => builder.body(text.clone()),
            Some(body) => builder.json(body),
            None => builder,
        };

        let started = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| RequestFailure::from_transport(e, RequestTiming::abandoned(started)))?;

        let status = response.status();
        let headers = collect_headers(response.headers());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RequestFailure::from_transport(e, RequestTiming::abandoned(started)))?;
        let timing = RequestTiming::completed(started, Instant::now());

        debug!(status = status.as_u16(), bytes = bytes.len(), "Response received");

        let raw = RawResponse {
            status: status.as_u16(),
            status_text: status_text(status),
            headers,
            data: decode_body(&bytes),
        };

        if self.reject_error_status && !status.is_success() {
            return Err(RequestFailure::from_status(raw, timing));
        }

        Ok(RequestSuccess {
            response: raw,
            timing,
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn status_text(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or_default().to_string()
}

/// Lower-case header names; repeated headers are joined with `", "`.
fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    collected
}

/// JSON when the body parses as JSON, text otherwise, `null` when empty.
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

fn transport_error_code(err: &reqwest::Error) -> Option<&'static str> {
    if err.is_timeout() {
        return Some("ETIMEDOUT");
    }
    if err.is_redirect() {
        return Some("ERR_TOO_MANY_REDIRECTS");
    }
    if err.is_builder() {
        return Some("ERR_BAD_OPTION");
    }
    if err.is_connect() {
        return Some(match io_error_kind(err) {
            Some(io::ErrorKind::ConnectionRefused) => "ECONNREFUSED",
            Some(io::ErrorKind::ConnectionReset) => "ECONNRESET",
            _ => "ECONNFAILED",
        });
    }
    if err.is_request() || err.is_body() || err.is_decode() {
        return Some("ERR_NETWORK");
    }
    None
}

fn status_error_code(status: u16) -> Option<&'static str> {
    match status {
        400..=499 => Some("ERR_BAD_REQUEST"),
        500..=599 => Some("ERR_BAD_RESPONSE"),
        _ => None,
    }
}

fn io_error_kind(err: &reqwest::Error) -> Option<io::ErrorKind> {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        source = cause.source();
    }
    None
}

fn source_chain(err: &reqwest::Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::api::model::{HttpMethod, ResponseTime};
    use axum::{
        Json, Router,
        http::{HeaderMap as AxumHeaders, Method, StatusCode as AxumStatus, Uri},
        response::Redirect,
        routing::{any, get},
    };
    use serde_json::json;
    use tokio::net::TcpListener;

    async fn echo(method: Method, uri: Uri, headers: AxumHeaders, body: String) -> Json<Value> {
        Json(json!({
            "method": method.as_str(),
            "path": uri.path(),
            "query": uri.query().unwrap_or(""),
            "contentType": headers
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
            "trace": headers.get("x-trace").and_then(|v| v.to_str().ok()),
            "body": body,
        }))
    }

    async fn spawn_server() -> (String, tokio::sync::oneshot::Sender<()>) {
        let app = Router::new()
            .route("/users", get(|| async { Json(json!([{"id": 1}, {"id": 2}])) }))
            .route("/text", get(|| async { "plain text" }))
            .route("/empty", get(|| async { AxumStatus::NO_CONTENT }))
            .route(
                "/missing",
                get(|| async { (AxumStatus::NOT_FOUND, Json(json!({"error": "nope"}))) }),
            )
            .route(
                "/broken",
                get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    "late"
                }),
            )
            .route("/loop", get(|| async { Redirect::temporary("/loop") }))
            .route("/echo", any(echo));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local_addr");
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
        });
        (format!("http://{}", addr), shutdown_tx)
    }

    fn executor(timeout_ms: u64) -> HttpExecutor {
        let config = HttpClientConfig {
            timeout_ms,
            ..HttpClientConfig::default()
        };
        HttpExecutor::new(&config).expect("client")
    }

    #[tokio::test]
    async fn test_success_decodes_json_and_times_call() {
        let (base, _shutdown) = spawn_server().await;
        let request = ApiRequest::new(HttpMethod::Get, format!("{}/users", base));

        let outcome = executor(5_000).execute(&request).await.expect("success");
        assert_eq!(outcome.response.status, 200);
        assert_eq!(outcome.response.status_text, "OK");
        assert_eq!(outcome.response.data, json!([{"id": 1}, {"id": 2}]));
        assert!(outcome.response.headers.contains_key("content-type"));
        assert!(matches!(outcome.timing.response_time(), ResponseTime::Millis(_)));
    }

    #[tokio::test]
    async fn test_text_and_empty_bodies() {
        let (base, _shutdown) = spawn_server().await;
        let exec = executor(5_000);

        let text = exec
            .execute(&ApiRequest::new(HttpMethod::Get, format!("{}/text", base)))
            .await
            .expect("text");
        assert_eq!(text.response.data, json!("plain text"));

        let empty = exec
            .execute(&ApiRequest::new(HttpMethod::Get, format!("{}/empty", base)))
            .await
            .expect("empty");
        assert_eq!(empty.response.status, 204);
        assert_eq!(empty.response.data, Value::Null);
    }

    #[tokio::test]
    async fn test_sends_headers_query_and_json_body() {
        let (base, _shutdown) = spawn_server().await;
        let request = ApiRequest::new(HttpMethod::Post, format!("{}/echo", base))
            .with_headers(BTreeMap::from([("x-trace".to_string(), "abc".to_string())]))
            .with_params(BTreeMap::from([
                ("page".to_string(), "2".to_string()),
                ("q".to_string(), "a b".to_string()),
            ]))
            .with_body(Some(json!({"name": "widget"})));

        let outcome = executor(5_000).execute(&request).await.expect("success");
        let echoed = &outcome.response.data;
        assert_eq!(echoed["method"], "POST");
        assert_eq!(echoed["query"], "page=2&q=a+b");
        assert_eq!(echoed["trace"], "abc");
        assert_eq!(echoed["contentType"], "application/json");
        assert_eq!(echoed["body"], r#"{"name":"widget"}"#);
    }

    #[tokio::test]
    async fn test_string_body_is_sent_verbatim() {
        let (base, _shutdown) = spawn_server().await;
        let request = ApiRequest::new(HttpMethod::Put, format!("{}/echo", base))
            .with_body(Some(json!("raw=1")));

        let outcome = executor(5_000).execute(&request).await.expect("success");
        assert_eq!(outcome.response.data["method"], "PUT");
        assert_eq!(outcome.response.data["body"], "raw=1");
    }

    #[tokio::test]
    async fn test_error_status_is_failure_with_response() {
        let (base, _shutdown) = spawn_server().await;
        let exec = executor(5_000);

        let not_found = exec
            .execute(&ApiRequest::new(HttpMethod::Get, format!("{}/missing", base)))
            .await
            .expect_err("404 is rejected");
        assert_eq!(not_found.message, "Request failed with status code 404");
        assert_eq!(not_found.code.as_deref(), Some("ERR_BAD_REQUEST"));
        let response = not_found.response.expect("partial response");
        assert_eq!(response.status, 404);
        assert_eq!(response.status_text, "Not Found");
        assert_eq!(response.data, json!({"error": "nope"}));

        let broken = exec
            .execute(&ApiRequest::new(HttpMethod::Get, format!("{}/broken", base)))
            .await
            .expect_err("500 is rejected");
        assert_eq!(broken.code.as_deref(), Some("ERR_BAD_RESPONSE"));
        assert_eq!(broken.response.map(|r| r.data), Some(json!("boom")));
    }

    #[tokio::test]
    async fn test_error_status_accepted_when_policy_allows() {
        let (base, _shutdown) = spawn_server().await;
        let config = HttpClientConfig {
            reject_error_status: false,
            ..HttpClientConfig::default()
        };
        let exec = HttpExecutor::new(&config).expect("client");

        let outcome = exec
            .execute(&ApiRequest::new(HttpMethod::Get, format!("{}/missing", base)))
            .await
            .expect("404 passes through");
        assert_eq!(outcome.response.status, 404);
    }

    #[tokio::test]
    async fn test_timeout_has_no_response_and_no_response_time() {
        let (base, _shutdown) = spawn_server().await;
        let failure = executor(100)
            .execute(&ApiRequest::new(HttpMethod::Get, format!("{}/slow", base)))
            .await
            .expect_err("times out");

        assert_eq!(failure.code.as_deref(), Some("ETIMEDOUT"));
        assert!(failure.response.is_none());
        assert_eq!(failure.timing.response_time(), ResponseTime::Unavailable);
    }

    #[tokio::test]
    async fn test_redirect_limit() {
        let (base, _shutdown) = spawn_server().await;
        let failure = executor(5_000)
            .execute(&ApiRequest::new(HttpMethod::Get, format!("{}/loop", base)))
            .await
            .expect_err("redirect loop");

        assert_eq!(failure.code.as_deref(), Some("ERR_TOO_MANY_REDIRECTS"));
        assert!(failure.response.is_none());
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local_addr");
        drop(listener);

        let failure = executor(5_000)
            .execute(&ApiRequest::new(HttpMethod::Get, format!("http://{}/", addr)))
            .await
            .expect_err("nothing listening");

        assert!(failure.response.is_none());
        assert!(failure.code.as_deref().is_some_and(|c| c.starts_with("ECONN")));
        assert!(!failure.causes.is_empty());
        assert!(failure.trace().contains("caused by"));
    }

    #[test]
    fn test_status_error_codes() {
        assert_eq!(status_error_code(400), Some("ERR_BAD_REQUEST"));
        assert_eq!(status_error_code(503), Some("ERR_BAD_RESPONSE"));
        assert_eq!(status_error_code(302), None);
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(b""), Value::Null);
        assert_eq!(decode_body(br#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(decode_body(b"42"), json!(42));
        assert_eq!(decode_body(b"<html>"), json!("<html>"));
    }
}
