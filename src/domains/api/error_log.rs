//! Durable error log.
//!
//! Every failed call is appended to a flat file as pretty-printed JSON
//! followed by a row of `=`. Writing never fails from the caller's point of
//! view: problems with the file are reported through `tracing` instead.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use super::executor::RequestFailure;
use super::model::{ApiRequest, CanonicalResult, HttpMethod, RawResponse};
use crate::core::config::ErrorLogConfig;

const SEPARATOR_WIDTH: usize = 80;

/// Entry category for failed network calls.
pub const REQUEST_FAILURE: &str = "request_failure";

/// Entry category for dispatcher-level errors (validation, unknown tool).
pub const HANDLER_ERROR: &str = "handler_error";

/// Written in place of header values in handler error entries.
pub const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureEntry<'a> {
    timestamp: String,
    category: &'static str,
    context: &'a str,
    method: HttpMethod,
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_data: Option<&'a Value>,
    error: ErrorDetail<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<&'a RawResponse>,
    result: &'a CanonicalResult,
}

#[derive(Debug, Serialize)]
struct ErrorDetail<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    stack: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HandlerEntry<'a> {
    timestamp: String,
    category: &'static str,
    context: &'a str,
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    arguments: Option<Value>,
}

/// Append-only failure log.
#[derive(Debug)]
pub struct ErrorLogger {
    /// `None` when file logging is disabled.
    path: Option<PathBuf>,
    write_lock: Mutex<()>,
}

impl ErrorLogger {
    pub fn new(config: &ErrorLogConfig) -> Self {
        Self {
            path: config.enabled.then(|| config.path.clone()),
            write_lock: Mutex::new(()),
        }
    }

    /// A logger that only reports to `tracing`.
    pub fn disabled() -> Self {
        Self {
            path: None,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record a failed call made on behalf of `context`.
    pub fn log_failure(
        &self,
        failure: &RequestFailure,
        request: &ApiRequest,
        context: &str,
        result: &CanonicalResult,
    ) {
        error!(
            context,
            method = %request.method,
            url = %request.url,
            code = failure.code.as_deref().unwrap_or("-"),
            "Request failed: {}",
            failure.message
        );

        let entry = FailureEntry {
            timestamp: timestamp(),
            category: REQUEST_FAILURE,
            context,
            method: request.method,
            url: &request.url,
            request_data: request.body.as_ref(),
            error: ErrorDetail {
                message: &failure.message,
                code: failure.code.as_deref(),
                stack: failure.trace(),
            },
            response: failure.response.as_ref(),
            result,
        };
        self.append(&entry);
    }

    /// Record an error raised before any request was attempted.
    ///
    /// Header values in `arguments` are replaced with [`REDACTED`].
    pub fn log_handler_error(&self, context: &str, message: &str, arguments: Option<&Value>) {
        error!(context, "Handler error: {}", message);

        let entry = HandlerEntry {
            timestamp: timestamp(),
            category: HANDLER_ERROR,
            context,
            error: message,
            arguments: arguments.map(redact_headers),
        };
        self.append(&entry);
    }

    fn append<T: Serialize>(&self, entry: &T) {
        let Some(path) = &self.path else {
            return;
        };
        match self.try_append(path, entry) {
            Ok(()) => debug!(path = %path.display(), "Error log entry written"),
            Err(e) => error!(
                path = %path.display(),
                "Failed to write error log entry: {}", e
            ),
        }
    }

    fn try_append<T: Serialize>(&self, path: &Path, entry: &T) -> io::Result<()> {
        let mut text = serde_json::to_string_pretty(entry)?;
        text.push('\n');
        text.push_str(&"=".repeat(SEPARATOR_WIDTH));
        text.push('\n');

        // A poisoned lock only means another writer panicked mid-append.
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(text.as_bytes())
    }
}

/// Copy of tool arguments with every `headers` value masked.
fn redact_headers(arguments: &Value) -> Value {
    let mut arguments = arguments.clone();
    match arguments.get_mut("headers") {
        Some(Value::Object(headers)) => {
            for value in headers.values_mut() {
                *value = Value::String(REDACTED.to_string());
            }
        }
        Some(other) if !other.is_null() => *other = Value::String(REDACTED.to_string()),
        _ => {}
    }
    arguments
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::api::model::{RequestTiming, ResponseTime};
    use crate::domains::api::normalizer::normalize_failure;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn logger_in(dir: &TempDir) -> ErrorLogger {
        ErrorLogger::new(&ErrorLogConfig {
            enabled: true,
            path: dir.path().join("nested/logs/errors.log"),
        })
    }

    fn entries(text: &str) -> Vec<Value> {
        let separator = "=".repeat(SEPARATOR_WIDTH);
        text.split(&format!("{}\n", separator))
            .filter(|chunk| !chunk.trim().is_empty())
            .map(|chunk| serde_json::from_str(chunk).expect("entry is JSON"))
            .collect()
    }

    fn http_failure() -> (RequestFailure, ApiRequest) {
        let failure = RequestFailure::new("Request failed with status code 500")
            .with_code("ERR_BAD_RESPONSE")
            .with_response(RawResponse {
                status: 500,
                status_text: "Internal Server Error".to_string(),
                headers: BTreeMap::new(),
                data: json!("boom"),
            })
            .with_timing(RequestTiming::default());
        let request = ApiRequest::new(HttpMethod::Post, "http://api.test/orders")
            .with_body(Some(json!({"qty": 2})));
        (failure, request)
    }

    #[test]
    fn test_failure_entry_is_appended_with_separator() {
        let dir = TempDir::new().unwrap();
        let logger = logger_in(&dir);
        let (failure, request) = http_failure();
        let result = normalize_failure(
            &failure,
            request.method,
            &request.url,
            request.body.as_ref(),
        );

        logger.log_failure(&failure, &request, "api_post", &result);

        let text = fs::read_to_string(logger.path().unwrap()).unwrap();
        assert!(text.ends_with(&format!("{}\n", "=".repeat(80))));

        let logged = entries(&text);
        assert_eq!(logged.len(), 1);
        let entry = &logged[0];
        assert_eq!(entry["category"], REQUEST_FAILURE);
        assert_eq!(entry["context"], "api_post");
        assert_eq!(entry["method"], "POST");
        assert_eq!(entry["url"], "http://api.test/orders");
        assert_eq!(entry["requestData"], json!({"qty": 2}));
        assert_eq!(entry["error"]["code"], "ERR_BAD_RESPONSE");
        assert_eq!(entry["error"]["stack"], "Request failed with status code 500");
        assert_eq!(entry["response"]["status"], 500);
        assert_eq!(entry["result"]["success"], false);
        assert!(entry["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_entries_accumulate() {
        let dir = TempDir::new().unwrap();
        let logger = logger_in(&dir);
        let (failure, request) = http_failure();
        let result = normalize_failure(&failure, request.method, &request.url, None);

        logger.log_failure(&failure, &request, "api_post", &result);
        logger.log_handler_error("api_foo", "Unknown tool: api_foo", None);

        let text = fs::read_to_string(logger.path().unwrap()).unwrap();
        let logged = entries(&text);
        assert_eq!(logged.len(), 2);
        assert_eq!(logged[1]["category"], HANDLER_ERROR);
        assert_eq!(logged[1]["error"], "Unknown tool: api_foo");
    }

    #[test]
    fn test_handler_error_redacts_header_values() {
        let dir = TempDir::new().unwrap();
        let logger = logger_in(&dir);
        let arguments = json!({
            "url": "ftp://api.test/",
            "headers": {"Authorization": "Bearer s3cr3t", "x-api-key": "k"},
        });

        logger.log_handler_error(
            "api_get",
            "Invalid arguments: unsupported url scheme",
            Some(&arguments),
        );

        let text = fs::read_to_string(logger.path().unwrap()).unwrap();
        assert!(!text.contains("s3cr3t"));
        let entry = &entries(&text)[0];
        assert_eq!(entry["arguments"]["url"], "ftp://api.test/");
        assert_eq!(entry["arguments"]["headers"]["Authorization"], REDACTED);
        assert_eq!(entry["arguments"]["headers"]["x-api-key"], REDACTED);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_do_not_interleave() {
        const WRITERS: usize = 16;
        let dir = TempDir::new().unwrap();
        let logger = Arc::new(logger_in(&dir));

        let tasks: Vec<_> = (0..WRITERS)
            .map(|i| {
                let logger = logger.clone();
                tokio::spawn(async move {
                    let (failure, _) = http_failure();
                    let request =
                        ApiRequest::new(HttpMethod::Post, format!("http://api.test/{}", i))
                            .with_body(Some(json!({"payload": "x".repeat(4096)})));
                    let result = normalize_failure(
                        &failure,
                        request.method,
                        &request.url,
                        request.body.as_ref(),
                    );
                    logger.log_failure(&failure, &request, "api_post", &result);
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let text = fs::read_to_string(logger.path().unwrap()).unwrap();
        let logged = entries(&text);
        assert_eq!(logged.len(), WRITERS);
        let mut urls: Vec<_> = logged
            .iter()
            .map(|e| e["url"].as_str().unwrap().to_string())
            .collect();
        urls.sort();
        urls.dedup();
        assert_eq!(urls.len(), WRITERS);
    }

    #[test]
    fn test_disabled_logger_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("errors.log");
        let logger = ErrorLogger::new(&ErrorLogConfig {
            enabled: false,
            path: path.clone(),
        });
        logger.log_handler_error("api_get", "Invalid arguments", None);

        assert!(logger.path().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_unwritable_path_is_swallowed() {
        let dir = TempDir::new().unwrap();
        // A regular file where the log directory should be.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let logger = ErrorLogger::new(&ErrorLogConfig {
            enabled: true,
            path: blocker.join("errors.log"),
        });

        let failure = RequestFailure::new("connect error").with_code("ECONNREFUSED");
        let request = ApiRequest::new(HttpMethod::Get, "http://api.test/");
        let result = normalize_failure(&failure, request.method, &request.url, None);
        assert_eq!(result.response_time, ResponseTime::Unavailable);

        logger.log_failure(&failure, &request, "api_get", &result);
        assert!(!blocker.join("errors.log").exists());
    }
}
