//! Projection of raw executor outcomes into [`CanonicalResult`] records.

use serde_json::Value;

use super::executor::{RequestFailure, RequestSuccess};
use super::model::{CanonicalResult, HttpMethod, ResponseTime, has_content};

/// Code used when a failure carries no code of its own.
pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";

/// Message used when a failure carries an empty message.
const FALLBACK_MESSAGE: &str = "Request failed";

/// Build the success-shaped record for a completed call.
pub fn normalize_success(
    outcome: &RequestSuccess,
    method: HttpMethod,
    url: &str,
    request_data: Option<&Value>,
) -> CanonicalResult {
    let response = &outcome.response;
    CanonicalResult {
        success: true,
        method,
        url: url.to_string(),
        status: Some(response.status),
        status_text: Some(response.status_text.clone()),
        headers: Some(response.headers.clone()),
        data: Some(response.data.clone()),
        response_time: outcome.timing.response_time(),
        error: None,
        code: None,
        request_data: echo_request_data(request_data),
    }
}

/// Build the failure-shaped record for a failed call.
///
/// `error` and `code` are never empty. Response fields are copied only when
/// the failure came with a response.
pub fn normalize_failure(
    failure: &RequestFailure,
    method: HttpMethod,
    url: &str,
    request_data: Option<&Value>,
) -> CanonicalResult {
    let error = if failure.message.trim().is_empty() {
        FALLBACK_MESSAGE.to_string()
    } else {
        failure.message.clone()
    };
    let code = failure
        .code
        .clone()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string());

    let mut result = CanonicalResult {
        success: false,
        method,
        url: url.to_string(),
        status: None,
        status_text: None,
        headers: None,
        data: None,
        response_time: ResponseTime::Unavailable,
        error: Some(error),
        code: Some(code),
        request_data: echo_request_data(request_data),
    };

    if let Some(response) = &failure.response {
        result.status = Some(response.status);
        result.status_text = Some(response.status_text.clone());
        result.headers = Some(response.headers.clone());
        result.data = Some(response.data.clone());
        result.response_time = failure.timing.response_time();
    }

    result
}

fn echo_request_data(request_data: Option<&Value>) -> Option<Value> {
    request_data.filter(|d| has_content(d)).cloned()
}
