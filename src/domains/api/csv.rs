//! CSV projection of a [`CanonicalResult`].
//!
//! The document is a `# key:value|...` metadata comment followed by one
//! table. The table is chosen from the shape of `data`:
//!
//! - array of objects: union of keys in first-seen order, one row per element
//! - object: its keys, one row
//! - scalar: a single `value` column
//! - failure without data: `error,code,message`
//! - anything else: `status,method,url`
//!
//! [`to_csv`] never fails. Internal errors produce the
//! `CSV Conversion Error` table instead.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use super::model::{CanonicalResult, NOT_AVAILABLE};

/// Marker placed in the `error` column when projection fails.
pub const CSV_CONVERSION_ERROR: &str = "CSV Conversion Error";

/// Code placed in the `code` column when projection fails.
pub const CSV_CONVERSION_CODE: &str = "CSV_CONVERSION_ERROR";

/// Deepest nesting a single cell may hold.
pub const MAX_CELL_DEPTH: usize = 64;

/// Internal projection failures.
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("cell value nested deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("failed to render cell: {0}")]
    Render(#[from] serde_json::Error),
}

/// Project `result` into a CSV document.
pub fn to_csv(result: &CanonicalResult) -> String {
    match try_to_csv(result) {
        Ok(csv) => csv,
        Err(e) => {
            warn!("CSV projection failed for {} {}: {}", result.method, result.url, e);
            conversion_error_table(&e.to_string())
        }
    }
}

fn try_to_csv(result: &CanonicalResult) -> Result<String, CsvError> {
    let mut lines = vec![metadata_line(result)];
    lines.extend(table(result)?);
    Ok(lines.join("\n"))
}

fn metadata_line(result: &CanonicalResult) -> String {
    let status = result
        .status
        .map(|s| s.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let mut fields = vec![
        format!("status:{}", status),
        format!("method:{}", result.method),
        format!("url:{}", single_line(&result.url)),
        format!("responseTime:{}", result.response_time),
    ];
    if let Some(error) = &result.error {
        fields.push(format!("error:{}", single_line(error)));
    }
    format!("# {}", fields.join("|"))
}

/// The metadata comment must stay on one line.
fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

fn table(result: &CanonicalResult) -> Result<Vec<String>, CsvError> {
    let data = result.data.as_ref().filter(|d| !d.is_null());

    if result.is_failure() && data.is_none() {
        let error = result.error.as_deref().unwrap_or_default();
        let code = result.code.as_deref().unwrap_or_default();
        return Ok(vec![
            "error,code,message".to_string(),
            join_row([error, code, error]),
        ]);
    }

    if let Some(lines) = data.map(data_table).transpose()?.flatten() {
        return Ok(lines);
    }

    let status = result.status.map(|s| s.to_string()).unwrap_or_default();
    Ok(vec![
        "status,method,url".to_string(),
        join_row([status.as_str(), result.method.as_str(), result.url.as_str()]),
    ])
}

/// `None` when `data` yields no table content.
fn data_table(data: &Value) -> Result<Option<Vec<String>>, CsvError> {
    match data {
        Value::Array(items) if items.is_empty() => Ok(None),
        Value::Array(items) => {
            if items.iter().all(Value::is_object) {
                let records: Vec<&Map<String, Value>> =
                    items.iter().filter_map(Value::as_object).collect();
                records_table(&records).map(Some)
            } else {
                let mut lines = vec!["value".to_string()];
                for item in items {
                    lines.push(escape(&cell(item)?));
                }
                Ok(Some(lines))
            }
        }
        Value::Object(map) if map.is_empty() => Ok(None),
        Value::Object(map) => records_table(&[map]).map(Some),
        Value::Null => Ok(None),
        scalar => Ok(Some(vec!["value".to_string(), escape(&cell(scalar)?)])),
    }
}

fn records_table(records: &[&Map<String, Value>]) -> Result<Vec<String>, CsvError> {
    let mut header: Vec<&str> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !header.contains(&key.as_str()) {
                header.push(key);
            }
        }
    }

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(join_row(header.iter().copied()));
    for record in records {
        let mut cells = Vec::with_capacity(header.len());
        for key in &header {
            let text = match record.get(*key) {
                Some(value) => cell(value)?,
                None => String::new(),
            };
            cells.push(escape(&text));
        }
        lines.push(cells.join(","));
    }
    Ok(lines)
}

/// Plain text of a value: strings unquoted, nested values as compact JSON.
fn cell(value: &Value) -> Result<String, CsvError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        nested => {
            if nesting_depth(nested) > MAX_CELL_DEPTH {
                return Err(CsvError::TooDeep {
                    limit: MAX_CELL_DEPTH,
                });
            }
            Ok(serde_json::to_string(nested)?)
        }
    }
}

fn nesting_depth(value: &Value) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(value, 1usize)];
    while let Some((current, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        match current {
            Value::Array(items) => stack.extend(items.iter().map(|v| (v, depth + 1))),
            Value::Object(map) => stack.extend(map.values().map(|v| (v, depth + 1))),
            _ => {}
        }
    }
    deepest
}

fn join_row<'a>(cells: impl IntoIterator<Item = &'a str>) -> String {
    cells.into_iter().map(escape).collect::<Vec<_>>().join(",")
}

/// Quote cells holding a comma, line break or double quote.
pub fn escape(text: &str) -> String {
    if text.contains([',', '\n', '\r', '"']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

fn conversion_error_table(message: &str) -> String {
    format!(
        "error,code,message\n{}",
        join_row([CSV_CONVERSION_ERROR, CSV_CONVERSION_CODE, message])
    )
}
