//! Body parsing for the server adapter
//!
//! Produces the already-parsed `body` and `fields` a [`Context`](super::Context)
//! exposes to extractors.

use crate::error::FrameworkError;
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use serde_json::{Map, Value};
use std::error::Error as StdError;

/// Collect the full body, refusing anything larger than `limit` bytes
///
/// Reading stops as soon as the limit is crossed, so an oversized request is
/// never buffered whole.
pub async fn collect_body<B>(body: B, limit: usize) -> Result<Bytes, FrameworkError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    Limited::new(body, limit)
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                FrameworkError::PayloadTooLarge { limit }
            } else {
                FrameworkError::internal(format!("Failed to read request body: {}", e))
            }
        })
}

/// Parse a body according to its content type
///
/// - `application/json` → `(json, {})`
/// - `application/x-www-form-urlencoded` → `(object, fields)`
/// - empty body → `(Null, {})`
/// - anything else → `(string, {})` when valid UTF-8, `Null` otherwise
pub fn parse_body(
    content_type: Option<&str>,
    bytes: &Bytes,
) -> Result<(Value, Map<String, Value>), FrameworkError> {
    if bytes.is_empty() {
        return Ok((Value::Null, Map::new()));
    }

    match content_type {
        Some(ct) if ct.starts_with("application/json") => {
            let value = serde_json::from_slice(bytes).map_err(|e| {
                FrameworkError::domain(format!("Failed to parse JSON body: {}", e), 400)
            })?;
            Ok((value, Map::new()))
        }
        Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => {
            let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(bytes).map_err(|e| {
                FrameworkError::domain(format!("Failed to parse form body: {}", e), 400)
            })?;
            let fields: Map<String, Value> = pairs
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect();
            Ok((Value::Object(fields.clone()), fields))
        }
        _ => Ok((
            std::str::from_utf8(bytes)
                .map(|text| Value::String(text.to_string()))
                .unwrap_or(Value::Null),
            Map::new(),
        )),
    }
}
