use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;

/// Request-side data of a [`Context`](super::Context)
///
/// Transport concerns (socket reads, multipart storage) stay outside trellis;
/// whoever builds the context fills these fields in already parsed.
#[derive(Debug, Clone, Default)]
pub struct RequestData {
    /// Request method as sent by the client (e.g. "GET")
    pub method: String,
    /// Request path without the query string
    pub path: String,
    /// Raw query string, without the leading `?`
    pub query_string: Option<String>,
    /// Header map with lower-cased names
    pub headers: HashMap<String, String>,
    /// Parsed request body, `Null` when absent
    pub body: Value,
    /// Parsed form fields
    pub fields: Map<String, Value>,
    /// Uploaded files, already stored by the transport layer
    pub files: Vec<UploadedFile>,
}

impl RequestData {
    /// Get a header value by (case-insensitive) name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Every value sent for a query key, in request order
    pub fn query_all(&self, key: &str) -> Vec<String> {
        self.query_string
            .as_deref()
            .and_then(|raw| serde_urlencoded::from_str::<Vec<(String, String)>>(raw).ok())
            .unwrap_or_default()
            .into_iter()
            .filter(|(name, _)| name == key)
            .map(|(_, value)| value)
            .collect()
    }
}

/// A file received with the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Form field the file was submitted under
    pub field: String,
    /// Client-supplied file name
    pub filename: String,
    pub content_type: Option<String>,
    /// Size in bytes
    pub size: u64,
    /// Where the transport stored the upload, if on disk
    pub path: Option<PathBuf>,
}

impl UploadedFile {
    pub fn new(field: impl Into<String>, filename: impl Into<String>, size: u64) -> Self {
        Self {
            field: field.into(),
            filename: filename.into(),
            content_type: None,
            size,
            path: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}
