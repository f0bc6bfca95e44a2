//! Conversion of controller method results into response values

use crate::error::FrameworkError;
use serde::Serialize;
use serde_json::Value;

/// Types a controller method may return
///
/// `None` means "nothing to write": the binder leaves the response body alone.
pub trait IntoReply {
    fn into_reply(self) -> Result<Option<Value>, FrameworkError>;
}

impl IntoReply for Value {
    fn into_reply(self) -> Result<Option<Value>, FrameworkError> {
        Ok(Some(self))
    }
}

impl IntoReply for Option<Value> {
    fn into_reply(self) -> Result<Option<Value>, FrameworkError> {
        Ok(self)
    }
}

impl IntoReply for () {
    fn into_reply(self) -> Result<Option<Value>, FrameworkError> {
        Ok(None)
    }
}

impl IntoReply for String {
    fn into_reply(self) -> Result<Option<Value>, FrameworkError> {
        Ok(Some(Value::String(self)))
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Result<Option<Value>, FrameworkError> {
        Ok(Some(Value::String(self.to_string())))
    }
}

/// Serialize any `T: Serialize` as the method result
///
/// ```rust,ignore
/// async fn show(self: Arc<Self>, _args: Arguments) -> Result<Json<Profile>, FrameworkError> {
///     Ok(Json(Profile { id: 1 }))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoReply for Json<T> {
    fn into_reply(self) -> Result<Option<Value>, FrameworkError> {
        Ok(Some(serde_json::to_value(self.0)?))
    }
}

/// JavaScript-style truthiness of a JSON value
///
/// `null`, `false`, `0`, `NaN` and `""` are falsy; objects and arrays are
/// truthy even when empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
