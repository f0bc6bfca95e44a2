use super::Context;
use crate::error::FrameworkError;
use bytes::Bytes;
use http_body_util::Full;
use serde_json::Value;

/// Outgoing HTTP response assembled by the server adapter
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    status: u16,
    body: String,
    headers: Vec<(String, String)>,
}

impl HttpResponse {
    pub fn new() -> Self {
        Self {
            status: 200,
            body: String::new(),
            headers: Vec::new(),
        }
    }

    /// Create a response with a plain-text body
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
        }
    }

    /// Create a JSON response
    pub fn json(body: &Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        }
    }

    /// Build the response from what handlers wrote into the context
    ///
    /// An explicit status always wins. Without one, a context with a body
    /// answers 200 and a context without one answers 404.
    pub fn from_context(ctx: &Context) -> Self {
        let state = ctx.response();
        let mut response = match &state.body {
            Some(Value::String(text)) => Self::text(text.clone()),
            Some(body) => Self::json(body),
            None => Self::text("Not Found").status(404),
        };
        if let Some(status) = state.status {
            response = response.status(status);
        }
        for (name, value) in state.headers {
            response = response.header(name, value);
        }
        response
    }

    /// Set the HTTP status code
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Add a header to the response
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Convert to hyper response
    pub fn into_hyper(self) -> hyper::Response<Full<Bytes>> {
        let mut builder = hyper::Response::builder().status(self.status);

        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }

        builder
            .body(Full::new(Bytes::from(self.body)))
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "invalid response parts, answering 500");
                let mut fallback = hyper::Response::new(Full::new(Bytes::new()));
                *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl From<FrameworkError> for HttpResponse {
    fn from(err: FrameworkError) -> HttpResponse {
        let body = match &err {
            FrameworkError::ParamError { param_name } => serde_json::json!({
                "error": format!("Missing required parameter: {}", param_name)
            }),
            _ => serde_json::json!({ "error": err.to_string() }),
        };
        HttpResponse::json(&body).status(err.status_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn context_without_body_is_not_found() {
        let ctx = Context::builder().build();
        let response = HttpResponse::from_context(&ctx);
        assert_eq!(response.status_code(), 404);
    }

    #[test]
    fn json_body_and_explicit_status() {
        let ctx = Context::builder().build();
        ctx.set_body(json!({"id": 1}));
        ctx.set_status(201);
        ctx.set_header("X-Trace", "abc");

        let response = HttpResponse::from_context(&ctx);
        assert_eq!(response.status_code(), 201);
        assert_eq!(response.body(), r#"{"id":1}"#);
        assert!(response
            .headers()
            .contains(&("X-Trace".to_string(), "abc".to_string())));
    }

    #[test]
    fn string_body_is_plain_text() {
        let ctx = Context::builder().build();
        ctx.set_body(json!("hello"));
        let response = HttpResponse::from_context(&ctx);
        assert_eq!(response.body(), "hello");
        assert_eq!(response.status_code(), 200);
    }

    #[test]
    fn framework_errors_carry_their_status() {
        let response = HttpResponse::from(FrameworkError::param("id"));
        assert_eq!(response.status_code(), 400);
        assert!(response.body().contains("Missing required parameter: id"));
    }
}
