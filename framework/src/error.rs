//! Errors raised while collecting, binding and serving routes
//!
//! Every fallible operation in trellis returns [`FrameworkError`]. Errors raised
//! by controller methods or response overrides travel out of the route handler
//! untouched; the server adapter is the one place that turns them into HTTP
//! responses.

use thiserror::Error;

/// A domain error that knows its HTTP status
///
/// Implement this on controller-domain errors to pick the status code and
/// message used when the error reaches the server adapter.
///
/// # Example
///
/// ```rust,ignore
/// use trellis::HttpError;
///
/// #[derive(Debug)]
/// struct ProfileMissing { id: u64 }
///
/// impl std::fmt::Display for ProfileMissing {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "Profile {} not found", self.id)
///     }
/// }
///
/// impl std::error::Error for ProfileMissing {}
///
/// impl HttpError for ProfileMissing {
///     fn status_code(&self) -> u16 { 404 }
/// }
/// ```
pub trait HttpError: std::error::Error + Send + Sync + 'static {
    /// Defaults to 500
    fn status_code(&self) -> u16 {
        500
    }

    /// Message placed in the `error` field of the response body
    fn error_message(&self) -> String {
        self.to_string()
    }
}

/// Ad-hoc domain error for controllers that don't need a dedicated type
///
/// ```rust,ignore
/// return Err(AppError::not_found("No such user").into());
/// ```
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    message: String,
    status_code: u16,
}

impl AppError {
    /// Status 500 until [`AppError::status`] says otherwise
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: 500,
        }
    }

    pub fn status(mut self, code: u16) -> Self {
        self.status_code = code;
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message).status(400)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(message).status(401)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message).status(404)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(message).status(409)
    }
}

impl HttpError for AppError {
    fn status_code(&self) -> u16 {
        self.status_code
    }
}

impl From<AppError> for FrameworkError {
    fn from(e: AppError) -> Self {
        FrameworkError::from_http_error(&e)
    }
}

/// Error returned by every fallible trellis operation
#[derive(Debug, Clone, Error)]
pub enum FrameworkError {
    /// An injected argument was missing or had the wrong shape
    #[error("Missing required parameter: {param_name}")]
    ParamError {
        /// The argument that failed extraction
        param_name: String,
    },

    /// An injected argument could not be converted to the requested type
    #[error("Invalid parameter '{param}': expected {expected_type}")]
    ParamParse {
        /// The argument that failed conversion
        param: String,
        /// The requested Rust type
        expected_type: &'static str,
    },

    /// A controller method declared a parameter list that is not dense
    #[error("Invalid parameters on {controller}::{method}: {reason}")]
    InvalidParameters {
        controller: &'static str,
        method: &'static str,
        reason: String,
    },

    /// The instance factory could not provide a usable controller instance
    #[error("Controller instance unavailable for {controller}: {reason}")]
    ControllerInstance {
        controller: &'static str,
        reason: String,
    },

    /// The router refused a registration
    #[error("Cannot register {method} {path}: {reason}")]
    RouteConflict {
        method: String,
        path: String,
        reason: String,
    },

    /// No route matched the request
    #[error("No route for {method} {path}")]
    NotFound { method: String, path: String },

    /// Request body exceeded the configured limit
    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// A controller result could not be serialized into a response body
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic internal error
    #[error("Internal server error: {message}")]
    Internal { message: String },

    /// Domain error with a custom status code
    #[error("{message}")]
    Domain { message: String, status_code: u16 },
}

impl FrameworkError {
    /// Create a ParamError for a missing or mismatched argument
    pub fn param(name: impl Into<String>) -> Self {
        Self::ParamError {
            param_name: name.into(),
        }
    }

    /// Create a ParamParse error
    pub fn param_parse(param: impl Into<String>, expected_type: &'static str) -> Self {
        Self::ParamParse {
            param: param.into(),
            expected_type,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn domain(message: impl Into<String>, status_code: u16) -> Self {
        Self::Domain {
            message: message.into(),
            status_code,
        }
    }

    /// Capture any [`HttpError`] as a domain error
    pub fn from_http_error<E: HttpError + ?Sized>(err: &E) -> Self {
        Self::Domain {
            message: err.error_message(),
            status_code: err.status_code(),
        }
    }

    /// Status the server adapter answers with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ParamError { .. } => 400,
            Self::ParamParse { .. } => 400,
            Self::InvalidParameters { .. } => 500,
            Self::ControllerInstance { .. } => 500,
            Self::RouteConflict { .. } => 500,
            Self::NotFound { .. } => 404,
            Self::PayloadTooLarge { .. } => 413,
            Self::Serialization(_) => 500,
            Self::Internal { .. } => 500,
            Self::Domain { status_code, .. } => *status_code,
        }
    }
}

impl From<serde_json::Error> for FrameworkError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
