//! Test helpers for controller bindings
//!
//! [`RecordingRouter`] stands in for a real router: it keeps every
//! registration and can run a recorded handler chain against a hand-built
//! [`Context`].
//!
//! ```rust,ignore
//! use trellis::testing::RecordingRouter;
//! use trellis::{bind_routes, definition, Context, HttpMethod};
//!
//! let mut router = RecordingRouter::new();
//! bind_routes(&mut router, &[definition::<ProfileController>()?], None)?;
//!
//! let ctx = Context::builder().build();
//! router.invoke(HttpMethod::Get, "/profile", ctx.clone()).await?;
//! assert_eq!(ctx.body(), Some(json!({"id": 1})));
//! ```

use crate::controller::HttpMethod;
use crate::error::FrameworkError;
use crate::http::Context;
use crate::middleware::{BoxedMiddleware, HandlerResult, Next};
use crate::routing::RouteRegistrar;
use std::fmt;

/// One recorded `register` call
#[derive(Clone)]
pub struct Registration {
    pub method: HttpMethod,
    pub path: String,
    pub handlers: Vec<BoxedMiddleware>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Router that only remembers what was registered
#[derive(Debug, Default)]
pub struct RecordingRouter {
    registrations: Vec<Registration>,
}

impl RecordingRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    /// `(method, path)` pairs in registration order
    pub fn routes(&self) -> Vec<(HttpMethod, &str)> {
        self.registrations
            .iter()
            .map(|r| (r.method, r.path.as_str()))
            .collect()
    }

    pub fn find(&self, method: HttpMethod, path: &str) -> Option<&Registration> {
        self.registrations
            .iter()
            .find(|r| r.method == method && r.path == path)
    }

    /// Run the chain recorded for `(method, path)` with `ctx`
    pub async fn invoke(&self, method: HttpMethod, path: &str, ctx: Context) -> HandlerResult {
        let registration =
            self.find(method, path)
                .ok_or_else(|| FrameworkError::NotFound {
                    method: method.to_string(),
                    path: path.to_string(),
                })?;
        Next::new(registration.handlers.clone()).run(ctx).await
    }
}

impl RouteRegistrar for RecordingRouter {
    fn register(
        &mut self,
        method: HttpMethod,
        path: &str,
        handlers: Vec<BoxedMiddleware>,
    ) -> Result<(), FrameworkError> {
        self.registrations.push(Registration {
            method,
            path: path.to_string(),
            handlers,
        });
        Ok(())
    }
}
