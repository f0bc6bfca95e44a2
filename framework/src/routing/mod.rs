//! Router seam
//!
//! The binder only needs somewhere to put `(verb, path, handler chain)`
//! triples. [`RouteRegistrar`] is that seam; [`Router`] is the matchit-backed
//! implementation the [`Server`](crate::Server) dispatches with.

mod router;

pub use router::{to_matchit_pattern, RouteSummary, Router};

use crate::controller::HttpMethod;
use crate::error::FrameworkError;
use crate::middleware::BoxedMiddleware;

/// Anything routes can be registered on
///
/// `handlers` is the full chain for the route, run in order with a shared
/// context: middleware first, the controller handler last.
pub trait RouteRegistrar {
    fn register(
        &mut self,
        method: HttpMethod,
        path: &str,
        handlers: Vec<BoxedMiddleware>,
    ) -> Result<(), FrameworkError>;

    fn head(&mut self, path: &str, handlers: Vec<BoxedMiddleware>) -> Result<(), FrameworkError> {
        self.register(HttpMethod::Head, path, handlers)
    }

    fn get(&mut self, path: &str, handlers: Vec<BoxedMiddleware>) -> Result<(), FrameworkError> {
        self.register(HttpMethod::Get, path, handlers)
    }

    fn post(&mut self, path: &str, handlers: Vec<BoxedMiddleware>) -> Result<(), FrameworkError> {
        self.register(HttpMethod::Post, path, handlers)
    }

    fn put(&mut self, path: &str, handlers: Vec<BoxedMiddleware>) -> Result<(), FrameworkError> {
        self.register(HttpMethod::Put, path, handlers)
    }

    fn delete(&mut self, path: &str, handlers: Vec<BoxedMiddleware>) -> Result<(), FrameworkError> {
        self.register(HttpMethod::Delete, path, handlers)
    }

    fn options(&mut self, path: &str, handlers: Vec<BoxedMiddleware>) -> Result<(), FrameworkError> {
        self.register(HttpMethod::Options, path, handlers)
    }

    fn all(&mut self, path: &str, handlers: Vec<BoxedMiddleware>) -> Result<(), FrameworkError> {
        self.register(HttpMethod::All, path, handlers)
    }
}
