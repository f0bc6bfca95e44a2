use crate::controller::HttpMethod;
use crate::http::Context;
use crate::middleware::{BoxedMiddleware, HandlerResult, Next};
use serde::Serialize;
use std::fmt;

/// A view route handed to a renderer instead of the router
///
/// [`ViewDescriptor::invoke`] runs the route's middleware and then the
/// controller method, exactly like a bound route would, so the renderer can
/// still fetch the view's data behind the same guards.
#[derive(Clone, Serialize)]
pub struct ViewDescriptor {
    /// View path declared on the method
    pub component: String,
    /// Controller prefix followed by the route path
    pub path: String,
    pub method: HttpMethod,
    /// Controller method name
    pub name: &'static str,
    /// Merged controller and method middleware
    #[serde(skip)]
    pub middleware: Vec<BoxedMiddleware>,
    #[serde(skip)]
    pub handler: BoxedMiddleware,
}

impl ViewDescriptor {
    /// Run the view's middleware followed by its controller method
    pub async fn invoke(&self, ctx: Context) -> HandlerResult {
        let mut chain = self.middleware.clone();
        chain.push(self.handler.clone());
        Next::new(chain).run(ctx).await
    }
}

impl fmt::Debug for ViewDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewDescriptor")
            .field("component", &self.component)
            .field("path", &self.path)
            .field("method", &self.method)
            .field("name", &self.name)
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}
