//! Handler chain contract
//!
//! Everything a router runs for a route is a [`Middleware`]: user middleware
//! and the controller route handler alike. Each one receives the shared
//! [`Context`] and a [`Next`] continuation over the rest of the chain.
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis::{async_trait, Context, HandlerResult, Middleware, Next};
//!
//! pub struct Timing;
//!
//! #[async_trait]
//! impl Middleware for Timing {
//!     async fn handle(&self, ctx: Context, next: Next) -> HandlerResult {
//!         let started = std::time::Instant::now();
//!         let result = next.run(ctx).await;
//!         tracing::info!(elapsed = ?started.elapsed(), "request done");
//!         result
//!     }
//! }
//! ```

use crate::error::FrameworkError;
use crate::http::Context;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future used at the type-erased seams
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a handler hands back to whoever called it
///
/// `Ok(Some(value))` lets outer middleware chain on the controller result.
pub type HandlerResult = Result<Option<Value>, FrameworkError>;

/// One link of a route's handler chain
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, ctx: Context, next: Next) -> HandlerResult;
}

pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Box a middleware for storage in a chain
pub fn into_boxed<M: Middleware + 'static>(middleware: M) -> BoxedMiddleware {
    Arc::new(middleware)
}

/// Adapter turning an async closure into a [`Middleware`]
pub struct FnMiddleware<F>(F);

/// Build a middleware from an async closure
///
/// ```rust
/// use trellis::{middleware, Context, Next};
///
/// let mw = middleware::from_fn(|ctx: Context, next: Next| async move {
///     ctx.set_header("X-Powered-By", "trellis");
///     next.run(ctx).await
/// });
/// # let _ = mw;
/// ```
pub fn from_fn<F, Fut>(f: F) -> FnMiddleware<F>
where
    F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    FnMiddleware(f)
}

#[async_trait]
impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, ctx: Context, next: Next) -> HandlerResult {
        (self.0)(ctx, next).await
    }
}

/// Continuation over the remaining links of a chain
///
/// Running `Next` past the last link resolves to `Ok(None)`.
#[derive(Clone)]
pub struct Next {
    chain: Arc<[BoxedMiddleware]>,
    index: usize,
}

impl Next {
    /// Continuation starting at the first link of `chain`
    pub fn new(chain: impl Into<Arc<[BoxedMiddleware]>>) -> Self {
        Self {
            chain: chain.into(),
            index: 0,
        }
    }

    /// Continuation with nothing left to run
    pub fn end() -> Self {
        Self::new(Vec::<BoxedMiddleware>::new())
    }

    /// Number of links still ahead of this continuation
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.index)
    }

    /// Run the next link
    pub async fn run(self, ctx: Context) -> HandlerResult {
        let Some(link) = self.chain.get(self.index).cloned() else {
            return Ok(None);
        };
        let rest = Next {
            chain: self.chain,
            index: self.index + 1,
        };
        link.handle(ctx, rest).await
    }
}

impl PartialEq for Next {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.chain, &other.chain) && self.index == other.index
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.remaining())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct Record {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Middleware for Record {
        async fn handle(&self, ctx: Context, next: Next) -> HandlerResult {
            self.log.lock().unwrap().push(self.label);
            next.run(ctx).await
        }
    }

    #[tokio::test]
    async fn runs_links_in_order_and_returns_the_last_result() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain: Vec<BoxedMiddleware> = vec![
            into_boxed(Record { label: "first", log: log.clone() }),
            into_boxed(Record { label: "second", log: log.clone() }),
            into_boxed(from_fn(|_ctx: Context, _next: Next| async {
                Ok(Some(json!("done")))
            })),
        ];

        let result = Next::new(chain).run(Context::builder().build()).await.unwrap();

        assert_eq!(result, Some(json!("done")));
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn end_of_chain_resolves_to_none() {
        let result = Next::end().run(Context::builder().build()).await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn middleware_can_short_circuit() {
        let chain: Vec<BoxedMiddleware> = vec![
            into_boxed(from_fn(|ctx: Context, _next: Next| async move {
                ctx.set_status(401);
                Ok(None)
            })),
            into_boxed(from_fn(|ctx: Context, _next: Next| async move {
                ctx.set_body(json!("unreachable"));
                Ok(None)
            })),
        ];
        let ctx = Context::builder().build();
        Next::new(chain).run(ctx.clone()).await.unwrap();

        assert_eq!(ctx.status(), Some(401));
        assert_eq!(ctx.body(), None);
    }

    #[test]
    fn next_equality_is_identity() {
        let chain: Arc<[BoxedMiddleware]> = Arc::from(Vec::<BoxedMiddleware>::new());
        let a = Next::new(chain.clone());
        assert_eq!(a, a.clone());
        assert_ne!(a, Next::end());
        assert_eq!(a.remaining(), 0);
    }
}
