//! Per-controller request timing

use std::time::Instant;
use trellis::{async_trait, Context, HandlerResult, Middleware, Next};

/// Logs how long the rest of the chain took
pub struct RequestLog {
    scope: &'static str,
}

impl RequestLog {
    pub fn new(scope: &'static str) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl Middleware for RequestLog {
    async fn handle(&self, ctx: Context, next: Next) -> HandlerResult {
        let started = Instant::now();
        let method = ctx.method().to_string();
        let path = ctx.path().to_string();

        let result = next.run(ctx).await;

        tracing::debug!(
            scope = self.scope,
            %method,
            %path,
            ok = result.is_ok(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "handled"
        );
        result
    }
}
