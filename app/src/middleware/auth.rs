//! Bearer token check

use trellis::{async_trait, AppError, Context, HandlerResult, Middleware, Next};

/// Rejects requests without `Authorization: Bearer <token>`
pub struct RequireToken {
    token: String,
}

impl RequireToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Token from `APP_API_TOKEN`, `secret` when unset
    pub fn from_env() -> Self {
        Self::new(trellis::config::env("APP_API_TOKEN", "secret".to_string()))
    }
}

#[async_trait]
impl Middleware for RequireToken {
    async fn handle(&self, ctx: Context, next: Next) -> HandlerResult {
        let presented = ctx
            .header("authorization")
            .and_then(|value| value.strip_prefix("Bearer "));

        if presented != Some(self.token.as_str()) {
            tracing::debug!(path = ctx.path(), "missing or invalid token");
            return Err(AppError::unauthorized("Invalid or missing token").into());
        }

        ctx.set_state("authenticated", true.into());
        next.run(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trellis::from_fn;

    fn chain() -> Next {
        Next::new(vec![
            trellis::middleware::into_boxed(RequireToken::new("t0k")),
            trellis::middleware::into_boxed(from_fn(|_ctx: Context, _next: Next| async {
                Ok(Some(json!("through")))
            })),
        ])
    }

    #[tokio::test]
    async fn accepts_the_configured_token() {
        let ctx = Context::builder().header("Authorization", "Bearer t0k").build();
        let result = chain().run(ctx.clone()).await.unwrap();

        assert_eq!(result, Some(json!("through")));
        assert_eq!(ctx.state("authenticated"), Some(json!(true)));
    }

    #[tokio::test]
    async fn rejects_other_tokens() {
        let ctx = Context::builder().header("Authorization", "Bearer nope").build();
        let err = chain().run(ctx).await.unwrap_err();
        assert_eq!(err.status_code(), 401);
    }
}
