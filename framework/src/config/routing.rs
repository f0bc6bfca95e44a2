use crate::controller::MiddlewarePolicy;

/// Binder defaults
#[derive(Debug, Clone, Default)]
pub struct RoutingConfig {
    /// How controller and method middleware combine unless a controller
    /// chooses otherwise
    pub middleware_policy: MiddlewarePolicy,
}

impl RoutingConfig {
    /// Read `ROUTING_MIDDLEWARE_POLICY` (`concatenate` or `override`)
    pub fn from_env() -> Self {
        let middleware_policy = match std::env::var("ROUTING_MIDDLEWARE_POLICY") {
            Ok(raw) => raw.parse().unwrap_or_else(|err| {
                tracing::warn!(value = %raw, error = %err, "falling back to concatenate");
                MiddlewarePolicy::default()
            }),
            Err(_) => MiddlewarePolicy::default(),
        };

        Self { middleware_policy }
    }

    pub fn middleware_policy(mut self, policy: MiddlewarePolicy) -> Self {
        self.middleware_policy = policy;
        self
    }
}
