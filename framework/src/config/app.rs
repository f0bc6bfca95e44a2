use super::env::{env, Environment};

/// Application identity and logging defaults
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: String,
    pub environment: Environment,
    pub debug: bool,
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl AppConfig {
    /// Read `APP_NAME`, `APP_ENV`, `APP_DEBUG` and `APP_LOG_LEVEL`
    pub fn from_env() -> Self {
        let environment = Environment::detect();
        let debug = env("APP_DEBUG", !environment.is_production());
        let fallback = if debug { "debug" } else { "info" };

        Self {
            name: env("APP_NAME", "trellis".to_string()),
            log_level: env("APP_LOG_LEVEL", fallback.to_string()),
            environment,
            debug,
        }
    }

    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Overrides applied on top of [`AppConfig::from_env`]
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    name: Option<String>,
    environment: Option<Environment>,
    debug: Option<bool>,
    log_level: Option<String>,
}

impl AppConfigBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    pub fn build(self) -> AppConfig {
        let base = AppConfig::from_env();
        AppConfig {
            name: self.name.unwrap_or(base.name),
            environment: self.environment.unwrap_or(base.environment),
            debug: self.debug.unwrap_or(base.debug),
            log_level: self.log_level.unwrap_or(base.log_level),
        }
    }
}
