use super::env::env;

/// HTTP listener settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, in bytes
    pub max_body_size: usize,
}

impl ServerConfig {
    /// Read `SERVER_HOST`, `SERVER_PORT` and `SERVER_MAX_BODY_SIZE`
    pub fn from_env() -> Self {
        Self {
            host: env("SERVER_HOST", "127.0.0.1".to_string()),
            port: env("SERVER_PORT", 8080),
            max_body_size: env("SERVER_MAX_BODY_SIZE", 10 * 1024 * 1024),
        }
    }

    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// `host:port` for binding
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    max_body_size: Option<usize>,
}

impl ServerConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = Some(bytes);
        self
    }

    pub fn build(self) -> ServerConfig {
        let base = ServerConfig::from_env();
        ServerConfig {
            host: self.host.unwrap_or(base.host),
            port: self.port.unwrap_or(base.port),
            max_body_size: self.max_body_size.unwrap_or(base.max_body_size),
        }
    }
}
