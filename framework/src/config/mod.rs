//! Configuration loaded from `.env` files and the process environment
//!
//! ```rust,no_run
//! use trellis::Config;
//!
//! let config = Config::init(std::path::Path::new("."));
//! println!("listening on {}", config.server.address());
//! ```

mod app;
pub mod env;
mod routing;
mod server;

pub use app::{AppConfig, AppConfigBuilder};
pub use env::{env, env_optional, load_dotenv, Environment};
pub use routing::RoutingConfig;
pub use server::{ServerConfig, ServerConfigBuilder};

use std::path::Path;
use std::sync::OnceLock;

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Every typed config section
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub server: ServerConfig,
    pub routing: RoutingConfig,
}

impl Config {
    /// Read every section from the current process environment
    pub fn from_env() -> Self {
        Self {
            app: AppConfig::from_env(),
            server: ServerConfig::from_env(),
            routing: RoutingConfig::from_env(),
        }
    }

    /// Load `.env` files under `root`, then read every section
    pub fn load(root: &Path) -> Self {
        env::load_dotenv(root);
        Self::from_env()
    }

    /// Load once and install as the process-wide config
    ///
    /// Later calls return the config installed by the first one.
    pub fn init(root: &Path) -> &'static Config {
        CONFIG.get_or_init(|| Self::load(root))
    }

    /// Install an explicit config; `false` when one was already installed
    pub fn set(config: Config) -> bool {
        CONFIG.set(config).is_ok()
    }

    /// The installed config, if any
    pub fn global() -> Option<&'static Config> {
        CONFIG.get()
    }

    /// The installed config, or a fresh read of the environment
    pub fn current() -> Config {
        Self::global().cloned().unwrap_or_else(Self::from_env)
    }

    pub fn environment(&self) -> &Environment {
        &self.app.environment
    }
}
