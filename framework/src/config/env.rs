use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Deployment environment, read from `APP_ENV`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Local,
    Development,
    Staging,
    Production,
    Testing,
    Custom(String),
}

impl Environment {
    /// Current environment; unset `APP_ENV` means local
    pub fn detect() -> Self {
        std::env::var("APP_ENV")
            .ok()
            .and_then(|name| name.parse().ok())
            .unwrap_or(Self::Local)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Local => "local",
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
            Self::Testing => "testing",
            Self::Custom(name) => name,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Local or development
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Local | Self::Development)
    }

    /// Dotenv files for this environment, most specific first
    pub fn dotenv_files(&self, root: &Path) -> Vec<PathBuf> {
        vec![
            root.join(format!(".env.{}.local", self.name())),
            root.join(format!(".env.{}", self.name())),
            root.join(".env.local"),
            root.join(".env"),
        ]
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "" | "local" => Self::Local,
            "development" | "dev" => Self::Development,
            "staging" => Self::Staging,
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            other => Self::Custom(other.to_string()),
        })
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Load `.env` files under `root` and return the detected environment
///
/// dotenvy never overwrites a variable that is already set, so files are
/// loaded most specific first and the real process environment wins over all
/// of them.
pub fn load_dotenv(root: &Path) -> Environment {
    let environment = Environment::detect();

    for path in environment.dotenv_files(root) {
        match dotenvy::from_path(&path) {
            Ok(()) => tracing::debug!(file = %path.display(), "loaded dotenv file"),
            Err(err) if err.not_found() => {}
            Err(err) => tracing::warn!(file = %path.display(), error = %err, "skipping dotenv file"),
        }
    }

    environment
}

/// Environment variable parsed as `T`, or `default` when unset or invalid
///
/// ```
/// use trellis::config::env;
///
/// let port: u16 = env("TRELLIS_DOC_PORT", 8080);
/// assert_eq!(port, 8080);
/// ```
pub fn env<T: FromStr>(key: &str, default: T) -> T {
    env_optional(key).unwrap_or(default)
}

/// Environment variable parsed as `T`, if set and valid
pub fn env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|value| value.parse().ok())
}
