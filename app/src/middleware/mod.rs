//! Application middleware
//!
//! Each middleware has its own file.

mod auth;
mod logging;

pub use auth::RequireToken;
pub use logging::RequestLog;
