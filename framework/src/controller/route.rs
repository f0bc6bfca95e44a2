use super::params::{Arguments, ParamExtractor};
use super::Instance;
use crate::error::FrameworkError;
use crate::http::Context;
use crate::middleware::{BoxFuture, BoxedMiddleware, HandlerResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// HTTP verbs a route can be declared for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Head,
    Get,
    Post,
    Put,
    Delete,
    Options,
    /// Matches any request method
    All,
}

impl HttpMethod {
    pub const VARIANTS: [HttpMethod; 7] = [
        HttpMethod::Head,
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Head => "HEAD",
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::All => "ALL",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = FrameworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::VARIANTS
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| FrameworkError::internal(format!("Unsupported HTTP method '{}'", s)))
    }
}

/// How controller-level and method-level middleware combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MiddlewarePolicy {
    /// Controller middleware, then method middleware
    #[default]
    Concatenate,
    /// Non-empty method middleware replaces controller middleware
    Override,
}

impl MiddlewarePolicy {
    pub fn merge(
        &self,
        controller: &[BoxedMiddleware],
        method: &[BoxedMiddleware],
    ) -> Vec<BoxedMiddleware> {
        match self {
            MiddlewarePolicy::Override if !method.is_empty() => method.to_vec(),
            _ => controller.iter().chain(method).cloned().collect(),
        }
    }
}

impl FromStr for MiddlewarePolicy {
    type Err = FrameworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concatenate" | "concat" => Ok(MiddlewarePolicy::Concatenate),
            "override" => Ok(MiddlewarePolicy::Override),
            other => Err(FrameworkError::internal(format!(
                "Unknown middleware policy '{}'",
                other
            ))),
        }
    }
}

/// Controller method captured at registration, with the instance type erased
pub type Action = Arc<dyn Fn(Instance, Arguments) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Custom response writer receiving the context and the awaited method result
pub type ResponseHandler =
    Arc<dyn Fn(Context, Option<Value>) -> BoxFuture<'static, Result<(), FrameworkError>> + Send + Sync>;

/// Finalized description of one verb/path/method binding
#[derive(Clone)]
pub struct RouteRecord {
    pub method: HttpMethod,
    /// Route fragment as declared
    pub path: String,
    /// Controller prefix followed by the fragment
    pub url: String,
    /// Middleware run before the handler, already merged
    pub middleware: Vec<BoxedMiddleware>,
    /// Controller method name
    pub name: &'static str,
    pub params: Vec<ParamExtractor>,
    pub view: Option<String>,
    pub response: Option<ResponseHandler>,
    pub(crate) action: Action,
}

impl RouteRecord {
    pub fn is_view(&self) -> bool {
        self.view.is_some()
    }

    /// Invoke the captured controller method directly
    pub fn call(&self, instance: Instance, args: Arguments) -> BoxFuture<'static, HandlerResult> {
        (self.action)(instance, args)
    }
}

impl fmt::Debug for RouteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRecord")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("name", &self.name)
            .field("middleware", &self.middleware.len())
            .field("params", &self.params)
            .field("view", &self.view)
            .field("response", &self.response.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{from_fn, into_boxed};
    use crate::Next;

    fn mw() -> BoxedMiddleware {
        into_boxed(from_fn(|ctx: Context, next: Next| next.run(ctx)))
    }

    #[test]
    fn method_parsing_is_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Options".parse::<HttpMethod>().unwrap(), HttpMethod::Options);
        assert!("PATCH".parse::<HttpMethod>().is_err());
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }

    #[test]
    fn concatenate_keeps_controller_then_method_order() {
        let (a, b, c) = (mw(), mw(), mw());
        let merged = MiddlewarePolicy::Concatenate.merge(&[a.clone()], &[b.clone(), c.clone()]);

        assert_eq!(merged.len(), 3);
        assert!(Arc::ptr_eq(&merged[0], &a));
        assert!(Arc::ptr_eq(&merged[1], &b));
        assert!(Arc::ptr_eq(&merged[2], &c));
    }

    #[test]
    fn override_replaces_only_when_method_list_is_non_empty() {
        let (a, b) = (mw(), mw());

        let replaced = MiddlewarePolicy::Override.merge(&[a.clone()], &[b.clone()]);
        assert_eq!(replaced.len(), 1);
        assert!(Arc::ptr_eq(&replaced[0], &b));

        let kept = MiddlewarePolicy::Override.merge(&[a.clone()], &[]);
        assert_eq!(kept.len(), 1);
        assert!(Arc::ptr_eq(&kept[0], &a));
    }

    #[test]
    fn policy_from_config_strings() {
        assert_eq!(
            "override".parse::<MiddlewarePolicy>().unwrap(),
            MiddlewarePolicy::Override
        );
        assert_eq!(
            " Concatenate ".parse::<MiddlewarePolicy>().unwrap(),
            MiddlewarePolicy::Concatenate
        );
        assert!("sails".parse::<MiddlewarePolicy>().is_err());
    }
}
