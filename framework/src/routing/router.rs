use super::RouteRegistrar;
use crate::controller::HttpMethod;
use crate::error::FrameworkError;
use crate::middleware::BoxedMiddleware;
use matchit::Router as MatchitRouter;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Handler chain stored per route
pub type Chain = Arc<[BoxedMiddleware]>;

/// What was registered, for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    pub method: HttpMethod,
    pub path: String,
    pub handlers: usize,
}

/// Convert an Express-style path into matchit syntax
///
/// `:id` becomes `{id}`, `*rest` becomes `{*rest}`, literal braces are
/// escaped and the empty path becomes `/`.
pub fn to_matchit_pattern(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    path.split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':').filter(|name| !name.is_empty()) {
                format!("{{{}}}", name)
            } else if let Some(name) = segment.strip_prefix('*') {
                let name = if name.is_empty() { "wildcard" } else { name };
                format!("{{*{}}}", name)
            } else {
                segment.replace('{', "{{").replace('}', "}}")
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// HTTP router with one matchit table per verb
pub struct Router {
    tables: HashMap<HttpMethod, MatchitRouter<Chain>>,
    routes: Vec<RouteSummary>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            routes: Vec::new(),
        }
    }

    /// Registered routes in registration order
    pub fn routes(&self) -> &[RouteSummary] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn lookup(&self, method: HttpMethod, path: &str) -> Option<(Chain, HashMap<String, String>)> {
        let matched = self.tables.get(&method)?.at(path).ok()?;
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Some((matched.value.clone(), params))
    }

    /// Match a request and return the handler chain with extracted params
    ///
    /// Tries the request verb first, then `GET` for `HEAD` requests, then
    /// routes registered for every verb.
    pub fn match_route(
        &self,
        method: &str,
        path: &str,
    ) -> Option<(Chain, HashMap<String, String>)> {
        let verb = method.parse::<HttpMethod>().ok();

        verb.and_then(|verb| self.lookup(verb, path))
            .or_else(|| match verb {
                Some(HttpMethod::Head) => self.lookup(HttpMethod::Get, path),
                _ => None,
            })
            .or_else(|| self.lookup(HttpMethod::All, path))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteRegistrar for Router {
    fn register(
        &mut self,
        method: HttpMethod,
        path: &str,
        handlers: Vec<BoxedMiddleware>,
    ) -> Result<(), FrameworkError> {
        let pattern = to_matchit_pattern(path);
        let count = handlers.len();

        self.tables
            .entry(method)
            .or_default()
            .insert(pattern, Chain::from(handlers))
            .map_err(|err| FrameworkError::RouteConflict {
                method: method.to_string(),
                path: path.to_string(),
                reason: err.to_string(),
            })?;

        self.routes.push(RouteSummary {
            method,
            path: path.to_string(),
            handlers: count,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{from_fn, into_boxed, Next};
    use crate::Context;
    use serde_json::json;

    fn reply(label: &'static str) -> Vec<BoxedMiddleware> {
        vec![into_boxed(from_fn(move |_ctx: Context, _next: Next| async move {
            Ok(Some(json!(label)))
        }))]
    }

    async fn run(chain: Chain) -> serde_json::Value {
        Next::new(chain)
            .run(Context::builder().build())
            .await
            .unwrap()
            .unwrap()
    }

    #[test]
    fn patterns() {
        assert_eq!(to_matchit_pattern(""), "/");
        assert_eq!(to_matchit_pattern("/users/:id"), "/users/{id}");
        assert_eq!(to_matchit_pattern("/files/*path"), "/files/{*path}");
        assert_eq!(to_matchit_pattern("/a:b"), "/a:b");
        assert_eq!(to_matchit_pattern("/raw/{x}"), "/raw/{{x}}");
    }

    #[tokio::test]
    async fn matches_by_verb_and_extracts_params() {
        let mut router = Router::new();
        router.get("/users/:id", reply("show")).unwrap();
        router.put("/users/:id", reply("update")).unwrap();

        let (chain, params) = router.match_route("GET", "/users/7").unwrap();
        assert_eq!(run(chain).await, json!("show"));
        assert_eq!(params.get("id").map(String::as_str), Some("7"));

        let (chain, _) = router.match_route("put", "/users/7").unwrap();
        assert_eq!(run(chain).await, json!("update"));

        assert!(router.match_route("DELETE", "/users/7").is_none());
        assert!(router.match_route("GET", "/posts").is_none());
    }

    #[tokio::test]
    async fn head_falls_back_to_get_and_all_matches_anything() {
        let mut router = Router::new();
        router.get("/status", reply("get")).unwrap();
        router.all("/any", reply("all")).unwrap();

        let (chain, _) = router.match_route("HEAD", "/status").unwrap();
        assert_eq!(run(chain).await, json!("get"));

        let (chain, _) = router.match_route("PATCH", "/any").unwrap();
        assert_eq!(run(chain).await, json!("all"));
    }

    #[test]
    fn conflicting_registration_is_an_error() {
        let mut router = Router::new();
        router.get("/users/:id", reply("a")).unwrap();

        let err = router.get("/users/:id", reply("b")).unwrap_err();
        assert!(matches!(err, FrameworkError::RouteConflict { .. }));
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn summaries_keep_registration_order() {
        let mut router = Router::new();
        router.post("/users", reply("store")).unwrap();
        router.get("", reply("home")).unwrap();

        assert_eq!(
            router.routes(),
            &[
                RouteSummary { method: HttpMethod::Post, path: "/users".into(), handlers: 1 },
                RouteSummary { method: HttpMethod::Get, path: "".into(), handlers: 1 },
            ]
        );
    }
}
