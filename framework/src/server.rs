use crate::config::ServerConfig;
use crate::error::FrameworkError;
use crate::http::{collect_body, parse_body, Context, ContextBuilder, HttpResponse};
use crate::middleware::{into_boxed, BoxedMiddleware, Middleware, Next};
use crate::routing::Router;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

/// HTTP/1 server dispatching to a [`Router`]
pub struct Server {
    router: Arc<Router>,
    middleware: Vec<BoxedMiddleware>,
    host: String,
    port: u16,
    max_body_size: usize,
}

impl Server {
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
            middleware: Vec::new(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_body_size: 10 * 1024 * 1024,
        }
    }

    pub fn from_config(router: Router, config: &ServerConfig) -> Self {
        Self::new(router)
            .host(&config.host)
            .port(config.port)
            .max_body_size(config.max_body_size)
    }

    /// Add global middleware, run before every matched route's own chain
    ///
    /// ```rust,ignore
    /// Server::from_config(router, &config.server)
    ///     .middleware(RequestId)
    ///     .run()
    ///     .await?;
    /// ```
    pub fn middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middleware.push(into_boxed(middleware));
        self
    }

    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Bind `host:port` and serve until the listener fails
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let listener = TcpListener::bind((self.host.as_str(), self.port)).await?;
        self.serve(listener).await
    }

    /// Serve connections accepted from `listener`
    pub async fn serve(
        self,
        listener: TcpListener,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(
            address = %listener.local_addr()?,
            routes = self.router.len(),
            "server listening"
        );

        let router = self.router;
        let middleware: Arc<[BoxedMiddleware]> = self.middleware.into();
        let limit = self.max_body_size;

        loop {
            let (stream, peer) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let router = router.clone();
            let middleware = middleware.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: hyper::Request<Incoming>| {
                    let router = router.clone();
                    let middleware = middleware.clone();
                    async move {
                        Ok::<_, Infallible>(handle_request(&router, &middleware, limit, req).await)
                    }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::warn!(%peer, error = %err, "connection error");
                }
            });
        }
    }
}

async fn handle_request(
    router: &Router,
    middleware: &[BoxedMiddleware],
    limit: usize,
    req: hyper::Request<Incoming>,
) -> hyper::Response<Full<Bytes>> {
    let started = Instant::now();
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();

    let response = match read_request(req, limit).await {
        Ok(builder) => respond(router, middleware, &method, &path, builder).await,
        Err(err) => HttpResponse::from(err),
    };

    tracing::info!(
        %method,
        %path,
        status = response.status_code(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );

    response.into_hyper()
}

/// Read headers, query and body into a context builder
async fn read_request(
    req: hyper::Request<Incoming>,
    limit: usize,
) -> Result<ContextBuilder, FrameworkError> {
    let (parts, body) = req.into_parts();

    let headers: HashMap<String, String> = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    let bytes = collect_body(body, limit).await?;
    let content_type = headers.get("content-type").map(String::as_str);
    let (body, fields) = parse_body(content_type, &bytes)?;

    Ok(Context::builder()
        .query_map(parse_query(parts.uri.query()))
        .query_string(parts.uri.query())
        .headers(headers)
        .body(body)
        .fields(fields))
}

/// Decode a raw query string; malformed input yields an empty map
///
/// Query values are plain strings, so a repeated key keeps its last value:
/// `?tag=a&tag=b` reads as `tag = "b"`. Handlers that need every value can
/// read them with `ctx.request().query_all(key)`.
pub fn parse_query(raw: Option<&str>) -> HashMap<String, String> {
    raw.and_then(|query| serde_urlencoded::from_str::<Vec<(String, String)>>(query).ok())
        .map(|pairs| pairs.into_iter().collect())
        .unwrap_or_default()
}

/// Route an already-read request and build its response
///
/// Global middleware runs first, then the matched route's chain. The
/// response comes from whatever the chain wrote into the context; errors map
/// to their status code.
pub async fn respond(
    router: &Router,
    middleware: &[BoxedMiddleware],
    method: &str,
    path: &str,
    request: ContextBuilder,
) -> HttpResponse {
    let Some((chain, params)) = router.match_route(method, path) else {
        return HttpResponse::from(FrameworkError::NotFound {
            method: method.to_string(),
            path: path.to_string(),
        });
    };

    let ctx = request.method(method).path(path).params(params).build();
    let handlers: Vec<BoxedMiddleware> = middleware.iter().chain(chain.iter()).cloned().collect();

    match Next::new(handlers).run(ctx.clone()).await {
        Ok(_) => HttpResponse::from_context(&ctx),
        Err(err) => {
            if err.status_code() >= 500 {
                tracing::error!(%method, %path, error = %err, "handler failed");
            }
            HttpResponse::from(err)
        }
    }
}
