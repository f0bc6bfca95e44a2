//! Declarative route collection for a controller
//!
//! [`ControllerBuilder`] is what a controller's `routes` function writes into.
//! Every call adds metadata to the builder's [`MetadataRegistry`]; nothing is
//! joined until [`ControllerBuilder::finish`] turns the accumulated entries
//! into route records.
//!
//! # Example
//!
//! ```rust,ignore
//! impl Controller for UserController {
//!     const PREFIX: &'static str = "/users";
//!
//!     fn routes(c: &mut ControllerBuilder<Self>) {
//!         c.middleware(RequestLog);
//!
//!         c.get("", "index", Self::index).query_params();
//!         c.get("/:id", "show", Self::show).param("id");
//!         c.post("", "store", Self::store)
//!             .middleware(RequireToken)
//!             .body();
//!     }
//! }
//! ```

use super::params::{extract, Arguments, ExtractFn, ParamExtractor};
use super::reply::IntoReply;
use super::route::{Action, HttpMethod, MiddlewarePolicy, ResponseHandler, RouteRecord};
use super::{construct, Controller, ControllerDefinition, ControllerId, Instance};
use crate::error::FrameworkError;
use crate::http::Context;
use crate::metadata::{
    MetadataKey, MetadataRegistry, MiddlewareList, ParamList, RawRoute, ResponseOverride,
    RouteList, ViewPath,
};
use crate::middleware::{into_boxed, BoxFuture, BoxedMiddleware, HandlerResult, Middleware};
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Collects controller-level and method-level route metadata
pub struct ControllerBuilder<C> {
    id: ControllerId,
    prefix: String,
    policy: MiddlewarePolicy,
    metadata: MetadataRegistry,
    /// One per entry of the route list, in declaration order
    actions: Vec<Action>,
    _controller: PhantomData<fn() -> C>,
}

impl<C: Controller> ControllerBuilder<C> {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            id: ControllerId::of::<C>(),
            prefix: prefix.into(),
            policy: MiddlewarePolicy::default(),
            metadata: MetadataRegistry::new(),
            actions: Vec::new(),
            _controller: PhantomData,
        }
    }

    pub fn id(&self) -> ControllerId {
        self.id
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Metadata collected so far
    pub fn metadata(&self) -> &MetadataRegistry {
        &self.metadata
    }

    /// Choose how controller and method middleware combine for this controller
    pub fn middleware_policy(&mut self, policy: MiddlewarePolicy) -> &mut Self {
        self.policy = policy;
        self
    }

    /// Add middleware run before every route of the controller
    pub fn middleware<M: Middleware + 'static>(&mut self, middleware: M) -> &mut Self {
        self.middleware_boxed(into_boxed(middleware))
    }

    pub fn middleware_boxed(&mut self, middleware: BoxedMiddleware) -> &mut Self {
        let key = MetadataKey::controller(self.id);
        self.metadata
            .update::<MiddlewareList, _>(&key, |list| list.push(middleware));
        self
    }

    /// Declare a route to the controller method `name`
    ///
    /// `path` is appended to the controller prefix as-is; pass `""` to route
    /// the prefix itself. Declaring several routes for the same `name` is
    /// allowed; they share the method's metadata but each keeps the handler
    /// it was declared with.
    pub fn route<H, Fut, R>(
        &mut self,
        method: HttpMethod,
        path: &str,
        name: &'static str,
        handler: H,
    ) -> MethodBuilder<'_, C>
    where
        H: Fn(Arc<C>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, FrameworkError>> + Send + 'static,
        R: IntoReply,
    {
        let controller = self.id;
        let action: Action = Arc::new(
            move |instance: Instance, args: Arguments| -> BoxFuture<'static, HandlerResult> {
                let this = match instance.downcast::<C>() {
                    Ok(this) => this,
                    Err(_) => {
                        let err = FrameworkError::ControllerInstance {
                            controller: controller.name(),
                            reason: "instance factory returned another type".to_string(),
                        };
                        return Box::pin(async move { Err(err) });
                    }
                };
                let call = handler(this, args);
                Box::pin(async move { call.await?.into_reply() })
            },
        );
        self.actions.push(action);

        let raw = RawRoute {
            method,
            path: path.to_string(),
            name,
        };
        let key = MetadataKey::controller(self.id);
        self.metadata
            .update::<RouteList, _>(&key, |routes| routes.push(raw));

        self.method(name)
    }

    pub fn head<H, Fut, R>(&mut self, path: &str, name: &'static str, handler: H) -> MethodBuilder<'_, C>
    where
        H: Fn(Arc<C>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, FrameworkError>> + Send + 'static,
        R: IntoReply,
    {
        self.route(HttpMethod::Head, path, name, handler)
    }

    pub fn get<H, Fut, R>(&mut self, path: &str, name: &'static str, handler: H) -> MethodBuilder<'_, C>
    where
        H: Fn(Arc<C>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, FrameworkError>> + Send + 'static,
        R: IntoReply,
    {
        self.route(HttpMethod::Get, path, name, handler)
    }

    pub fn post<H, Fut, R>(&mut self, path: &str, name: &'static str, handler: H) -> MethodBuilder<'_, C>
    where
        H: Fn(Arc<C>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, FrameworkError>> + Send + 'static,
        R: IntoReply,
    {
        self.route(HttpMethod::Post, path, name, handler)
    }

    pub fn put<H, Fut, R>(&mut self, path: &str, name: &'static str, handler: H) -> MethodBuilder<'_, C>
    where
        H: Fn(Arc<C>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, FrameworkError>> + Send + 'static,
        R: IntoReply,
    {
        self.route(HttpMethod::Put, path, name, handler)
    }

    pub fn delete<H, Fut, R>(&mut self, path: &str, name: &'static str, handler: H) -> MethodBuilder<'_, C>
    where
        H: Fn(Arc<C>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, FrameworkError>> + Send + 'static,
        R: IntoReply,
    {
        self.route(HttpMethod::Delete, path, name, handler)
    }

    pub fn options<H, Fut, R>(&mut self, path: &str, name: &'static str, handler: H) -> MethodBuilder<'_, C>
    where
        H: Fn(Arc<C>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, FrameworkError>> + Send + 'static,
        R: IntoReply,
    {
        self.route(HttpMethod::Options, path, name, handler)
    }

    pub fn all<H, Fut, R>(&mut self, path: &str, name: &'static str, handler: H) -> MethodBuilder<'_, C>
    where
        H: Fn(Arc<C>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, FrameworkError>> + Send + 'static,
        R: IntoReply,
    {
        self.route(HttpMethod::All, path, name, handler)
    }

    /// Attach metadata to method `name` without declaring a route
    pub fn method(&mut self, name: &'static str) -> MethodBuilder<'_, C> {
        MethodBuilder {
            builder: self,
            name,
        }
    }

    /// Join every raw route with its method metadata
    ///
    /// Fails when a method's parameter indices are not exactly `0..n`.
    pub fn finish(self) -> Result<ControllerDefinition, FrameworkError> {
        let class_key = MetadataKey::controller(self.id);
        let class_middleware = self.metadata.list::<MiddlewareList, _>(&class_key);

        let mut routes = Vec::new();
        for (position, raw) in self
            .metadata
            .list::<RouteList, _>(&class_key)
            .iter()
            .enumerate()
        {
            let key = MetadataKey::method(self.id, raw.name);

            let params = self.metadata.list::<ParamList, _>(&key).to_vec();
            check_dense(self.id, raw.name, &params)?;

            let action = self.actions.get(position).cloned().ok_or_else(|| {
                FrameworkError::internal(format!(
                    "{}::{} has a route but no handler",
                    self.id.name(),
                    raw.name
                ))
            })?;

            routes.push(Arc::new(RouteRecord {
                method: raw.method,
                path: raw.path.clone(),
                url: format!("{}{}", self.prefix, raw.path),
                middleware: self
                    .policy
                    .merge(class_middleware, self.metadata.list::<MiddlewareList, _>(&key)),
                name: raw.name,
                params,
                view: self.metadata.get::<ViewPath>(&key).cloned(),
                response: self.metadata.get::<ResponseOverride>(&key).cloned(),
                action,
            }));
        }

        tracing::debug!(
            controller = self.id.name(),
            prefix = %self.prefix,
            routes = routes.len(),
            "controller finalized"
        );

        Ok(ControllerDefinition {
            id: self.id,
            prefix: self.prefix,
            routes,
            construct: construct::<C>,
        })
    }
}

fn check_dense(
    controller: ControllerId,
    method: &'static str,
    params: &[ParamExtractor],
) -> Result<(), FrameworkError> {
    let invalid = |reason: String| FrameworkError::InvalidParameters {
        controller: controller.name(),
        method,
        reason,
    };

    let mut seen = vec![false; params.len()];
    for param in params {
        match seen.get_mut(param.index) {
            Some(slot) if !*slot => *slot = true,
            Some(_) => return Err(invalid(format!("index {} declared twice", param.index))),
            None => {
                return Err(invalid(format!(
                    "index {} leaves a gap, only {} parameter(s) declared",
                    param.index,
                    params.len()
                )))
            }
        }
    }
    Ok(())
}

/// Method-scoped view of a [`ControllerBuilder`]
pub struct MethodBuilder<'a, C> {
    builder: &'a mut ControllerBuilder<C>,
    name: &'static str,
}

impl<C: Controller> MethodBuilder<'_, C> {
    fn key(&self) -> MetadataKey {
        MetadataKey::method(self.builder.id, self.name)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Add middleware run before this method only
    pub fn middleware<M: Middleware + 'static>(self, middleware: M) -> Self {
        let key = self.key();
        let middleware = into_boxed(middleware);
        self.builder
            .metadata
            .update::<MiddlewareList, _>(&key, |list| list.push(middleware));
        self
    }

    /// Inject the next argument with `extract`
    pub fn inject(self, extract: ExtractFn) -> Self {
        let index = self.builder.metadata.list::<ParamList, _>(&self.key()).len();
        self.inject_at(index, extract)
    }

    /// Inject the argument at `index` with `extract`
    ///
    /// Indices may be declared in any order; they are resolved in ascending
    /// order and must end up covering `0..n`.
    pub fn inject_at(self, index: usize, extract: ExtractFn) -> Self {
        let key = self.key();
        let param = ParamExtractor::new(index, self.name, extract);
        self.builder
            .metadata
            .update::<ParamList, _>(&key, |params| params.push(param));
        self
    }

    /// Inject the request context
    pub fn ctx(self) -> Self {
        self.inject(extract::context())
    }

    /// Inject the parsed request body
    pub fn body(self) -> Self {
        self.inject(extract::body())
    }

    /// Inject the parsed form fields
    pub fn fields(self) -> Self {
        self.inject(extract::fields())
    }

    /// Inject the first uploaded file (or the empty collection)
    pub fn file(self) -> Self {
        self.inject(extract::file())
    }

    /// Inject every uploaded file
    pub fn files(self) -> Self {
        self.inject(extract::files())
    }

    /// Inject one query value
    pub fn query_param(self, key: &str) -> Self {
        self.inject(extract::query_param(Some(key)))
    }

    /// Inject the whole query map
    pub fn query_params(self) -> Self {
        self.inject(extract::query_params())
    }

    /// Inject one path parameter
    pub fn param(self, key: &str) -> Self {
        self.inject(extract::path_param(Some(key)))
    }

    /// Inject the whole path parameter map
    pub fn params(self) -> Self {
        self.inject(extract::path_params())
    }

    /// Hand this route to an external renderer instead of the router
    pub fn view(self, path: impl Into<String>) -> Self {
        let key = self.key();
        self.builder.metadata.define::<ViewPath>(&key, path.into());
        self
    }

    /// Replace the default body assignment with a custom response writer
    ///
    /// The writer receives the context and the awaited method result and is
    /// solely responsible for the response.
    pub fn response<F, Fut>(self, respond: F) -> Self
    where
        F: Fn(Context, Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), FrameworkError>> + Send + 'static,
    {
        let key = self.key();
        let handler: ResponseHandler = Arc::new(
            move |ctx: Context,
                  result: Option<Value>|
                  -> BoxFuture<'static, Result<(), FrameworkError>> {
                Box::pin(respond(ctx, result))
            },
        );
        self.builder
            .metadata
            .define::<ResponseOverride>(&key, handler);
        self
    }
}
