//! Turning finalized controller definitions into router registrations
//!
//! ```rust,ignore
//! use trellis::{bind_routes, definition, Router};
//!
//! let mut router = Router::new();
//! let views = bind_routes(
//!     &mut router,
//!     &[definition::<ProfileController>()?, definition::<PageController>()?],
//!     None,
//! )?;
//! ```

mod arguments;
mod view;

pub use arguments::resolve_arguments;
pub use view::ViewDescriptor;

use crate::container::InstanceFactory;
use crate::controller::{is_truthy, registered, ControllerDefinition, RouteRecord};
use crate::error::FrameworkError;
use crate::http::Context;
use crate::middleware::{BoxedMiddleware, HandlerResult, Middleware, Next};
use crate::routing::RouteRegistrar;
use async_trait::async_trait;
use std::sync::Arc;

/// Final link of a bound route's chain: runs the controller method
pub struct RouteHandler {
    controller: Arc<ControllerDefinition>,
    route: Arc<RouteRecord>,
    factory: Option<Arc<dyn InstanceFactory>>,
}

impl RouteHandler {
    pub fn new(
        controller: Arc<ControllerDefinition>,
        route: Arc<RouteRecord>,
        factory: Option<Arc<dyn InstanceFactory>>,
    ) -> Self {
        Self {
            controller,
            route,
            factory,
        }
    }

    pub fn route(&self) -> &RouteRecord {
        &self.route
    }
}

#[async_trait]
impl Middleware for RouteHandler {
    async fn handle(&self, ctx: Context, next: Next) -> HandlerResult {
        let instance = match &self.factory {
            Some(factory) => factory.instantiate(&self.controller)?,
            None => self.controller.instantiate(),
        };

        let args = resolve_arguments(&self.route.params, &ctx, &next);
        tracing::trace!(
            controller = self.controller.id().short_name(),
            action = self.route.name,
            args = args.len(),
            "invoking controller"
        );
        let result = self.route.call(instance, args).await?;

        match &self.route.response {
            Some(respond) => respond(ctx.clone(), result.clone()).await?,
            None => {
                if let Some(body) = result.as_ref().filter(|value| is_truthy(value)) {
                    ctx.set_body(body.clone());
                }
            }
        }

        Ok(result)
    }
}

/// Register every non-view route of `controllers` on `router`
///
/// Each registration carries the route's merged middleware followed by its
/// [`RouteHandler`]. View routes are skipped and returned as
/// [`ViewDescriptor`]s instead. Without a `factory` every request gets a
/// default-constructed controller.
pub fn bind_routes<R: RouteRegistrar + ?Sized>(
    router: &mut R,
    controllers: &[Arc<ControllerDefinition>],
    factory: Option<Arc<dyn InstanceFactory>>,
) -> Result<Vec<ViewDescriptor>, FrameworkError> {
    let mut views = Vec::new();
    let mut bound = 0usize;

    for controller in controllers {
        for route in controller.routes() {
            let handler: BoxedMiddleware = Arc::new(RouteHandler::new(
                controller.clone(),
                route.clone(),
                factory.clone(),
            ));

            if let Some(component) = &route.view {
                views.push(ViewDescriptor {
                    component: component.clone(),
                    path: route.url.clone(),
                    method: route.method,
                    name: route.name,
                    middleware: route.middleware.clone(),
                    handler,
                });
                continue;
            }

            let mut chain = route.middleware.clone();
            chain.push(handler);
            router.register(route.method, &route.url, chain)?;
            bound += 1;

            tracing::debug!(
                method = %route.method,
                path = %route.url,
                controller = controller.id().short_name(),
                action = route.name,
                "route bound"
            );
        }
    }

    tracing::info!(
        controllers = controllers.len(),
        routes = bound,
        views = views.len(),
        "controllers bound"
    );

    Ok(views)
}

/// [`bind_routes`] over every controller registered with
/// [`register_controller!`](crate::register_controller)
pub fn bind_registered<R: RouteRegistrar + ?Sized>(
    router: &mut R,
    factory: Option<Arc<dyn InstanceFactory>>,
) -> Result<Vec<ViewDescriptor>, FrameworkError> {
    bind_routes(router, &registered()?, factory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use crate::controller::{
        definition, Arguments, Controller, ControllerBuilder, ControllerDefinition, HttpMethod,
        Injected, Instance, MiddlewarePolicy,
    };
    use crate::http::UploadedFile;
    use crate::middleware::{from_fn, into_boxed};
    use crate::testing::RecordingRouter;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct ProfileController;

    impl ProfileController {
        async fn show(self: Arc<Self>, args: Arguments) -> Result<Value, FrameworkError> {
            assert_eq!(args.len(), 1);
            args.context(0)?;
            Ok(json!({"id": 1}))
        }
    }

    impl Controller for ProfileController {
        const PREFIX: &'static str = "/profile";

        fn routes(c: &mut ControllerBuilder<Self>) {
            c.get("", "show", Self::show).ctx();
        }
    }

    #[tokio::test]
    async fn profile_scenario() {
        let mut router = RecordingRouter::new();
        let views = bind_routes(&mut router, &[definition::<ProfileController>().unwrap()], None)
            .unwrap();

        assert!(views.is_empty());
        assert_eq!(router.routes(), vec![(HttpMethod::Get, "/profile")]);

        let ctx = Context::builder().build();
        let result = router
            .invoke(HttpMethod::Get, "/profile", ctx.clone())
            .await
            .unwrap();

        assert_eq!(result, Some(json!({"id": 1})));
        assert_eq!(ctx.body(), Some(json!({"id": 1})));
    }

    /// Echoes its resolved arguments so tests can inspect them
    #[derive(Default)]
    struct Echo;

    impl Echo {
        async fn echo(self: Arc<Self>, args: Arguments) -> Result<Value, FrameworkError> {
            let values = args
                .into_vec()
                .into_iter()
                .map(|arg| match arg {
                    Injected::Value(v) => v,
                    Injected::File(f) => json!({"file": f.filename}),
                    Injected::Files(fs) => json!(fs.len()),
                    Injected::Context(_) => json!("ctx"),
                    Injected::Next(_) => json!("next"),
                    Injected::Missing => Value::Null,
                })
                .collect();
            Ok(Value::Array(values))
        }

        async fn nothing(self: Arc<Self>, _args: Arguments) -> Result<Value, FrameworkError> {
            Ok(json!(0))
        }

        async fn fail(self: Arc<Self>, _args: Arguments) -> Result<Value, FrameworkError> {
            Err(FrameworkError::domain("teapot", 418))
        }
    }

    impl Controller for Echo {
        const PREFIX: &'static str = "/echo";

        fn routes(c: &mut ControllerBuilder<Self>) {
            c.post("/query", "query", Self::echo)
                .query_param("id")
                .query_param("name");
            c.get("/default", "default", Self::echo);
            c.post("/file", "file", Self::echo).file();
            c.get("/falsy", "falsy", Self::nothing);
            c.get("/fail", "fail", Self::fail);
            c.get("/custom", "custom", Self::echo)
                .query_params()
                .response(|ctx: Context, result: Option<Value>| async move {
                    ctx.set_status(202);
                    ctx.set_state("seen", result.unwrap_or(Value::Null));
                    Ok(())
                });
            c.get("/page", "page", Self::echo).view("views/echo");
        }
    }

    async fn echo_router() -> RecordingRouter {
        let mut router = RecordingRouter::new();
        bind_routes(&mut router, &[definition::<Echo>().unwrap()], None).unwrap();
        router
    }

    #[tokio::test]
    async fn query_parameters_are_positional() {
        let router = echo_router().await;
        let ctx = Context::builder().query("id", "5").query("name", "x").build();

        router
            .invoke(HttpMethod::Post, "/echo/query", ctx.clone())
            .await
            .unwrap();
        assert_eq!(ctx.body(), Some(json!(["5", "x"])));
    }

    #[tokio::test]
    async fn undeclared_parameters_receive_context_and_next() {
        let router = echo_router().await;
        let ctx = Context::builder().build();

        router
            .invoke(HttpMethod::Get, "/echo/default", ctx.clone())
            .await
            .unwrap();
        assert_eq!(ctx.body(), Some(json!(["ctx", "next"])));
    }

    #[tokio::test]
    async fn file_parameter_is_single_or_empty_collection() {
        let router = echo_router().await;

        let empty = Context::builder().build();
        router.invoke(HttpMethod::Post, "/echo/file", empty.clone()).await.unwrap();
        assert_eq!(empty.body(), Some(json!([0])));

        let one = Context::builder()
            .file(UploadedFile::new("avatar", "me.png", 10))
            .build();
        router.invoke(HttpMethod::Post, "/echo/file", one.clone()).await.unwrap();
        assert_eq!(one.body(), Some(json!([{"file": "me.png"}])));
    }

    #[tokio::test]
    async fn falsy_results_leave_the_body_alone() {
        let router = echo_router().await;
        let ctx = Context::builder().build();

        let result = router
            .invoke(HttpMethod::Get, "/echo/falsy", ctx.clone())
            .await
            .unwrap();
        assert_eq!(result, Some(json!(0)));
        assert_eq!(ctx.body(), None);
    }

    #[tokio::test]
    async fn response_override_replaces_body_assignment() {
        let router = echo_router().await;
        let ctx = Context::builder().query("q", "rust").build();

        let result = router
            .invoke(HttpMethod::Get, "/echo/custom", ctx.clone())
            .await
            .unwrap();

        assert_eq!(result, Some(json!([{"q": "rust"}])));
        assert_eq!(ctx.body(), None);
        assert_eq!(ctx.status(), Some(202));
        assert_eq!(ctx.state("seen"), Some(json!([{"q": "rust"}])));
    }

    #[tokio::test]
    async fn method_errors_propagate() {
        let router = echo_router().await;
        let err = router
            .invoke(HttpMethod::Get, "/echo/fail", Context::builder().build())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 418);
    }

    #[tokio::test]
    async fn view_routes_are_returned_not_registered() {
        let mut router = RecordingRouter::new();
        let views = bind_routes(&mut router, &[definition::<Echo>().unwrap()], None).unwrap();

        assert!(router.find(HttpMethod::Get, "/echo/page").is_none());
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].component, "views/echo");
        assert_eq!(views[0].path, "/echo/page");
        assert_eq!(views[0].name, "page");

        let ctx = Context::builder().build();
        views[0].invoke(ctx.clone()).await.unwrap();
        assert_eq!(ctx.body(), Some(json!(["ctx", "next"])));
    }

    #[tokio::test]
    async fn binding_twice_yields_independent_routers() {
        let def = definition::<Echo>().unwrap();
        let mut first = RecordingRouter::new();
        let mut second = RecordingRouter::new();

        bind_routes(&mut first, &[def.clone()], None).unwrap();
        bind_routes(&mut second, &[def], None).unwrap();

        assert_eq!(first.routes(), second.routes());
        assert_eq!(first.registrations().len(), 6);

        let a = &first.registrations()[0].handlers;
        let b = &second.registrations()[0].handlers;
        assert!(!Arc::ptr_eq(a.last().unwrap(), b.last().unwrap()));
    }

    fn tag(log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> BoxedMiddleware {
        let log = log.clone();
        into_boxed(from_fn(move |ctx: Context, next: Next| {
            log.lock().unwrap().push(label);
            next.run(ctx)
        }))
    }

    #[derive(Default)]
    struct Guarded;

    impl Guarded {
        async fn open(self: Arc<Self>, _args: Arguments) -> Result<(), FrameworkError> {
            Ok(())
        }
    }

    impl Controller for Guarded {
        fn routes(c: &mut ControllerBuilder<Self>) {
            c.get("/open", "open", Self::open);
        }
    }

    fn guarded(
        policy: MiddlewarePolicy,
        log: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Arc<ControllerDefinition> {
        let mut builder = ControllerBuilder::<Guarded>::new("/guarded");
        builder.middleware_policy(policy);
        builder.middleware_boxed(tag(log, "class-1"));
        builder.middleware_boxed(tag(log, "class-2"));
        builder.get("/open", "open", Guarded::open);
        let log = log.clone();
        builder
            .method("open")
            .middleware(from_fn(move |ctx: Context, next: Next| {
                log.lock().unwrap().push("method");
                next.run(ctx)
            }));
        Arc::new(builder.finish().unwrap())
    }

    #[tokio::test]
    async fn middleware_runs_class_then_method_then_handler() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut router = RecordingRouter::new();
        bind_routes(&mut router, &[guarded(MiddlewarePolicy::Concatenate, &log)], None).unwrap();

        let registration = router.find(HttpMethod::Get, "/guarded/open").unwrap();
        assert_eq!(registration.handlers.len(), 4);

        router
            .invoke(HttpMethod::Get, "/guarded/open", Context::builder().build())
            .await
            .unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["class-1", "class-2", "method"]);
    }

    #[tokio::test]
    async fn override_mode_drops_class_middleware() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut router = RecordingRouter::new();
        bind_routes(&mut router, &[guarded(MiddlewarePolicy::Override, &log)], None).unwrap();

        router
            .invoke(HttpMethod::Get, "/guarded/open", Context::builder().build())
            .await
            .unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["method"]);
    }

    #[derive(Default)]
    struct Visits {
        count: AtomicUsize,
    }

    impl Visits {
        async fn hit(self: Arc<Self>, _args: Arguments) -> Result<Value, FrameworkError> {
            Ok(json!(self.count.fetch_add(1, Ordering::SeqCst) + 1))
        }
    }

    impl Controller for Visits {
        const PREFIX: &'static str = "/visits";

        fn routes(c: &mut ControllerBuilder<Self>) {
            c.post("", "hit", Self::hit);
        }
    }

    #[tokio::test]
    async fn instances_are_per_request_without_a_factory() {
        let mut router = RecordingRouter::new();
        bind_routes(&mut router, &[definition::<Visits>().unwrap()], None).unwrap();

        for _ in 0..2 {
            let result = router
                .invoke(HttpMethod::Post, "/visits", Context::builder().build())
                .await
                .unwrap();
            assert_eq!(result, Some(json!(1)));
        }
    }

    #[tokio::test]
    async fn factory_supplies_instances() {
        let mut container = Container::new();
        container.singleton(Visits::default());

        let mut router = RecordingRouter::new();
        bind_routes(
            &mut router,
            &[definition::<Visits>().unwrap()],
            Some(container.shared()),
        )
        .unwrap();

        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(
                router
                    .invoke(HttpMethod::Post, "/visits", Context::builder().build())
                    .await
                    .unwrap(),
            );
        }
        assert_eq!(seen, vec![Some(json!(1)), Some(json!(2)), Some(json!(3))]);
    }

    #[tokio::test]
    async fn factory_errors_propagate() {
        let failing: Arc<dyn InstanceFactory> =
            Arc::new(|def: &ControllerDefinition| -> Result<Instance, FrameworkError> {
                Err(FrameworkError::ControllerInstance {
                    controller: def.name(),
                    reason: "database offline".to_string(),
                })
            });

        let mut router = RecordingRouter::new();
        bind_routes(&mut router, &[definition::<Visits>().unwrap()], Some(failing)).unwrap();

        let err = router
            .invoke(HttpMethod::Post, "/visits", Context::builder().build())
            .await
            .unwrap_err();
        assert!(matches!(err, FrameworkError::ControllerInstance { .. }));
    }

    #[derive(Default)]
    struct Vault;

    impl Vault {
        async fn secret(self: Arc<Self>, _args: Arguments) -> Result<Value, FrameworkError> {
            Ok(json!({"secret": "data"}))
        }
    }

    impl Controller for Vault {
        const PREFIX: &'static str = "/vault";

        fn routes(c: &mut ControllerBuilder<Self>) {
            c.middleware(from_fn(|ctx: Context, next: Next| async move {
                if ctx.header("Authorization").is_none() {
                    return Err(FrameworkError::domain("denied", 401));
                }
                next.run(ctx).await
            }));
            c.get("/page", "page", Self::secret).view("Secret");
        }
    }

    #[tokio::test]
    async fn views_keep_their_middleware() {
        let mut router = RecordingRouter::new();
        let views = bind_routes(&mut router, &[definition::<Vault>().unwrap()], None).unwrap();
        assert_eq!(views[0].middleware.len(), 1);

        let anonymous = Context::builder().build();
        let err = views[0].invoke(anonymous.clone()).await.unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert_eq!(anonymous.body(), None);

        let signed = Context::builder().header("Authorization", "Bearer t").build();
        let result = views[0].invoke(signed).await.unwrap();
        assert_eq!(result, Some(json!({"secret": "data"})));
    }

    #[test]
    fn router_conflicts_surface() {
        let mut router = crate::Router::new();
        let def = definition::<ProfileController>().unwrap();

        bind_routes(&mut router, &[def.clone()], None).unwrap();
        let err = bind_routes(&mut router, &[def], None).unwrap_err();
        assert!(matches!(err, FrameworkError::RouteConflict { .. }));
    }
}
