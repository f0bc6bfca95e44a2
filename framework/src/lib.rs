pub mod binding;
pub mod config;
pub mod container;
pub mod controller;
pub mod error;
pub mod http;
pub mod logging;
pub mod metadata;
pub mod middleware;
pub mod routing;
pub mod server;
pub mod testing;

pub use binding::{bind_registered, bind_routes, resolve_arguments, RouteHandler, ViewDescriptor};
pub use config::{AppConfig, Config, Environment, RoutingConfig, ServerConfig};
pub use container::{Container, InstanceFactory};
pub use controller::{
    definition, extract, is_truthy, Arguments, Controller, ControllerBuilder, ControllerDefinition,
    ControllerId, HttpMethod, Injected, Instance, IntoReply, Json, MethodBuilder, MiddlewarePolicy,
    RouteRecord,
};
pub use error::{AppError, FrameworkError, HttpError};
pub use http::{Context, HttpResponse, UploadedFile};
pub use middleware::{from_fn, BoxedMiddleware, HandlerResult, Middleware, Next};
pub use routing::{RouteRegistrar, Router};
pub use server::Server;

pub use async_trait::async_trait;
#[doc(hidden)]
pub use inventory;
