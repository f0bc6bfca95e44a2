//! Controllers and their finalized route definitions
//!
//! A controller is a plain struct implementing [`Controller`]. Its `routes`
//! function declares everything the binder needs: verbs, paths, middleware,
//! argument injection, views and response overrides. The first call to
//! [`definition`] finalizes those declarations and caches the result for the
//! lifetime of the process.
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis::{Arguments, Controller, ControllerBuilder, FrameworkError};
//!
//! #[derive(Default)]
//! pub struct ProfileController;
//!
//! impl ProfileController {
//!     async fn show(self: Arc<Self>, args: Arguments) -> Result<Value, FrameworkError> {
//!         let ctx = args.context(0)?;
//!         Ok(json!({ "id": 1, "path": ctx.path() }))
//!     }
//! }
//!
//! impl Controller for ProfileController {
//!     const PREFIX: &'static str = "/profile";
//!
//!     fn routes(c: &mut ControllerBuilder<Self>) {
//!         c.get("", "show", Self::show).ctx();
//!     }
//! }
//!
//! trellis::register_controller!(ProfileController);
//! ```

mod builder;
mod params;
mod registry;
mod reply;
mod route;

pub use builder::{ControllerBuilder, MethodBuilder};
pub use params::{extract, Arguments, ExtractFn, Injected, ParamExtractor};
pub use registry::{registered, ControllerEntry};
pub use reply::{is_truthy, IntoReply, Json};
pub use route::{Action, HttpMethod, MiddlewarePolicy, ResponseHandler, RouteRecord};

use crate::config::Config;
use crate::error::FrameworkError;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock, RwLock};

/// Type-erased controller instance handed to captured actions
pub type Instance = Arc<dyn Any + Send + Sync>;

/// A routable controller
pub trait Controller: Default + Send + Sync + 'static {
    /// Prefix prepended verbatim to every route path
    const PREFIX: &'static str = "";

    /// Declare routes and their metadata
    fn routes(controller: &mut ControllerBuilder<Self>);
}

/// Identity of a controller type
///
/// Compares by `TypeId`; the type name is carried for logs and errors.
#[derive(Clone, Copy)]
pub struct ControllerId {
    type_id: TypeId,
    name: &'static str,
}

impl ControllerId {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

impl PartialEq for ControllerId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ControllerId {}

impl Hash for ControllerId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ControllerId({})", self.name)
    }
}

pub(crate) fn construct<C: Controller>() -> Instance {
    Arc::new(C::default())
}

/// Finalized routes of one controller
pub struct ControllerDefinition {
    pub(crate) id: ControllerId,
    pub(crate) prefix: String,
    pub(crate) routes: Vec<Arc<RouteRecord>>,
    pub(crate) construct: fn() -> Instance,
}

impl ControllerDefinition {
    /// Run `C::routes` against a fresh builder, bypassing the cache
    pub fn finalize<C: Controller>(policy: MiddlewarePolicy) -> Result<Self, FrameworkError> {
        let mut builder = ControllerBuilder::<C>::new(C::PREFIX);
        builder.middleware_policy(policy);
        C::routes(&mut builder);
        builder.finish()
    }

    pub fn id(&self) -> ControllerId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn routes(&self) -> &[Arc<RouteRecord>] {
        &self.routes
    }

    /// Default-construct a fresh instance
    pub fn instantiate(&self) -> Instance {
        (self.construct)()
    }
}

impl fmt::Debug for ControllerDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerDefinition")
            .field("id", &self.id)
            .field("prefix", &self.prefix)
            .field("routes", &self.routes)
            .finish()
    }
}

type DefinitionCache = RwLock<HashMap<ControllerId, Arc<ControllerDefinition>>>;

static DEFINITIONS: OnceLock<DefinitionCache> = OnceLock::new();

fn definitions() -> &'static DefinitionCache {
    DEFINITIONS.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Finalized definition of `C`, built on first use and cached afterwards
///
/// The middleware policy defaults to the configured
/// `ROUTING_MIDDLEWARE_POLICY`; a controller may override it in `routes`.
pub fn definition<C: Controller>() -> Result<Arc<ControllerDefinition>, FrameworkError> {
    let id = ControllerId::of::<C>();

    if let Some(existing) = definitions()
        .read()
        .ok()
        .and_then(|cache| cache.get(&id).cloned())
    {
        return Ok(existing);
    }

    let policy = Config::current().routing.middleware_policy;
    let built = Arc::new(ControllerDefinition::finalize::<C>(policy)?);

    let mut cache = definitions()
        .write()
        .map_err(|_| FrameworkError::internal("controller cache poisoned"))?;
    Ok(cache.entry(id).or_insert(built).clone())
}
