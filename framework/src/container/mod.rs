//! Controller instance provisioning
//!
//! The binder asks an [`InstanceFactory`] for a controller instance on every
//! request. [`Container`] is the stock factory: controllers bound as
//! singletons are shared, controllers bound to a factory closure are built per
//! request, and anything unbound is default-constructed.
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis::Container;
//!
//! let mut container = Container::new();
//! container.singleton(UserController::new(store));
//! container.factory(|| AuditController::new(Clock::system()));
//!
//! let views = trellis::bind_registered(&mut router, Some(container.shared()))?;
//! ```

use crate::controller::{ControllerDefinition, Instance};
use crate::error::FrameworkError;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Source of controller instances for the binder
pub trait InstanceFactory: Send + Sync {
    fn instantiate(&self, controller: &ControllerDefinition) -> Result<Instance, FrameworkError>;
}

impl<F> InstanceFactory for F
where
    F: Fn(&ControllerDefinition) -> Result<Instance, FrameworkError> + Send + Sync,
{
    fn instantiate(&self, controller: &ControllerDefinition) -> Result<Instance, FrameworkError> {
        self(controller)
    }
}

/// Binding types: either a singleton instance or a factory closure
#[derive(Clone)]
enum Binding {
    /// Same instance for every request
    Singleton(Instance),

    /// New instance per request
    Factory(Arc<dyn Fn() -> Instance + Send + Sync>),
}

/// Type-keyed controller bindings
#[derive(Clone, Default)]
pub struct Container {
    bindings: HashMap<TypeId, Binding>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share `instance` across all requests
    pub fn singleton<C: Any + Send + Sync>(&mut self, instance: C) -> &mut Self {
        self.bindings
            .insert(TypeId::of::<C>(), Binding::Singleton(Arc::new(instance)));
        self
    }

    /// Build a new instance with `factory` for each request
    pub fn factory<C, F>(&mut self, factory: F) -> &mut Self
    where
        C: Any + Send + Sync,
        F: Fn() -> C + Send + Sync + 'static,
    {
        let wrapped: Arc<dyn Fn() -> Instance + Send + Sync> =
            Arc::new(move || Arc::new(factory()) as Instance);
        self.bindings
            .insert(TypeId::of::<C>(), Binding::Factory(wrapped));
        self
    }

    /// Check whether `C` is bound
    pub fn has<C: Any>(&self) -> bool {
        self.bindings.contains_key(&TypeId::of::<C>())
    }

    /// Freeze into a shareable factory
    pub fn shared(self) -> Arc<dyn InstanceFactory> {
        Arc::new(self)
    }
}

impl InstanceFactory for Container {
    fn instantiate(&self, controller: &ControllerDefinition) -> Result<Instance, FrameworkError> {
        Ok(match self.bindings.get(&controller.id().type_id()) {
            Some(Binding::Singleton(instance)) => instance.clone(),
            Some(Binding::Factory(factory)) => factory(),
            None => controller.instantiate(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ControllerBuilder, MiddlewarePolicy};
    use crate::Controller;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        start: usize,
    }

    impl Controller for Counter {
        fn routes(_: &mut ControllerBuilder<Self>) {}
    }

    fn counter() -> ControllerDefinition {
        ControllerDefinition::finalize::<Counter>(MiddlewarePolicy::default()).unwrap()
    }

    fn start(instance: &Instance) -> usize {
        instance.downcast_ref::<Counter>().unwrap().start
    }

    #[test]
    fn unbound_controllers_are_default_constructed() {
        let container = Container::new();
        let a = container.instantiate(&counter()).unwrap();
        let b = container.instantiate(&counter()).unwrap();

        assert_eq!(start(&a), 0);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn singletons_are_shared() {
        let mut container = Container::new();
        container.singleton(Counter { start: 10 });
        assert!(container.has::<Counter>());

        let a = container.instantiate(&counter()).unwrap();
        let b = container.instantiate(&counter()).unwrap();
        assert_eq!(start(&a), 10);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn factories_run_per_resolution() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();

        let mut container = Container::new();
        container.factory(move || Counter {
            start: seen.fetch_add(1, Ordering::SeqCst),
        });

        let a = container.instantiate(&counter()).unwrap();
        let b = container.instantiate(&counter()).unwrap();
        assert_eq!((start(&a), start(&b)), (0, 1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn closures_are_factories() {
        let factory = |_: &ControllerDefinition| -> Result<Instance, FrameworkError> {
            Ok(Arc::new(Counter { start: 3 }))
        };
        let instance = factory.instantiate(&counter()).unwrap();
        assert_eq!(start(&instance), 3);
    }
}
