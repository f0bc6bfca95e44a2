//! Controller registry via inventory

use super::ControllerDefinition;
use crate::error::FrameworkError;
use std::sync::Arc;

/// Finalizer producing a controller's cached definition
pub type DefinitionFn = fn() -> Result<Arc<ControllerDefinition>, FrameworkError>;

/// Inventory entry for a controller
///
/// Submitted by [`register_controller!`](crate::register_controller).
pub struct ControllerEntry {
    pub name: &'static str,
    pub definition: DefinitionFn,
}

inventory::collect!(ControllerEntry);

/// Definitions of every registered controller, ordered by type name
pub fn registered() -> Result<Vec<Arc<ControllerDefinition>>, FrameworkError> {
    let mut entries: Vec<&'static ControllerEntry> =
        inventory::iter::<ControllerEntry>.into_iter().collect();
    entries.sort_by_key(|entry| entry.name);

    entries.into_iter().map(|entry| (entry.definition)()).collect()
}

/// Register a controller type for [`bind_registered`](crate::bind_registered)
///
/// ```rust,ignore
/// #[derive(Default)]
/// pub struct UserController;
///
/// impl Controller for UserController { /* ... */ }
///
/// trellis::register_controller!(UserController);
/// ```
#[macro_export]
macro_rules! register_controller {
    ($controller:ty) => {
        $crate::inventory::submit! {
            $crate::controller::ControllerEntry {
                name: ::std::stringify!($controller),
                definition: $crate::controller::definition::<$controller>,
            }
        }
    };
}
