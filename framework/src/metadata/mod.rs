//! Typed metadata store
//!
//! Annotations on a controller write into a [`MetadataRegistry`], keyed by the
//! controller's identity plus an optional method name. Each slot is typed by a
//! [`MetadataKind`] marker, so a middleware list and a view path stored under
//! the same key never collide.
//!
//! ```rust
//! use trellis::metadata::{MetadataKey, MetadataRegistry, ViewPath};
//! use trellis::ControllerId;
//!
//! struct Pages;
//!
//! let mut registry = MetadataRegistry::new();
//! let key = MetadataKey::method(ControllerId::of::<Pages>(), "home");
//! registry.define::<ViewPath>(&key, "views/home".to_string());
//!
//! assert_eq!(registry.get::<ViewPath>(&key).map(String::as_str), Some("views/home"));
//! ```

use crate::controller::{ControllerId, HttpMethod, ParamExtractor, ResponseHandler};
use crate::middleware::BoxedMiddleware;
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Marker type naming one kind of metadata and the value stored for it
pub trait MetadataKind: 'static {
    type Value: Any + Send + Sync;
}

/// Raw route entry pushed by a verb annotation, before finalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRoute {
    pub method: HttpMethod,
    pub path: String,
    pub name: &'static str,
}

/// Raw routes of a controller, in declaration order (controller scope)
pub struct RouteList;

impl MetadataKind for RouteList {
    type Value = Vec<RawRoute>;
}

/// Middleware declared on a controller or on one of its methods
pub struct MiddlewareList;

impl MetadataKind for MiddlewareList {
    type Value = Vec<BoxedMiddleware>;
}

/// Parameter extractors of a method
pub struct ParamList;

impl MetadataKind for ParamList {
    type Value = Vec<ParamExtractor>;
}

/// View path of a method
pub struct ViewPath;

impl MetadataKind for ViewPath {
    type Value = String;
}

/// Response override of a method
pub struct ResponseOverride;

impl MetadataKind for ResponseOverride {
    type Value = ResponseHandler;
}

/// Target of a metadata entry
///
/// No member means controller scope; a member names one controller method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetadataKey {
    pub controller: ControllerId,
    pub member: Option<&'static str>,
}

impl MetadataKey {
    pub fn controller(controller: ControllerId) -> Self {
        Self {
            controller,
            member: None,
        }
    }

    pub fn method(controller: ControllerId, name: &'static str) -> Self {
        Self {
            controller,
            member: Some(name),
        }
    }

    pub fn is_controller_scope(&self) -> bool {
        self.member.is_none()
    }
}

/// Key/value store behind the annotation builders
#[derive(Default)]
pub struct MetadataRegistry {
    entries: HashMap<(MetadataKey, TypeId), Box<dyn Any + Send + Sync>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing whatever was there
    pub fn define<K: MetadataKind>(&mut self, key: &MetadataKey, value: K::Value) {
        self.entries
            .insert((*key, TypeId::of::<K>()), Box::new(value));
    }

    /// Read the value stored under `key`
    pub fn get<K: MetadataKind>(&self, key: &MetadataKey) -> Option<&K::Value> {
        self.entries
            .get(&(*key, TypeId::of::<K>()))
            .and_then(|boxed| boxed.downcast_ref::<K::Value>())
    }

    /// Read-modify-write: fetch the existing value or start from `Default`,
    /// apply `f`, and write it back
    pub fn update<K, F>(&mut self, key: &MetadataKey, f: F)
    where
        K: MetadataKind,
        K::Value: Default,
        F: FnOnce(&mut K::Value),
    {
        let mut value = self
            .entries
            .remove(&(*key, TypeId::of::<K>()))
            .and_then(|boxed| boxed.downcast::<K::Value>().ok())
            .map(|boxed| *boxed)
            .unwrap_or_default();
        f(&mut value);
        self.define::<K>(key, value);
    }

    /// Whether anything is stored under `key` for kind `K`
    pub fn has<K: MetadataKind>(&self, key: &MetadataKey) -> bool {
        self.entries.contains_key(&(*key, TypeId::of::<K>()))
    }

    /// List lookup that degrades to an empty slice
    pub fn list<K, T>(&self, key: &MetadataKey) -> &[T]
    where
        K: MetadataKind<Value = Vec<T>>,
        T: Any + Send + Sync,
    {
        self.get::<K>(key).map(Vec::as_slice).unwrap_or(&[])
    }
}
