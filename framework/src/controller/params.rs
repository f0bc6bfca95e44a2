//! Argument injection
//!
//! A controller method declares one [`ParamExtractor`] per argument. At request
//! time each extractor reads its value out of the shared [`Context`]; the
//! resolved values reach the method as [`Arguments`], in ascending index order.

use crate::error::FrameworkError;
use crate::http::{Context, UploadedFile};
use crate::middleware::Next;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One resolved argument value
#[derive(Debug, Clone, PartialEq)]
pub enum Injected {
    /// The request context itself
    Context(Context),
    /// The downstream continuation
    Next(Next),
    Value(Value),
    File(UploadedFile),
    Files(Vec<UploadedFile>),
    /// Nothing to inject (e.g. an absent query key)
    Missing,
}

impl Injected {
    pub fn is_missing(&self) -> bool {
        matches!(self, Injected::Missing)
    }
}

impl From<Value> for Injected {
    fn from(value: Value) -> Self {
        Injected::Value(value)
    }
}

/// Function deriving one argument from the request context
pub type ExtractFn = Arc<dyn Fn(&Context) -> Injected + Send + Sync>;

/// Extractor bound to a parameter position of a controller method
#[derive(Clone)]
pub struct ParamExtractor {
    /// Zero-based position in the method's argument list
    pub index: usize,
    /// Method the parameter belongs to
    pub name: &'static str,
    extract: ExtractFn,
}

impl ParamExtractor {
    pub fn new(index: usize, name: &'static str, extract: ExtractFn) -> Self {
        Self {
            index,
            name,
            extract,
        }
    }

    pub fn extract(&self, ctx: &Context) -> Injected {
        (self.extract)(ctx)
    }
}

impl fmt::Debug for ParamExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamExtractor")
            .field("index", &self.index)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Resolved arguments handed to a controller method
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Arguments(Vec<Injected>);

impl Arguments {
    pub fn new(values: Vec<Injected>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Injected> {
        self.0.get(index)
    }

    pub fn as_slice(&self) -> &[Injected] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Injected> {
        self.0
    }

    fn at(&self, index: usize) -> Result<&Injected, FrameworkError> {
        self.0
            .get(index)
            .ok_or_else(|| FrameworkError::param(format!("argument #{}", index)))
    }

    /// The context injected at `index`
    pub fn context(&self, index: usize) -> Result<Context, FrameworkError> {
        match self.at(index)? {
            Injected::Context(ctx) => Ok(ctx.clone()),
            _ => Err(FrameworkError::param_parse(
                format!("argument #{}", index),
                "Context",
            )),
        }
    }

    /// The continuation injected at `index`
    pub fn next(&self, index: usize) -> Result<Next, FrameworkError> {
        match self.at(index)? {
            Injected::Next(next) => Ok(next.clone()),
            _ => Err(FrameworkError::param_parse(
                format!("argument #{}", index),
                "Next",
            )),
        }
    }

    /// The JSON value injected at `index`; a missing value is an error
    pub fn value(&self, index: usize) -> Result<&Value, FrameworkError> {
        match self.at(index)? {
            Injected::Value(value) => Ok(value),
            Injected::Missing => Err(FrameworkError::param(format!("argument #{}", index))),
            _ => Err(FrameworkError::param_parse(
                format!("argument #{}", index),
                "serde_json::Value",
            )),
        }
    }

    /// The value at `index` as a string slice
    pub fn str(&self, index: usize) -> Result<&str, FrameworkError> {
        self.value(index)?
            .as_str()
            .ok_or_else(|| FrameworkError::param_parse(format!("argument #{}", index), "&str"))
    }

    /// The value at `index`, or `None` when nothing was injected
    pub fn optional(&self, index: usize) -> Result<Option<&Value>, FrameworkError> {
        match self.at(index)? {
            Injected::Missing => Ok(None),
            _ => self.value(index).map(Some),
        }
    }

    /// Deserialize the value at `index` into `T`
    ///
    /// String values are also tried as JSON literals, so a query value of
    /// `"5"` deserializes into a `u64`.
    pub fn deserialize<T: DeserializeOwned>(&self, index: usize) -> Result<T, FrameworkError> {
        let value = self.value(index)?;
        serde_json::from_value::<T>(value.clone())
            .or_else(|err| match value {
                Value::String(raw) => serde_json::from_str::<T>(raw),
                _ => Err(err),
            })
            .map_err(|_| {
                FrameworkError::param_parse(
                    format!("argument #{}", index),
                    std::any::type_name::<T>(),
                )
            })
    }

    /// The single file injected at `index`
    pub fn file(&self, index: usize) -> Result<&UploadedFile, FrameworkError> {
        match self.at(index)? {
            Injected::File(file) => Ok(file),
            _ => Err(FrameworkError::param(format!("argument #{}", index))),
        }
    }

    /// The file collection injected at `index`
    pub fn files(&self, index: usize) -> Result<&[UploadedFile], FrameworkError> {
        match self.at(index)? {
            Injected::Files(files) => Ok(files),
            Injected::File(file) => Ok(std::slice::from_ref(file)),
            _ => Err(FrameworkError::param(format!("argument #{}", index))),
        }
    }
}

impl From<Vec<Injected>> for Arguments {
    fn from(values: Vec<Injected>) -> Self {
        Self(values)
    }
}

impl IntoIterator for Arguments {
    type Item = Injected;
    type IntoIter = std::vec::IntoIter<Injected>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Built-in extractor functions
pub mod extract {
    use super::*;

    fn string_map(map: &HashMap<String, String>) -> Value {
        Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                .collect::<Map<String, Value>>(),
        )
    }

    fn lookup(map: &HashMap<String, String>, key: Option<&str>) -> Injected {
        match key {
            None => Injected::Value(string_map(map)),
            Some(key) => map
                .get(key)
                .map(|value| Injected::Value(Value::String(value.clone())))
                .unwrap_or(Injected::Missing),
        }
    }

    /// Wrap a closure as an [`ExtractFn`]
    pub fn custom<F>(f: F) -> ExtractFn
    where
        F: Fn(&Context) -> Injected + Send + Sync + 'static,
    {
        Arc::new(f)
    }

    /// The whole request context
    pub fn context() -> ExtractFn {
        custom(|ctx| Injected::Context(ctx.clone()))
    }

    /// The parsed request body
    pub fn body() -> ExtractFn {
        custom(|ctx| Injected::Value(ctx.request().body.clone()))
    }

    /// The parsed form fields
    pub fn fields() -> ExtractFn {
        custom(|ctx| Injected::Value(Value::Object(ctx.request().fields.clone())))
    }

    /// The first uploaded file, or the (empty) collection when there is none
    pub fn file() -> ExtractFn {
        custom(|ctx| match ctx.request().files.first() {
            Some(file) => Injected::File(file.clone()),
            None => Injected::Files(ctx.request().files.clone()),
        })
    }

    /// Every uploaded file
    pub fn files() -> ExtractFn {
        custom(|ctx| Injected::Files(ctx.request().files.clone()))
    }

    /// One query value, or the whole query map when `key` is `None`
    pub fn query_param(key: Option<&str>) -> ExtractFn {
        let key = key.map(str::to_string);
        custom(move |ctx| lookup(ctx.query(), key.as_deref()))
    }

    /// The whole query map
    pub fn query_params() -> ExtractFn {
        query_param(None)
    }

    /// One path parameter, or the whole parameter map when `key` is `None`
    pub fn path_param(key: Option<&str>) -> ExtractFn {
        let key = key.map(str::to_string);
        custom(move |ctx| lookup(ctx.params(), key.as_deref()))
    }

    /// The whole path parameter map
    pub fn path_params() -> ExtractFn {
        path_param(None)
    }
}
