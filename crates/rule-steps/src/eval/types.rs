//! Type registry used to turn type names from step text into live types.
//!
//! A step such as `dial as Dialing from json {...}` names a type by string.
//! The registry maps such names to a [`TypeHandle`] which knows how to decode
//! JSON/YAML text into that type and how to recognise it among session facts.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{Value, render};
use crate::error::{Result, StepError};

/// Rust types that can be registered: decodable, cloneable and comparable.
pub trait BindableType: Any + Clone + PartialEq + Send + Sync + DeserializeOwned {}

impl<T> BindableType for T where T: Any + Clone + PartialEq + Send + Sync + DeserializeOwned {}

type Decoder = fn(&str) -> Result<Value>;
type Recognizer = fn(&Value) -> bool;
type Equality = fn(&Value, &Value) -> Option<bool>;

fn decode_json<T: BindableType>(text: &str) -> Result<Value> {
    Ok(Value::from(serde_json::from_str::<T>(text)?))
}

fn decode_yaml<T: BindableType>(text: &str) -> Result<Value> {
    Ok(Value::from(serde_yaml::from_str::<T>(text)?))
}

/// `None` when either side is not a `T`.
fn equals_typed<T: BindableType>(left: &Value, right: &Value) -> Option<bool> {
    let left = left.read_lock::<T>()?;
    let right = right.read_lock::<T>()?;
    Some(*left == *right)
}

fn to_value<T: Serialize>(text: &str, value: &T) -> Result<Value> {
    rhai::serde::to_dynamic(value).map_err(|e| StepError::unresolvable(text, e))
}

fn decode_json_dynamic(text: &str) -> Result<Value> {
    let parsed: serde_json::Value = serde_json::from_str(text)?;
    to_value(text, &parsed)
}

fn decode_yaml_dynamic(text: &str) -> Result<Value> {
    let parsed: serde_yaml::Value = serde_yaml::from_str(text)?;
    to_value(text, &parsed)
}

fn is_type<T: BindableType>(value: &Value) -> bool {
    value.is::<T>()
}

fn is_structured(value: &Value) -> bool {
    value.is_map() || value.is_array()
}

/// A resolved type.
#[derive(Clone)]
pub struct TypeHandle {
    name: String,
    rust_name: &'static str,
    json: Decoder,
    yaml: Decoder,
    recognizer: Recognizer,
    type_id: Option<TypeId>,
    equality: Option<Equality>,
}

impl TypeHandle {
    /// Create a handle for a Rust type under the given (possibly qualified) name.
    #[must_use]
    pub fn of<T>(name: impl Into<String>) -> Self
    where
        T: BindableType,
    {
        Self {
            name: name.into(),
            rust_name: std::any::type_name::<T>(),
            json: decode_json::<T>,
            yaml: decode_yaml::<T>,
            recognizer: is_type::<T>,
            type_id: Some(TypeId::of::<T>()),
            equality: Some(equals_typed::<T>),
        }
    }

    /// Create a handle that decodes into generic maps and arrays.
    #[must_use]
    pub fn dynamic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rust_name: "dynamic",
            json: decode_json_dynamic,
            yaml: decode_yaml_dynamic,
            recognizer: is_structured,
            type_id: None,
            equality: None,
        }
    }

    /// The registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The last segment of the registered name.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// The Rust type behind this handle.
    #[must_use]
    pub const fn rust_name(&self) -> &'static str {
        self.rust_name
    }

    /// Decode JSON text into a value of this type.
    pub fn from_json(&self, text: &str) -> Result<Value> {
        (self.json)(text)
    }

    /// Decode YAML text into a value of this type.
    pub fn from_yaml(&self, text: &str) -> Result<Value> {
        (self.yaml)(text)
    }

    /// Check if a value is an instance of this type.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        (self.recognizer)(value)
    }

    /// Compare two values with this type's `PartialEq`.
    ///
    /// `None` when the handle is not typed or either value is of another type.
    #[must_use]
    pub fn equals(&self, left: &Value, right: &Value) -> Option<bool> {
        self.equality.and_then(|equality| equality(left, right))
    }
}

/// Scalars whose rendered form identifies the value.
fn is_scalar(value: &Value) -> bool {
    value.is_unit()
        || value.is_bool()
        || value.is_int()
        || value.is_float()
        || value.is_char()
        || value.is_string()
        || value.is_blob()
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHandle")
            .field("name", &self.name)
            .field("rust_name", &self.rust_name)
            .finish_non_exhaustive()
    }
}

/// Registered types, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeHandle>,
}

impl TypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the scalar and collection types pre-registered.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(TypeHandle::of::<String>("String"));
        registry.register(TypeHandle::of::<bool>("Boolean"));
        registry.register(TypeHandle::of::<i64>("Integer"));
        registry.register(TypeHandle::of::<i64>("Long"));
        registry.register(TypeHandle::of::<f64>("Double"));
        registry.register(TypeHandle::dynamic("Map"));
        registry.register(TypeHandle::dynamic("List"));
        registry.register(TypeHandle::dynamic("Object"));
        registry
    }

    /// Register a type, returning the handle previously registered under its name.
    pub fn register(&mut self, handle: TypeHandle) -> Option<TypeHandle> {
        self.types.insert(handle.name.clone(), handle)
    }

    /// Check if a name is registered exactly as given.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Resolve a type name.
    ///
    /// The name is tried as written first, then qualified by each namespace
    /// in import order.
    pub fn resolve(&self, name: &str, namespaces: &[String]) -> Result<TypeHandle> {
        let name = name.trim();
        if let Some(handle) = self.types.get(name) {
            return Ok(handle.clone());
        }
        namespaces
            .iter()
            .find_map(|ns| self.types.get(&format!("{ns}.{name}")))
            .cloned()
            .ok_or_else(|| StepError::unknown_type(name))
    }

    /// Compare two values for equality.
    ///
    /// Scalars compare by runtime type and rendered form, arrays and maps
    /// element by element, and registered types with their `PartialEq`.
    /// Values of an unregistered custom type never compare equal.
    #[must_use]
    pub fn values_equal(&self, left: &Value, right: &Value) -> bool {
        if left.type_id() != right.type_id() {
            return false;
        }
        if is_scalar(left) {
            return render(left) == render(right);
        }
        if let (Some(l), Some(r)) = (
            left.read_lock::<rhai::Array>(),
            right.read_lock::<rhai::Array>(),
        ) {
            return l.len() == r.len()
                && l.iter().zip(r.iter()).all(|(a, b)| self.values_equal(a, b));
        }
        if let (Some(l), Some(r)) = (
            left.read_lock::<rhai::Map>(),
            right.read_lock::<rhai::Map>(),
        ) {
            return l.len() == r.len()
                && l.iter()
                    .all(|(key, a)| r.get(key).is_some_and(|b| self.values_equal(a, b)));
        }
        let type_id = left.type_id();
        self.types
            .values()
            .filter(|handle| handle.type_id == Some(type_id))
            .find_map(|handle| handle.equals(left, right))
            .unwrap_or(false)
    }
}
