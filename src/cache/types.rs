//! Core type definitions for the cache system

use crate::decorators::reference::Referent;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

/// Hash contributed by a null value
pub const NULL_HASH: i32 = 1;

/// A dynamic datum carried in cached results and contributed to cache keys
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    /// A result row, columns ordered by name
    Row(BTreeMap<String, Value>),
    /// A live process-local object; never serializable
    #[serde(skip)]
    Handle(Handle),
}

impl Value {
    /// Stable 32-bit content hash used by cache key accumulation.
    ///
    /// The hash is computed from content only, so two processes building a
    /// key from the same values arrive at the same identity.
    pub fn hash_code(&self) -> i32 {
        match self {
            Value::Null => NULL_HASH,
            Value::Bool(b) => {
                if *b {
                    1231
                } else {
                    1237
                }
            }
            Value::Int(v) => (*v ^ ((*v as u64) >> 32) as i64) as i32,
            Value::Float(f) => {
                let bits = f.to_bits();
                (bits ^ (bits >> 32)) as i32
            }
            Value::Text(s) => text_hash(s),
            Value::Bytes(bytes) => bytes
                .iter()
                .fold(1i32, |h, &b| h.wrapping_mul(31).wrapping_add(b as i8 as i32)),
            Value::List(items) => items
                .iter()
                .fold(1i32, |h, v| h.wrapping_mul(31).wrapping_add(v.hash_code())),
            Value::Row(columns) => columns
                .iter()
                .fold(0i32, |h, (k, v)| h.wrapping_add(text_hash(k) ^ v.hash_code())),
            Value::Handle(handle) => handle.identity_hash(),
        }
    }

    /// Whether this value (and everything it contains) has a serialized form
    pub fn is_serializable(&self) -> bool {
        match self {
            Value::Handle(_) => false,
            Value::Float(f) => f.is_finite(),
            Value::List(items) => items.iter().all(Value::is_serializable),
            Value::Row(columns) => columns.values().all(Value::is_serializable),
            _ => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

fn text_hash(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(c as i32))
}

// Floats compare by bit pattern so that values can serve as key parts.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Row(a), Value::Row(b)) => a == b,
            (Value::Handle(a), Value::Handle(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Row(columns) => {
                write!(f, "{{")?;
                for (i, (k, v)) in columns.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Handle(h) => write!(f, "<handle {}>", h.name),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Handle> for Value {
    fn from(v: Handle) -> Self {
        Value::Handle(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Shared reference to a live object, compared by identity
#[derive(Clone)]
pub struct Handle {
    name: String,
    object: Arc<dyn Any + Send + Sync>,
}

impl Handle {
    pub fn new<T: Any + Send + Sync>(name: impl Into<String>, object: T) -> Self {
        Self {
            name: name.into(),
            object: Arc::new(object),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }

    fn identity_hash(&self) -> i32 {
        let addr = Arc::as_ptr(&self.object) as *const () as usize as u64;
        (addr ^ (addr >> 32)) as i32
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.name).finish()
    }
}

/// What a cache layer holds for a key
#[derive(Debug, Clone)]
pub enum CacheValue {
    /// A shared result object
    Object(Arc<Value>),

    /// Serialized form of a result, written by the serialized decorator
    Serialized(Arc<[u8]>),

    /// Reclaimable handle, written by the soft/weak decorators
    Reference(Weak<Referent>),
}

impl CacheValue {
    pub fn object(value: impl Into<Value>) -> Self {
        CacheValue::Object(Arc::new(value.into()))
    }

    pub fn as_object(&self) -> Option<&Arc<Value>> {
        match self {
            CacheValue::Object(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<Arc<Value>> {
        match self {
            CacheValue::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Short name of the stored form, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            CacheValue::Object(_) => "object",
            CacheValue::Serialized(_) => "serialized",
            CacheValue::Reference(_) => "reference",
        }
    }
}

impl From<Value> for CacheValue {
    fn from(v: Value) -> Self {
        CacheValue::Object(Arc::new(v))
    }
}

impl From<Arc<Value>> for CacheValue {
    fn from(v: Arc<Value>) -> Self {
        CacheValue::Object(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_hash_matches_string_hash() {
        assert_eq!(Value::from("").hash_code(), 0);
        assert_eq!(Value::from("a").hash_code(), 97);
        assert_eq!(Value::from("ab").hash_code(), 97 * 31 + 98);
    }

    #[test]
    fn test_scalar_hashes() {
        assert_eq!(Value::Null.hash_code(), NULL_HASH);
        assert_eq!(Value::Bool(true).hash_code(), 1231);
        assert_eq!(Value::Bool(false).hash_code(), 1237);
        assert_eq!(Value::Int(42).hash_code(), 42);
        assert_eq!(Value::Int(-1).hash_code(), 0);
    }

    #[test]
    fn test_float_equality_by_bits() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }

    #[test]
    fn test_serializable() {
        let row: BTreeMap<String, Value> = [
            ("id".to_string(), Value::Int(1)),
            ("name".to_string(), Value::from("ada")),
        ]
        .into_iter()
        .collect();
        assert!(Value::Row(row.clone()).is_serializable());

        let mut with_handle = row;
        with_handle.insert("cursor".to_string(), Handle::new("cursor", 7u32).into());
        assert!(!Value::Row(with_handle).is_serializable());
        assert!(!Value::Float(f64::INFINITY).is_serializable());
    }

    #[test]
    fn test_handle_identity() {
        let a = Handle::new("loader", String::from("x"));
        let b = a.clone();
        let c = Handle::new("loader", String::from("x"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.downcast_ref::<String>().map(String::as_str), Some("x"));
    }

    #[test]
    fn test_option_into_value() {
        let none: Option<i64> = None;
        assert_eq!(Value::from(none), Value::Null);
        assert_eq!(Value::from(Some(3i64)), Value::Int(3));
    }

    #[test]
    fn test_display() {
        let v = Value::List(vec![Value::Int(1), Value::from("two"), Value::Null]);
        assert_eq!(v.to_string(), "[1, two, null]");
    }
}
