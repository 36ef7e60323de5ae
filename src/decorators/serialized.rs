//! Defensive copies through serialization

use crate::cache::{
    key::CacheKey,
    types::{CacheValue, Value},
    Cache,
};
use crate::error::{CacheError, Result};
use std::sync::Arc;

/// Stores values in serialized form and deserializes on every read, so each
/// caller gets an independent copy.
pub struct SerializedCache {
    delegate: Arc<dyn Cache>,
}

impl SerializedCache {
    pub fn new(delegate: Arc<dyn Cache>) -> Self {
        Self { delegate }
    }

    fn serialize(&self, value: &Value) -> Result<CacheValue> {
        if !value.is_serializable() {
            return Err(self.not_serializable());
        }
        let bytes = serde_json::to_vec(value)?;
        Ok(CacheValue::Serialized(bytes.into()))
    }

    fn not_serializable(&self) -> CacheError {
        CacheError::NotSerializable {
            region: self.id().to_string(),
        }
    }
}

impl Cache for SerializedCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: CacheKey, value: Option<CacheValue>) -> Result<()> {
        let stored = match value {
            None => None,
            Some(CacheValue::Object(object)) => Some(self.serialize(&object)?),
            Some(_) => return Err(self.not_serializable()),
        };
        self.delegate.put(key, stored)
    }

    fn get(&self, key: &CacheKey) -> Result<Option<CacheValue>> {
        match self.delegate.get(key)? {
            None => Ok(None),
            Some(CacheValue::Serialized(bytes)) => {
                let value: Value = serde_json::from_slice(&bytes)?;
                Ok(Some(CacheValue::Object(Arc::new(value))))
            }
            Some(other) => Err(CacheError::Serialization(format!(
                "expected serialized entry in region '{}', found {}",
                self.id(),
                other.kind()
            ))),
        }
    }

    fn remove(&self, key: &CacheKey) -> Result<Option<CacheValue>> {
        self.delegate.remove(key)
    }

    fn clear(&self) -> Result<()> {
        self.delegate.clear()
    }

    fn size(&self) -> Result<usize> {
        self.delegate.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{store::BaseStore, types::Handle};
    use std::collections::BTreeMap;

    fn key(n: i64) -> CacheKey {
        CacheKey::from_parts([Value::Int(n)])
    }

    fn row() -> Value {
        let columns: BTreeMap<String, Value> = [
            ("id".to_string(), Value::Int(7)),
            ("name".to_string(), Value::from("ada")),
            ("tags".to_string(), Value::List(vec![Value::from("x"), Value::Null])),
        ]
        .into_iter()
        .collect();
        Value::Row(columns)
    }

    #[test]
    fn test_round_trip_is_copy() {
        let cache = SerializedCache::new(Arc::new(BaseStore::new("rw")));
        let original = Arc::new(row());
        cache
            .put(key(1), Some(CacheValue::Object(original.clone())))
            .unwrap();

        let first = cache.get(&key(1)).unwrap().unwrap().into_object().unwrap();
        let second = cache.get(&key(1)).unwrap().unwrap().into_object().unwrap();

        assert_eq!(*first, *original);
        assert!(!Arc::ptr_eq(&first, &original));
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_stores_bytes() {
        let store = Arc::new(BaseStore::new("rw"));
        let cache = SerializedCache::new(store.clone());
        cache.put(key(1), Some(CacheValue::object(row()))).unwrap();

        assert_eq!(store.get(&key(1)).unwrap().unwrap().kind(), "serialized");
    }

    #[test]
    fn test_rejects_handles() {
        let cache = SerializedCache::new(Arc::new(BaseStore::new("rw")));
        let value = Value::List(vec![Value::Int(1), Handle::new("cursor", 3u8).into()]);

        let err = cache.put(key(1), Some(CacheValue::object(value))).unwrap_err();
        assert!(matches!(err, CacheError::NotSerializable { .. }));
        assert_eq!(cache.size().unwrap(), 0);
    }

    #[test]
    fn test_null_allowed() {
        let cache = SerializedCache::new(Arc::new(BaseStore::new("rw")));
        cache.put(key(1), None).unwrap();
        assert!(cache.get(&key(1)).unwrap().is_none());
        assert_eq!(cache.size().unwrap(), 1);
    }

    #[test]
    fn test_unexpected_inner_value_is_error() {
        let store = Arc::new(BaseStore::new("rw"));
        store.put(key(1), Some(CacheValue::object(1))).unwrap();
        let cache = SerializedCache::new(store);

        assert!(matches!(
            cache.get(&key(1)),
            Err(CacheError::Serialization(_))
        ));
    }

    #[test]
    fn test_computed_floats_read_back_bit_exact() {
        let cache = SerializedCache::new(Arc::new(BaseStore::new("rw")));
        for i in 1..5000i64 {
            let f = (i as f64).sqrt() / 7.0;
            cache.put(key(i), Some(CacheValue::object(f))).unwrap();

            let read = cache.get(&key(i)).unwrap().unwrap().into_object().unwrap();
            assert_eq!(*read, Value::Float(f), "float {} changed on read", f);
        }

        let list = Value::List(vec![Value::Float(0.1 + 0.2), Value::Float(f64::MIN_POSITIVE)]);
        cache.put(key(0), Some(CacheValue::object(list.clone()))).unwrap();
        let read = cache.get(&key(0)).unwrap().unwrap().into_object().unwrap();
        assert_eq!(*read, list);
    }
}
