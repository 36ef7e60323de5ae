//! Error types for cache operations
//!
//! This module defines the error type shared by every cache layer, the
//! transactional buffers and the region configuration loader.

use thiserror::Error;

/// Main error type for cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// A contribution was appended to the reserved null key
    #[error("Cannot update the reserved null cache key")]
    ImmutableKey,

    /// A value without a serialized form was written through a read-write region
    #[error("Value stored in region '{region}' is not serializable")]
    NotSerializable { region: String },

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A per-key lock could not be acquired in time
    #[error("Couldn't get a lock in {timeout_ms}ms for the key {key} at the cache {region}")]
    LockTimeout {
        region: String,
        key: String,
        timeout_ms: u64,
    },

    /// A per-key lock was released without being held
    #[error("Attempt to release unacquired lock for key {key} at the cache {region}")]
    UnacquiredLock { region: String, key: String },

    /// A region reference names a namespace that has no cache
    #[error("Region reference '{namespace}' points to unknown region '{target}'")]
    UnresolvedAlias { namespace: String, target: String },

    /// Region references form a cycle
    #[error("Circular region reference: {}", chain.join(" -> "))]
    CircularAlias { chain: Vec<String> },

    /// Two regions (or a region and a reference) share a name
    #[error("Region '{0}' is already defined")]
    DuplicateRegion(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Failure reading configuration from disk
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Serialization(e.to_string())
    }
}

impl From<String> for CacheError {
    fn from(s: String) -> Self {
        CacheError::Other(s)
    }
}

impl From<&str> for CacheError {
    fn from(s: &str) -> Self {
        CacheError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CacheError::NotSerializable {
            region: "users".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Value stored in region 'users' is not serializable"
        );

        let timeout = CacheError::LockTimeout {
            region: "users".to_string(),
            key: "17:0:0".to_string(),
            timeout_ms: 50,
        };
        assert!(timeout.to_string().contains("50ms"));

        let cycle = CacheError::CircularAlias {
            chain: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert!(cycle.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn test_error_conversion() {
        let error: CacheError = "test error".into();
        assert!(matches!(error, CacheError::Other(_)));

        let error: CacheError = "test error".to_string().into();
        assert!(matches!(error, CacheError::Other(_)));

        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let error: CacheError = json_err.into();
        assert!(matches!(error, CacheError::Serialization(_)));
    }
}
