//! Configuration for cache regions

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Eviction policy placed directly above a region's base store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Eviction {
    #[default]
    Lru,
    Fifo,
    Soft,
    Weak,
}

/// Declaration of one cache region
///
/// Mirrors the options of [`CacheBuilder`](crate::cache::CacheBuilder); every
/// field except `id` falls back to the builder default when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Region identifier; also the namespace the region is registered under
    pub id: String,

    pub eviction: Eviction,

    /// Capacity of the eviction layer; the layer's own default when absent
    pub size: Option<usize>,

    /// Full clear interval; no scheduled clearing when absent
    pub flush_interval_ms: Option<u64>,

    /// Read-only regions hand out shared values, read-write ones copies
    pub read_only: bool,

    /// Hold a per-key lock from a miss until the key is filled
    pub blocking: bool,

    /// Upper bound on waiting for a per-key lock
    pub lock_timeout_ms: Option<u64>,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            eviction: Eviction::Lru,
            size: None,
            flush_interval_ms: None,
            read_only: true,
            blocking: false,
            lock_timeout_ms: None,
        }
    }
}

impl RegionConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(CacheError::ConfigError("region id must not be empty".to_string()));
        }

        if self.size == Some(0) {
            return Err(CacheError::ConfigError(format!(
                "region '{}': size must be greater than 0",
                self.id
            )));
        }

        if self.flush_interval_ms == Some(0) {
            return Err(CacheError::ConfigError(format!(
                "region '{}': flush_interval_ms must be greater than 0",
                self.id
            )));
        }

        if self.lock_timeout_ms == Some(0) {
            return Err(CacheError::ConfigError(format!(
                "region '{}': lock_timeout_ms must be greater than 0",
                self.id
            )));
        }

        Ok(())
    }
}

/// A namespace that shares the cache of another namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRef {
    pub namespace: String,
    pub target: String,
}

impl RegionRef {
    pub fn new(namespace: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            target: target.into(),
        }
    }
}

/// All regions and references of one application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub regions: Vec<RegionConfig>,
    pub references: Vec<RegionRef>,
}

impl CacheSettings {
    /// Create a new builder for cache settings
    pub fn builder() -> CacheSettingsBuilder {
        CacheSettingsBuilder::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: CacheSettings = serde_json::from_str(json)
            .map_err(|e| CacheError::ConfigError(format!("invalid cache settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Validate every region declaration
    pub fn validate(&self) -> Result<()> {
        for region in &self.regions {
            region.validate()?;
        }
        Ok(())
    }
}

/// Builder for cache settings
#[derive(Debug, Default)]
pub struct CacheSettingsBuilder {
    regions: Vec<RegionConfig>,
    references: Vec<RegionRef>,
}

impl CacheSettingsBuilder {
    /// Declare a region
    pub fn region(mut self, region: RegionConfig) -> Self {
        self.regions.push(region);
        self
    }

    /// Let `namespace` share the cache of `target`
    pub fn reference(mut self, namespace: impl Into<String>, target: impl Into<String>) -> Self {
        self.references.push(RegionRef::new(namespace, target));
        self
    }

    /// Build the settings
    pub fn build(self) -> CacheSettings {
        CacheSettings {
            regions: self.regions,
            references: self.references,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_region() {
        let config = RegionConfig::new("users");
        assert_eq!(config.eviction, Eviction::Lru);
        assert!(config.size.is_none());
        assert!(config.read_only);
        assert!(!config.blocking);
        assert!(config.flush_interval_ms.is_none());
    }

    #[test]
    fn test_region_validation() {
        assert!(RegionConfig::new("users").validate().is_ok());
        assert!(RegionConfig::default().validate().is_err());

        let mut invalid = RegionConfig::new("users");
        invalid.size = Some(0);
        assert!(invalid.validate().is_err());

        let mut invalid = RegionConfig::new("users");
        invalid.flush_interval_ms = Some(0);
        assert!(invalid.validate().is_err());

        let mut invalid = RegionConfig::new("users");
        invalid.lock_timeout_ms = Some(0);
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_settings_from_json() {
        let json = r#"{
            "regions": [
                { "id": "users", "eviction": "fifo", "size": 64, "read_only": false },
                { "id": "orders", "flush_interval_ms": 60000, "blocking": true }
            ],
            "references": [
                { "namespace": "admin", "target": "users" }
            ]
        }"#;

        let settings = CacheSettings::from_json_str(json).unwrap();
        assert_eq!(settings.regions.len(), 2);
        assert_eq!(settings.regions[0].eviction, Eviction::Fifo);
        assert_eq!(settings.regions[0].size, Some(64));
        assert!(settings.regions[1].size.is_none());
        assert!(!settings.regions[0].read_only);
        assert_eq!(settings.regions[1].eviction, Eviction::Lru);
        assert_eq!(settings.regions[1].flush_interval_ms, Some(60_000));
        assert!(settings.regions[1].blocking);
        assert_eq!(settings.references[0], RegionRef::new("admin", "users"));
    }

    #[test]
    fn test_settings_rejects_invalid_region() {
        let json = r#"{ "regions": [ { "id": "users", "size": 0 } ] }"#;
        assert!(matches!(
            CacheSettings::from_json_str(json),
            Err(CacheError::ConfigError(_))
        ));
        assert!(matches!(
            CacheSettings::from_json_str("not json"),
            Err(CacheError::ConfigError(_))
        ));
    }

    #[test]
    fn test_settings_builder() {
        let settings = CacheSettings::builder()
            .region(RegionConfig::new("users"))
            .reference("admin", "users")
            .build();

        assert_eq!(settings.regions.len(), 1);
        assert_eq!(settings.references.len(), 1);
        assert!(settings.validate().is_ok());
    }
}
