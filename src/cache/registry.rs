//! Namespace to region lookup, with region references resolved at build time

use crate::cache::builder::CacheBuilder;
use crate::cache::config::CacheSettings;
use crate::cache::Cache;
use crate::error::{CacheError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Every configured region, reachable by its own id or by any namespace
/// that references it.
pub struct RegionRegistry {
    regions: HashMap<String, Arc<dyn Cache>>,
    namespaces: HashMap<String, Arc<dyn Cache>>,
}

impl RegionRegistry {
    /// Build all regions, then resolve all references.
    ///
    /// Fails on a duplicate name, a reference to an unknown namespace, or a
    /// reference cycle. No registry is produced on failure.
    pub fn build(settings: &CacheSettings) -> Result<Self> {
        settings.validate()?;

        let mut regions: HashMap<String, Arc<dyn Cache>> = HashMap::new();
        for config in &settings.regions {
            if regions.contains_key(&config.id) {
                return Err(CacheError::DuplicateRegion(config.id.clone()));
            }
            let cache = CacheBuilder::from_config(config).build()?;
            regions.insert(config.id.clone(), cache);
        }

        let mut targets: HashMap<&str, &str> = HashMap::new();
        for reference in &settings.references {
            let namespace = reference.namespace.as_str();
            if regions.contains_key(namespace) || targets.contains_key(namespace) {
                return Err(CacheError::DuplicateRegion(reference.namespace.clone()));
            }
            targets.insert(namespace, reference.target.as_str());
        }

        let mut namespaces = regions.clone();
        for reference in &settings.references {
            let cache = Self::resolve(&regions, &targets, &reference.namespace)?;
            info!(
                namespace = %reference.namespace,
                region = %cache.id(),
                "Resolved region reference"
            );
            namespaces.insert(reference.namespace.clone(), cache);
        }

        info!(
            regions = regions.len(),
            references = settings.references.len(),
            "Cache regions ready"
        );
        Ok(Self {
            regions,
            namespaces,
        })
    }

    fn resolve(
        regions: &HashMap<String, Arc<dyn Cache>>,
        targets: &HashMap<&str, &str>,
        namespace: &str,
    ) -> Result<Arc<dyn Cache>> {
        let mut chain = vec![namespace.to_string()];
        let mut current = namespace;
        loop {
            let target = match targets.get(current) {
                Some(target) => *target,
                None => {
                    return Err(CacheError::UnresolvedAlias {
                        namespace: current.to_string(),
                        target: String::new(),
                    })
                }
            };
            if let Some(cache) = regions.get(target) {
                return Ok(cache.clone());
            }
            if !targets.contains_key(target) {
                return Err(CacheError::UnresolvedAlias {
                    namespace: current.to_string(),
                    target: target.to_string(),
                });
            }
            if chain.iter().any(|seen| seen == target) {
                chain.push(target.to_string());
                return Err(CacheError::CircularAlias { chain });
            }
            chain.push(target.to_string());
            current = target;
        }
    }

    /// Region serving `namespace`, if any
    pub fn get(&self, namespace: &str) -> Option<Arc<dyn Cache>> {
        self.namespaces.get(namespace).cloned()
    }

    /// Ids of the declared regions, sorted
    pub fn region_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.regions.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// All known namespaces, sorted
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.namespaces.keys().cloned().collect();
        names.sort();
        names
    }
}
