//! In-memory platform definition registry with query support.

use crate::{
    definition::{PlatformCategory, PlatformDefinition},
    error::{CatalogError, Result},
    loader::PlatformLoader,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};
use umbra_core::PlatformId;

/// In-memory cache of platform definitions with query capabilities.
///
/// The registry loads definitions from disk and caches them in memory for
/// fast lookups. Catalog order (loader walk order) is preserved, so scans
/// that select a `limit`-sized subset always take the same stable prefix.
#[derive(Clone)]
pub struct PlatformRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

#[derive(Default)]
struct RegistryInner {
    /// Cached platform definitions, indexed by platform ID
    definitions: HashMap<PlatformId, PlatformDefinition>,
    /// Catalog order of platform IDs
    order: Vec<PlatformId>,
}

impl PlatformRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryInner::default())),
        }
    }

    /// Create a registry and load all definitions from the given loader.
    ///
    /// # Errors
    /// Returns error if loading fails.
    pub fn load_from(loader: &PlatformLoader) -> Result<Self> {
        let registry = Self::new();
        registry.reload(loader)?;
        Ok(registry)
    }

    /// Reload all platform definitions from the loader.
    ///
    /// This replaces the current cache with freshly loaded definitions.
    ///
    /// # Errors
    /// Returns error if loading fails.
    pub fn reload(&self, loader: &PlatformLoader) -> Result<()> {
        let definitions = loader.load_all()?;

        let mut cache = self.inner.write().expect("acquire write lock on registry");

        cache.definitions.clear();
        cache.order.clear();

        for definition in definitions {
            let platform_id = definition.id().clone();
            if cache
                .definitions
                .insert(platform_id.clone(), definition)
                .is_none()
            {
                cache.order.push(platform_id);
            }
        }

        info!(count = cache.order.len(), "reloaded platform definitions");

        Ok(())
    }

    /// Get a platform definition by ID.
    ///
    /// # Errors
    /// Returns error if the platform is not found.
    pub fn get(&self, platform_id: &PlatformId) -> Result<PlatformDefinition> {
        let cache = self.inner.read().expect("acquire read lock on registry");

        cache
            .definitions
            .get(platform_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                platform_id: platform_id.to_string(),
            })
    }

    /// Get all platform definitions in catalog order.
    #[must_use]
    pub fn get_all(&self) -> Vec<PlatformDefinition> {
        let cache = self.inner.read().expect("acquire read lock on registry");

        cache
            .order
            .iter()
            .filter_map(|id| cache.definitions.get(id).cloned())
            .collect()
    }

    /// Query platforms by category, preserving catalog order.
    #[must_use]
    pub fn get_by_category(&self, category: PlatformCategory) -> Vec<PlatformDefinition> {
        self.get_all()
            .into_iter()
            .filter(|def| def.category() == category)
            .collect()
    }

    /// Get the total number of platforms in the registry.
    #[must_use]
    pub fn count(&self) -> usize {
        let cache = self.inner.read().expect("acquire read lock on registry");
        cache.order.len()
    }

    /// Check if a platform exists in the registry.
    #[must_use]
    pub fn contains(&self, platform_id: &PlatformId) -> bool {
        let cache = self.inner.read().expect("acquire read lock on registry");
        cache.definitions.contains_key(platform_id)
    }

    /// Add or update a platform definition in the registry.
    ///
    /// New platforms are appended to the catalog order; updating an existing
    /// ID keeps its position.
    pub fn insert(&self, definition: PlatformDefinition) -> Result<()> {
        definition.validate()?;

        let mut cache = self.inner.write().expect("acquire write lock on registry");

        let platform_id = definition.id().clone();
        if cache
            .definitions
            .insert(platform_id.clone(), definition)
            .is_none()
        {
            cache.order.push(platform_id.clone());
        }

        debug!(platform_id = %platform_id, "inserted platform definition");

        Ok(())
    }

    /// Remove a platform definition from the registry.
    ///
    /// Returns `true` if the platform was present, `false` otherwise.
    pub fn remove(&self, platform_id: &PlatformId) -> bool {
        let mut cache = self.inner.write().expect("acquire write lock on registry");

        let removed = cache.definitions.remove(platform_id).is_some();

        if removed {
            cache.order.retain(|id| id != platform_id);
            debug!(platform_id = %platform_id, "removed platform definition");
        }

        removed
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{DetectionRule, PlatformMetadata};

    fn create_test_definition(id: &str, category: PlatformCategory) -> PlatformDefinition {
        PlatformDefinition {
            platform: PlatformMetadata {
                id: PlatformId::new(id).expect("valid platform ID"),
                name: format!("Test {id}"),
                category,
                url_template: format!("https://{id}.example.com/{{handle}}"),
            },
            detection: DetectionRule::StatusRange {
                found_min: 200,
                found_max: 299,
            },
            extraction: None,
        }
    }

    #[test]
    fn test_registry_new() {
        let registry = PlatformRegistry::new();
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_registry_insert_and_get() {
        let registry = PlatformRegistry::new();
        let definition = create_test_definition("test-platform", PlatformCategory::Social);
        let platform_id = definition.id().clone();

        registry.insert(definition).expect("insert definition");

        let retrieved = registry.get(&platform_id).expect("get definition");
        assert_eq!(retrieved.id(), &platform_id);
        assert_eq!(retrieved.name(), "Test test-platform");
    }

    #[test]
    fn test_registry_get_nonexistent() {
        let registry = PlatformRegistry::new();
        let platform_id = PlatformId::new("nonexistent").expect("valid platform ID");

        let result = registry.get(&platform_id);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), CatalogError::NotFound { .. }));
    }

    #[test]
    fn test_registry_contains_and_remove() {
        let registry = PlatformRegistry::new();
        let definition = create_test_definition("test-platform", PlatformCategory::Social);
        let platform_id = definition.id().clone();

        assert!(!registry.contains(&platform_id));

        registry.insert(definition).expect("insert definition");
        assert!(registry.contains(&platform_id));

        assert!(registry.remove(&platform_id));
        assert!(!registry.contains(&platform_id));
        assert_eq!(registry.count(), 0);

        // Removing again should return false
        assert!(!registry.remove(&platform_id));
    }

    #[test]
    fn test_registry_preserves_insertion_order() {
        let registry = PlatformRegistry::new();

        for id in ["platform-c", "platform-a", "platform-b"] {
            registry
                .insert(create_test_definition(id, PlatformCategory::Social))
                .expect("insert definition");
        }

        let ids: Vec<String> = registry
            .get_all()
            .iter()
            .map(|d| d.id().to_string())
            .collect();
        assert_eq!(ids, vec!["platform-c", "platform-a", "platform-b"]);
    }

    #[test]
    fn test_registry_update_keeps_position() {
        let registry = PlatformRegistry::new();

        registry
            .insert(create_test_definition("platform-a", PlatformCategory::Social))
            .expect("insert platform-a");
        registry
            .insert(create_test_definition("platform-b", PlatformCategory::Social))
            .expect("insert platform-b");

        // Re-insert the first with a new category
        registry
            .insert(create_test_definition(
                "platform-a",
                PlatformCategory::Developer,
            ))
            .expect("update platform-a");

        assert_eq!(registry.count(), 2);
        let all = registry.get_all();
        assert_eq!(all[0].id().as_str(), "platform-a");
        assert_eq!(all[0].category(), PlatformCategory::Developer);
    }

    #[test]
    fn test_registry_get_by_category() {
        let registry = PlatformRegistry::new();

        registry
            .insert(create_test_definition("platform-a", PlatformCategory::Social))
            .expect("insert platform-a");
        registry
            .insert(create_test_definition(
                "platform-b",
                PlatformCategory::Developer,
            ))
            .expect("insert platform-b");
        registry
            .insert(create_test_definition("platform-c", PlatformCategory::Social))
            .expect("insert platform-c");

        let social = registry.get_by_category(PlatformCategory::Social);
        assert_eq!(social.len(), 2);

        let developer = registry.get_by_category(PlatformCategory::Developer);
        assert_eq!(developer.len(), 1);

        let gaming = registry.get_by_category(PlatformCategory::Gaming);
        assert!(gaming.is_empty());
    }
}
