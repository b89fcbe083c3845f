//! In-process caching of objects built by the authority factory

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::model::Object;

/// Cache key combining the table, authority and code of a stored object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub table: String,
    pub authority: String,
    pub code: String,
}

impl CacheKey {
    pub fn new(table: &str, authority: &str, code: &str) -> Self {
        Self {
            table: table.to_string(),
            authority: authority.to_string(),
            code: code.to_string(),
        }
    }
}

/// In-process cache for objects resolved from the metadata repository
#[derive(Debug, Clone)]
pub struct ObjectCache {
    cache: Arc<Mutex<HashMap<CacheKey, Arc<Object>>>>,
}

impl ObjectCache {
    /// Create a new empty object cache
    pub fn new() -> Self {
        Self {
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<CacheKey, Arc<Object>>>> {
        self.cache.lock().map_err(|_| Error::LockPoisoned {
            context: "object cache".to_string(),
        })
    }

    /// Get a cached object, or build and cache it if not present
    pub fn get_or_process<F>(&self, key: CacheKey, processor: F) -> Result<Arc<Object>>
    where
        F: FnOnce() -> Result<Object>,
    {
        // The lock is not held while building: builders recurse into the cache
        {
            let cache = self.lock()?;
            if let Some(cached) = cache.get(&key) {
                log::debug!("Cache hit for {}:{} in {}", key.authority, key.code, key.table);
                return Ok(Arc::clone(cached));
            }
        }

        let result = Arc::new(processor()?);

        {
            let mut cache = self.lock()?;
            cache.insert(key, Arc::clone(&result));
        }

        Ok(result)
    }

    /// Get a value from cache without computing
    pub fn get(&self, key: &CacheKey) -> Result<Option<Arc<Object>>> {
        Ok(self.lock()?.get(key).cloned())
    }

    /// Get the number of cached entries
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }
}

impl Default for ObjectCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UnitOfMeasure;

    #[test]
    fn test_cache_key() {
        let key1 = CacheKey::new("ellipsoid", "EPSG", "7030");
        let key2 = CacheKey::new("ellipsoid", "EPSG", "7030");
        let key3 = CacheKey::new("geodetic_datum", "EPSG", "7030");

        assert_eq!(key1, key2);
        assert_ne!(key1, key3);
    }

    #[test]
    fn test_cache_get_or_process() {
        let cache = ObjectCache::new();
        let key = CacheKey::new("unit_of_measure", "EPSG", "9001");

        // First call should execute processor
        let call_count = Arc::new(Mutex::new(0));
        let call_count_clone = Arc::clone(&call_count);

        let result1 = cache
            .get_or_process(key.clone(), || {
                *call_count_clone.lock().unwrap() += 1;
                Ok(Object::Unit(UnitOfMeasure::metre()))
            })
            .unwrap();

        assert_eq!(*call_count.lock().unwrap(), 1);
        assert_eq!(result1.name(), "metre");

        // Second call should use cached result
        let call_count_clone = Arc::clone(&call_count);
        let result2 = cache
            .get_or_process(key, || {
                *call_count_clone.lock().unwrap() += 1;
                Ok(Object::Unit(UnitOfMeasure::degree()))
            })
            .unwrap();

        assert_eq!(*call_count.lock().unwrap(), 1); // Still 1, processor not called
        assert_eq!(result2.name(), "metre");
        assert!(Arc::ptr_eq(&result1, &result2));
    }

    #[test]
    fn test_failed_processing_is_not_cached() {
        let cache = ObjectCache::new();
        let key = CacheKey::new("ellipsoid", "EPSG", "1");
        assert!(cache
            .get_or_process(key.clone(), || Err(Error::factory("boom")))
            .is_err());
        assert!(cache.get(&key).unwrap().is_none());
    }

    #[test]
    fn test_cache_operations() {
        let cache = ObjectCache::new();
        let key = CacheKey::new("unit_of_measure", "EPSG", "9122");

        // Initially empty
        assert!(cache.is_empty().unwrap());
        assert_eq!(cache.len().unwrap(), 0);
        assert!(cache.get(&key).unwrap().is_none());

        cache
            .get_or_process(key.clone(), || Ok(Object::Unit(UnitOfMeasure::degree())))
            .unwrap();

        // Now has content
        assert!(!cache.is_empty().unwrap());
        assert_eq!(cache.len().unwrap(), 1);

        // Get
        let retrieved = cache.get(&key).unwrap().unwrap();
        assert_eq!(retrieved.name(), "degree");
    }

    #[test]
    fn test_cache_default() {
        let cache = ObjectCache::default();
        assert!(cache.is_empty().unwrap());
        assert_eq!(cache.len().unwrap(), 0);
    }
}
