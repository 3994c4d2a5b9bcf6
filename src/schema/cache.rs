use crate::schema::registry::CompiledSchema;
use crate::schema::types::SchemaError;
use log::info;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

static CACHE: Lazy<Mutex<HashMap<String, Arc<CompiledSchema>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Process-wide cache of compiled schemas, keyed by schema key.
///
/// The lifecycle is explicit: a key is populated at most once, replaced only
/// through [`invalidate`] followed by a fresh [`populate`]. Keeping the
/// lifecycle an API rather than a side effect of first access is what makes
/// rebuilds observable.
///
/// [`invalidate`]: CompiledSchemaCache::invalidate
/// [`populate`]: CompiledSchemaCache::populate
pub struct CompiledSchemaCache;

impl CompiledSchemaCache {
    pub fn get(key: &str) -> Option<Arc<CompiledSchema>> {
        CACHE.lock().ok()?.get(key).cloned()
    }

    /// Populates a key. Populating an already-populated key without an
    /// intervening invalidation is a configuration error: serving code must
    /// never have a schema swapped underneath it implicitly.
    pub fn populate(key: &str, schema: CompiledSchema) -> Result<Arc<CompiledSchema>, SchemaError> {
        let mut cache = CACHE
            .lock()
            .map_err(|_| SchemaError::Storage("Schema cache lock poisoned".to_string()))?;
        if cache.contains_key(key) {
            return Err(SchemaError::Config(format!(
                "Schema cache already populated for key {}; invalidate before rebuilding",
                key
            )));
        }
        info!("Populating compiled schema cache for '{}'", key);
        let shared = Arc::new(schema);
        cache.insert(key.to_string(), Arc::clone(&shared));
        Ok(shared)
    }

    /// Removes a key so the next build cycle can repopulate it. Returns
    /// whether anything was cached.
    pub fn invalidate(key: &str) -> bool {
        let Ok(mut cache) = CACHE.lock() else {
            return false;
        };
        let removed = cache.remove(key).is_some();
        if removed {
            info!("Invalidated compiled schema cache for '{}'", key);
        }
        removed
    }

    pub fn clear() {
        if let Ok(mut cache) = CACHE.lock() {
            cache.clear();
        }
    }
}
