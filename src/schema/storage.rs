use crate::schema::registry::CompiledSchema;
use crate::schema::types::SchemaError;
use log::info;
use sled::Tree;

/// The storage boundary: opaque keyed persistence for compiled schema
/// artifacts. The engine never interprets the stored blob beyond
/// round-tripping its own artifact type.
pub trait SchemaStorage: Send + Sync {
    fn put(&self, key: &str, schema: &CompiledSchema) -> Result<(), SchemaError>;

    fn get(&self, key: &str) -> Result<Option<CompiledSchema>, SchemaError>;
}

/// Sled-backed artifact storage: one tree of JSON blobs keyed by schema key.
pub struct SledSchemaStorage {
    tree: Tree,
}

impl SledSchemaStorage {
    /// Opens (or creates) the backing database at `path`.
    pub fn open(path: &str) -> Result<Self, SchemaError> {
        let db = sled::open(path)?;
        let tree = db.open_tree("compiled_schemas")?;
        Ok(Self { tree })
    }

    /// Wraps an existing sled tree.
    pub fn with_tree(tree: Tree) -> Self {
        Self { tree }
    }
}

impl SchemaStorage for SledSchemaStorage {
    fn put(&self, key: &str, schema: &CompiledSchema) -> Result<(), SchemaError> {
        info!("Persisting compiled schema '{}'", key);
        let bytes = serde_json::to_vec(schema)?;
        self.tree.insert(key.as_bytes(), bytes)?;
        self.tree.flush()?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<CompiledSchema>, SchemaError> {
        match self.tree.get(key.as_bytes())? {
            Some(bytes) => {
                let schema = serde_json::from_slice(&bytes)?;
                Ok(Some(schema))
            }
            None => Ok(None),
        }
    }
}
