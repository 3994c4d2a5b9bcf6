pub mod cache;
pub mod model;
pub mod obfuscator;
pub mod registry;
pub mod storage;
pub mod types;

pub use cache::CompiledSchemaCache;
pub use obfuscator::{HashNameObfuscator, NameObfuscator, PlainNameObfuscator};
pub use registry::{CompiledSchema, SchemaRegistry, SchemaType};
pub use storage::{SchemaStorage, SledSchemaStorage};
pub use types::{
    Field, FieldVariant, ModelField, ModelType, Operation, OperationKind, PropertyPath,
    SchemaError, Type, TypeRef,
};
