pub mod errors;
pub mod field;
pub mod model_field;
pub mod model_type;
pub mod operation;
pub mod type_def;
pub mod type_ref;
pub mod variant;

pub use errors::SchemaError;
pub use field::Field;
pub use model_field::{ModelField, PropertyPath};
pub use model_type::{ExtraType, ModelType};
pub use operation::{Operation, OperationKind};
pub use type_def::Type;
pub use type_ref::TypeRef;
pub use variant::FieldVariant;
