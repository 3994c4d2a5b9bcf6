use crate::config::ConfigMap;
use crate::schema::types::{Field, SchemaError};
use serde::{Deserialize, Serialize};

/// Which root type a synthesized operation is exposed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Query,
    Mutation,
}

/// A synthesized entry point (read-one, read-many, create, update, delete)
/// built by an operation creator for a model type. Operations are not
/// declared as fields; a successfully created one is exposed as a field on
/// the root type matching its kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    identifier: String,
    kind: OperationKind,
    field: Field,
    config: ConfigMap,
}

impl Operation {
    pub fn new(
        identifier: impl Into<String>,
        kind: OperationKind,
        field: Field,
        config: ConfigMap,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
            field,
            config,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut Field {
        &mut self.field
    }

    pub fn config(&self) -> &ConfigMap {
        &self.config
    }

    /// Absorbs model-level default plugin bindings for this operation's
    /// identifier. Explicit bindings on the operation win.
    pub fn set_default_plugins(&mut self, defaults: &ConfigMap) -> Result<(), SchemaError> {
        self.field.set_default_plugins(defaults)
    }
}
