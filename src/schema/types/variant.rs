use crate::config::ConfigMap;
use crate::schema::types::{Field, ModelField, SchemaError, TypeRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The two shapes a field can take on a type: a plain declared field, or a
/// model-derived field carrying its backing property path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FieldVariant {
    Plain(Field),
    Model(ModelField),
}

impl FieldVariant {
    pub fn name(&self) -> &str {
        match self {
            FieldVariant::Plain(field) => field.name(),
            FieldVariant::Model(field) => field.name(),
        }
    }

    pub fn field(&self) -> &Field {
        match self {
            FieldVariant::Plain(field) => field,
            FieldVariant::Model(field) => field.field(),
        }
    }

    pub fn field_mut(&mut self) -> &mut Field {
        match self {
            FieldVariant::Plain(field) => field,
            FieldVariant::Model(field) => field.field_mut(),
        }
    }

    pub fn type_ref(&self) -> Option<&TypeRef> {
        self.field().type_ref()
    }

    pub fn as_model(&self) -> Option<&ModelField> {
        match self {
            FieldVariant::Model(field) => Some(field),
            FieldVariant::Plain(_) => None,
        }
    }

    pub fn apply_config(&mut self, config: &ConfigMap) -> Result<(), SchemaError> {
        match self {
            FieldVariant::Plain(field) => field.apply_config(config),
            FieldVariant::Model(field) => field.apply_config(config),
        }
    }

    pub(crate) fn rename_types(&mut self, lookup: &BTreeMap<String, String>) {
        self.field_mut().rename_types(lookup);
    }
}

impl From<Field> for FieldVariant {
    fn from(field: Field) -> Self {
        FieldVariant::Plain(field)
    }
}

impl From<ModelField> for FieldVariant {
    fn from(field: ModelField) -> Self {
        FieldVariant::Model(field)
    }
}
