//! Contracts for the backing data model.
//!
//! A [`SchemaModel`] describes one named entity in an external data source.
//! Behavior varies by which optional capabilities the implementation
//! supports; the composition engine asks through the `as_*` accessors rather
//! than relying on a type hierarchy. An accessor returning `None` means the
//! capability is absent.

use crate::config::ConfigMap;
use crate::schema::types::{ModelField, ModelType, Operation, SchemaError, Type};
use std::sync::Arc;

/// Abstraction over a backing data source's named entity: its field list and
/// how individual properties resolve into typed fields.
pub trait SchemaModel: Send + Sync {
    /// Opaque handle identifying the real data source entity, used in error
    /// messages and policy reporting.
    fn source_identifier(&self) -> &str;

    /// The API type name derived for this entity. An empty name fails
    /// [`ModelType::new`].
    fn type_name(&self) -> String;

    /// Resolves a property path into a field by introspecting the backing
    /// entity. Returns `Ok(None)` when the property is unknown; the caller
    /// then falls back to the declared config alone.
    fn field(&self, property: &str, config: &ConfigMap)
        -> Result<Option<ModelField>, SchemaError>;

    /// Every property the model can enumerate.
    fn all_field_names(&self) -> Vec<String>;

    fn as_default_fields(&self) -> Option<&dyn DefaultFieldsProvider> {
        None
    }

    fn as_base_fields(&self) -> Option<&dyn BaseFieldsProvider> {
        None
    }

    fn as_operation_provider(&self) -> Option<&dyn OperationProvider> {
        None
    }

    fn as_blacklist(&self) -> Option<&dyn ModelBlacklist> {
        None
    }

    fn as_extra_types(&self) -> Option<&dyn ExtraTypeProvider> {
        None
    }
}

/// Fields added implicitly before any explicit config is consumed.
pub trait DefaultFieldsProvider {
    fn default_fields(&self) -> ConfigMap;
}

/// Required scaffolding fields (e.g. identifiers). Their presence is asserted
/// by the post-build validation gate.
pub trait BaseFieldsProvider {
    fn base_fields(&self) -> ConfigMap;
}

/// Operation support: which CRUD-style identifiers the model understands and
/// who synthesizes them.
pub trait OperationProvider {
    fn all_operation_identifiers(&self) -> Vec<String>;

    fn operation_creator(&self, identifier: &str) -> Option<Arc<dyn OperationCreator>>;

    /// Model-configuration defaults for one operation identifier, e.g. a
    /// `plugins` map every `read` operation should absorb.
    fn operation_config(&self, _identifier: &str) -> ConfigMap {
        ConfigMap::new()
    }
}

/// A model-level field blacklist: names listed here can never be exposed via
/// the API, regardless of config.
pub trait ModelBlacklist {
    fn blacklisted_fields(&self) -> Vec<String>;
}

/// Cross-cutting types the model contributes independent of any single field.
pub trait ExtraTypeProvider {
    fn extra_types(&self) -> Result<Vec<Type>, SchemaError>;
}

/// Synthesizes one operation for a model type. A creator may decline by
/// returning `Ok(None)`, in which case the identifier produces no field.
pub trait OperationCreator: Send + Sync {
    fn create_operation(
        &self,
        model: &dyn SchemaModel,
        type_name: &str,
        config: &ConfigMap,
    ) -> Result<Option<Operation>, SchemaError>;

    fn as_input_type_provider(&self) -> Option<&dyn InputTypeProvider> {
        None
    }
}

/// Input types an operation contributes to the schema graph (e.g. a filter or
/// create-payload type).
pub trait InputTypeProvider {
    fn provide_input_types(
        &self,
        owner: &ModelType,
        config: &ConfigMap,
    ) -> Result<Vec<Type>, SchemaError>;
}

/// Supplies models by name. Fragment discovery and dependency wiring live
/// outside the engine; the registry only ever asks for a model here.
pub trait ModelSource: Send + Sync {
    fn model(&self, name: &str) -> Option<Arc<dyn SchemaModel>>;
}
