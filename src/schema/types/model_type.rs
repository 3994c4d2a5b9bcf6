use crate::config::{assert_valid_config, assert_valid_keys, hoist_wildcard, ConfigMap, WILDCARD};
use crate::schema::model::{OperationCreator, SchemaModel};
use crate::schema::types::{FieldVariant, ModelField, Operation, SchemaError, Type, TypeRef};
use log::debug;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One level of a model type's extra-type contribution. Transitive expansion
/// and dedup-by-name happen at registry assembly, so duplicates here are
/// allowed.
pub enum ExtraType {
    /// A fully formed type, e.g. an operation's input type.
    Ready(Type),
    /// A nested composed model, referenced by name and materialized through
    /// the registry's model source.
    ModelRef { name: String, config: ConfigMap },
}

/// A [`Type`] whose fields and operations derive from a backing
/// [`SchemaModel`].
///
/// Field resolution asks the model first so introspection can produce a
/// richer, pre-typed field than a bare declaration; explicit config is
/// applied on top and always wins. The model's blacklist is enforced at
/// add-time for every path a field can take into the type.
pub struct ModelType {
    base: Type,
    model: Arc<dyn SchemaModel>,
    operation_configs: BTreeMap<String, ConfigMap>,
    operations: BTreeMap<String, Operation>,
    blacklisted_fields: Vec<String>,
}

impl ModelType {
    pub fn new(model: Arc<dyn SchemaModel>, config: &ConfigMap) -> Result<Self, SchemaError> {
        let type_name = model.type_name();
        if type_name.is_empty() {
            return Err(SchemaError::Resolution(format!(
                "Could not determine a type name for model {}",
                model.source_identifier()
            )));
        }
        let blacklisted_fields = model
            .as_blacklist()
            .map(|b| {
                b.blacklisted_fields()
                    .iter()
                    .map(|name| name.to_lowercase())
                    .collect()
            })
            .unwrap_or_default();
        let mut model_type = Self {
            base: Type::new(type_name),
            model,
            operation_configs: BTreeMap::new(),
            operations: BTreeMap::new(),
            blacklisted_fields,
        };
        model_type.apply_config(config)?;
        Ok(model_type)
    }

    pub fn name(&self) -> &str {
        self.base.name()
    }

    pub fn model(&self) -> &dyn SchemaModel {
        self.model.as_ref()
    }

    pub fn type_def(&self) -> &Type {
        &self.base
    }

    pub fn type_def_mut(&mut self) -> &mut Type {
        &mut self.base
    }

    /// Applies one config fragment for this type. Recognized scopes are
    /// `fields`, `operations`, and `plugins`; anything else fails loud.
    pub fn apply_config(&mut self, config: &ConfigMap) -> Result<(), SchemaError> {
        assert_valid_config(config, &["fields", "operations", "plugins"])?;

        match config.get("fields") {
            None => {}
            Some(Value::String(s)) if s == WILDCARD => self.add_all_fields()?,
            Some(Value::Object(explicit)) => {
                let mut fields = self.initial_fields();
                for (name, data) in explicit {
                    fields.insert(name.clone(), data.clone());
                }
                assert_valid_keys(&fields)?;
                // Wildcard first, so explicit entries can override a subset
                // of whatever it expands to.
                let fields = hoist_wildcard(fields);
                for (name, data) in &fields {
                    if matches!(data, Value::Bool(false)) {
                        self.base.remove_field(name);
                        continue;
                    }
                    if name == WILDCARD {
                        self.add_all_fields()?;
                    } else {
                        self.add_field(name, data)?;
                    }
                }
            }
            Some(_) => {
                return Err(SchemaError::Config(format!(
                    "Fields config for {} must be \"{}\" or a map",
                    self.base.name(),
                    WILDCARD
                )));
            }
        }

        match config.get("operations") {
            None => {}
            Some(Value::String(s)) if s == WILDCARD => self.add_all_operations()?,
            Some(Value::Object(operations)) => self.apply_operations_config(&operations.clone())?,
            Some(_) => {
                return Err(SchemaError::Config(format!(
                    "Operations config for {} must be \"{}\" or a map",
                    self.base.name(),
                    WILDCARD
                )));
            }
        }

        if let Some(plugins) = config.get("plugins") {
            let plugins = plugins.as_object().ok_or_else(|| {
                SchemaError::Config(format!(
                    "Plugins config for {} must be a map",
                    self.base.name()
                ))
            })?;
            self.base.set_plugins(plugins)?;
        }

        Ok(())
    }

    /// Adds a field by spec. Resolution order: ask the model about the
    /// backing property (honoring a `property` alias), fall back to the bare
    /// declaration, fail if no type could be inferred by any means. The
    /// blacklist is checked last, against the final field name.
    pub fn add_field(&mut self, name: &str, config: &Value) -> Result<(), SchemaError> {
        let declared = ModelField::from_config(name, config)?;
        let property = declared.property().to_string();
        let field_config = config.as_object().cloned().unwrap_or_default();

        let field = match self.model.field(&property, &field_config)? {
            Some(mut resolved) => {
                resolved.field_mut().set_name(name);
                match config {
                    Value::Object(map) => {
                        resolved.apply_config(map)?;
                        if let Some(nested) = declared.nested_config() {
                            resolved.set_nested_config(nested.clone());
                        }
                    }
                    Value::String(type_expr) => {
                        resolved.field_mut().set_type(TypeRef::parse(type_expr)?);
                    }
                    _ => {}
                }
                resolved
            }
            None => {
                if declared.field().type_ref().is_none() {
                    return Err(SchemaError::Resolution(format!(
                        "Field {} on type {} could not infer a type; check that the property \
                         exists on the model or give an explicit type",
                        name,
                        self.base.name()
                    )));
                }
                declared
            }
        };

        if field.nested_config().is_some() && field.model_type_name().is_none() {
            return Err(SchemaError::Config(format!(
                "Field {} on type {} declares nested fields but does not resolve to a composed model",
                name,
                self.base.name()
            )));
        }

        self.add_field_obj(field.into())
    }

    /// Adds a fully formed field verbatim (the programmatic escape hatch).
    /// The blacklist still applies: a model-level policy cannot be bypassed
    /// by how the field was constructed.
    pub fn add_field_obj(&mut self, field: FieldVariant) -> Result<(), SchemaError> {
        let lowered = field.name().to_lowercase();
        if self.blacklisted_fields.contains(&lowered) {
            return Err(SchemaError::Policy(format!(
                "Field {} is not allowed on {}",
                field.name(),
                self.model.source_identifier()
            )));
        }
        self.base.add_field_obj(field);
        Ok(())
    }

    /// Adds default and base fields first (required scaffolding), then every
    /// remaining field the model enumerates. First writer wins within this
    /// implicit pass; explicit config processed afterwards can still
    /// override.
    pub fn add_all_fields(&mut self) -> Result<(), SchemaError> {
        let initial = self.initial_fields();
        for (name, data) in &initial {
            self.add_field(name, data)?;
        }
        for name in self.model.all_field_names() {
            if self.base.field_by_name(&name).is_none() {
                self.add_field(&name, &Value::Bool(true))?;
            }
        }
        Ok(())
    }

    /// Registers every operation identifier the model declares support for.
    /// A model without the operation capability cannot expand the wildcard;
    /// silently dropping all CRUD surface would be worse than failing here.
    pub fn add_all_operations(&mut self) -> Result<(), SchemaError> {
        let identifiers = match self.model.as_operation_provider() {
            Some(provider) => provider.all_operation_identifiers(),
            None => {
                return Err(SchemaError::Resolution(format!(
                    "Model for {} does not provide operations; the operation wildcard cannot \
                     be expanded",
                    self.base.name()
                )));
            }
        };
        let mut operations = ConfigMap::new();
        for identifier in identifiers {
            operations.insert(identifier, Value::Bool(true));
        }
        self.apply_operations_config(&operations)
    }

    pub fn apply_operations_config(&mut self, operations: &ConfigMap) -> Result<(), SchemaError> {
        assert_valid_keys(operations)?;
        for (identifier, data) in operations {
            if matches!(data, Value::Bool(false)) {
                self.operation_configs.remove(identifier);
                continue;
            }
            // The wildcard is allowed here too, so individual operations can
            // be overridden after it expands.
            if identifier == WILDCARD {
                self.add_all_operations()?;
                continue;
            }
            match data {
                Value::Bool(true) => self.add_operation(identifier, ConfigMap::new()),
                Value::Object(config) => self.add_operation(identifier, config.clone()),
                _ => {
                    return Err(SchemaError::Config(format!(
                        "Operation config for {} must be a map or true",
                        identifier
                    )));
                }
            }
        }
        Ok(())
    }

    /// Registers or replaces an operation's config.
    pub fn add_operation(&mut self, identifier: &str, config: ConfigMap) {
        self.operation_configs.insert(identifier.to_string(), config);
    }

    pub fn remove_operation(&mut self, identifier: &str) {
        self.operation_configs.remove(identifier);
    }

    /// Merges config into an already registered operation. Updating an
    /// operation that was never added is a hard failure.
    pub fn update_operation(&mut self, identifier: &str, config: &ConfigMap) -> Result<(), SchemaError> {
        match self.operation_configs.get_mut(identifier) {
            Some(existing) => {
                for (key, value) in config {
                    existing.insert(key.clone(), value.clone());
                }
                Ok(())
            }
            None => Err(SchemaError::Resolution(format!(
                "Cannot update nonexistent operation {} on {}",
                identifier,
                self.base.name()
            ))),
        }
    }

    pub fn operation_configs(&self) -> &BTreeMap<String, ConfigMap> {
        &self.operation_configs
    }

    /// Synthesizes every registered operation through its creator. The cache
    /// is recomputed from scratch, so repeated builds with unchanged config
    /// yield the same operation set.
    pub fn build_operations(&mut self) -> Result<(), SchemaError> {
        let mut operations = BTreeMap::new();
        for (identifier, config) in &self.operation_configs {
            let creator = self.operation_creator(identifier)?;
            match creator.create_operation(self.model.as_ref(), self.base.name(), config)? {
                Some(mut operation) => {
                    if let Some(provider) = self.model.as_operation_provider() {
                        let defaults = provider.operation_config(identifier);
                        if let Some(Value::Object(plugins)) = defaults.get("plugins") {
                            operation.set_default_plugins(plugins)?;
                        }
                    }
                    operations.insert(identifier.clone(), operation);
                }
                None => {
                    debug!(
                        "Operation creator for {} declined on {}",
                        identifier,
                        self.base.name()
                    );
                }
            }
        }
        self.operations = operations;
        Ok(())
    }

    pub fn operations(&self) -> &BTreeMap<String, Operation> {
        &self.operations
    }

    /// One level of the types this type pulls into the schema graph: input
    /// types from operation creators, nested composed models behind fields,
    /// and anything the model itself contributes.
    pub fn extra_types(&self) -> Result<Vec<ExtraType>, SchemaError> {
        let mut extras = Vec::new();
        for (identifier, config) in &self.operation_configs {
            let creator = self.operation_creator(identifier)?;
            if let Some(provider) = creator.as_input_type_provider() {
                for input_type in provider.provide_input_types(self, config)? {
                    if !input_type.is_input() {
                        return Err(SchemaError::Config(format!(
                            "Operation {} on {} contributed a non-input type {}",
                            identifier,
                            self.base.name(),
                            input_type.name()
                        )));
                    }
                    extras.push(ExtraType::Ready(input_type));
                }
            }
        }
        for field in self.base.fields().values() {
            if let Some(model_field) = field.as_model() {
                if let Some(nested) = model_field.model_type_name() {
                    extras.push(ExtraType::ModelRef {
                        name: nested.to_string(),
                        config: model_field.nested_config().cloned().unwrap_or_default(),
                    });
                }
            }
        }
        if let Some(provider) = self.model.as_extra_types() {
            extras.extend(provider.extra_types()?.into_iter().map(ExtraType::Ready));
        }
        Ok(extras)
    }

    /// Final integrity gate: every required base field must have survived
    /// field resolution and config overrides.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if let Some(provider) = self.model.as_base_fields() {
            for name in provider.base_fields().keys() {
                if self.base.field_by_name(name).is_none() {
                    return Err(SchemaError::Policy(format!(
                        "Required base field {} was not on type {}",
                        name,
                        self.base.name()
                    )));
                }
            }
        }
        self.base.validate()
    }

    /// Merges another model type of the same name into this one: operation
    /// configs replace per identifier, fields union last-write-wins.
    pub fn merge_with(&mut self, other: ModelType) {
        for (identifier, config) in other.operation_configs {
            self.operation_configs.insert(identifier, config);
        }
        self.base.merge_with(other.base);
    }

    fn initial_fields(&self) -> ConfigMap {
        let mut fields = self
            .model
            .as_default_fields()
            .map(|provider| provider.default_fields())
            .unwrap_or_default();
        if let Some(provider) = self.model.as_base_fields() {
            for (name, data) in provider.base_fields() {
                fields.insert(name, data);
            }
        }
        fields
    }

    fn operation_creator(&self, identifier: &str) -> Result<Arc<dyn OperationCreator>, SchemaError> {
        self.model
            .as_operation_provider()
            .and_then(|provider| provider.operation_creator(identifier))
            .ok_or_else(|| {
                SchemaError::Resolution(format!(
                    "Invalid operation {} on {}",
                    identifier,
                    self.base.name()
                ))
            })
    }
}

impl std::fmt::Debug for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelType")
            .field("base", &self.base)
            .field("source", &self.model.source_identifier())
            .field("operation_configs", &self.operation_configs)
            .field("blacklisted_fields", &self.blacklisted_fields)
            .finish()
    }
}
