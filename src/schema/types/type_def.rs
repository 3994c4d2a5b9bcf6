use crate::config::{assert_valid_config, assert_valid_keys, ConfigMap};
use crate::schema::types::field::{parse_plugin_config, PLAIN_FIELD_CONFIG_KEYS};
use crate::schema::types::{Field, FieldVariant, SchemaError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A named composite shape in the served schema: an ordered collection of
/// fields plus plugin bindings. Input types contributed by operations are
/// Types flagged with `is_input`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Type {
    name: String,
    fields: BTreeMap<String, FieldVariant>,
    plugins: BTreeMap<String, ConfigMap>,
    is_input: bool,
}

impl Type {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
            plugins: BTreeMap::new(),
            is_input: false,
        }
    }

    /// An input type, as contributed by an operation creator.
    pub fn input(name: impl Into<String>) -> Self {
        let mut type_def = Self::new(name);
        type_def.is_input = true;
        type_def
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_input(&self) -> bool {
        self.is_input
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldVariant> {
        &self.fields
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldVariant> {
        self.fields.get(name)
    }

    pub fn remove_field(&mut self, name: &str) -> bool {
        self.fields.remove(name).is_some()
    }

    /// Adds a fully formed field, replacing any previous field of the same
    /// name.
    pub fn add_field_obj(&mut self, field: impl Into<FieldVariant>) {
        let field = field.into();
        self.fields.insert(field.name().to_string(), field);
    }

    /// Adds a field from a config spec: a type string, or a map of field
    /// config. Plain types have no model to infer from, so a missing type is
    /// a resolution error here.
    pub fn add_field(&mut self, name: &str, config: &Value) -> Result<(), SchemaError> {
        let mut field = Field::new(name);
        match config {
            Value::String(type_expr) => {
                field.set_type(crate::schema::types::TypeRef::parse(type_expr)?);
            }
            Value::Object(map) => {
                assert_valid_config(map, PLAIN_FIELD_CONFIG_KEYS)?;
                field.apply_config(map)?;
            }
            _ => {
                return Err(SchemaError::Config(format!(
                    "Invalid field config for {} on {}: expected a type string or a map",
                    name, self.name
                )));
            }
        }
        if field.type_ref().is_none() {
            return Err(SchemaError::Resolution(format!(
                "Field {} on type {} has no type and no model to infer one from",
                name, self.name
            )));
        }
        self.add_field_obj(field);
        Ok(())
    }

    pub fn plugins(&self) -> &BTreeMap<String, ConfigMap> {
        &self.plugins
    }

    pub fn set_plugins(&mut self, plugins: &ConfigMap) -> Result<(), SchemaError> {
        for (name, cfg) in parse_plugin_config(plugins)? {
            self.plugins.insert(name, cfg);
        }
        Ok(())
    }

    /// Applies a config fragment to a plain type. Model types layer their own
    /// handling on top of this.
    pub fn apply_config(&mut self, config: &ConfigMap) -> Result<(), SchemaError> {
        assert_valid_config(config, &["fields", "plugins", "input"])?;
        if let Some(Value::Bool(input)) = config.get("input") {
            self.is_input = *input;
        }
        if let Some(fields) = config.get("fields") {
            let fields = fields.as_object().ok_or_else(|| {
                SchemaError::Config(format!("Fields config for type {} must be a map", self.name))
            })?;
            assert_valid_keys(fields)?;
            for (field_name, data) in fields {
                if matches!(data, Value::Bool(false)) {
                    self.fields.remove(field_name);
                } else {
                    self.add_field(field_name, data)?;
                }
            }
        }
        if let Some(plugins) = config.get("plugins") {
            let plugins = plugins.as_object().ok_or_else(|| {
                SchemaError::Config(format!("Plugins config for type {} must be a map", self.name))
            })?;
            self.set_plugins(plugins)?;
        }
        Ok(())
    }

    /// Recursively unions another type's fields into this one, last write
    /// winning per field name. Plugin bindings union the same way.
    pub fn merge_with(&mut self, other: Type) {
        for (name, field) in other.fields {
            self.fields.insert(name, field);
        }
        for (name, cfg) in other.plugins {
            self.plugins.insert(name, cfg);
        }
        self.is_input = self.is_input || other.is_input;
    }

    /// Final integrity gate: a servable type has a name and a resolved type
    /// on every field.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::Config("Type has no name".to_string()));
        }
        for (name, field) in &self.fields {
            if field.type_ref().is_none() {
                return Err(SchemaError::Resolution(format!(
                    "Field {} on type {} has no resolved type",
                    name, self.name
                )));
            }
        }
        Ok(())
    }

    /// Renames this type and every type reference its fields carry through
    /// the obfuscation lookup.
    pub(crate) fn rename_types(&mut self, lookup: &BTreeMap<String, String>) {
        if let Some(renamed) = lookup.get(&self.name) {
            self.name = renamed.clone();
        }
        for field in self.fields.values_mut() {
            field.rename_types(lookup);
        }
    }
}
