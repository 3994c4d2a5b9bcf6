use crate::config::{assert_valid_config, ConfigMap};
use crate::schema::types::{SchemaError, TypeRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Config keys recognized on a field entry. `property` and `fields` are
/// consumed by the model-aware layer; they are listed here so a field config
/// carrying them passes the allow-list check.
pub(crate) const FIELD_CONFIG_KEYS: &[&str] = &[
    "type",
    "description",
    "args",
    "resolver",
    "plugins",
    "property",
    "fields",
];

/// The subset valid on a plain type's field entry. `property` and `fields`
/// only mean something with a backing model, so a plain type rejects them.
pub(crate) const PLAIN_FIELD_CONFIG_KEYS: &[&str] =
    &["type", "description", "args", "resolver", "plugins"];

/// A named, typed, resolvable unit of output on a [`Type`].
///
/// The resolver binding is an opaque identifier for an externally registered
/// resolver; the engine stores and exposes it but never invokes it.
///
/// [`Type`]: crate::schema::types::Type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    name: String,
    type_ref: Option<TypeRef>,
    description: Option<String>,
    args: BTreeMap<String, TypeRef>,
    resolver: Option<String>,
    plugins: BTreeMap<String, ConfigMap>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_ref: None,
            description: None,
            args: BTreeMap::new(),
            resolver: None,
            plugins: BTreeMap::new(),
        }
    }

    /// Convenience constructor for a field with a parsed type expression.
    pub fn with_type(name: impl Into<String>, type_expr: &str) -> Result<Self, SchemaError> {
        let mut field = Self::new(name);
        field.type_ref = Some(TypeRef::parse(type_expr)?);
        Ok(field)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn type_ref(&self) -> Option<&TypeRef> {
        self.type_ref.as_ref()
    }

    pub fn set_type(&mut self, type_ref: TypeRef) {
        self.type_ref = Some(type_ref);
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn args(&self) -> &BTreeMap<String, TypeRef> {
        &self.args
    }

    pub fn add_arg(&mut self, name: impl Into<String>, type_expr: &str) -> Result<(), SchemaError> {
        self.args.insert(name.into(), TypeRef::parse(type_expr)?);
        Ok(())
    }

    pub fn resolver(&self) -> Option<&str> {
        self.resolver.as_deref()
    }

    pub fn set_resolver(&mut self, resolver: impl Into<String>) {
        self.resolver = Some(resolver.into());
    }

    pub fn plugins(&self) -> &BTreeMap<String, ConfigMap> {
        &self.plugins
    }

    pub fn add_plugin(&mut self, name: impl Into<String>, config: ConfigMap) {
        self.plugins.insert(name.into(), config);
    }

    /// Applies inline config overrides. Explicit config always wins over
    /// anything inferred earlier.
    pub fn apply_config(&mut self, config: &ConfigMap) -> Result<(), SchemaError> {
        assert_valid_config(config, FIELD_CONFIG_KEYS)?;
        if let Some(type_value) = config.get("type") {
            let type_str = type_value.as_str().ok_or_else(|| {
                SchemaError::Config(format!("Field {} type must be a string", self.name))
            })?;
            self.type_ref = Some(TypeRef::parse(type_str)?);
        }
        if let Some(Value::String(description)) = config.get("description") {
            self.description = Some(description.clone());
        }
        if let Some(args) = config.get("args") {
            let args = args.as_object().ok_or_else(|| {
                SchemaError::Config(format!("Field {} args must be a map", self.name))
            })?;
            for (arg_name, arg_type) in args {
                let type_str = arg_type.as_str().ok_or_else(|| {
                    SchemaError::Config(format!(
                        "Argument {} on field {} must map to a type string",
                        arg_name, self.name
                    ))
                })?;
                self.args.insert(arg_name.clone(), TypeRef::parse(type_str)?);
            }
        }
        if let Some(Value::String(resolver)) = config.get("resolver") {
            self.resolver = Some(resolver.clone());
        }
        if let Some(plugins) = config.get("plugins") {
            let plugins = plugins.as_object().ok_or_else(|| {
                SchemaError::Config(format!("Field {} plugins must be a map", self.name))
            })?;
            for (name, cfg) in parse_plugin_config(plugins)? {
                self.plugins.insert(name, cfg);
            }
        }
        Ok(())
    }

    /// Absorbs default plugin bindings for this field's operation identifier.
    /// An explicitly configured plugin of the same name wins.
    pub fn set_default_plugins(&mut self, defaults: &ConfigMap) -> Result<(), SchemaError> {
        for (name, cfg) in parse_plugin_config(defaults)? {
            self.plugins.entry(name).or_insert(cfg);
        }
        Ok(())
    }

    /// Renames this field's type references through the obfuscation lookup.
    pub(crate) fn rename_types(&mut self, lookup: &BTreeMap<String, String>) {
        if let Some(type_ref) = &self.type_ref {
            self.type_ref = Some(type_ref.renamed(lookup));
        }
        for type_ref in self.args.values_mut() {
            *type_ref = type_ref.renamed(lookup);
        }
    }
}

/// Parses a plugin binding map: each entry is `true` (empty config) or a
/// config object.
pub(crate) fn parse_plugin_config(
    plugins: &ConfigMap,
) -> Result<BTreeMap<String, ConfigMap>, SchemaError> {
    let mut parsed = BTreeMap::new();
    for (name, value) in plugins {
        match value {
            Value::Bool(true) => {
                parsed.insert(name.clone(), ConfigMap::new());
            }
            Value::Bool(false) => {
                parsed.remove(name);
            }
            Value::Object(cfg) => {
                parsed.insert(name.clone(), cfg.clone());
            }
            _ => {
                return Err(SchemaError::Config(format!(
                    "Plugin {} must be configured with true or a map",
                    name
                )));
            }
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: serde_json::Value) -> ConfigMap {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn config_overrides_inferred_type() {
        let mut field = Field::with_type("title", "String").unwrap();
        field
            .apply_config(&config(json!({ "type": "ID", "description": "identifier" })))
            .unwrap();
        assert_eq!(field.type_ref().unwrap().to_string(), "ID");
        assert_eq!(field.description(), Some("identifier"));
    }

    #[test]
    fn unknown_field_config_key_fails() {
        let mut field = Field::new("title");
        let err = field.apply_config(&config(json!({ "typ": "ID" })));
        assert!(matches!(err, Err(SchemaError::Config(_))));
    }

    #[test]
    fn default_plugins_do_not_override_explicit_ones() {
        let mut field = Field::with_type("books", "[Book]").unwrap();
        field.add_plugin("paginate", config(json!({ "limit": 5 })));
        field
            .set_default_plugins(&config(json!({ "paginate": { "limit": 100 }, "sort": true })))
            .unwrap();
        assert_eq!(field.plugins()["paginate"], config(json!({ "limit": 5 })));
        assert!(field.plugins().contains_key("sort"));
    }
}
