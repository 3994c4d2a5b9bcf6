use crate::config::{assert_valid_config, merge, ConfigMap, WILDCARD};
use crate::query::QueryLimits;
use crate::schema::model::ModelSource;
use crate::schema::obfuscator::{NameObfuscator, PlainNameObfuscator};
use crate::schema::types::field::parse_plugin_config;
use crate::schema::types::{
    ExtraType, ModelType, OperationKind, SchemaError, Type,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Reserved root type names; operations are exposed as fields on these.
const QUERY_ROOT: &str = "Query";
const MUTATION_ROOT: &str = "Mutation";

/// A registered type: plain, or derived from a capability model.
pub enum SchemaType {
    Plain(Type),
    Model(ModelType),
}

impl SchemaType {
    pub fn name(&self) -> &str {
        match self {
            SchemaType::Plain(type_def) => type_def.name(),
            SchemaType::Model(model_type) => model_type.name(),
        }
    }

    pub fn type_def(&self) -> &Type {
        match self {
            SchemaType::Plain(type_def) => type_def,
            SchemaType::Model(model_type) => model_type.type_def(),
        }
    }

    pub fn as_model(&self) -> Option<&ModelType> {
        match self {
            SchemaType::Model(model_type) => Some(model_type),
            SchemaType::Plain(_) => None,
        }
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        match self {
            SchemaType::Plain(type_def) => type_def.validate(),
            SchemaType::Model(model_type) => model_type.validate(),
        }
    }
}

/// The finalized, immutable build artifact: flattened types with
/// (optionally obfuscated) names plus the opaque-to-original lookup. Safe to
/// share across query-serving threads; replaced wholesale by a rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledSchema {
    key: String,
    types: BTreeMap<String, Type>,
    name_lookup: BTreeMap<String, String>,
}

impl CompiledSchema {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn types(&self) -> &BTreeMap<String, Type> {
        &self.types
    }

    pub fn type_by_name(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    /// The lookup-back path from an opaque persisted name to the original.
    pub fn original_name(&self, opaque: &str) -> Option<&str> {
        self.name_lookup.get(opaque).map(String::as_str)
    }
}

/// Process-wide-per-key registry of named types, plugins, and configuration.
///
/// Lifecycle: constructed against a [`ModelSource`], mutated by config
/// fragments applied in source order, finalized by [`build`] which resolves
/// operations, closes over every reachable type, validates, obfuscates, and
/// emits a [`CompiledSchema`]. Build cycles for one key must be serialized by
/// the caller; a failed build leaves any previously compiled artifact
/// untouched.
///
/// [`build`]: SchemaRegistry::build
pub struct SchemaRegistry {
    key: String,
    model_source: Arc<dyn ModelSource>,
    config: ConfigMap,
    plugins: BTreeMap<String, ConfigMap>,
    types: BTreeMap<String, SchemaType>,
    obfuscator: Box<dyn NameObfuscator>,
}

impl SchemaRegistry {
    pub fn new(key: impl Into<String>, model_source: Arc<dyn ModelSource>) -> Self {
        Self {
            key: key.into(),
            model_source,
            config: ConfigMap::new(),
            plugins: BTreeMap::new(),
            types: BTreeMap::new(),
            obfuscator: Box::new(PlainNameObfuscator),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set_obfuscator(&mut self, obfuscator: Box<dyn NameObfuscator>) {
        self.obfuscator = obfuscator;
    }

    pub fn get_type(&self, name: &str) -> Option<&SchemaType> {
        self.types.get(name)
    }

    pub fn types(&self) -> &BTreeMap<String, SchemaType> {
        &self.types
    }

    pub fn plugins(&self) -> &BTreeMap<String, ConfigMap> {
        &self.plugins
    }

    pub fn config(&self) -> &ConfigMap {
        &self.config
    }

    /// Query limits parsed from the merged global config's `limits` key.
    /// Absent limits are unbounded.
    pub fn query_limits(&self) -> Result<QueryLimits, SchemaError> {
        match self.config.get("limits") {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| SchemaError::Config(format!("Invalid limits config: {}", e))),
            None => Ok(QueryLimits::default()),
        }
    }

    /// Applies one configuration fragment. Fragments merge in application
    /// order; later fragments win per key.
    pub fn apply_config(&mut self, fragment: &ConfigMap) -> Result<(), SchemaError> {
        assert_valid_config(fragment, &["types", "models", "plugins", "config"])?;
        info!("Applying config fragment to schema '{}'", self.key);

        if let Some(models) = fragment.get("models") {
            let models = models.as_object().ok_or_else(|| {
                SchemaError::Config("Models config must be a map".to_string())
            })?;
            for (model_name, model_config) in models {
                let model_config = model_config.as_object().ok_or_else(|| {
                    SchemaError::Config(format!(
                        "Config for model {} must be a map",
                        model_name
                    ))
                })?;
                self.configure_model(model_name, model_config)?;
            }
        }

        if let Some(types) = fragment.get("types") {
            let types = types.as_object().ok_or_else(|| {
                SchemaError::Config("Types config must be a map".to_string())
            })?;
            for (type_name, type_config) in types {
                let type_config = type_config.as_object().ok_or_else(|| {
                    SchemaError::Config(format!("Config for type {} must be a map", type_name))
                })?;
                self.configure_type(type_name, type_config)?;
            }
        }

        if let Some(plugins) = fragment.get("plugins") {
            let plugins = plugins.as_object().ok_or_else(|| {
                SchemaError::Config("Plugins config must be a map".to_string())
            })?;
            for (name, config) in parse_plugin_config(plugins)? {
                self.plugins.insert(name, config);
            }
        }

        if let Some(config) = fragment.get("config") {
            let config = config.as_object().ok_or_else(|| {
                SchemaError::Config("Global config must be a map".to_string())
            })?;
            self.config = merge(&self.config, config);
        }

        Ok(())
    }

    /// Registers a plain type, merging with any same-named type.
    pub fn add_type(&mut self, type_def: Type) {
        let name = type_def.name().to_string();
        match self.types.get_mut(&name) {
            Some(SchemaType::Plain(existing)) => existing.merge_with(type_def),
            Some(SchemaType::Model(existing)) => existing.type_def_mut().merge_with(type_def),
            None => {
                self.types.insert(name, SchemaType::Plain(type_def));
            }
        }
    }

    /// Registers a model type, merging with any same-named one (operations
    /// included).
    pub fn add_model_type(&mut self, model_type: ModelType) {
        let name = model_type.name().to_string();
        match self.types.remove(&name) {
            Some(SchemaType::Model(mut existing)) => {
                existing.merge_with(model_type);
                self.types.insert(name, SchemaType::Model(existing));
            }
            Some(SchemaType::Plain(plain)) => {
                let mut merged = model_type;
                merged.type_def_mut().merge_with(plain);
                self.types.insert(name, SchemaType::Model(merged));
            }
            None => {
                self.types.insert(name, SchemaType::Model(model_type));
            }
        }
    }

    /// Runs the per-type validation gate across every registered type.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for schema_type in self.types.values() {
            schema_type.validate()?;
        }
        Ok(())
    }

    /// Finalizes the schema: builds every model type's operations, closes
    /// over every reachable type, validates, obfuscates, and emits the
    /// compiled artifact. The registry's in-memory state is the working
    /// graph; any previously persisted artifact is untouched on failure.
    pub fn build(&mut self) -> Result<CompiledSchema, SchemaError> {
        info!("Building schema '{}'", self.key);

        let names: Vec<String> = self.types.keys().cloned().collect();
        for name in &names {
            if let Some(SchemaType::Model(model_type)) = self.types.get_mut(name) {
                model_type.build_operations()?;
            }
        }

        self.close_over_extra_types()?;

        let (query_root, mutation_root) = self.assemble_roots()?;

        for schema_type in self.types.values() {
            schema_type.validate()?;
        }
        query_root.validate()?;
        mutation_root.validate()?;

        let artifact = self.assemble_artifact(query_root, mutation_root)?;
        info!(
            "Schema '{}' built with {} types",
            self.key,
            artifact.types.len()
        );
        Ok(artifact)
    }

    fn configure_model(&mut self, model_name: &str, config: &ConfigMap) -> Result<(), SchemaError> {
        let model = self.model_source.model(model_name).ok_or_else(|| {
            SchemaError::Resolution(format!("No model found for {}", model_name))
        })?;
        let type_name = model.type_name();
        debug!("Configuring model {} as type {}", model_name, type_name);
        match self.types.get_mut(&type_name) {
            Some(SchemaType::Model(existing)) => existing.apply_config(config),
            Some(SchemaType::Plain(_)) | None => {
                let model_type = ModelType::new(model, config)?;
                self.add_model_type(model_type);
                Ok(())
            }
        }
    }

    fn configure_type(&mut self, type_name: &str, config: &ConfigMap) -> Result<(), SchemaError> {
        match self.types.get_mut(type_name) {
            Some(SchemaType::Plain(existing)) => existing.apply_config(config),
            Some(SchemaType::Model(_)) => Err(SchemaError::Config(format!(
                "Type {} is derived from a model; configure it under \"models\"",
                type_name
            ))),
            None => {
                let mut type_def = Type::new(type_name);
                type_def.apply_config(config)?;
                self.types.insert(type_name.to_string(), SchemaType::Plain(type_def));
                Ok(())
            }
        }
    }

    /// The extra-type closure: a worklist over type names with a per-build
    /// seen-set. No cycle detection happens inside any one type's traversal;
    /// termination comes from materializing each name at most once per build,
    /// and deduplication falls out of keying the type map by name.
    fn close_over_extra_types(&mut self) -> Result<(), SchemaError> {
        let mut worklist: Vec<String> = self.types.keys().cloned().collect();
        let mut seen: HashSet<String> = worklist.iter().cloned().collect();

        while let Some(name) = worklist.pop() {
            let extras = match self.types.get(&name) {
                Some(SchemaType::Model(model_type)) => model_type.extra_types()?,
                _ => continue,
            };
            for extra in extras {
                match extra {
                    ExtraType::Ready(type_def) => {
                        let type_name = type_def.name().to_string();
                        debug!("Schema '{}' gains extra type {}", self.key, type_name);
                        self.add_type(type_def);
                        if seen.insert(type_name.clone()) {
                            worklist.push(type_name);
                        }
                    }
                    ExtraType::ModelRef { name: ref_name, config } => {
                        if seen.contains(&ref_name) {
                            continue;
                        }
                        let model = self.model_source.model(&ref_name).ok_or_else(|| {
                            SchemaError::Resolution(format!(
                                "Field on {} references unknown model {}",
                                name, ref_name
                            ))
                        })?;
                        let fields = if config.is_empty() {
                            Value::String(WILDCARD.to_string())
                        } else {
                            Value::Object(config)
                        };
                        let mut full_config = ConfigMap::new();
                        full_config.insert("fields".to_string(), fields);
                        let mut model_type = ModelType::new(model, &full_config)?;
                        model_type.build_operations()?;
                        let type_name = model_type.name().to_string();
                        debug!("Schema '{}' gains nested model type {}", self.key, type_name);
                        seen.insert(ref_name);
                        seen.insert(type_name.clone());
                        self.add_model_type(model_type);
                        worklist.push(type_name);
                    }
                }
            }
        }
        Ok(())
    }

    fn assemble_roots(&self) -> Result<(Type, Type), SchemaError> {
        let mut query_root = Type::new(QUERY_ROOT);
        let mut mutation_root = Type::new(MUTATION_ROOT);
        for schema_type in self.types.values() {
            if let SchemaType::Model(model_type) = schema_type {
                for operation in model_type.operations().values() {
                    let root = match operation.kind() {
                        OperationKind::Query => &mut query_root,
                        OperationKind::Mutation => &mut mutation_root,
                    };
                    let field_name = operation.field().name();
                    if root.field_by_name(field_name).is_some() {
                        return Err(SchemaError::Config(format!(
                            "Operation field {} on {} is synthesized by more than one operation",
                            field_name,
                            root.name()
                        )));
                    }
                    root.add_field_obj(operation.field().clone());
                }
            }
        }
        Ok((query_root, mutation_root))
    }

    fn assemble_artifact(
        &self,
        query_root: Type,
        mutation_root: Type,
    ) -> Result<CompiledSchema, SchemaError> {
        let mut forward = BTreeMap::new();
        let mut name_lookup = BTreeMap::new();
        for name in self.types.keys() {
            let opaque = self.obfuscator.obfuscate(name);
            if let Some(previous) = name_lookup.insert(opaque.clone(), name.clone()) {
                return Err(SchemaError::Config(format!(
                    "Obfuscation collision: {} and {} both map to {}",
                    previous, name, opaque
                )));
            }
            forward.insert(name.clone(), opaque);
        }

        let mut types = BTreeMap::new();
        for schema_type in self.types.values() {
            let mut type_def = schema_type.type_def().clone();
            type_def.rename_types(&forward);
            types.insert(type_def.name().to_string(), type_def);
        }
        for mut root in [query_root, mutation_root] {
            if root.fields().is_empty() {
                continue;
            }
            if self.types.contains_key(root.name()) {
                return Err(SchemaError::Config(format!(
                    "Registered type {} collides with the reserved operation root of the \
                     same name",
                    root.name()
                )));
            }
            root.rename_types(&forward);
            types.insert(root.name().to_string(), root);
        }

        Ok(CompiledSchema {
            key: self.key.clone(),
            types,
            name_lookup,
        })
    }
}
