//! Shared test fixtures: a fake capability model backed by an in-memory
//! property table, plus the CRUD-style operation creators the tests register.

use graphweave::config::ConfigMap;
use graphweave::schema::model::{
    BaseFieldsProvider, DefaultFieldsProvider, ExtraTypeProvider, InputTypeProvider,
    ModelBlacklist, ModelSource, OperationCreator, OperationProvider, SchemaModel,
};
use graphweave::schema::types::{
    Field, ModelField, ModelType, Operation, OperationKind, PropertyPath, SchemaError, Type,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Once};

static LOG_INIT: Once = Once::new();

/// Installs the test logger once per process so `RUST_LOG` surfaces engine
/// logging in test output.
pub fn init_logging() {
    LOG_INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// One introspectable property on the fake backing entity.
#[derive(Clone)]
struct PropSpec {
    type_expr: String,
    model_type: Option<String>,
}

/// A fake backing entity with configurable capabilities.
pub struct FakeModel {
    source: String,
    type_name: String,
    properties: BTreeMap<String, PropSpec>,
    default_fields: ConfigMap,
    base_fields: ConfigMap,
    blacklist: Vec<String>,
    operations: Vec<String>,
    operation_configs: BTreeMap<String, ConfigMap>,
    extra_types: Vec<Type>,
    has_default_fields: bool,
    has_base_fields: bool,
    has_operations: bool,
    has_blacklist: bool,
    has_extra_types: bool,
}

impl FakeModel {
    pub fn new(source: &str, type_name: &str) -> Self {
        init_logging();
        Self {
            source: source.to_string(),
            type_name: type_name.to_string(),
            properties: BTreeMap::new(),
            default_fields: ConfigMap::new(),
            base_fields: ConfigMap::new(),
            blacklist: Vec::new(),
            operations: Vec::new(),
            operation_configs: BTreeMap::new(),
            extra_types: Vec::new(),
            has_default_fields: false,
            has_base_fields: false,
            has_operations: false,
            has_blacklist: false,
            has_extra_types: false,
        }
    }

    /// A model whose derived type name is empty, for construction-failure
    /// tests.
    pub fn nameless(source: &str) -> Self {
        Self::new(source, "")
    }

    pub fn with_property(mut self, name: &str, type_expr: &str) -> Self {
        self.properties.insert(
            name.to_string(),
            PropSpec {
                type_expr: type_expr.to_string(),
                model_type: None,
            },
        );
        self
    }

    /// A property whose value is itself a composed model.
    pub fn with_relation(mut self, name: &str, type_expr: &str, model_type: &str) -> Self {
        self.properties.insert(
            name.to_string(),
            PropSpec {
                type_expr: type_expr.to_string(),
                model_type: Some(model_type.to_string()),
            },
        );
        self
    }

    pub fn with_default_fields(mut self, fields: Value) -> Self {
        self.default_fields = fields.as_object().cloned().expect("object");
        self.has_default_fields = true;
        self
    }

    pub fn with_base_fields(mut self, fields: Value) -> Self {
        self.base_fields = fields.as_object().cloned().expect("object");
        self.has_base_fields = true;
        self
    }

    pub fn with_blacklist(mut self, names: &[&str]) -> Self {
        self.blacklist = names.iter().map(|n| n.to_string()).collect();
        self.has_blacklist = true;
        self
    }

    pub fn with_operations(mut self, identifiers: &[&str]) -> Self {
        self.operations = identifiers.iter().map(|id| id.to_string()).collect();
        self.has_operations = true;
        self
    }

    pub fn with_operation_config(mut self, identifier: &str, config: Value) -> Self {
        self.operation_configs.insert(
            identifier.to_string(),
            config.as_object().cloned().expect("object"),
        );
        self
    }

    pub fn with_extra_type(mut self, type_def: Type) -> Self {
        self.extra_types.push(type_def);
        self.has_extra_types = true;
        self
    }
}

impl SchemaModel for FakeModel {
    fn source_identifier(&self) -> &str {
        &self.source
    }

    fn type_name(&self) -> String {
        self.type_name.clone()
    }

    fn field(
        &self,
        property: &str,
        _config: &ConfigMap,
    ) -> Result<Option<ModelField>, SchemaError> {
        let path = PropertyPath::parse(property)?;
        // Aggregates over a known relation surface as integers, the way a
        // count projection would.
        if path.aggregate() == Some("Count") && self.properties.contains_key(path.root()) {
            let field = Field::with_type(path.root(), "Int!")?;
            return Ok(Some(ModelField::from_field(field, path)));
        }
        let Some(spec) = self.properties.get(property) else {
            return Ok(None);
        };
        let field = Field::with_type(path.root(), &spec.type_expr)?;
        let mut model_field = ModelField::from_field(field, path);
        if let Some(model_type) = &spec.model_type {
            model_field.set_model_type_name(model_type);
        }
        Ok(Some(model_field))
    }

    fn all_field_names(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }

    fn as_default_fields(&self) -> Option<&dyn DefaultFieldsProvider> {
        if self.has_default_fields {
            Some(self)
        } else {
            None
        }
    }

    fn as_base_fields(&self) -> Option<&dyn BaseFieldsProvider> {
        if self.has_base_fields {
            Some(self)
        } else {
            None
        }
    }

    fn as_operation_provider(&self) -> Option<&dyn OperationProvider> {
        if self.has_operations {
            Some(self)
        } else {
            None
        }
    }

    fn as_blacklist(&self) -> Option<&dyn ModelBlacklist> {
        if self.has_blacklist {
            Some(self)
        } else {
            None
        }
    }

    fn as_extra_types(&self) -> Option<&dyn ExtraTypeProvider> {
        if self.has_extra_types {
            Some(self)
        } else {
            None
        }
    }
}

impl DefaultFieldsProvider for FakeModel {
    fn default_fields(&self) -> ConfigMap {
        self.default_fields.clone()
    }
}

impl BaseFieldsProvider for FakeModel {
    fn base_fields(&self) -> ConfigMap {
        self.base_fields.clone()
    }
}

impl OperationProvider for FakeModel {
    fn all_operation_identifiers(&self) -> Vec<String> {
        self.operations.clone()
    }

    fn operation_creator(&self, identifier: &str) -> Option<Arc<dyn OperationCreator>> {
        if !self.operations.iter().any(|id| id == identifier) {
            return None;
        }
        match identifier {
            // `legacyRead` is a second identifier served by the same creator,
            // so its synthesized field name matches `read`'s.
            "read" | "legacyRead" => Some(Arc::new(ReadCreator)),
            "readOne" => Some(Arc::new(ReadOneCreator)),
            "create" => Some(Arc::new(CreateCreator)),
            "delete" => Some(Arc::new(DeleteCreator)),
            "audit" => Some(Arc::new(DecliningCreator)),
            _ => None,
        }
    }

    fn operation_config(&self, identifier: &str) -> ConfigMap {
        self.operation_configs
            .get(identifier)
            .cloned()
            .unwrap_or_default()
    }
}

impl ModelBlacklist for FakeModel {
    fn blacklisted_fields(&self) -> Vec<String> {
        self.blacklist.clone()
    }
}

impl ExtraTypeProvider for FakeModel {
    fn extra_types(&self) -> Result<Vec<Type>, SchemaError> {
        Ok(self.extra_types.clone())
    }
}

/// Supplies fake models by model name and by derived type name, so nested
/// model references resolve during the closure.
#[derive(Default)]
pub struct FakeModelSource {
    models: BTreeMap<String, Arc<FakeModel>>,
}

impl FakeModelSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, name: &str, model: FakeModel) -> Self {
        let model = Arc::new(model);
        self.models.insert(model.type_name(), Arc::clone(&model));
        self.models.insert(name.to_string(), model);
        self
    }
}

impl ModelSource for FakeModelSource {
    fn model(&self, name: &str) -> Option<Arc<dyn SchemaModel>> {
        self.models
            .get(name)
            .map(|model| Arc::clone(model) as Arc<dyn SchemaModel>)
    }
}

fn operation_field(
    name: String,
    type_expr: &str,
    config: &ConfigMap,
) -> Result<Field, SchemaError> {
    let mut field = Field::with_type(name, type_expr)?;
    if let Some(plugins) = config.get("plugins") {
        let mut overlay = ConfigMap::new();
        overlay.insert("plugins".to_string(), plugins.clone());
        field.apply_config(&overlay)?;
    }
    Ok(field)
}

/// Read-many: `read{Type}s: [{Type}]`, contributing a filter input type.
pub struct ReadCreator;

impl OperationCreator for ReadCreator {
    fn create_operation(
        &self,
        _model: &dyn SchemaModel,
        type_name: &str,
        config: &ConfigMap,
    ) -> Result<Option<Operation>, SchemaError> {
        let field = operation_field(
            format!("read{}s", type_name),
            &format!("[{}]", type_name),
            config,
        )?;
        Ok(Some(Operation::new(
            "read",
            OperationKind::Query,
            field,
            config.clone(),
        )))
    }

    fn as_input_type_provider(&self) -> Option<&dyn InputTypeProvider> {
        Some(self)
    }
}

impl InputTypeProvider for ReadCreator {
    fn provide_input_types(
        &self,
        owner: &ModelType,
        _config: &ConfigMap,
    ) -> Result<Vec<Type>, SchemaError> {
        let mut input = Type::input(format!("{}FilterInput", owner.name()));
        input.add_field("id", &serde_json::json!("ID"))?;
        Ok(vec![input])
    }
}

/// Read-one: `readOne{Type}: {Type}`.
pub struct ReadOneCreator;

impl OperationCreator for ReadOneCreator {
    fn create_operation(
        &self,
        _model: &dyn SchemaModel,
        type_name: &str,
        config: &ConfigMap,
    ) -> Result<Option<Operation>, SchemaError> {
        let mut field = operation_field(format!("readOne{}", type_name), type_name, config)?;
        field.add_arg("id", "ID!")?;
        Ok(Some(Operation::new(
            "readOne",
            OperationKind::Query,
            field,
            config.clone(),
        )))
    }
}

/// Create mutation, contributing a payload input type.
pub struct CreateCreator;

impl OperationCreator for CreateCreator {
    fn create_operation(
        &self,
        _model: &dyn SchemaModel,
        type_name: &str,
        config: &ConfigMap,
    ) -> Result<Option<Operation>, SchemaError> {
        let mut field = operation_field(format!("create{}", type_name), type_name, config)?;
        field.add_arg("input", &format!("{}CreateInput!", type_name))?;
        Ok(Some(Operation::new(
            "create",
            OperationKind::Mutation,
            field,
            config.clone(),
        )))
    }

    fn as_input_type_provider(&self) -> Option<&dyn InputTypeProvider> {
        Some(self)
    }
}

impl InputTypeProvider for CreateCreator {
    fn provide_input_types(
        &self,
        owner: &ModelType,
        _config: &ConfigMap,
    ) -> Result<Vec<Type>, SchemaError> {
        let mut input = Type::input(format!("{}CreateInput", owner.name()));
        for (name, field) in owner.type_def().fields() {
            if let Some(type_ref) = field.type_ref() {
                input.add_field(name, &serde_json::json!(type_ref.named()))?;
            }
        }
        Ok(vec![input])
    }
}

/// Delete mutation: `delete{Type}(id: ID!): ID`.
pub struct DeleteCreator;

impl OperationCreator for DeleteCreator {
    fn create_operation(
        &self,
        _model: &dyn SchemaModel,
        type_name: &str,
        config: &ConfigMap,
    ) -> Result<Option<Operation>, SchemaError> {
        let mut field = operation_field(format!("delete{}", type_name), "ID", config)?;
        field.add_arg("id", "ID!")?;
        Ok(Some(Operation::new(
            "delete",
            OperationKind::Mutation,
            field,
            config.clone(),
        )))
    }
}

/// A creator that always declines, so tests can assert a declined identifier
/// produces no field.
pub struct DecliningCreator;

impl OperationCreator for DecliningCreator {
    fn create_operation(
        &self,
        _model: &dyn SchemaModel,
        _type_name: &str,
        _config: &ConfigMap,
    ) -> Result<Option<Operation>, SchemaError> {
        Ok(None)
    }
}

pub fn config(value: Value) -> ConfigMap {
    value.as_object().cloned().expect("config fixtures are objects")
}
