use crate::config::ConfigMap;
use crate::schema::types::{Field, SchemaError, TypeRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A source property path on a backing model.
///
/// Supports dotted traversal across relations. A trailing `Name()` segment is
/// an aggregate over the related collection (`comments.Count()`); a dotted
/// tail ending in a plain segment is a scalar projection across the relation
/// (`author.surname`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyPath {
    segments: Vec<String>,
    aggregate: Option<String>,
}

impl PropertyPath {
    pub fn parse(raw: &str) -> Result<Self, SchemaError> {
        let mut segments: Vec<String> = Vec::new();
        let mut aggregate = None;
        let parts: Vec<&str> = raw.split('.').collect();
        for (index, part) in parts.iter().enumerate() {
            let is_last = index == parts.len() - 1;
            if part.is_empty() {
                return Err(SchemaError::Config(format!(
                    "Malformed property path \"{}\"",
                    raw
                )));
            }
            if let Some(name) = part.strip_suffix("()") {
                if !is_last || name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err(SchemaError::Config(format!(
                        "Malformed property path \"{}\": aggregates may only terminate a path",
                        raw
                    )));
                }
                aggregate = Some(name.to_string());
            } else {
                segments.push((*part).to_string());
            }
        }
        if segments.is_empty() {
            return Err(SchemaError::Config(format!(
                "Malformed property path \"{}\"",
                raw
            )));
        }
        Ok(Self { segments, aggregate })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The aggregate function name, e.g. `Count` in `comments.Count()`.
    pub fn aggregate(&self) -> Option<&str> {
        self.aggregate.as_deref()
    }

    /// The first segment: the property looked up on the model itself.
    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    /// True for dotted traversals and aggregates over a relation.
    pub fn is_relation(&self) -> bool {
        self.segments.len() > 1 || self.aggregate.is_some()
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))?;
        if let Some(aggregate) = &self.aggregate {
            write!(f, ".{}()", aggregate)?;
        }
        Ok(())
    }
}

/// A [`Field`] whose type and resolution derive from a model property.
///
/// When the property's value is itself a composed model, the field records
/// the nested model type's *name* only. The nested type is owned by the
/// registry's type map and reached by lookup, never by this field, so
/// mutually referencing types stay acyclic in ownership terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelField {
    field: Field,
    property: PropertyPath,
    model_type_name: Option<String>,
    nested_config: Option<ConfigMap>,
}

impl ModelField {
    /// Builds a declared field from a config spec. The `property` key remaps
    /// the backing property (the aliased-field case); otherwise the external
    /// name doubles as the property path.
    pub fn from_config(name: &str, config: &Value) -> Result<Self, SchemaError> {
        let mut field = Field::new(name);
        let mut nested_config = None;
        let property_raw = match config {
            Value::Object(map) => {
                field.apply_config(map)?;
                if let Some(nested) = map.get("fields") {
                    let nested = nested.as_object().ok_or_else(|| {
                        SchemaError::Config(format!(
                            "Nested fields config on {} must be a map",
                            name
                        ))
                    })?;
                    nested_config = Some(nested.clone());
                }
                map.get("property")
                    .and_then(Value::as_str)
                    .unwrap_or(name)
                    .to_string()
            }
            Value::String(type_expr) => {
                field.set_type(TypeRef::parse(type_expr)?);
                name.to_string()
            }
            Value::Bool(true) => name.to_string(),
            _ => {
                return Err(SchemaError::Config(format!(
                    "Invalid field config for {}: expected true, a type string, or a map",
                    name
                )));
            }
        };
        Ok(Self {
            field,
            property: PropertyPath::parse(&property_raw)?,
            model_type_name: None,
            nested_config,
        })
    }

    /// Wraps a model-resolved [`Field`] with its backing property path.
    pub fn from_field(field: Field, property: PropertyPath) -> Self {
        Self {
            field,
            property,
            model_type_name: None,
            nested_config: None,
        }
    }

    pub fn name(&self) -> &str {
        self.field.name()
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut Field {
        &mut self.field
    }

    pub fn property(&self) -> &PropertyPath {
        &self.property
    }

    pub fn model_type_name(&self) -> Option<&str> {
        self.model_type_name.as_deref()
    }

    pub fn set_model_type_name(&mut self, name: impl Into<String>) {
        self.model_type_name = Some(name.into());
    }

    /// Config for the nested composed model, captured from a `fields`
    /// sub-map on this field's config entry.
    pub fn nested_config(&self) -> Option<&ConfigMap> {
        self.nested_config.as_ref()
    }

    pub(crate) fn set_nested_config(&mut self, config: ConfigMap) {
        self.nested_config = Some(config);
    }

    /// Applies inline overrides from the field's config entry. The nested
    /// `fields` key is consumed by the owning model type; the `property` key
    /// was consumed at construction.
    pub fn apply_config(&mut self, config: &ConfigMap) -> Result<(), SchemaError> {
        self.field.apply_config(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_property_path() {
        let path = PropertyPath::parse("title").unwrap();
        assert_eq!(path.root(), "title");
        assert!(!path.is_relation());
        assert_eq!(path.to_string(), "title");
    }

    #[test]
    fn aggregate_path_terminates_in_count() {
        let path = PropertyPath::parse("comments.Count()").unwrap();
        assert_eq!(path.root(), "comments");
        assert_eq!(path.aggregate(), Some("Count"));
        assert!(path.is_relation());
        assert_eq!(path.to_string(), "comments.Count()");
    }

    #[test]
    fn projection_path_across_relation() {
        let path = PropertyPath::parse("author.surname").unwrap();
        assert_eq!(path.segments(), ["author", "surname"]);
        assert!(path.is_relation());
    }

    #[test]
    fn aggregate_must_be_terminal() {
        assert!(PropertyPath::parse("comments.Count().id").is_err());
        assert!(PropertyPath::parse("a..b").is_err());
        assert!(PropertyPath::parse("Count()").is_err());
    }

    #[test]
    fn property_key_aliases_the_backing_property() {
        let field = ModelField::from_config(
            "writer",
            &json!({ "property": "author.surname", "type": "String" }),
        )
        .unwrap();
        assert_eq!(field.name(), "writer");
        assert_eq!(field.property().to_string(), "author.surname");
        assert_eq!(field.field().type_ref().unwrap().to_string(), "String");
    }

    #[test]
    fn bare_true_uses_the_name_as_property() {
        let field = ModelField::from_config("title", &json!(true)).unwrap();
        assert_eq!(field.property().to_string(), "title");
        assert!(field.field().type_ref().is_none());
    }
}
