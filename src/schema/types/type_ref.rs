use crate::schema::types::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A reference to an output or input type: a bare type name, or a
/// list-of/non-null wrapper around one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    /// Parses the string syntax, e.g. `String`, `[Book]`, `[Book!]!`.
    pub fn parse(raw: &str) -> Result<Self, SchemaError> {
        let s = raw.trim();
        if let Some(inner) = s.strip_suffix('!') {
            return Ok(TypeRef::NonNull(Box::new(TypeRef::parse(inner)?)));
        }
        if s.starts_with('[') {
            let inner = s
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
                .ok_or_else(|| {
                    SchemaError::Config(format!("Malformed type expression \"{}\"", raw))
                })?;
            return Ok(TypeRef::List(Box::new(TypeRef::parse(inner)?)));
        }
        let valid = !s.is_empty()
            && s.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(SchemaError::Config(format!(
                "Malformed type expression \"{}\"",
                raw
            )));
        }
        Ok(TypeRef::Named(s.to_string()))
    }

    /// The innermost named type.
    pub fn named(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.named(),
        }
    }

    /// Returns a copy with the innermost name replaced through the lookup,
    /// leaving names absent from the lookup unchanged.
    pub fn renamed(&self, lookup: &BTreeMap<String, String>) -> TypeRef {
        match self {
            TypeRef::Named(name) => {
                TypeRef::Named(lookup.get(name).cloned().unwrap_or_else(|| name.clone()))
            }
            TypeRef::List(inner) => TypeRef::List(Box::new(inner.renamed(lookup))),
            TypeRef::NonNull(inner) => TypeRef::NonNull(Box::new(inner.renamed(lookup))),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::List(inner) => write!(f, "[{}]", inner),
            TypeRef::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_wrappers() {
        let parsed = TypeRef::parse("[Book!]!").unwrap();
        assert_eq!(parsed.to_string(), "[Book!]!");
        assert_eq!(parsed.named(), "Book");
    }

    #[test]
    fn parses_bare_name() {
        assert_eq!(TypeRef::parse(" String ").unwrap(), TypeRef::Named("String".into()));
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert!(TypeRef::parse("[Book").is_err());
        assert!(TypeRef::parse("").is_err());
        assert!(TypeRef::parse("9Lives").is_err());
    }

    #[test]
    fn renames_innermost_name_only() {
        let mut lookup = BTreeMap::new();
        lookup.insert("Book".to_string(), "gql_abc".to_string());
        let renamed = TypeRef::parse("[Book]!").unwrap().renamed(&lookup);
        assert_eq!(renamed.to_string(), "[gql_abc]!");
    }
}
