use std::fmt;

/// Build-time error taxonomy for schema composition.
///
/// Every variant is fatal to the build cycle that raised it; a previously
/// compiled artifact is never touched by a failed build.
#[derive(Debug, Clone)]
pub enum SchemaError {
    /// Malformed or unrecognized configuration
    Config(String),
    /// A field, operation, or type could not be determined from the
    /// available information
    Resolution(String),
    /// A model-level policy was violated (blacklisted field exposed,
    /// required base field missing)
    Policy(String),
    /// Errors from the compiled-artifact storage backend
    Storage(String),
    /// Errors serializing or deserializing a compiled artifact
    Serialization(String),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::Config(msg) => write!(f, "Configuration error: {}", msg),
            SchemaError::Resolution(msg) => write!(f, "Resolution error: {}", msg),
            SchemaError::Policy(msg) => write!(f, "Policy violation: {}", msg),
            SchemaError::Storage(msg) => write!(f, "Storage error: {}", msg),
            SchemaError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for SchemaError {}

impl From<sled::Error> for SchemaError {
    fn from(err: sled::Error) -> Self {
        SchemaError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        SchemaError::Serialization(err.to_string())
    }
}
