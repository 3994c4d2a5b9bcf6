use crate::query::AdmissionError;
use crate::schema::types::SchemaError;
use std::fmt;
use std::io;

/// Unified error type for the engine.
///
/// Build-time failures surface as [`SchemaError`]; query-time admission
/// failures surface as one or more [`AdmissionError`]s. Each variant keeps
/// enough context for the embedder to report the offending name or limit.
#[derive(Debug)]
pub enum GraphWeaveError {
    /// Errors raised while composing or validating a schema
    Schema(SchemaError),

    /// Admission-control violations for a single query document
    Admission(Vec<AdmissionError>),

    /// Errors related to IO operations
    Io(io::Error),
}

impl fmt::Display for GraphWeaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(err) => write!(f, "Schema error: {}", err),
            Self::Admission(errors) => {
                let joined = errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "Query rejected: {}", joined)
            }
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for GraphWeaveError {}

impl From<SchemaError> for GraphWeaveError {
    fn from(err: SchemaError) -> Self {
        Self::Schema(err)
    }
}

impl From<Vec<AdmissionError>> for GraphWeaveError {
    fn from(errors: Vec<AdmissionError>) -> Self {
        Self::Admission(errors)
    }
}

impl From<io::Error> for GraphWeaveError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Result type alias using [`GraphWeaveError`]
pub type GraphWeaveResult<T> = Result<T, GraphWeaveError>;
