//! # GraphWeave
//!
//! A declarative schema-composition engine for a graph query API. GraphWeave
//! turns layered, mergeable configuration fragments describing types, fields,
//! operations, and cross-cutting plugin bindings into a fully resolved schema,
//! and enforces depth/complexity/node-count limits against incoming queries
//! before execution begins.
//!
//! ## Core Components
//!
//! * `config` - Deterministic merging of layered config fragments with
//!   wildcard (`*`) and removal (`false`) semantics
//! * `schema` - The schema data model (types, fields, operations), the
//!   capability-model contracts, the keyed registry that orchestrates
//!   merge/build/validate, name obfuscation, and compiled-artifact storage
//! * `query` - Request-time admission control over parsed query documents
//! * `error` - Unified error types
//!
//! The engine does not fetch data: field resolution is delegated to
//! externally registered resolvers, and the backing data source is reached
//! only through the [`schema::model::SchemaModel`] contract.

pub mod config;
pub mod error;
pub mod query;
pub mod schema;

pub use error::{GraphWeaveError, GraphWeaveResult};
pub use query::{AdmissionError, QueryLimiter, QueryLimits, QueryRule};
pub use schema::registry::{CompiledSchema, SchemaRegistry};
pub use schema::types::SchemaError;
