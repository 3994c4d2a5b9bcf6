pub mod limiter;

pub use limiter::{
    document_complexity, document_depth, document_nodes, AdmissionError, QueryLimiter,
    QueryLimits, QueryRule,
};
