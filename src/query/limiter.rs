//! Request-time admission control.
//!
//! A query document is checked once, before execution begins and independent
//! of any resolver. All checks are pure functions of the parsed document and
//! the configured limits: no I/O, no suspension. The three built-in checks
//! are independent and composable, and externally registered rules run
//! alongside them, never instead of them.

use async_graphql_parser::types::{
    ExecutableDocument, Selection, SelectionSet,
};
use async_graphql_parser::parse_query;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The three admission limits. Each is optional; absence means unbounded for
/// that dimension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryLimits {
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default)]
    pub max_complexity: Option<usize>,
    #[serde(default)]
    pub max_nodes: Option<usize>,
}

/// A structured, user-visible admission failure naming the limit and the
/// observed value. The query is never executed once one of these is raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("Maximum query depth exceeded: limit {max}, got {actual}")]
    DepthExceeded { max: usize, actual: usize },

    #[error("Maximum query complexity exceeded: limit {max}, got {actual}")]
    ComplexityExceeded { max: usize, actual: usize },

    #[error("Maximum query node count exceeded: limit {max}, got {actual}")]
    NodeBudgetExceeded { max: usize, actual: usize },

    #[error("Query parse error: {0}")]
    Parse(String),

    #[error("Query rejected by rule {rule}: {message}")]
    Rule { rule: String, message: String },
}

/// An externally registered validation rule. Rules added to a limiter run on
/// every document in addition to the engine's own checks.
pub trait QueryRule: Send + Sync {
    fn name(&self) -> &str;

    fn validate(&self, document: &ExecutableDocument) -> Result<(), AdmissionError>;
}

/// Enforces depth, complexity, and node-count limits against an incoming
/// query document, plus any registered [`QueryRule`]s. A single query may
/// trip more than one check; every violation is reported.
pub struct QueryLimiter {
    limits: QueryLimits,
    rules: Vec<Box<dyn QueryRule>>,
}

impl QueryLimiter {
    pub fn new(limits: QueryLimits) -> Self {
        Self {
            limits,
            rules: Vec::new(),
        }
    }

    pub fn limits(&self) -> &QueryLimits {
        &self.limits
    }

    /// Appends an external rule. The engine adds its own rules; it never
    /// removes ones it does not own.
    pub fn add_rule(&mut self, rule: Box<dyn QueryRule>) {
        self.rules.push(rule);
    }

    /// Parses and checks a query. `Ok(())` means the query may proceed to
    /// execution.
    pub fn check(&self, query: &str) -> Result<(), Vec<AdmissionError>> {
        let document =
            parse_query(query).map_err(|e| vec![AdmissionError::Parse(e.to_string())])?;
        self.check_document(&document)
    }

    /// Checks an already-parsed document, collecting every violation.
    pub fn check_document(&self, document: &ExecutableDocument) -> Result<(), Vec<AdmissionError>> {
        let mut violations = Vec::new();

        if let Some(max) = self.limits.max_depth {
            let actual = document_depth(document);
            if actual > max {
                violations.push(AdmissionError::DepthExceeded { max, actual });
            }
        }
        if let Some(max) = self.limits.max_complexity {
            let actual = document_complexity(document);
            if actual > max {
                violations.push(AdmissionError::ComplexityExceeded { max, actual });
            }
        }
        if let Some(max) = self.limits.max_nodes {
            let actual = document_nodes(document);
            if actual > max {
                violations.push(AdmissionError::NodeBudgetExceeded { max, actual });
            }
        }
        for rule in &self.rules {
            if let Err(violation) = rule.validate(document) {
                violations.push(violation);
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// Deepest field nesting in the document as written: `{ a }` has depth 1,
/// each nested selection set adds one. Fragment spreads resolve through the
/// document's fragment definitions; inline fragments add no depth of their
/// own.
pub fn document_depth(document: &ExecutableDocument) -> usize {
    document
        .operations
        .iter()
        .map(|(_, operation)| {
            selection_depth(document, &operation.node.selection_set.node, &mut Vec::new())
        })
        .max()
        .unwrap_or(0)
}

/// Summed cost of the document at uniform cost 1 per field occurrence, with
/// fragments expanded at each spread site.
pub fn document_complexity(document: &ExecutableDocument) -> usize {
    document
        .operations
        .iter()
        .map(|(_, operation)| {
            selection_cost(document, &operation.node.selection_set.node, &mut Vec::new())
        })
        .sum()
}

/// Total syntactic nodes in the parsed document: every operation definition,
/// fragment definition, field, inline fragment, fragment spread, and
/// argument counts as one. Definitions count once, not per spread.
pub fn document_nodes(document: &ExecutableDocument) -> usize {
    let mut count = 0;
    for (_, operation) in document.operations.iter() {
        count += 1;
        count += selection_nodes(&operation.node.selection_set.node);
    }
    for fragment in document.fragments.values() {
        count += 1;
        count += selection_nodes(&fragment.node.selection_set.node);
    }
    count
}

fn selection_depth(
    document: &ExecutableDocument,
    selection_set: &SelectionSet,
    visiting: &mut Vec<String>,
) -> usize {
    selection_set
        .items
        .iter()
        .map(|selection| match &selection.node {
            Selection::Field(field) => {
                1 + selection_depth(document, &field.node.selection_set.node, visiting)
            }
            Selection::InlineFragment(fragment) => {
                selection_depth(document, &fragment.node.selection_set.node, visiting)
            }
            Selection::FragmentSpread(spread) => {
                with_fragment(document, spread.node.fragment_name.node.as_str(), visiting, |set, visiting| {
                    selection_depth(document, set, visiting)
                })
            }
        })
        .max()
        .unwrap_or(0)
}

fn selection_cost(
    document: &ExecutableDocument,
    selection_set: &SelectionSet,
    visiting: &mut Vec<String>,
) -> usize {
    selection_set
        .items
        .iter()
        .map(|selection| match &selection.node {
            Selection::Field(field) => {
                1 + selection_cost(document, &field.node.selection_set.node, visiting)
            }
            Selection::InlineFragment(fragment) => {
                selection_cost(document, &fragment.node.selection_set.node, visiting)
            }
            Selection::FragmentSpread(spread) => {
                with_fragment(document, spread.node.fragment_name.node.as_str(), visiting, |set, visiting| {
                    selection_cost(document, set, visiting)
                })
            }
        })
        .sum()
}

fn selection_nodes(selection_set: &SelectionSet) -> usize {
    selection_set
        .items
        .iter()
        .map(|selection| match &selection.node {
            Selection::Field(field) => {
                1 + field.node.arguments.len() + selection_nodes(&field.node.selection_set.node)
            }
            Selection::InlineFragment(fragment) => {
                1 + selection_nodes(&fragment.node.selection_set.node)
            }
            Selection::FragmentSpread(_) => 1,
        })
        .sum()
}

/// Resolves a named fragment and runs `walk` over its selection set. Unknown
/// fragments contribute nothing, and a fragment already on the visiting stack
/// is skipped so malformed cyclic fragments terminate.
fn with_fragment<F>(
    document: &ExecutableDocument,
    name: &str,
    visiting: &mut Vec<String>,
    walk: F,
) -> usize
where
    F: FnOnce(&SelectionSet, &mut Vec<String>) -> usize,
{
    if visiting.iter().any(|n| n == name) {
        return 0;
    }
    let Some(fragment) = document
        .fragments
        .iter()
        .find(|(fragment_name, _)| fragment_name.as_str() == name)
        .map(|(_, fragment)| fragment)
    else {
        return 0;
    };
    visiting.push(name.to_string());
    let result = walk(&fragment.node.selection_set.node, visiting);
    visiting.pop();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(query: &str) -> ExecutableDocument {
        parse_query(query).expect("query should parse")
    }

    #[test]
    fn depth_counts_field_nesting() {
        assert_eq!(document_depth(&parse("{ a }")), 1);
        assert_eq!(document_depth(&parse("{ a { b { c } } d }")), 3);
    }

    #[test]
    fn depth_resolves_fragment_spreads() {
        let doc = parse("{ a { ...deep } } fragment deep on T { b { c } }");
        assert_eq!(document_depth(&doc), 3);
    }

    #[test]
    fn depth_terminates_on_cyclic_fragments() {
        let doc = parse(
            "{ ...a } fragment a on T { x { ...b } } fragment b on T { y { ...a } }",
        );
        // Each fragment is entered once per path; the cycle is cut.
        assert_eq!(document_depth(&doc), 2);
    }

    #[test]
    fn complexity_is_one_per_field_occurrence() {
        assert_eq!(document_complexity(&parse("{ a b c }")), 3);
        assert_eq!(document_complexity(&parse("{ a { b } c }")), 3);
    }

    #[test]
    fn complexity_expands_fragments_per_spread() {
        let doc = parse("{ a { ...f } b { ...f } } fragment f on T { x y }");
        // a, b, plus x/y twice.
        assert_eq!(document_complexity(&doc), 6);
    }

    #[test]
    fn node_count_includes_arguments_and_definitions() {
        // 1 operation + 2 fields + 1 argument.
        assert_eq!(document_nodes(&parse("{ a(first: 10) { b } }")), 4);
        // 1 operation + 1 field + 1 spread + 1 fragment definition + 2 fields.
        let doc = parse("{ a ...f } fragment f on T { x y }");
        assert_eq!(document_nodes(&doc), 6);
    }

    #[test]
    fn violations_are_collected_not_short_circuited() {
        let limiter = QueryLimiter::new(QueryLimits {
            max_depth: Some(1),
            max_complexity: Some(1),
            max_nodes: Some(1),
        });
        let errors = limiter.check("{ a { b } c }").unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn parse_failure_is_an_admission_error() {
        let limiter = QueryLimiter::new(QueryLimits::default());
        let errors = limiter.check("{ a").unwrap_err();
        assert!(matches!(errors[0], AdmissionError::Parse(_)));
    }

    #[test]
    fn unbounded_dimensions_admit_everything() {
        let limiter = QueryLimiter::new(QueryLimits::default());
        assert!(limiter.check("{ a { b { c { d } } } }").is_ok());
    }
}
