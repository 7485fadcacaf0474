use serde::{Deserialize, Serialize};

use crate::model::{Identifier, Need, QueryId, Span, Transform};

/// One reason an evaluated task cannot be placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    /// A wait-flagged need finds too few documents over `span`.
    NeedUnmet { span: Span, need: Need },
    /// A wait-flagged output no other task needs.
    OutputUnconsumed { ranges: Vec<Span>, transform: Transform },
    /// A consumer exists, but its deadline window does not survive intersection.
    OutputDeadlineUnreachable {
        ranges: Vec<Span>,
        transform: Transform,
        consumer: Identifier,
    },
}

impl Diagnostic {
    pub fn kind(&self) -> &'static str {
        match self {
            Diagnostic::NeedUnmet { .. } => "need_unmet",
            Diagnostic::OutputUnconsumed { .. } => "output_unconsumed",
            Diagnostic::OutputDeadlineUnreachable { .. } => "output_deadline_unreachable",
        }
    }

    pub fn ranges(&self) -> &[Span] {
        match self {
            Diagnostic::NeedUnmet { span, .. } => std::slice::from_ref(span),
            Diagnostic::OutputUnconsumed { ranges, .. }
            | Diagnostic::OutputDeadlineUnreachable { ranges, .. } => ranges,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::NeedUnmet { span, need } => write!(
                f,
                "need of {} x{} unmet over [{}, {})",
                need.collection_name, need.quantity, span.start, span.end
            ),
            Diagnostic::OutputUnconsumed { transform, .. } => match transform.collection_name() {
                Some(name) => write!(f, "output to {name} is never consumed"),
                None => write!(f, "update output is never consumed"),
            },
            Diagnostic::OutputDeadlineUnreachable {
                ranges, consumer, ..
            } => write!(f, "output consumed by {consumer} only within {ranges:?}"),
        }
    }
}

#[derive(Debug)]
pub enum EngineError {
    Unsatisfiable(Vec<Diagnostic>),
    UnknownQuery(QueryId),
    InvalidSpan(Span),
    LimitExceeded(&'static str),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Unsatisfiable(diagnostics) => {
                write!(f, "unsatisfiable: {} failing dependencies", diagnostics.len())?;
                if let Some(first) = diagnostics.first() {
                    write!(f, " (first: {first})")?;
                }
                Ok(())
            }
            EngineError::UnknownQuery(id) => write!(f, "unknown query: {id}"),
            EngineError::InvalidSpan(span) => {
                write!(f, "invalid span [{}, {})", span.start, span.end)
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
