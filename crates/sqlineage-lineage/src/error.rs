//! Lineage resolution errors

use serde::Serialize;
use sqlineage_ast::Span;
use thiserror::Error;

/// A column-scoped resolution failure
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineageError {
    #[error("column {column} is ambiguous between {}", .candidates.join(", "))]
    AmbiguousColumn {
        column: String,
        candidates: Vec<String>,
        span: Span,
    },

    #[error("unknown table {name}")]
    UnknownTable { name: String, span: Span },

    #[error("unknown column {column}")]
    UnknownColumn { column: String, span: Span },

    #[error("no schema entry for table {table}; cannot expand *")]
    MissingSchema { table: String, span: Span },
}

impl LineageError {
    pub fn span(&self) -> Span {
        match self {
            LineageError::AmbiguousColumn { span, .. } => *span,
            LineageError::UnknownTable { span, .. } => *span,
            LineageError::UnknownColumn { span, .. } => *span,
            LineageError::MissingSchema { span, .. } => *span,
        }
    }
}
