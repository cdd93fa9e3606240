//! Lineage report types

use serde::{Deserialize, Serialize};

use crate::LineageError;

/// How an output column is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    /// Copied or computed from its sources by ordinary expressions
    #[default]
    Passthrough,
    /// Result of an aggregate function
    Aggregate,
    /// Result of a function carrying an `OVER` clause
    Window,
    /// Produced with no column input (`CURRENT_TIMESTAMP`, `RANDOM()`)
    Generator,
}

impl TransformKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformKind::Passthrough => "passthrough",
            TransformKind::Aggregate => "aggregate",
            TransformKind::Window => "window",
            TransformKind::Generator => "generator",
        }
    }
}

/// One physical source column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceColumn {
    pub table: String,
    pub column: String,
}

impl SourceColumn {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl std::fmt::Display for SourceColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Lineage of a single output column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLineage {
    pub name: String,
    /// Empty for passthrough, otherwise the upper-case function name
    pub transform: String,
    pub kind: TransformKind,
    /// Physical source columns in first-reference order, deduplicated
    pub sources: Vec<SourceColumn>,
}

impl ColumnLineage {
    pub fn passthrough(name: impl Into<String>, sources: Vec<SourceColumn>) -> Self {
        Self {
            name: name.into(),
            transform: String::new(),
            kind: TransformKind::Passthrough,
            sources,
        }
    }
}

/// Result of analyzing one statement
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LineageReport {
    /// Physical tables in first-reference order, deduplicated
    pub sources: Vec<String>,
    /// Output columns in SELECT-list order, after `*` expansion
    pub columns: Vec<ColumnLineage>,
    /// Column-scoped resolution failures; analysis continues past each one
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<LineageError>,
}

impl LineageReport {
    /// Find an output column by name (case-insensitive)
    pub fn column(&self, name: &str) -> Option<&ColumnLineage> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fail-fast view of the report: the first error, if any
    pub fn into_result(self) -> Result<LineageReport, LineageError> {
        match self.errors.first() {
            Some(err) => Err(err.clone()),
            None => Ok(self),
        }
    }
}

/// Append unless an equal item is already present
pub(crate) fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}
