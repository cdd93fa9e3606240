//! Name-resolution scopes
//!
//! A scope holds the tables visible to one SELECT core, in FROM-then-JOIN
//! order, plus a link to the enclosing scope for correlated references.

use sqlineage_ast::{ColumnRef, Span};

use crate::{ColumnLineage, LineageError, SourceColumn};

/// What is known about one visible table
#[derive(Debug, Clone)]
pub(crate) enum EntryKind {
    /// Output columns of a CTE, derived table, or schema-described table
    Known(Vec<ColumnLineage>),
    /// A physical table with no schema entry; any column name is accepted
    Opaque { table: String },
}

#[derive(Debug, Clone)]
pub(crate) struct ScopeEntry {
    /// Alias or table name; `None` for an unaliased derived table
    pub name: Option<String>,
    pub kind: EntryKind,
}

impl ScopeEntry {
    pub fn label(&self) -> String {
        match (&self.name, &self.kind) {
            (Some(name), _) => name.clone(),
            (None, EntryKind::Opaque { table }) => table.clone(),
            (None, EntryKind::Known(_)) => "(subquery)".to_string(),
        }
    }

    pub fn matches(&self, qualifier: &str) -> bool {
        self.name
            .as_deref()
            .is_some_and(|name| name.eq_ignore_ascii_case(qualifier))
    }

    fn column(&self, name: &str) -> Option<&ColumnLineage> {
        match &self.kind {
            EntryKind::Known(columns) => columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)),
            EntryKind::Opaque { .. } => None,
        }
    }

    /// Known entries answer exactly; a table without a schema entry might hold any column
    fn may_have(&self, name: &str) -> bool {
        match &self.kind {
            EntryKind::Known(_) => self.column(name).is_some(),
            EntryKind::Opaque { .. } => true,
        }
    }

    /// Output column names of a known entry
    pub fn known_names(&self) -> Vec<String> {
        match &self.kind {
            EntryKind::Known(columns) => columns.iter().map(|c| c.name.clone()).collect(),
            EntryKind::Opaque { .. } => Vec::new(),
        }
    }
}

/// Where a column reference landed
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Resolved<'s> {
    /// A column with known lineage
    Column(&'s ColumnLineage),
    /// A column of a table without a schema entry
    Opaque(SourceColumn),
}

/// One `USING` / `NATURAL` join column and the entries it merges
#[derive(Debug, Clone)]
pub(crate) struct JoinColumn {
    pub name: String,
    /// Indices into `Scope::entries`, ascending
    pub entries: Vec<usize>,
}

#[derive(Debug, Default)]
pub(crate) struct Scope<'p> {
    pub entries: Vec<ScopeEntry>,
    pub join_columns: Vec<JoinColumn>,
    parent: Option<&'p Scope<'p>>,
}

impl<'p> Scope<'p> {
    pub fn new(parent: Option<&'p Scope<'p>>) -> Self {
        Self {
            entries: Vec::new(),
            join_columns: Vec::new(),
            parent,
        }
    }

    /// Record that the entry at `joined` was joined on `name` with every
    /// earlier entry that may carry that column
    pub fn merge_join_column(&mut self, name: &str, joined: usize) {
        let mut entries: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .take(joined)
            .filter(|(_, e)| e.may_have(name))
            .map(|(i, _)| i)
            .collect();
        entries.push(joined);
        self.join_columns.push(JoinColumn {
            name: name.to_string(),
            entries,
        });
    }

    /// True when one join column merges every listed entry
    fn merged(&self, name: &str, indices: &[usize]) -> bool {
        self.join_columns.iter().any(|j| {
            j.name.eq_ignore_ascii_case(name) && indices.iter().all(|i| j.entries.contains(i))
        })
    }

    /// True when `*` has already emitted this column from an earlier merged entry
    pub fn merged_with_earlier(&self, name: &str, index: usize) -> bool {
        self.join_columns.iter().any(|j| {
            j.name.eq_ignore_ascii_case(name)
                && j.entries.contains(&index)
                && j.entries.iter().any(|&i| i < index)
        })
    }

    /// Entries a `table.*` item refers to
    pub fn find_entry(&self, qualifier: &str) -> Option<&ScopeEntry> {
        self.entries.iter().find(|e| e.matches(qualifier))
    }

    pub fn resolve(&self, col: &ColumnRef, span: Span) -> Result<Resolved<'_>, LineageError> {
        match col.table() {
            Some(qualifier) => self.resolve_qualified(qualifier, col, span),
            None => self.resolve_bare(col, span),
        }
    }

    fn resolve_qualified(
        &self,
        qualifier: &str,
        col: &ColumnRef,
        span: Span,
    ) -> Result<Resolved<'_>, LineageError> {
        let Some(entry) = self.find_entry(qualifier) else {
            return match self.parent {
                Some(parent) => parent.resolve(col, span),
                None => Err(LineageError::UnknownTable {
                    name: col.qualifier_path().unwrap_or_default(),
                    span,
                }),
            };
        };
        entry_column(entry, col, span)
    }

    /// An unqualified name must be carried by exactly one entry, unless a
    /// join column merges all of the entries that may carry it.
    fn resolve_bare(&self, col: &ColumnRef, span: Span) -> Result<Resolved<'_>, LineageError> {
        let candidates: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.may_have(&col.name))
            .map(|(i, _)| i)
            .collect();

        match candidates.as_slice() {
            [] => match self.parent {
                Some(parent) => parent.resolve(col, span),
                None => Err(LineageError::UnknownColumn {
                    column: col.name.clone(),
                    span,
                }),
            },
            [first, ..] if candidates.len() == 1 || self.merged(&col.name, &candidates) => {
                entry_column(&self.entries[*first], col, span)
            }
            _ => Err(LineageError::AmbiguousColumn {
                column: col.name.clone(),
                candidates: candidates.iter().map(|&i| self.entries[i].label()).collect(),
                span,
            }),
        }
    }
}

fn entry_column<'s>(
    entry: &'s ScopeEntry,
    col: &ColumnRef,
    span: Span,
) -> Result<Resolved<'s>, LineageError> {
    match &entry.kind {
        EntryKind::Opaque { table } => Ok(Resolved::Opaque(SourceColumn::new(table, &col.name))),
        EntryKind::Known(_) => entry
            .column(&col.name)
            .map(Resolved::Column)
            .ok_or_else(|| LineageError::UnknownColumn {
                column: col.to_string(),
                span,
            }),
    }
}
