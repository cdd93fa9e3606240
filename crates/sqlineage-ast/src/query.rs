//! Statement and query-structure AST nodes

use serde::{Deserialize, Serialize};
use crate::{Expr, Span};

/// A complete `SELECT` / `WITH` statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub with: Option<WithClause>,
    pub body: SelectBody,
    pub span: Span,
}

/// `WITH [RECURSIVE] name AS (...), ...`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithClause {
    pub recursive: bool,
    pub ctes: Vec<Cte>,
    pub span: Span,
}

impl WithClause {
    /// Find a CTE by name (case-insensitive)
    pub fn find(&self, name: &str) -> Option<&Cte> {
        self.ctes.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// A single common table expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cte {
    pub name: String,
    /// Optional output column names: `name(a, b) AS (...)`
    pub columns: Vec<String>,
    pub materialized: Option<bool>,
    pub query: Box<Statement>,
    pub span: Span,
}

/// Left-leaning chain of cores joined by set operators.
///
/// `a UNION b EXCEPT c` is `SetOp(SetOp(Core(a), UNION, b), EXCEPT, c)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectBody {
    Core(Box<SelectCore>),
    SetOp {
        left: Box<SelectBody>,
        op: SetOperator,
        right: Box<SelectCore>,
        span: Span,
    },
}

impl SelectBody {
    pub fn span(&self) -> Span {
        match self {
            SelectBody::Core(core) => core.span,
            SelectBody::SetOp { span, .. } => *span,
        }
    }

    /// The leftmost core; it names the output columns
    pub fn first_core(&self) -> &SelectCore {
        match self {
            SelectBody::Core(core) => core,
            SelectBody::SetOp { left, .. } => left.first_core(),
        }
    }

    /// Every core in source order
    pub fn cores(&self) -> Vec<&SelectCore> {
        let mut cores = Vec::new();
        self.collect_cores(&mut cores);
        cores
    }

    fn collect_cores<'a>(&'a self, out: &mut Vec<&'a SelectCore>) {
        match self {
            SelectBody::Core(core) => out.push(&**core),
            SelectBody::SetOp { left, right, .. } => {
                left.collect_cores(out);
                out.push(&**right);
            }
        }
    }

    /// The `(operator, core)` pairs following the first core, in source order
    pub fn operations(&self) -> Vec<(SetOperator, &SelectCore)> {
        match self {
            SelectBody::Core(_) => Vec::new(),
            SelectBody::SetOp {
                left, op, right, ..
            } => {
                let mut ops = left.operations();
                ops.push((*op, &**right));
                ops
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOperator {
    pub kind: SetOpKind,
    /// `UNION ALL` / `INTERSECT ALL` / `EXCEPT ALL`
    pub all: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOpKind {
    Union,
    Intersect,
    Except,
}

impl SetOpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetOpKind::Union => "UNION",
            SetOpKind::Intersect => "INTERSECT",
            SetOpKind::Except => "EXCEPT",
        }
    }
}

/// One `SELECT ... FROM ... WHERE ...` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectCore {
    pub distinct: bool,
    pub items: Vec<SelectItem>,
    pub from: Option<FromClause>,
    pub where_clause: Option<Expr>,
    pub group_by: GroupBy,
    pub having: Option<Expr>,
    pub windows: Vec<NamedWindow>,
    pub qualify: Option<Expr>,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<Expr>,
    pub offset: Option<Expr>,
    pub span: Span,
}

impl SelectCore {
    /// Look up a `WINDOW name AS (...)` definition
    pub fn named_window(&self, name: &str) -> Option<&WindowDef> {
        self.windows
            .iter()
            .find(|w| w.name.eq_ignore_ascii_case(name))
            .map(|w| &w.def)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectItem {
    pub kind: SelectItemKind,
    pub span: Span,
}

/// Exactly one of star, table-star or expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectItemKind {
    /// `*`
    Star,
    /// `t.*` or `s.t.*`; the qualifier is kept dotted
    TableStar(String),
    /// `expr [AS alias]`
    Expr { expr: Expr, alias: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum GroupBy {
    #[default]
    None,
    /// `GROUP BY ALL`
    All,
    Exprs(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FromClause {
    pub source: TableRef,
    pub joins: Vec<Join>,
    pub span: Span,
}

impl FromClause {
    /// The source followed by each join's right-hand side, in source order
    pub fn tables(&self) -> impl Iterator<Item = &TableRef> {
        std::iter::once(&self.source).chain(self.joins.iter().map(|j| &j.table))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub table: TableRef,
    pub constraint: JoinConstraint,
    /// `FROM a, b` is modeled as a cross join with this flag set
    pub implicit: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

/// A join has at most one of these, never a condition alongside USING/NATURAL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JoinConstraint {
    None,
    On(Expr),
    Using(Vec<String>),
    Natural,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableRef {
    Table(TableName),
    Derived(DerivedTable),
    Lateral(DerivedTable),
}

impl TableRef {
    pub fn span(&self) -> Span {
        match self {
            TableRef::Table(t) => t.span,
            TableRef::Derived(d) | TableRef::Lateral(d) => d.span,
        }
    }

    /// The name this table is visible under in its scope
    pub fn visible_name(&self) -> Option<&str> {
        match self {
            TableRef::Table(t) => Some(t.alias.as_deref().unwrap_or(&t.name)),
            TableRef::Derived(d) | TableRef::Lateral(d) => d.alias.as_deref(),
        }
    }
}

/// `[catalog.][schema.]name [AS alias]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableName {
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub name: String,
    pub alias: Option<String>,
    pub span: Span,
}

impl TableName {
    /// Dotted name as written, without the alias
    pub fn qualified_name(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(3);
        if let Some(catalog) = &self.catalog {
            parts.push(catalog);
        }
        if let Some(schema) = &self.schema {
            parts.push(schema);
        }
        parts.push(&self.name);
        parts.join(".")
    }

    pub fn is_qualified(&self) -> bool {
        self.schema.is_some() || self.catalog.is_some()
    }
}

/// `(subquery) [AS alias[(columns)]]`, also used for `LATERAL (subquery)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedTable {
    pub query: Box<Statement>,
    pub alias: Option<String>,
    pub columns: Vec<String>,
    pub span: Span,
}

/// ORDER BY item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub expr: Expr,
    pub direction: OrderDirection,
    pub nulls: Option<NullsOrder>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NullsOrder {
    First,
    Last,
}

/// `WINDOW name AS (...)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedWindow {
    pub name: String,
    pub def: WindowDef,
    pub span: Span,
}

/// The `OVER` part of a window function call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WindowSpec {
    /// `OVER name`
    Named(String),
    /// `OVER (...)`
    Inline(WindowDef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowDef {
    /// `OVER (w ORDER BY ...)` refines the named window `w`
    pub base: Option<String>,
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<OrderItem>,
    pub frame: Option<FrameSpec>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSpec {
    pub units: FrameUnits,
    pub start: FrameBound,
    /// Absent for the single-bound shorthand `ROWS 3 PRECEDING`
    pub end: Option<FrameBound>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameUnits {
    Rows,
    Range,
    Groups,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding(Box<Expr>),
    CurrentRow,
    Following(Box<Expr>),
    UnboundedFollowing,
}
