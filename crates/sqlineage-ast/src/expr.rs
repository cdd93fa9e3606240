//! Expression AST nodes

use serde::{Deserialize, Serialize};
use crate::{OrderItem, Span, Statement, WindowSpec};

/// An expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// Column reference: `a`, `t.a`, `s.t.a`
    Column(ColumnRef),

    /// Literal value: `42`, `'text'`, `TRUE`, `NULL`
    Literal(Literal),

    /// Unary operation: `NOT x`, `-y`
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    /// Binary operation: `a + b`, `x = y`, `p AND q`
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Function call, optionally aggregate-filtered or windowed
    Function(FunctionCall),

    /// `CASE [operand] WHEN .. THEN .. [ELSE ..] END`
    Case {
        operand: Option<Box<Expr>>,
        branches: Vec<CaseBranch>,
        else_result: Option<Box<Expr>>,
    },

    /// `CAST(x AS T)`, `TRY_CAST(x AS T)`, `x::T`
    Cast {
        expr: Box<Expr>,
        data_type: DataType,
        style: CastStyle,
    },

    /// `x [NOT] IN (a, b, c)`
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },

    /// `x [NOT] IN (SELECT ...)`
    InSubquery {
        expr: Box<Expr>,
        subquery: Box<Statement>,
        negated: bool,
    },

    /// `x [NOT] BETWEEN low AND high`
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },

    /// `x IS [NOT] NULL`
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },

    /// `x [NOT] LIKE p [ESCAPE e]`, `x [NOT] ILIKE p [ESCAPE e]`
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        escape: Option<Box<Expr>>,
        negated: bool,
        case_insensitive: bool,
    },

    /// `EXISTS (SELECT ...)`
    Exists(Box<Statement>),

    /// `(SELECT ...)` used as a value; never legal in the SELECT list
    Subquery(Box<Statement>),

    /// Parenthesized expression: `(a + b)`
    Nested(Box<Expr>),

    /// Array index: `arr[1]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },

    /// List literal: `[1, 2, 3]`
    Array(Vec<Expr>),
}

/// A possibly qualified column name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Qualifier parts before the column, outermost first
    pub qualifier: Vec<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            qualifier: Vec::new(),
            name: name.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            qualifier: vec![table.into()],
            name: name.into(),
        }
    }

    /// The table (or alias) part of the qualifier, if any
    pub fn table(&self) -> Option<&str> {
        self.qualifier.last().map(String::as_str)
    }

    /// Full dotted qualifier: `s.t` for `s.t.a`
    pub fn qualifier_path(&self) -> Option<String> {
        if self.qualifier.is_empty() {
            None
        } else {
            Some(self.qualifier.join("."))
        }
    }
}

/// A literal value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Boolean(bool),
    /// Kept as written so `1.50` and `1e3` survive unchanged
    Number(String),
    /// Unescaped contents
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Logical
    Or,
    And,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    IsDistinctFrom,
    IsNotDistinctFrom,

    // Additive
    Add,
    Sub,
    Concat,

    // Multiplicative
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Or => "OR",
            BinaryOp::And => "AND",
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::IsDistinctFrom => "IS DISTINCT FROM",
            BinaryOp::IsNotDistinctFrom => "IS NOT DISTINCT FROM",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Concat => "||",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }
}

/// `name([DISTINCT] args [ORDER BY ..]) [FILTER (WHERE ..)] [OVER ..]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
    /// `COUNT(*)`
    pub wildcard: bool,
    pub distinct: bool,
    /// Ordered-aggregate arguments: `STRING_AGG(x, ',' ORDER BY y)`
    pub order_by: Vec<OrderItem>,
    pub filter: Option<Box<Expr>>,
    pub over: Option<WindowSpec>,
    /// False for niladic forms such as bare `CURRENT_TIMESTAMP`
    pub parens: bool,
}

impl FunctionCall {
    /// A plain `name(args)` call
    pub fn simple(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            name: name.into(),
            args,
            wildcard: false,
            distinct: false,
            order_by: Vec::new(),
            filter: None,
            over: None,
            parens: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseBranch {
    pub condition: Expr,
    pub result: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastStyle {
    Cast,
    TryCast,
    /// DuckDB/Postgres `x::T`
    DoubleColon,
}

/// Type name as written: `DECIMAL(10, 2)`, `VARCHAR[]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataType {
    /// Upper-cased, multi-word names joined by a single space
    pub name: String,
    pub args: Vec<String>,
    pub array_dims: usize,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Strip any number of enclosing parentheses
    pub fn unparenthesized(&self) -> &Expr {
        match &self.kind {
            ExprKind::Nested(inner) => inner.unparenthesized(),
            _ => self,
        }
    }

    /// Direct sub-expressions, in source order.
    ///
    /// Subquery bodies are not expressions of this scope and are skipped;
    /// window and filter clauses of a call are included.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Column(_) | ExprKind::Literal(_) => vec![],
            ExprKind::Exists(_) | ExprKind::Subquery(_) => vec![],
            ExprKind::Unary { operand, .. } => vec![&**operand],
            ExprKind::Binary { left, right, .. } => vec![&**left, &**right],
            ExprKind::Function(call) => {
                let mut out: Vec<&Expr> = call.args.iter().collect();
                out.extend(call.order_by.iter().map(|o| &o.expr));
                if let Some(filter) = &call.filter {
                    out.push(&**filter);
                }
                if let Some(WindowSpec::Inline(def)) = &call.over {
                    out.extend(def.partition_by.iter());
                    out.extend(def.order_by.iter().map(|o| &o.expr));
                }
                out
            }
            ExprKind::Case {
                operand,
                branches,
                else_result,
            } => {
                let mut out: Vec<&Expr> = Vec::new();
                if let Some(op) = operand {
                    out.push(&**op);
                }
                for branch in branches {
                    out.push(&branch.condition);
                    out.push(&branch.result);
                }
                if let Some(e) = else_result {
                    out.push(&**e);
                }
                out
            }
            ExprKind::Cast { expr, .. } => vec![&**expr],
            ExprKind::InList { expr, list, .. } => {
                let mut out: Vec<&Expr> = vec![&**expr];
                out.extend(list.iter());
                out
            }
            ExprKind::InSubquery { expr, .. } => vec![&**expr],
            ExprKind::Between {
                expr, low, high, ..
            } => vec![&**expr, &**low, &**high],
            ExprKind::IsNull { expr, .. } => vec![&**expr],
            ExprKind::Like {
                expr,
                pattern,
                escape,
                ..
            } => {
                let mut out: Vec<&Expr> = vec![&**expr, &**pattern];
                out.extend(escape.as_deref());
                out
            }
            ExprKind::Nested(inner) => vec![&**inner],
            ExprKind::Index { object, index } => vec![&**object, &**index],
            ExprKind::Array(items) => items.iter().collect(),
        }
    }

    /// Pre-order walk over this expression and every sub-expression
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expr)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Column references in source order, duplicates included
    pub fn column_refs(&self) -> Vec<&ColumnRef> {
        let mut refs = Vec::new();
        self.walk(&mut |e| {
            if let ExprKind::Column(col) = &e.kind {
                refs.push(col);
            }
        });
        refs
    }

    /// Subquery statements nested anywhere in this expression
    pub fn subqueries(&self) -> Vec<&Statement> {
        let mut out = Vec::new();
        self.walk(&mut |e| match &e.kind {
            ExprKind::InSubquery { subquery, .. }
            | ExprKind::Exists(subquery)
            | ExprKind::Subquery(subquery) => out.push(&**subquery),
            _ => {}
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> Expr {
        Expr::new(ExprKind::Column(ColumnRef::bare(name)), Span::dummy())
    }

    #[test]
    fn test_column_refs_in_order() {
        let expr = Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Add,
                left: Box::new(col("a")),
                right: Box::new(Expr::new(
                    ExprKind::Function(FunctionCall::simple("abs", vec![col("b"), col("a")])),
                    Span::dummy(),
                )),
            },
            Span::dummy(),
        );
        let names: Vec<_> = expr.column_refs().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_unparenthesized() {
        let inner = col("x");
        let nested = Expr::new(
            ExprKind::Nested(Box::new(Expr::new(
                ExprKind::Nested(Box::new(inner.clone())),
                Span::dummy(),
            ))),
            Span::dummy(),
        );
        assert_eq!(nested.unparenthesized(), &inner);
    }

    #[test]
    fn test_column_ref_qualifier() {
        let c = ColumnRef {
            qualifier: vec!["main".into(), "orders".into()],
            name: "id".into(),
        };
        assert_eq!(c.table(), Some("orders"));
        assert_eq!(c.qualifier_path().as_deref(), Some("main.orders"));
        assert_eq!(ColumnRef::bare("id").table(), None);
    }
}
