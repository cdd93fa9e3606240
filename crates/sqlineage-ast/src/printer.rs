//! Compact SQL rendering of expressions
//!
//! Used to name unaliased output columns (`sum(amount)`) and in
//! diagnostics. Output is canonical rather than byte-for-byte faithful:
//! keywords come out upper-case and whitespace is normalized.

use std::fmt::{self, Display, Formatter};

use crate::*;

fn write_list<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl Display for ColumnRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for part in &self.qualifier {
            write!(f, "{}.", part)?;
        }
        write!(f, "{}", self.name)
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "NULL"),
            Literal::Boolean(true) => write!(f, "TRUE"),
            Literal::Boolean(false) => write!(f, "FALSE"),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "(")?;
            write_list(f, &self.args)?;
            write!(f, ")")?;
        }
        for _ in 0..self.array_dims {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

impl Display for OrderItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        if self.direction == OrderDirection::Desc {
            write!(f, " DESC")?;
        }
        match self.nulls {
            Some(NullsOrder::First) => write!(f, " NULLS FIRST"),
            Some(NullsOrder::Last) => write!(f, " NULLS LAST"),
            None => Ok(()),
        }
    }
}

impl Display for FrameBound {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FrameBound::UnboundedPreceding => write!(f, "UNBOUNDED PRECEDING"),
            FrameBound::Preceding(n) => write!(f, "{} PRECEDING", n),
            FrameBound::CurrentRow => write!(f, "CURRENT ROW"),
            FrameBound::Following(n) => write!(f, "{} FOLLOWING", n),
            FrameBound::UnboundedFollowing => write!(f, "UNBOUNDED FOLLOWING"),
        }
    }
}

impl Display for WindowDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(base) = &self.base {
            parts.push(base.clone());
        }
        if !self.partition_by.is_empty() {
            let exprs: Vec<String> = self.partition_by.iter().map(|e| e.to_string()).collect();
            parts.push(format!("PARTITION BY {}", exprs.join(", ")));
        }
        if !self.order_by.is_empty() {
            let items: Vec<String> = self.order_by.iter().map(|o| o.to_string()).collect();
            parts.push(format!("ORDER BY {}", items.join(", ")));
        }
        if let Some(frame) = &self.frame {
            let units = match frame.units {
                FrameUnits::Rows => "ROWS",
                FrameUnits::Range => "RANGE",
                FrameUnits::Groups => "GROUPS",
            };
            match &frame.end {
                Some(end) => parts.push(format!("{} BETWEEN {} AND {}", units, frame.start, end)),
                None => parts.push(format!("{} {}", units, frame.start)),
            }
        }
        write!(f, "({})", parts.join(" "))
    }
}

impl Display for FunctionCall {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.parens {
            return Ok(());
        }
        write!(f, "(")?;
        if self.distinct {
            write!(f, "DISTINCT ")?;
        }
        if self.wildcard {
            write!(f, "*")?;
        } else {
            write_list(f, &self.args)?;
        }
        if !self.order_by.is_empty() {
            write!(f, " ORDER BY ")?;
            write_list(f, &self.order_by)?;
        }
        write!(f, ")")?;
        if let Some(filter) = &self.filter {
            write!(f, " FILTER (WHERE {})", filter)?;
        }
        match &self.over {
            Some(WindowSpec::Named(name)) => write!(f, " OVER {}", name),
            Some(WindowSpec::Inline(def)) => write!(f, " OVER {}", def),
            None => Ok(()),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Column(col) => write!(f, "{}", col),
            ExprKind::Literal(lit) => write!(f, "{}", lit),
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "NOT {}", operand),
                UnaryOp::Neg => write!(f, "-{}", operand),
                UnaryOp::Plus => write!(f, "+{}", operand),
            },
            ExprKind::Binary { op, left, right } => {
                write!(f, "{} {} {}", left, op.as_str(), right)
            }
            ExprKind::Function(call) => write!(f, "{}", call),
            ExprKind::Case {
                operand,
                branches,
                else_result,
            } => {
                write!(f, "CASE")?;
                if let Some(op) = operand {
                    write!(f, " {}", op)?;
                }
                for branch in branches {
                    write!(f, " WHEN {} THEN {}", branch.condition, branch.result)?;
                }
                if let Some(e) = else_result {
                    write!(f, " ELSE {}", e)?;
                }
                write!(f, " END")
            }
            ExprKind::Cast {
                expr,
                data_type,
                style,
            } => match style {
                CastStyle::Cast => write!(f, "CAST({} AS {})", expr, data_type),
                CastStyle::TryCast => write!(f, "TRY_CAST({} AS {})", expr, data_type),
                CastStyle::DoubleColon => write!(f, "{}::{}", expr, data_type),
            },
            ExprKind::InList {
                expr,
                list,
                negated,
            } => {
                write!(f, "{} {}IN (", expr, if *negated { "NOT " } else { "" })?;
                write_list(f, list)?;
                write!(f, ")")
            }
            ExprKind::InSubquery { expr, negated, .. } => {
                write!(f, "{} {}IN (...)", expr, if *negated { "NOT " } else { "" })
            }
            ExprKind::Between {
                expr,
                low,
                high,
                negated,
            } => write!(
                f,
                "{} {}BETWEEN {} AND {}",
                expr,
                if *negated { "NOT " } else { "" },
                low,
                high
            ),
            ExprKind::IsNull { expr, negated } => {
                write!(f, "{} IS {}NULL", expr, if *negated { "NOT " } else { "" })
            }
            ExprKind::Like {
                expr,
                pattern,
                escape,
                negated,
                case_insensitive,
            } => {
                write!(
                    f,
                    "{} {}{} {}",
                    expr,
                    if *negated { "NOT " } else { "" },
                    if *case_insensitive { "ILIKE" } else { "LIKE" },
                    pattern
                )?;
                match escape {
                    Some(escape) => write!(f, " ESCAPE {}", escape),
                    None => Ok(()),
                }
            }
            ExprKind::Exists(_) => write!(f, "EXISTS (...)"),
            ExprKind::Subquery(_) => write!(f, "(...)"),
            ExprKind::Nested(inner) => write!(f, "({})", inner),
            ExprKind::Index { object, index } => write!(f, "{}[{}]", object, index),
            ExprKind::Array(items) => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
        }
    }
}
