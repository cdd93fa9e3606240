//! Expression parsing by precedence climbing
//!
//! Loosest to tightest: OR, AND, NOT, one comparison-tier predicate,
//! `+ - ||`, `* / %`, unary sign, postfix `[i]` and `::type`, primary.

use sqlineage_ast::*;
use sqlineage_lexer::TokenKind;

use crate::{ParseError, Parser};

/// SQL functions that are called without parentheses
const NILADIC_FUNCTIONS: &[&str] = &[
    "CURRENT_TIMESTAMP",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "LOCALTIMESTAMP",
    "LOCALTIME",
];

/// Second words of multi-word type names: `DOUBLE PRECISION`, `CHARACTER VARYING`
const TYPE_CONTINUATIONS: &[&str] = &["PRECISION", "VARYING"];

impl<'a> Parser<'a> {
    pub(crate) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    pub(crate) fn parse_expr_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = vec![self.parse_expr()?];
        while self.eat(TokenKind::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    fn binary(&self, start: Span, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            self.span_from(start),
        )
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();
        let mut left = self.parse_and()?;

        while self.eat(TokenKind::Or) {
            let right = self.parse_and()?;
            left = self.binary(start, BinaryOp::Or, left, right);
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();
        let mut left = self.parse_not()?;

        while self.eat(TokenKind::And) {
            let right = self.parse_not()?;
            left = self.binary(start, BinaryOp::And, left, right);
        }

        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();
        if self.eat(TokenKind::Not) {
            let operand = self.parse_not()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                self.span_from(start),
            ));
        }
        self.parse_comparison()
    }

    /// At most one comparison-tier operator; `a = b = c` does not chain
    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();
        let left = self.parse_additive()?;

        let op = match self.peek() {
            TokenKind::Eq => Some(BinaryOp::Eq),
            TokenKind::NotEq => Some(BinaryOp::NotEq),
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::LtEq => Some(BinaryOp::LtEq),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::GtEq => Some(BinaryOp::GtEq),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let right = self.parse_additive()?;
            return Ok(self.binary(start, op, left, right));
        }

        if self.eat(TokenKind::Is) {
            let negated = self.eat(TokenKind::Not);
            if self.eat(TokenKind::Distinct) {
                self.consume(TokenKind::From)?;
                let right = self.parse_additive()?;
                let op = if negated {
                    BinaryOp::IsNotDistinctFrom
                } else {
                    BinaryOp::IsDistinctFrom
                };
                return Ok(self.binary(start, op, left, right));
            }
            self.consume(TokenKind::Null)?;
            return Ok(Expr::new(
                ExprKind::IsNull {
                    expr: Box::new(left),
                    negated,
                },
                self.span_from(start),
            ));
        }

        let negated = self.at(TokenKind::Not)
            && matches!(
                self.peek_ahead(1),
                TokenKind::In | TokenKind::Between | TokenKind::Like | TokenKind::Ilike
            );
        if negated {
            self.advance();
        }

        let kind = match self.peek() {
            TokenKind::In => {
                self.advance();
                self.parse_in_rhs(left, negated)?
            }
            TokenKind::Between => {
                self.advance();
                let low = self.parse_additive()?;
                self.consume(TokenKind::And)?;
                let high = self.parse_additive()?;
                ExprKind::Between {
                    expr: Box::new(left),
                    low: Box::new(low),
                    high: Box::new(high),
                    negated,
                }
            }
            TokenKind::Like | TokenKind::Ilike => {
                let case_insensitive = self.advance().kind == TokenKind::Ilike;
                let pattern = self.parse_additive()?;
                let escape = if self.eat(TokenKind::Escape) {
                    Some(Box::new(self.parse_additive()?))
                } else {
                    None
                };
                ExprKind::Like {
                    expr: Box::new(left),
                    pattern: Box::new(pattern),
                    escape,
                    negated,
                    case_insensitive,
                }
            }
            _ => return Ok(left),
        };

        Ok(Expr::new(kind, self.span_from(start)))
    }

    /// `( list )` or `( subquery )` after `[NOT] IN`
    fn parse_in_rhs(&mut self, left: Expr, negated: bool) -> Result<ExprKind, ParseError> {
        if self.at(TokenKind::LParen)
            && matches!(self.peek_ahead(1), TokenKind::Select | TokenKind::With)
        {
            let subquery = self.parse_subquery()?;
            return Ok(ExprKind::InSubquery {
                expr: Box::new(left),
                subquery: Box::new(subquery),
                negated,
            });
        }

        self.consume(TokenKind::LParen)?;
        let list = self.parse_expr_list()?;
        self.consume(TokenKind::RParen)?;
        Ok(ExprKind::InList {
            expr: Box::new(left),
            list,
            negated,
        })
    }

    /// `( SELECT ... )`; rejected inside a SELECT-list expression
    fn parse_subquery(&mut self) -> Result<Statement, ParseError> {
        if self.in_select_list {
            return Err(ParseError::ScalarSubquery {
                position: self.current().position,
            });
        }
        self.consume(TokenKind::LParen)?;
        let query = self.parse_query()?;
        self.consume(TokenKind::RParen)?;
        Ok(query)
    }

    pub(crate) fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                TokenKind::Concat => BinaryOp::Concat,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.binary(start, op, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = self.binary(start, op, left, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();

        let op = match self.peek() {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                self.span_from(start),
            ));
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();
        let mut expr = self.parse_primary()?;

        loop {
            if self.eat(TokenKind::LBracket) {
                let index = self.parse_expr()?;
                self.consume(TokenKind::RBracket)?;
                expr = Expr::new(
                    ExprKind::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    },
                    self.span_from(start),
                );
            } else if self.eat(TokenKind::DoubleColon) {
                let data_type = self.parse_data_type()?;
                expr = Expr::new(
                    ExprKind::Cast {
                        expr: Box::new(expr),
                        data_type,
                        style: CastStyle::DoubleColon,
                    },
                    self.span_from(start),
                );
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();

        let literal = match self.peek() {
            TokenKind::Number => Some(Literal::Number(self.current().text.clone())),
            TokenKind::String => Some(Literal::String(self.current().text.clone())),
            TokenKind::Null => Some(Literal::Null),
            TokenKind::True => Some(Literal::Boolean(true)),
            TokenKind::False => Some(Literal::Boolean(false)),
            _ => None,
        };
        if let Some(literal) = literal {
            self.advance();
            return Ok(Expr::new(ExprKind::Literal(literal), start));
        }

        match self.peek() {
            TokenKind::LParen => {
                if matches!(self.peek_ahead(1), TokenKind::Select | TokenKind::With) {
                    let query = self.parse_subquery()?;
                    return Ok(Expr::new(
                        ExprKind::Subquery(Box::new(query)),
                        self.span_from(start),
                    ));
                }
                self.advance();
                let inner = self.parse_expr()?;
                self.consume(TokenKind::RParen)?;
                Ok(Expr::new(
                    ExprKind::Nested(Box::new(inner)),
                    self.span_from(start),
                ))
            }
            TokenKind::LBracket => {
                self.advance();
                let items = if self.at(TokenKind::RBracket) {
                    vec![]
                } else {
                    self.parse_expr_list()?
                };
                self.consume(TokenKind::RBracket)?;
                Ok(Expr::new(ExprKind::Array(items), self.span_from(start)))
            }
            TokenKind::Exists => {
                if self.in_select_list {
                    return Err(ParseError::ScalarSubquery {
                        position: self.current().position,
                    });
                }
                self.advance();
                let query = self.parse_subquery()?;
                Ok(Expr::new(
                    ExprKind::Exists(Box::new(query)),
                    self.span_from(start),
                ))
            }
            TokenKind::Case => self.parse_case(),
            TokenKind::Cast | TokenKind::TryCast => self.parse_cast(),
            // LEFT('abc', 2) and RIGHT(...) are functions despite the join keywords
            TokenKind::Left | TokenKind::Right if self.peek_ahead(1) == TokenKind::LParen => {
                let name = self.name_text(self.current());
                self.advance();
                self.parse_function_call(start, name)
            }
            kind if kind.is_identifier() => self.parse_name_expr(),
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Column reference, function call or niladic function
    fn parse_name_expr(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();
        let plain = self.at(TokenKind::Ident);
        let mut parts = vec![self.parse_identifier("expression")?];

        while self.at(TokenKind::Dot) && self.peek_ahead(1).is_identifier() {
            self.advance();
            parts.push(self.parse_identifier("column name")?);
        }

        if self.at(TokenKind::LParen) {
            return self.parse_function_call(start, parts.join("."));
        }

        if plain && parts.len() == 1 {
            let upper = parts[0].to_ascii_uppercase();
            if NILADIC_FUNCTIONS.contains(&upper.as_str()) {
                let mut call = FunctionCall::simple(parts.remove(0), vec![]);
                call.parens = false;
                return Ok(Expr::new(ExprKind::Function(call), self.span_from(start)));
            }
        }

        let name = parts.pop().unwrap_or_default();
        Ok(Expr::new(
            ExprKind::Column(ColumnRef {
                qualifier: parts,
                name,
            }),
            self.span_from(start),
        ))
    }

    /// Everything after the function name, starting at `(`
    fn parse_function_call(&mut self, start: Span, name: String) -> Result<Expr, ParseError> {
        self.consume(TokenKind::LParen)?;
        let mut call = FunctionCall::simple(name, vec![]);

        if self.eat(TokenKind::Star) {
            call.wildcard = true;
        } else if !self.at(TokenKind::RParen) {
            if self.eat(TokenKind::Distinct) {
                call.distinct = true;
            } else {
                self.eat(TokenKind::All);
            }
            call.args = self.parse_expr_list()?;
            if self.eat(TokenKind::Order) {
                self.consume(TokenKind::By)?;
                call.order_by = self.parse_order_items()?;
            }
        }
        self.consume(TokenKind::RParen)?;

        if self.at(TokenKind::Filter) && self.peek_ahead(1) == TokenKind::LParen {
            self.advance();
            self.advance();
            self.consume(TokenKind::Where)?;
            call.filter = Some(Box::new(self.parse_expr()?));
            self.consume(TokenKind::RParen)?;
        }

        if self.eat(TokenKind::Over) {
            call.over = Some(if self.at(TokenKind::LParen) {
                WindowSpec::Inline(self.parse_window_def()?)
            } else {
                WindowSpec::Named(self.parse_identifier("window name or '('")?)
            });
        }

        Ok(Expr::new(ExprKind::Function(call), self.span_from(start)))
    }

    fn parse_case(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();
        self.consume(TokenKind::Case)?;

        let operand = if self.at(TokenKind::When) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };

        let mut branches = Vec::new();
        while self.eat(TokenKind::When) {
            let condition = self.parse_expr()?;
            self.consume(TokenKind::Then)?;
            let result = self.parse_expr()?;
            branches.push(CaseBranch { condition, result });
        }
        if branches.is_empty() {
            return Err(self.unexpected("WHEN"));
        }

        let else_result = if self.eat(TokenKind::Else) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        self.consume(TokenKind::End)?;

        Ok(Expr::new(
            ExprKind::Case {
                operand,
                branches,
                else_result,
            },
            self.span_from(start),
        ))
    }

    /// `CAST(x AS T)` / `TRY_CAST(x AS T)`
    fn parse_cast(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();
        let style = if self.advance().kind == TokenKind::TryCast {
            CastStyle::TryCast
        } else {
            CastStyle::Cast
        };
        self.consume(TokenKind::LParen)?;
        let expr = self.parse_expr()?;
        self.consume(TokenKind::As)?;
        let data_type = self.parse_data_type()?;
        self.consume(TokenKind::RParen)?;

        Ok(Expr::new(
            ExprKind::Cast {
                expr: Box::new(expr),
                data_type,
                style,
            },
            self.span_from(start),
        ))
    }

    /// `INTEGER`, `DECIMAL(10, 2)`, `DOUBLE PRECISION`, `VARCHAR[]`,
    /// `TIMESTAMP WITH TIME ZONE`
    fn parse_data_type(&mut self) -> Result<DataType, ParseError> {
        let mut name = self.parse_identifier("type name")?.to_ascii_uppercase();

        while self.at(TokenKind::Ident)
            && TYPE_CONTINUATIONS.contains(&self.peek_text(0).to_ascii_uppercase().as_str())
        {
            let word = self.peek_text(0).to_ascii_uppercase();
            self.advance();
            name.push(' ');
            name.push_str(&word);
        }

        let zone_suffix = (self.at(TokenKind::With)
            || (self.at(TokenKind::Ident) && self.peek_text(0).eq_ignore_ascii_case("without")))
            && self.peek_text(1).eq_ignore_ascii_case("time")
            && self.peek_text(2).eq_ignore_ascii_case("zone");
        if zone_suffix {
            let first = self.advance().text.to_ascii_uppercase();
            self.advance();
            self.advance();
            name.push(' ');
            name.push_str(&first);
            name.push_str(" TIME ZONE");
        }

        let mut args = Vec::new();
        if self.eat(TokenKind::LParen) {
            loop {
                if !self.at_any(&[TokenKind::Number, TokenKind::Ident]) {
                    return Err(self.unexpected("type parameter"));
                }
                args.push(self.advance().text.clone());
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.consume(TokenKind::RParen)?;
        }

        let mut array_dims = 0;
        while self.at(TokenKind::LBracket) && self.peek_ahead(1) == TokenKind::RBracket {
            self.advance();
            self.advance();
            array_dims += 1;
        }

        Ok(DataType {
            name,
            args,
            array_dims,
        })
    }
}
