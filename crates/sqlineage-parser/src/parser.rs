//! Recursive descent parser: statements, clauses and table references
//!
//! Expressions live in `expr.rs`.

use sqlineage_ast::*;
use sqlineage_lexer::{Dialect, Token, TokenKind};

use crate::ParseError;

pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    dialect: Dialect,
    /// Set while parsing a SELECT-list expression; subqueries are rejected there
    pub(crate) in_select_list: bool,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, mut tokens: Vec<Token>, dialect: Dialect) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = source.len();
            tokens.push(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                span: Span::new(end, end),
                position: LineIndex::new(source).position(end),
            });
        }
        Self {
            source,
            tokens,
            pos: 0,
            dialect,
            in_select_list: false,
        }
    }

    // === Utilities ===

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek(&self) -> TokenKind {
        self.current().kind
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    pub(crate) fn peek_text(&self, n: usize) -> &str {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.text.as_str())
            .unwrap_or("")
    }

    pub(crate) fn advance(&mut self) -> &Token {
        let index = self.pos.min(self.tokens.len() - 1);
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        &self.tokens[index]
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    pub(crate) fn at_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.peek())
    }

    /// Consume the current token if it matches
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn consume(&mut self, kind: TokenKind) -> Result<&Token, ParseError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::unexpected(kind.describe(), self.current()))
        }
    }

    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::unexpected(expected, self.current())
    }

    pub(crate) fn span(&self) -> Span {
        self.current().span
    }

    /// Span from `start` to the end of the last consumed token
    pub(crate) fn span_from(&self, start: Span) -> Span {
        let end = match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(prev) if prev.span.end >= start.start => prev.span.end,
            _ => start.end,
        };
        Span::new(start.start, end)
    }

    /// Name text of an identifier-like token. Keywords used as names are
    /// folded like any other unquoted identifier.
    pub(crate) fn name_text(&self, token: &Token) -> String {
        if token.kind.is_keyword() {
            self.dialect.normalize_identifier(token.raw(self.source))
        } else {
            token.text.clone()
        }
    }

    pub(crate) fn parse_identifier(&mut self, expected: &str) -> Result<String, ParseError> {
        if !self.peek().is_identifier() {
            return Err(self.unexpected(expected));
        }
        let text = self.name_text(self.current());
        self.advance();
        Ok(text)
    }

    /// `(a, b, c)`
    fn parse_ident_list(&mut self) -> Result<Vec<String>, ParseError> {
        self.consume(TokenKind::LParen)?;
        let mut names = vec![self.parse_identifier("column name")?];
        while self.eat(TokenKind::Comma) {
            names.push(self.parse_identifier("column name")?);
        }
        self.consume(TokenKind::RParen)?;
        Ok(names)
    }

    /// `AS name` or a bare plain identifier
    fn parse_alias(&mut self) -> Result<Option<String>, ParseError> {
        if self.eat(TokenKind::As) {
            return Ok(Some(self.parse_identifier("alias")?));
        }
        if self.at_any(&[TokenKind::Ident, TokenKind::QuotedIdent]) {
            return Ok(Some(self.parse_identifier("alias")?));
        }
        Ok(None)
    }

    // === Statements ===

    /// Parse one complete statement, an optional `;`, then end of input
    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        tracing::trace!(tokens = self.tokens.len(), "parsing statement");

        if !self.at_any(&[TokenKind::Select, TokenKind::With]) {
            return Err(ParseError::InvalidStart {
                position: self.current().position,
            });
        }

        let statement = self.parse_query()?;
        self.eat(TokenKind::Semicolon);
        if !self.at(TokenKind::Eof) {
            return Err(self.unexpected("end of input"));
        }
        Ok(statement)
    }

    /// `[WITH ...] select_body`, also used for every nested subquery
    pub(crate) fn parse_query(&mut self) -> Result<Statement, ParseError> {
        let start = self.span();
        let saved = std::mem::replace(&mut self.in_select_list, false);
        let result = self.parse_query_inner();
        self.in_select_list = saved;
        let (with, body) = result?;

        Ok(Statement {
            with,
            body,
            span: self.span_from(start),
        })
    }

    fn parse_query_inner(&mut self) -> Result<(Option<WithClause>, SelectBody), ParseError> {
        let with = if self.at(TokenKind::With) {
            Some(self.parse_with_clause()?)
        } else {
            None
        };
        let body = self.parse_select_body()?;
        Ok((with, body))
    }

    fn parse_with_clause(&mut self) -> Result<WithClause, ParseError> {
        let start = self.span();
        self.consume(TokenKind::With)?;
        let recursive = self.eat(TokenKind::Recursive);

        let mut ctes: Vec<Cte> = Vec::new();
        loop {
            let position = self.current().position;
            let cte = self.parse_cte()?;
            if ctes.iter().any(|c| c.name.eq_ignore_ascii_case(&cte.name)) {
                return Err(ParseError::DuplicateCte {
                    name: cte.name,
                    position,
                });
            }
            ctes.push(cte);

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        Ok(WithClause {
            recursive,
            ctes,
            span: self.span_from(start),
        })
    }

    fn parse_cte(&mut self) -> Result<Cte, ParseError> {
        let start = self.span();
        let name = self.parse_identifier("CTE name")?;
        let columns = if self.at(TokenKind::LParen) {
            self.parse_ident_list()?
        } else {
            vec![]
        };
        self.consume(TokenKind::As)?;

        let materialized = if self.at(TokenKind::Not) && self.peek_ahead(1) == TokenKind::Materialized {
            self.advance();
            self.advance();
            Some(false)
        } else if self.eat(TokenKind::Materialized) {
            Some(true)
        } else {
            None
        };

        self.consume(TokenKind::LParen)?;
        let query = self.parse_query()?;
        self.consume(TokenKind::RParen)?;

        Ok(Cte {
            name,
            columns,
            materialized,
            query: Box::new(query),
            span: self.span_from(start),
        })
    }

    fn parse_select_body(&mut self) -> Result<SelectBody, ParseError> {
        let start = self.span();
        let mut body = SelectBody::Core(Box::new(self.parse_select_core()?));

        loop {
            let kind = match self.peek() {
                TokenKind::Union => SetOpKind::Union,
                TokenKind::Intersect => SetOpKind::Intersect,
                TokenKind::Except => SetOpKind::Except,
                _ => break,
            };
            self.advance();
            let all = if self.eat(TokenKind::All) {
                true
            } else {
                self.eat(TokenKind::Distinct);
                false
            };
            let right = self.parse_select_core()?;
            body = SelectBody::SetOp {
                left: Box::new(body),
                op: SetOperator { kind, all },
                right: Box::new(right),
                span: self.span_from(start),
            };
        }

        Ok(body)
    }

    // === SELECT core ===

    fn parse_select_core(&mut self) -> Result<SelectCore, ParseError> {
        let start = self.span();
        self.consume(TokenKind::Select)?;

        let distinct = if self.eat(TokenKind::Distinct) {
            true
        } else {
            self.eat(TokenKind::All);
            false
        };

        let mut items = vec![self.parse_select_item()?];
        while self.eat(TokenKind::Comma) {
            items.push(self.parse_select_item()?);
        }

        let from = if self.at(TokenKind::From) {
            Some(self.parse_from_clause()?)
        } else {
            None
        };

        let where_clause = if self.eat(TokenKind::Where) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let group_by = if self.eat(TokenKind::Group) {
            self.consume(TokenKind::By)?;
            if self.eat(TokenKind::All) {
                GroupBy::All
            } else {
                GroupBy::Exprs(self.parse_expr_list()?)
            }
        } else {
            GroupBy::None
        };

        let having = if self.eat(TokenKind::Having) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let mut windows = Vec::new();
        if self.eat(TokenKind::Window) {
            loop {
                let window_start = self.span();
                let name = self.parse_identifier("window name")?;
                self.consume(TokenKind::As)?;
                let def = self.parse_window_def()?;
                windows.push(NamedWindow {
                    name,
                    def,
                    span: self.span_from(window_start),
                });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        let qualify = if self.eat(TokenKind::Qualify) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let order_by = if self.eat(TokenKind::Order) {
            self.consume(TokenKind::By)?;
            self.parse_order_items()?
        } else {
            vec![]
        };

        let limit = if self.eat(TokenKind::Limit) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let offset = if self.eat(TokenKind::Offset) {
            let offset = self.parse_expr()?;
            if !self.eat(TokenKind::Rows) {
                self.eat(TokenKind::Row);
            }
            Some(offset)
        } else {
            None
        };

        Ok(SelectCore {
            distinct,
            items,
            from,
            where_clause,
            group_by,
            having,
            windows,
            qualify,
            order_by,
            limit,
            offset,
            span: self.span_from(start),
        })
    }

    fn parse_select_item(&mut self) -> Result<SelectItem, ParseError> {
        let start = self.span();

        if self.eat(TokenKind::Star) {
            return Ok(SelectItem {
                kind: SelectItemKind::Star,
                span: self.span_from(start),
            });
        }

        if let Some(parts) = self.table_star_parts() {
            let mut qualifier = Vec::with_capacity(parts);
            for _ in 0..parts {
                qualifier.push(self.parse_identifier("table name")?);
                self.advance();
            }
            self.advance();
            return Ok(SelectItem {
                kind: SelectItemKind::TableStar(qualifier.join(".")),
                span: self.span_from(start),
            });
        }

        let saved = std::mem::replace(&mut self.in_select_list, true);
        let expr = self.parse_expr();
        self.in_select_list = saved;
        let expr = expr?;

        let alias = self.parse_alias()?;
        Ok(SelectItem {
            kind: SelectItemKind::Expr { expr, alias },
            span: self.span_from(start),
        })
    }

    /// Qualifier length when the tokens ahead spell `t.*`, `s.t.*` or `c.s.t.*`
    fn table_star_parts(&self) -> Option<usize> {
        (1..=3).find(|&n| {
            (0..n).all(|i| {
                self.peek_ahead(2 * i).is_identifier() && self.peek_ahead(2 * i + 1) == TokenKind::Dot
            }) && self.peek_ahead(2 * n) == TokenKind::Star
        })
    }

    pub(crate) fn parse_order_items(&mut self) -> Result<Vec<OrderItem>, ParseError> {
        let mut items = Vec::new();
        loop {
            let start = self.span();
            let expr = self.parse_expr()?;
            let direction = match self.peek() {
                TokenKind::Asc => {
                    self.advance();
                    OrderDirection::Asc
                }
                TokenKind::Desc => {
                    self.advance();
                    OrderDirection::Desc
                }
                _ => OrderDirection::Asc,
            };
            let nulls = if self.eat(TokenKind::Nulls) {
                match self.peek() {
                    TokenKind::First => {
                        self.advance();
                        Some(NullsOrder::First)
                    }
                    TokenKind::Last => {
                        self.advance();
                        Some(NullsOrder::Last)
                    }
                    _ => return Err(self.unexpected("FIRST or LAST")),
                }
            } else {
                None
            };
            items.push(OrderItem {
                expr,
                direction,
                nulls,
                span: self.span_from(start),
            });

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(items)
    }

    // === FROM ===

    fn parse_from_clause(&mut self) -> Result<FromClause, ParseError> {
        let start = self.span();
        self.consume(TokenKind::From)?;
        let source = self.parse_table_ref()?;

        let mut joins = Vec::new();
        loop {
            if self.at(TokenKind::Comma) {
                let join_start = self.span();
                self.advance();
                let table = self.parse_table_ref()?;
                joins.push(Join {
                    kind: JoinKind::Cross,
                    table,
                    constraint: JoinConstraint::None,
                    implicit: true,
                    span: self.span_from(join_start),
                });
            } else if self.at_any(&[
                TokenKind::Join,
                TokenKind::Inner,
                TokenKind::Left,
                TokenKind::Right,
                TokenKind::Full,
                TokenKind::Cross,
                TokenKind::Natural,
            ]) {
                joins.push(self.parse_join()?);
            } else {
                break;
            }
        }

        Ok(FromClause {
            source,
            joins,
            span: self.span_from(start),
        })
    }

    fn parse_join(&mut self) -> Result<Join, ParseError> {
        let start = self.span();
        let natural = self.eat(TokenKind::Natural);

        let kind = match self.peek() {
            TokenKind::Inner => {
                self.advance();
                JoinKind::Inner
            }
            TokenKind::Left => {
                self.advance();
                self.eat(TokenKind::Outer);
                JoinKind::Left
            }
            TokenKind::Right => {
                self.advance();
                self.eat(TokenKind::Outer);
                JoinKind::Right
            }
            TokenKind::Full => {
                self.advance();
                self.eat(TokenKind::Outer);
                JoinKind::Full
            }
            TokenKind::Cross if !natural => {
                self.advance();
                JoinKind::Cross
            }
            _ => JoinKind::Inner,
        };

        self.consume(TokenKind::Join)?;
        let table = self.parse_table_ref()?;

        let constraint = if natural || kind == JoinKind::Cross {
            if self.at_any(&[TokenKind::On, TokenKind::Using]) {
                return Err(self.unexpected("JOIN or end of FROM clause"));
            }
            if natural {
                JoinConstraint::Natural
            } else {
                JoinConstraint::None
            }
        } else if self.eat(TokenKind::On) {
            JoinConstraint::On(self.parse_expr()?)
        } else if self.at(TokenKind::Using) {
            self.advance();
            JoinConstraint::Using(self.parse_ident_list()?)
        } else {
            return Err(self.unexpected("ON or USING"));
        };

        Ok(Join {
            kind,
            table,
            constraint,
            implicit: false,
            span: self.span_from(start),
        })
    }

    fn parse_table_ref(&mut self) -> Result<TableRef, ParseError> {
        let start = self.span();

        if self.eat(TokenKind::Lateral) {
            return Ok(TableRef::Lateral(self.parse_derived_table(start)?));
        }
        if self.at(TokenKind::LParen) {
            return Ok(TableRef::Derived(self.parse_derived_table(start)?));
        }

        let mut parts = vec![self.parse_identifier("table name")?];
        while parts.len() < 3 && self.at(TokenKind::Dot) {
            self.advance();
            parts.push(self.parse_identifier("table name")?);
        }
        let alias = self.parse_alias()?;

        let name = parts.pop().unwrap_or_default();
        let schema = parts.pop();
        let catalog = parts.pop();
        Ok(TableRef::Table(TableName {
            catalog,
            schema,
            name,
            alias,
            span: self.span_from(start),
        }))
    }

    fn parse_derived_table(&mut self, start: Span) -> Result<DerivedTable, ParseError> {
        self.consume(TokenKind::LParen)?;
        // Redundant parentheses: `((SELECT ...)) d`
        let mut depth = 1;
        while self.eat(TokenKind::LParen) {
            depth += 1;
        }
        if !self.at_any(&[TokenKind::Select, TokenKind::With]) {
            return Err(self.unexpected("SELECT or WITH"));
        }
        let query = self.parse_query()?;
        for _ in 0..depth {
            self.consume(TokenKind::RParen)?;
        }

        let alias = self.parse_alias()?;
        let columns = if alias.is_some() && self.at(TokenKind::LParen) {
            self.parse_ident_list()?
        } else {
            vec![]
        };

        Ok(DerivedTable {
            query: Box::new(query),
            alias,
            columns,
            span: self.span_from(start),
        })
    }

    // === Windows ===

    /// `( [base] [PARTITION BY ..] [ORDER BY ..] [frame] )`
    pub(crate) fn parse_window_def(&mut self) -> Result<WindowDef, ParseError> {
        let start = self.span();
        self.consume(TokenKind::LParen)?;

        let base = if self.at_any(&[TokenKind::Ident, TokenKind::QuotedIdent]) {
            Some(self.parse_identifier("window name")?)
        } else {
            None
        };

        let partition_by = if self.eat(TokenKind::Partition) {
            self.consume(TokenKind::By)?;
            self.parse_expr_list()?
        } else {
            vec![]
        };

        let order_by = if self.eat(TokenKind::Order) {
            self.consume(TokenKind::By)?;
            self.parse_order_items()?
        } else {
            vec![]
        };

        let frame = if self.at_any(&[TokenKind::Rows, TokenKind::Range, TokenKind::Groups]) {
            Some(self.parse_frame()?)
        } else {
            None
        };

        self.consume(TokenKind::RParen)?;
        Ok(WindowDef {
            base,
            partition_by,
            order_by,
            frame,
            span: self.span_from(start),
        })
    }

    fn parse_frame(&mut self) -> Result<FrameSpec, ParseError> {
        let start = self.span();
        let position = self.current().position;
        let units = match self.advance().kind {
            TokenKind::Range => FrameUnits::Range,
            TokenKind::Groups => FrameUnits::Groups,
            _ => FrameUnits::Rows,
        };

        let (start_bound, end_bound) = if self.eat(TokenKind::Between) {
            let low = self.parse_frame_bound()?;
            self.consume(TokenKind::And)?;
            let high = self.parse_frame_bound()?;
            (low, Some(high))
        } else {
            (self.parse_frame_bound()?, None)
        };

        if start_bound == FrameBound::UnboundedFollowing
            || end_bound == Some(FrameBound::UnboundedPreceding)
        {
            return Err(ParseError::InvalidFrame { position });
        }

        Ok(FrameSpec {
            units,
            start: start_bound,
            end: end_bound,
            span: self.span_from(start),
        })
    }

    fn parse_frame_bound(&mut self) -> Result<FrameBound, ParseError> {
        if self.eat(TokenKind::Unbounded) {
            return match self.peek() {
                TokenKind::Preceding => {
                    self.advance();
                    Ok(FrameBound::UnboundedPreceding)
                }
                TokenKind::Following => {
                    self.advance();
                    Ok(FrameBound::UnboundedFollowing)
                }
                _ => Err(self.unexpected("PRECEDING or FOLLOWING")),
            };
        }
        if self.eat(TokenKind::Current) {
            self.consume(TokenKind::Row)?;
            return Ok(FrameBound::CurrentRow);
        }

        let offset = Box::new(self.parse_additive()?);
        match self.peek() {
            TokenKind::Preceding => {
                self.advance();
                Ok(FrameBound::Preceding(offset))
            }
            TokenKind::Following => {
                self.advance();
                Ok(FrameBound::Following(offset))
            }
            _ => Err(self.unexpected("PRECEDING or FOLLOWING")),
        }
    }
}
