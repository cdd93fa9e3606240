//! Token definitions for the SQL dialect

use logos::Logos;
use serde::Serialize;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[logos(skip r"[ \t\r\n\f]+")]  // Skip whitespace
#[logos(skip r"--[^\n]*")]      // Skip line comments
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]  // Skip block comments, no nesting
pub enum TokenKind {
    // === Keywords (case-insensitive) ===
    #[token("select", ignore(ascii_case))]
    Select,
    #[token("from", ignore(ascii_case))]
    From,
    #[token("where", ignore(ascii_case))]
    Where,
    #[token("with", ignore(ascii_case))]
    With,
    #[token("recursive", ignore(ascii_case))]
    Recursive,
    #[token("as", ignore(ascii_case))]
    As,
    #[token("distinct", ignore(ascii_case))]
    Distinct,
    #[token("all", ignore(ascii_case))]
    All,
    #[token("union", ignore(ascii_case))]
    Union,
    #[token("intersect", ignore(ascii_case))]
    Intersect,
    #[token("except", ignore(ascii_case))]
    Except,
    #[token("join", ignore(ascii_case))]
    Join,
    #[token("inner", ignore(ascii_case))]
    Inner,
    #[token("left", ignore(ascii_case))]
    Left,
    #[token("right", ignore(ascii_case))]
    Right,
    #[token("full", ignore(ascii_case))]
    Full,
    #[token("outer", ignore(ascii_case))]
    Outer,
    #[token("cross", ignore(ascii_case))]
    Cross,
    #[token("natural", ignore(ascii_case))]
    Natural,
    #[token("lateral", ignore(ascii_case))]
    Lateral,
    #[token("on", ignore(ascii_case))]
    On,
    #[token("using", ignore(ascii_case))]
    Using,
    #[token("group", ignore(ascii_case))]
    Group,
    #[token("by", ignore(ascii_case))]
    By,
    #[token("having", ignore(ascii_case))]
    Having,
    #[token("qualify", ignore(ascii_case))]
    Qualify,
    #[token("window", ignore(ascii_case))]
    Window,
    #[token("order", ignore(ascii_case))]
    Order,
    #[token("asc", ignore(ascii_case))]
    Asc,
    #[token("desc", ignore(ascii_case))]
    Desc,
    #[token("nulls", ignore(ascii_case))]
    Nulls,
    #[token("first", ignore(ascii_case))]
    First,
    #[token("last", ignore(ascii_case))]
    Last,
    #[token("limit", ignore(ascii_case))]
    Limit,
    #[token("offset", ignore(ascii_case))]
    Offset,
    #[token("and", ignore(ascii_case))]
    And,
    #[token("or", ignore(ascii_case))]
    Or,
    #[token("not", ignore(ascii_case))]
    Not,
    #[token("in", ignore(ascii_case))]
    In,
    #[token("is", ignore(ascii_case))]
    Is,
    #[token("null", ignore(ascii_case))]
    Null,
    #[token("true", ignore(ascii_case))]
    True,
    #[token("false", ignore(ascii_case))]
    False,
    #[token("between", ignore(ascii_case))]
    Between,
    #[token("like", ignore(ascii_case))]
    Like,
    #[token("ilike", ignore(ascii_case))]
    Ilike,
    #[token("escape", ignore(ascii_case))]
    Escape,
    #[token("case", ignore(ascii_case))]
    Case,
    #[token("when", ignore(ascii_case))]
    When,
    #[token("then", ignore(ascii_case))]
    Then,
    #[token("else", ignore(ascii_case))]
    Else,
    #[token("end", ignore(ascii_case))]
    End,
    #[token("cast", ignore(ascii_case))]
    Cast,
    #[token("try_cast", ignore(ascii_case))]
    TryCast,
    #[token("over", ignore(ascii_case))]
    Over,
    #[token("partition", ignore(ascii_case))]
    Partition,
    #[token("filter", ignore(ascii_case))]
    Filter,
    #[token("rows", ignore(ascii_case))]
    Rows,
    #[token("range", ignore(ascii_case))]
    Range,
    #[token("groups", ignore(ascii_case))]
    Groups,
    #[token("unbounded", ignore(ascii_case))]
    Unbounded,
    #[token("preceding", ignore(ascii_case))]
    Preceding,
    #[token("following", ignore(ascii_case))]
    Following,
    #[token("current", ignore(ascii_case))]
    Current,
    #[token("row", ignore(ascii_case))]
    Row,
    #[token("exists", ignore(ascii_case))]
    Exists,
    #[token("materialized", ignore(ascii_case))]
    Materialized,

    // === Operators ===
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("||")]
    Concat,
    #[token("|")]
    Pipe,
    #[token("=")]
    #[token("==")]
    Eq,
    #[token("<>")]
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("!")]
    Bang,
    #[token("&")]
    Ampersand,
    #[token("~")]
    Tilde,
    #[token("^")]
    Caret,
    #[token("->")]
    Arrow,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("::")]
    DoubleColon,
    #[token("?")]
    Question,

    // === Literals ===
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?")]
    Number,

    /// `'...'` with `''` as the escaped quote
    #[regex(r"'([^']|'')*'")]
    String,

    // === Identifiers ===
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_$]*")]
    Ident,

    /// `"..."` with `""` as the escaped quote
    #[regex(r#""([^"]|"")*""#)]
    QuotedIdent,

    // === Special ===
    Eof,
}

impl TokenKind {
    pub fn is_keyword(&self) -> bool {
        self.keyword_text().is_some()
    }

    /// Reserved keywords never stand in for an identifier.
    ///
    /// Non-reserved keywords (`FIRST`, `ROWS`, `FILTER`, ...) may name
    /// columns, tables and functions.
    pub fn is_reserved(&self) -> bool {
        matches!(
            self,
            TokenKind::Select
                | TokenKind::From
                | TokenKind::Where
                | TokenKind::With
                | TokenKind::As
                | TokenKind::Distinct
                | TokenKind::All
                | TokenKind::Union
                | TokenKind::Intersect
                | TokenKind::Except
                | TokenKind::Join
                | TokenKind::Inner
                | TokenKind::Left
                | TokenKind::Right
                | TokenKind::Full
                | TokenKind::Outer
                | TokenKind::Cross
                | TokenKind::Natural
                | TokenKind::Lateral
                | TokenKind::On
                | TokenKind::Using
                | TokenKind::Group
                | TokenKind::By
                | TokenKind::Having
                | TokenKind::Qualify
                | TokenKind::Window
                | TokenKind::Order
                | TokenKind::Asc
                | TokenKind::Desc
                | TokenKind::Limit
                | TokenKind::Offset
                | TokenKind::And
                | TokenKind::Or
                | TokenKind::Not
                | TokenKind::In
                | TokenKind::Is
                | TokenKind::Null
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Between
                | TokenKind::Like
                | TokenKind::Ilike
                | TokenKind::Case
                | TokenKind::When
                | TokenKind::Then
                | TokenKind::Else
                | TokenKind::End
                | TokenKind::Cast
                | TokenKind::TryCast
                | TokenKind::Over
                | TokenKind::Exists
        )
    }

    /// Identifier-like tokens: plain, quoted, or a non-reserved keyword
    pub fn is_identifier(&self) -> bool {
        matches!(self, TokenKind::Ident | TokenKind::QuotedIdent)
            || (self.is_keyword() && !self.is_reserved())
    }

    /// Canonical upper-case spelling of a keyword
    pub fn keyword_text(&self) -> Option<&'static str> {
        let text = match self {
            TokenKind::Select => "SELECT",
            TokenKind::From => "FROM",
            TokenKind::Where => "WHERE",
            TokenKind::With => "WITH",
            TokenKind::Recursive => "RECURSIVE",
            TokenKind::As => "AS",
            TokenKind::Distinct => "DISTINCT",
            TokenKind::All => "ALL",
            TokenKind::Union => "UNION",
            TokenKind::Intersect => "INTERSECT",
            TokenKind::Except => "EXCEPT",
            TokenKind::Join => "JOIN",
            TokenKind::Inner => "INNER",
            TokenKind::Left => "LEFT",
            TokenKind::Right => "RIGHT",
            TokenKind::Full => "FULL",
            TokenKind::Outer => "OUTER",
            TokenKind::Cross => "CROSS",
            TokenKind::Natural => "NATURAL",
            TokenKind::Lateral => "LATERAL",
            TokenKind::On => "ON",
            TokenKind::Using => "USING",
            TokenKind::Group => "GROUP",
            TokenKind::By => "BY",
            TokenKind::Having => "HAVING",
            TokenKind::Qualify => "QUALIFY",
            TokenKind::Window => "WINDOW",
            TokenKind::Order => "ORDER",
            TokenKind::Asc => "ASC",
            TokenKind::Desc => "DESC",
            TokenKind::Nulls => "NULLS",
            TokenKind::First => "FIRST",
            TokenKind::Last => "LAST",
            TokenKind::Limit => "LIMIT",
            TokenKind::Offset => "OFFSET",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Not => "NOT",
            TokenKind::In => "IN",
            TokenKind::Is => "IS",
            TokenKind::Null => "NULL",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::Between => "BETWEEN",
            TokenKind::Like => "LIKE",
            TokenKind::Ilike => "ILIKE",
            TokenKind::Escape => "ESCAPE",
            TokenKind::Case => "CASE",
            TokenKind::When => "WHEN",
            TokenKind::Then => "THEN",
            TokenKind::Else => "ELSE",
            TokenKind::End => "END",
            TokenKind::Cast => "CAST",
            TokenKind::TryCast => "TRY_CAST",
            TokenKind::Over => "OVER",
            TokenKind::Partition => "PARTITION",
            TokenKind::Filter => "FILTER",
            TokenKind::Rows => "ROWS",
            TokenKind::Range => "RANGE",
            TokenKind::Groups => "GROUPS",
            TokenKind::Unbounded => "UNBOUNDED",
            TokenKind::Preceding => "PRECEDING",
            TokenKind::Following => "FOLLOWING",
            TokenKind::Current => "CURRENT",
            TokenKind::Row => "ROW",
            TokenKind::Exists => "EXISTS",
            TokenKind::Materialized => "MATERIALIZED",
            _ => return None,
        };
        Some(text)
    }

    pub fn describe(&self) -> &'static str {
        if let Some(text) = self.keyword_text() {
            return text;
        }
        match self {
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Concat => "'||'",
            TokenKind::Pipe => "'|'",
            TokenKind::Eq => "'='",
            TokenKind::NotEq => "'<>'",
            TokenKind::Lt => "'<'",
            TokenKind::LtEq => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::GtEq => "'>='",
            TokenKind::Bang => "'!'",
            TokenKind::Ampersand => "'&'",
            TokenKind::Tilde => "'~'",
            TokenKind::Caret => "'^'",
            TokenKind::Arrow => "'->'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Semicolon => "';'",
            TokenKind::Colon => "':'",
            TokenKind::DoubleColon => "'::'",
            TokenKind::Question => "'?'",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Ident => "identifier",
            TokenKind::QuotedIdent => "quoted identifier",
            TokenKind::Eof => "end of input",
            _ => "keyword",
        }
    }
}
