//! Parser error types

use sqlineage_ast::Position;
use sqlineage_lexer::{LexError, Token};
use thiserror::Error;

/// A grammar violation or a hard dialect constraint. Fatal to the parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("statement must begin with SELECT or WITH")]
    InvalidStart { position: Position },

    #[error("scalar subqueries in SELECT columns are not supported; rewrite using a CTE and JOIN")]
    ScalarSubquery { position: Position },

    #[error("unexpected token {found}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        position: Position,
    },

    #[error("duplicate CTE name {name}")]
    DuplicateCte { name: String, position: Position },

    #[error("invalid window frame")]
    InvalidFrame { position: Position },
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::Lex(err) => err.position(),
            ParseError::InvalidStart { position } => *position,
            ParseError::ScalarSubquery { position } => *position,
            ParseError::UnexpectedToken { position, .. } => *position,
            ParseError::DuplicateCte { position, .. } => *position,
            ParseError::InvalidFrame { position } => *position,
        }
    }

    pub fn unexpected(expected: impl Into<String>, found: &Token) -> Self {
        ParseError::UnexpectedToken {
            found: found.describe(),
            expected: expected.into(),
            position: found.position,
        }
    }
}
