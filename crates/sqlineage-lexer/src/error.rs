//! Lexer error types

use sqlineage_ast::Position;
use thiserror::Error;

/// Malformed source text. Always fatal to the parse attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated string literal")]
    UnterminatedString { position: Position },

    #[error("unterminated quoted identifier")]
    UnterminatedIdentifier { position: Position },

    #[error("invalid number literal")]
    InvalidNumber { position: Position },

    #[error("unterminated block comment")]
    UnterminatedComment { position: Position },

    #[error("unexpected character '{ch}'")]
    UnexpectedCharacter { ch: char, position: Position },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnterminatedString { position } => *position,
            LexError::UnterminatedIdentifier { position } => *position,
            LexError::InvalidNumber { position } => *position,
            LexError::UnterminatedComment { position } => *position,
            LexError::UnexpectedCharacter { position, .. } => *position,
        }
    }
}
