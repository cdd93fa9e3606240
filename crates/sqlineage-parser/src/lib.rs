//! sqlineage Parser - Recursive descent parser
//!
//! Parses one `SELECT` / `WITH` statement into a `Statement` AST.
//! Key parsing constraints:
//! - Anything not starting with SELECT or WITH is rejected up front
//! - Subqueries are legal in FROM and predicates, never in the SELECT list
//! - No error recovery: the first violation ends the parse

mod error;
mod expr;
mod parser;

pub use error::*;
pub use parser::*;

use sqlineage_ast::Statement;
use sqlineage_lexer::{tokenize_with, Dialect, Lexer, TokenKind};

/// Parse a source string with the default dialect
pub fn parse(source: &str) -> Result<Statement, ParseError> {
    parse_with_dialect(source, &Dialect::default())
}

/// Parse a source string into a Statement AST
pub fn parse_with_dialect(source: &str, dialect: &Dialect) -> Result<Statement, ParseError> {
    check_leading_keyword(source, dialect)?;
    let tokens = tokenize_with(source, dialect)?;
    let mut parser = Parser::new(source, tokens, *dialect);
    parser.parse_statement()
}

/// The first significant token decides before any later lex error can
fn check_leading_keyword(source: &str, dialect: &Dialect) -> Result<(), ParseError> {
    match Lexer::new(source, *dialect).next() {
        Some(Ok(token)) if matches!(token.kind, TokenKind::Select | TokenKind::With) => Ok(()),
        Some(Ok(token)) => Err(ParseError::InvalidStart {
            position: token.position,
        }),
        Some(Err(err)) => Err(ParseError::InvalidStart {
            position: err.position(),
        }),
        None => Err(ParseError::InvalidStart {
            position: Default::default(),
        }),
    }
}
