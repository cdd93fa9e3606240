//! sqlineage Lexer - Tokenization using logos
//!
//! Dialect facts baked into the token rules:
//! - `"ident"` is a quoted identifier, `""` escapes a quote inside it
//! - `'text'` is a string, `''` escapes a quote inside it
//! - `--` and non-nesting `/* */` comments are skipped
//!
//! The whole input is materialized up front; the parser needs unbounded
//! lookahead to tell derived tables from parenthesized expressions.

mod dialect;
mod error;
mod token;

pub use dialect::*;
pub use error::*;
pub use token::*;

use logos::Logos;
use sqlineage_ast::{LineIndex, Position, Span};

/// Tokenize a source string with the default dialect
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    tokenize_with(source, &Dialect::default())
}

/// Tokenize a source string. The result always ends with an `Eof` token.
pub fn tokenize_with(source: &str, dialect: &Dialect) -> Result<Vec<Token>, LexError> {
    Lexer::new(source, *dialect).collect()
}

/// A token with its normalized text and location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Keywords upper-cased, identifiers folded per dialect, quotes removed
    /// and unescaped for strings and quoted identifiers
    pub text: String,
    pub span: Span,
    pub position: Position,
}

impl Token {
    /// The token exactly as written
    pub fn raw<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.span.start..self.span.end).unwrap_or("")
    }

    /// Human-facing description used in "unexpected token" diagnostics
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Ident | TokenKind::QuotedIdent => format!("identifier {}", self.text),
            TokenKind::Number => format!("number {}", self.text),
            TokenKind::String => format!("string '{}'", self.text.replace('\'', "''")),
            kind => kind.describe().to_string(),
        }
    }
}

/// Streaming front end over the logos automaton.
///
/// Yields `Ok` tokens followed by a final `Eof`, or stops after the first
/// `Err`.
pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, TokenKind>,
    index: LineIndex<'a>,
    dialect: Dialect,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, dialect: Dialect) -> Self {
        Self {
            source,
            inner: TokenKind::lexer(source),
            index: LineIndex::new(source),
            dialect,
            done: false,
        }
    }

    fn error_at(&self, start: usize) -> LexError {
        let position = self.index.position(start);
        match self.source[start..].chars().next() {
            Some('\'') => LexError::UnterminatedString { position },
            Some('"') => LexError::UnterminatedIdentifier { position },
            Some(ch) => LexError::UnexpectedCharacter { ch, position },
            None => LexError::UnexpectedCharacter { ch: '\0', position },
        }
    }

    fn finish(&self, kind: TokenKind, span: Span) -> Result<Token, LexError> {
        let raw = &self.source[span.start..span.end];
        let next = self.source.as_bytes().get(span.end).copied();

        let text = match kind {
            TokenKind::Number => {
                // `12abc`, `1.2.3` and `1e` must not split into two tokens
                if matches!(next, Some(b) if b.is_ascii_alphanumeric() || b == b'_' || b == b'.') {
                    return Err(LexError::InvalidNumber {
                        position: self.index.position(span.start),
                    });
                }
                raw.to_string()
            }
            TokenKind::Slash if next == Some(b'*') => {
                return Err(LexError::UnterminatedComment {
                    position: self.index.position(span.start),
                });
            }
            TokenKind::Ident => self.dialect.normalize_identifier(raw),
            TokenKind::QuotedIdent => unquote(raw, '"'),
            TokenKind::String => unquote(raw, '\''),
            kind => match kind.keyword_text() {
                Some(keyword) => keyword.to_string(),
                None => raw.to_string(),
            },
        };

        Ok(Token {
            kind,
            text,
            span,
            position: self.index.position(span.start),
        })
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = match self.inner.next() {
            None => {
                self.done = true;
                let end = self.source.len();
                return Some(Ok(Token {
                    kind: TokenKind::Eof,
                    text: String::new(),
                    span: Span::new(end, end),
                    position: self.index.position(end),
                }));
            }
            Some(Err(_)) => Err(self.error_at(self.inner.span().start)),
            Some(Ok(kind)) => {
                let range = self.inner.span();
                self.finish(kind, Span::new(range.start, range.end))
            }
        };
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

/// Strip the surrounding quotes and collapse doubled quotes
fn unquote(raw: &str, quote: char) -> String {
    let inner = raw
        .strip_prefix(quote)
        .and_then(|s| s.strip_suffix(quote))
        .unwrap_or(raw);
    let doubled: String = [quote, quote].iter().collect();
    inner.replace(&doubled, &quote.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_basic_tokens() {
        let tokens = tokenize("SELECT a FROM t").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Select);
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[2].kind, TokenKind::From);
        assert_eq!(tokens[3].kind, TokenKind::Ident);
        assert_eq!(tokens[4].kind, TokenKind::Eof);
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let tokens = tokenize("select Distinct fRoM").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Select);
        assert_eq!(tokens[0].text, "SELECT");
        assert_eq!(tokens[1].kind, TokenKind::Distinct);
        assert_eq!(tokens[2].text, "FROM");
    }

    #[test]
    fn test_identifier_case() {
        let tokens = tokenize("OrderId").unwrap();
        assert_eq!(tokens[0].text, "OrderId");

        let lower = Dialect::with_identifier_case(IdentifierCase::Lowercase);
        let tokens = tokenize_with("OrderId \"MixedCase\"", &lower).unwrap();
        assert_eq!(tokens[0].text, "orderid");
        assert_eq!(tokens[1].kind, TokenKind::QuotedIdent);
        assert_eq!(tokens[1].text, "MixedCase");
    }

    #[test]
    fn test_greedy_operators() {
        assert_eq!(
            kinds("|| <> != <= >= | < > = ::"),
            vec![
                TokenKind::Concat,
                TokenKind::NotEq,
                TokenKind::NotEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::Pipe,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Eq,
                TokenKind::DoubleColon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("123 45.67 1e10 2.5E-3 .5").unwrap();
        let texts: Vec<_> = tokens.iter().take(5).map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["123", "45.67", "1e10", "2.5E-3", ".5"]);
        assert!(tokens.iter().take(5).all(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn test_invalid_numbers() {
        for source in ["SELECT 12abc", "SELECT 1.2.3", "SELECT 1e"] {
            let err = tokenize(source).unwrap_err();
            assert!(matches!(err, LexError::InvalidNumber { .. }), "{}", source);
            assert_eq!(err.to_string(), "invalid number literal");
            assert_eq!(err.position().column, 8);
        }
    }

    #[test]
    fn test_string_escapes() {
        let tokens = tokenize("'it''s' \"a\"\"b\"").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "it's");
        assert_eq!(tokens[1].kind, TokenKind::QuotedIdent);
        assert_eq!(tokens[1].text, "a\"b");
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("SELECT 'abc").unwrap_err();
        assert_eq!(err.to_string(), "unterminated string literal");
        assert_eq!(err.position(), Position::new(1, 8, 7));
    }

    #[test]
    fn test_unterminated_identifier() {
        let err = tokenize("SELECT \"abc FROM t").unwrap_err();
        assert_eq!(err.to_string(), "unterminated quoted identifier");
    }

    #[test]
    fn test_comments_skipped() {
        let tokens = tokenize("SELECT -- trailing\n a /* block\n comment */ FROM t").unwrap();
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::Select,
                TokenKind::Ident,
                TokenKind::From,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[1].position, Position::new(2, 2, 20));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = tokenize("SELECT a /* never closed").unwrap_err();
        assert_eq!(err.to_string(), "unterminated block comment");
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("SELECT a # b").unwrap_err();
        assert!(matches!(err, LexError::UnexpectedCharacter { ch: '#', .. }));
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("SELECT\n  a").unwrap();
        assert_eq!(tokens[1].position, Position::new(2, 3, 9));
        assert_eq!(tokens[1].span, Span::new(9, 10));
        assert_eq!(tokens[2].span, Span::new(10, 10));
    }

    #[test]
    fn test_describe() {
        let tokens = tokenize("FROM foo 'x' ) 1").unwrap();
        assert_eq!(tokens[0].describe(), "FROM");
        assert_eq!(tokens[1].describe(), "identifier foo");
        assert_eq!(tokens[2].describe(), "string 'x'");
        assert_eq!(tokens[3].describe(), "')'");
        assert_eq!(tokens[4].describe(), "number 1");
        assert_eq!(tokens[5].describe(), "end of input");
    }
}
