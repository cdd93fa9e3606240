//! Dialect facts the lexer and parser depend on
//!
//! Quoting (`"ident"` with `""` escapes, `'string'` with `''` escapes) and
//! comment syntax (`--`, `/* */`) are fixed for the supported dialect family.
//! What varies between deployments is how unquoted identifiers are folded.

use serde::{Deserialize, Serialize};

/// Case normalization applied to unquoted identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierCase {
    /// Keep identifiers as written (DuckDB)
    #[default]
    Preserve,
    /// Fold to lower case (Postgres)
    Lowercase,
    /// Fold to upper case (Snowflake, Oracle)
    Uppercase,
}

/// Immutable dialect configuration passed into lexing and parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dialect {
    pub identifier_case: IdentifierCase,
}

impl Dialect {
    pub fn duckdb() -> Self {
        Self::default()
    }

    pub fn with_identifier_case(identifier_case: IdentifierCase) -> Self {
        Self { identifier_case }
    }

    /// Normalize an unquoted identifier. Quoted identifiers are never folded.
    pub fn normalize_identifier(&self, raw: &str) -> String {
        match self.identifier_case {
            IdentifierCase::Preserve => raw.to_string(),
            IdentifierCase::Lowercase => raw.to_lowercase(),
            IdentifierCase::Uppercase => raw.to_uppercase(),
        }
    }
}
