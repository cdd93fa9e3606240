//! sqlineage - SQL SELECT parsing and column-level lineage
//!
//! This is the root workspace crate that hosts the end-to-end tests.
//! The implementation lives in the workspace member crates.

// Re-export main crates for convenience
pub use sqlineage_ast as ast;
pub use sqlineage_lexer as lexer;
pub use sqlineage_lineage as lineage;
pub use sqlineage_parser as parser;

pub use sqlineage_lineage::{analyze, LineageReport, Schema};
pub use sqlineage_parser::{parse, ParseError};
