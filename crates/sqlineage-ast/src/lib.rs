//! sqlineage AST - Core types for parsed SQL queries
//!
//! This crate defines the statement and expression trees produced by the
//! parser, spans and positions for source locations, and a compact printer
//! used to name derived columns.
//!
//! Nodes are plain owned data. They are built once by the parser and never
//! mutated afterwards, so a `Statement` can be shared freely between threads.

mod span;
mod expr;
mod query;
mod printer;

pub use span::*;
pub use expr::*;
pub use query::*;
