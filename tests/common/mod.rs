//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use sqlineage::ast::Statement;
use sqlineage::lineage::{ColumnLineage, LineageReport, Schema, SourceColumn};

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// All `.sql` files directly under `dir`, sorted by name
pub fn sql_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", dir.display(), e))
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("sql"))
        .collect();
    files.sort();
    files
}

/// Load a test fixture from tests/fixtures/
pub fn load_fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// The schema shared by the fixture queries
pub fn fixture_schema() -> Schema {
    serde_json::from_str(&load_fixture("schema.json")).expect("schema.json is valid")
}

pub fn parse_ok(sql: &str) -> Statement {
    sqlineage::parse(sql).unwrap_or_else(|e| panic!("Expected {:?} to parse: {}", sql, e))
}

pub fn parse_err(sql: &str) -> String {
    match sqlineage::parse(sql) {
        Ok(stmt) => panic!("Expected {:?} to fail, got {:?}", sql, stmt),
        Err(e) => e.to_string(),
    }
}

pub fn lineage(sql: &str, schema: Option<&Schema>) -> LineageReport {
    sqlineage::analyze(&parse_ok(sql), schema)
}

/// Assert an output column exists and return it
pub fn column<'r>(report: &'r LineageReport, name: &str) -> &'r ColumnLineage {
    report
        .column(name)
        .unwrap_or_else(|| panic!("Expected output column {} in {:?}", name, report.columns))
}

pub fn sources(pairs: &[(&str, &str)]) -> Vec<SourceColumn> {
    pairs
        .iter()
        .map(|(table, column)| SourceColumn::new(*table, *column))
        .collect()
}
