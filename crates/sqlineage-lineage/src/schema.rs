//! External table schemas used for `*` expansion

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlineage_ast::TableName;

/// Table name to ordered column list.
///
/// Deserializes from a plain JSON object: `{"orders": ["id", "amount"]}`.
/// Keys may be bare (`orders`) or qualified (`main.orders`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    tables: BTreeMap<String, Vec<String>>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table<I, S>(mut self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(name, columns);
        self
    }

    pub fn insert<I, S>(&mut self, name: impl Into<String>, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables
            .insert(name.into(), columns.into_iter().map(Into::into).collect());
    }

    /// Case-insensitive lookup by the exact (possibly dotted) name
    pub fn find_table(&self, name: &str) -> Option<&[String]> {
        self.tables
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, columns)| columns.as_slice())
    }

    /// Columns for a table reference: the qualified name first, then the bare name
    pub fn lookup(&self, table: &TableName) -> Option<&[String]> {
        if table.is_qualified() {
            if let Some(columns) = self.find_table(&table.qualified_name()) {
                return Some(columns);
            }
        }
        self.find_table(&table.name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlineage_ast::Span;

    fn table(schema: Option<&str>, name: &str) -> TableName {
        TableName {
            catalog: None,
            schema: schema.map(String::from),
            name: name.into(),
            alias: None,
            span: Span::dummy(),
        }
    }

    #[test]
    fn test_lookup_prefers_qualified_name() {
        let schema = Schema::new()
            .with_table("orders", ["id"])
            .with_table("sales.orders", ["id", "region"]);
        assert_eq!(schema.lookup(&table(Some("sales"), "orders")).unwrap().len(), 2);
        assert_eq!(schema.lookup(&table(Some("main"), "orders")).unwrap().len(), 1);
        assert_eq!(schema.lookup(&table(None, "ORDERS")).unwrap().len(), 1);
        assert!(schema.lookup(&table(None, "missing")).is_none());
    }

    #[test]
    fn test_deserialize_plain_object() {
        let schema: Schema = serde_json::from_str(r#"{"t": ["a", "b"]}"#).unwrap();
        assert_eq!(schema.find_table("T"), Some(&["a".to_string(), "b".to_string()][..]));
        assert_eq!(schema.len(), 1);
    }
}
