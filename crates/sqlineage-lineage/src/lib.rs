//! sqlineage Lineage - Column-level lineage over parsed statements
//!
//! For every output column of a statement this crate reports the physical
//! source columns it is computed from, and whether it is a passthrough,
//! aggregate, window or generator column.
//!
//! Analysis is best-effort: resolution failures are collected in
//! [`LineageReport::errors`] while sibling columns still resolve. Use
//! [`Analyzer::analyze_strict`] or [`LineageReport::into_result`] for
//! fail-fast behaviour.

mod analyzer;
mod catalog;
mod error;
mod report;
mod schema;
mod scope;

pub use analyzer::*;
pub use catalog::*;
pub use error::*;
pub use report::*;
pub use schema::*;

use sqlineage_ast::Statement;

/// Analyze a statement with the built-in function catalog
pub fn analyze(statement: &Statement, schema: Option<&Schema>) -> LineageReport {
    let analyzer = Analyzer::default();
    match schema {
        Some(schema) => analyzer.with_schema(schema).analyze(statement),
        None => analyzer.analyze(statement),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlineage_parser::parse;

    fn lineage(sql: &str) -> LineageReport {
        analyze(&parse(sql).unwrap(), None)
    }

    fn lineage_with(sql: &str, schema: &Schema) -> LineageReport {
        analyze(&parse(sql).unwrap(), Some(schema))
    }

    fn src(table: &str, column: &str) -> SourceColumn {
        SourceColumn::new(table, column)
    }

    #[test]
    fn test_star_expansion() {
        let schema = Schema::new().with_table("t", ["a", "b"]);
        let report = lineage_with("SELECT * FROM t", &schema);
        assert!(report.is_complete());
        assert_eq!(report.sources, vec!["t"]);
        assert_eq!(
            report.columns,
            vec![
                ColumnLineage::passthrough("a", vec![src("t", "a")]),
                ColumnLineage::passthrough("b", vec![src("t", "b")]),
            ]
        );
    }

    #[test]
    fn test_table_star_expands_one_table() {
        let schema = Schema::new()
            .with_table("t", ["a", "b"])
            .with_table("u", ["c"]);
        let report = lineage_with("SELECT u.*, t.a FROM t JOIN u ON t.a = u.c", &schema);
        let names: Vec<_> = report.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a"]);
        assert_eq!(report.sources, vec!["t", "u"]);
    }

    #[test]
    fn test_star_without_schema() {
        let report = lineage("SELECT * FROM t");
        assert!(report.columns.is_empty());
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            &report.errors[0],
            LineageError::MissingSchema { table, .. } if table == "t"
        ));
        assert_eq!(report.sources, vec!["t"]);
    }

    #[test]
    fn test_aggregate_classification() {
        let report = lineage("SELECT SUM(amount) AS total FROM orders");
        let column = &report.columns[0];
        assert_eq!(column.name, "total");
        assert_eq!(column.transform, "SUM");
        assert_eq!(column.kind, TransformKind::Aggregate);
        assert_eq!(column.sources, vec![src("orders", "amount")]);
    }

    #[test]
    fn test_window_classification() {
        let report = lineage(
            "SELECT ROW_NUMBER() OVER (PARTITION BY customer_id ORDER BY order_date) AS rn FROM orders",
        );
        let column = &report.columns[0];
        assert_eq!(column.name, "rn");
        assert_eq!(column.transform, "ROW_NUMBER");
        assert_eq!(column.kind, TransformKind::Window);
        assert_eq!(
            column.sources,
            vec![src("orders", "customer_id"), src("orders", "order_date")]
        );
    }

    #[test]
    fn test_window_sources_include_arguments_and_named_windows() {
        let report = lineage(
            "SELECT sum(amount) OVER (w ORDER BY order_date) AS running \
             FROM orders WINDOW w AS (PARTITION BY region)",
        );
        let column = &report.columns[0];
        assert_eq!(column.transform, "SUM");
        assert_eq!(column.kind, TransformKind::Window);
        assert_eq!(
            column.sources,
            vec![
                src("orders", "amount"),
                src("orders", "region"),
                src("orders", "order_date"),
            ]
        );
    }

    #[test]
    fn test_generator_classification() {
        let report = lineage("SELECT CURRENT_TIMESTAMP AS ts, random() AS r FROM t");
        assert_eq!(report.columns[0].transform, "CURRENT_TIMESTAMP");
        assert_eq!(report.columns[0].kind, TransformKind::Generator);
        assert!(report.columns[0].sources.is_empty());
        assert_eq!(report.columns[1].kind, TransformKind::Generator);
    }

    #[test]
    fn test_unknown_function_is_passthrough() {
        let report = lineage("SELECT MY_UDF(x) AS y FROM t");
        let column = &report.columns[0];
        assert_eq!(column.name, "y");
        assert_eq!(column.transform, "");
        assert_eq!(column.kind, TransformKind::Passthrough);
        assert_eq!(column.sources, vec![src("t", "x")]);
    }

    #[test]
    fn test_output_names() {
        let report = lineage("SELECT a, t.b, sum(amount), a + 1 FROM t");
        let names: Vec<_> = report.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "sum(amount)", "a + 1"]);
    }

    #[test]
    fn test_cte_chaining() {
        let report = lineage("WITH a AS (SELECT id FROM t), b AS (SELECT id FROM a) SELECT id FROM b");
        assert_eq!(report.sources, vec!["t"]);
        assert_eq!(report.columns[0].sources, vec![src("t", "id")]);
        assert!(report.is_complete());
    }

    #[test]
    fn test_cte_column_list_and_inherited_transform() {
        let report = lineage(
            "WITH totals(customer, spent) AS (SELECT customer_id, sum(amount) FROM orders GROUP BY 1) \
             SELECT spent FROM totals",
        );
        let column = &report.columns[0];
        assert_eq!(column.name, "spent");
        assert_eq!(column.transform, "SUM");
        assert_eq!(column.kind, TransformKind::Aggregate);
        assert_eq!(column.sources, vec![src("orders", "amount")]);
    }

    #[test]
    fn test_recursive_cte() {
        let report = lineage(
            "WITH RECURSIVE r(n) AS (SELECT start_at FROM seeds UNION ALL SELECT n + 1 FROM r WHERE n < 10) \
             SELECT n FROM r",
        );
        assert!(report.is_complete(), "{:?}", report.errors);
        assert_eq!(report.sources, vec!["seeds"]);
        assert_eq!(report.columns[0].sources, vec![src("seeds", "start_at")]);
    }

    #[test]
    fn test_derived_table_aliases() {
        let report = lineage("SELECT d.x FROM (SELECT a AS y FROM t) AS d(x)");
        assert_eq!(report.columns[0].name, "x");
        assert_eq!(report.columns[0].sources, vec![src("t", "a")]);
    }

    #[test]
    fn test_lateral_sees_left_tables() {
        let schema = Schema::new().with_table("t", ["a"]);
        let report = lineage_with("SELECT l.y FROM t, LATERAL (SELECT t.a * 2 AS y) l", &schema);
        assert!(report.is_complete(), "{:?}", report.errors);
        assert_eq!(report.columns[0].sources, vec![src("t", "a")]);
    }

    #[test]
    fn test_set_operation_union_of_branches() {
        let report = lineage("SELECT a, count(b) AS c FROM t UNION ALL SELECT x, y FROM u");
        assert_eq!(report.sources, vec!["t", "u"]);
        assert_eq!(report.columns.len(), 2);
        assert_eq!(report.columns[0].name, "a");
        assert_eq!(report.columns[0].sources, vec![src("t", "a"), src("u", "x")]);
        assert_eq!(report.columns[1].transform, "COUNT");
        assert_eq!(report.columns[1].sources, vec![src("t", "b"), src("u", "y")]);
    }

    #[test]
    fn test_mismatched_branch_widths() {
        let report = lineage("SELECT a FROM t UNION SELECT x, y FROM u");
        assert_eq!(report.columns.len(), 2);
        assert_eq!(report.columns[1].name, "y");
        assert_eq!(report.columns[1].sources, vec![src("u", "y")]);
    }

    #[test]
    fn test_predicate_subquery_tables_are_sources() {
        let report = lineage("SELECT a FROM t WHERE a IN (SELECT b FROM u)");
        assert_eq!(report.sources, vec!["t", "u"]);
        assert_eq!(report.columns[0].sources, vec![src("t", "a")]);
    }

    #[test]
    fn test_using_columns_are_unambiguous() {
        let schema = Schema::new()
            .with_table("a", ["id", "x"])
            .with_table("b", ["id", "y"]);
        let report = lineage_with("SELECT id FROM a JOIN b USING (id)", &schema);
        assert!(report.is_complete());
        assert_eq!(report.columns[0].sources, vec![src("a", "id")]);

        let report = lineage_with("SELECT * FROM a NATURAL JOIN b", &schema);
        let names: Vec<_> = report.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "x", "y"]);
    }

    #[test]
    fn test_using_merges_only_the_joined_tables() {
        let schema = Schema::new()
            .with_table("a", ["id"])
            .with_table("b", ["id"])
            .with_table("c", ["id"]);
        let report = lineage_with("SELECT id FROM a JOIN b USING (id) JOIN c ON c.id = a.id", &schema);
        assert!(report.columns[0].sources.is_empty());
        assert!(matches!(
            &report.errors[..],
            [LineageError::AmbiguousColumn { candidates, .. }] if candidates == &["a", "b", "c"]
        ));

        let report = lineage_with("SELECT id FROM a JOIN b USING (id) JOIN c USING (id)", &schema);
        assert!(report.is_complete());
        assert_eq!(report.columns[0].sources, vec![src("a", "id")]);

        let report = lineage_with("SELECT * FROM a JOIN b USING (id) JOIN c ON c.id = a.id", &schema);
        let names: Vec<_> = report.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "id"]);
        assert_eq!(report.columns[1].sources, vec![src("c", "id")]);
    }

    #[test]
    fn test_schemaless_table_makes_bare_name_ambiguous() {
        let schema = Schema::new().with_table("customers", ["id", "name"]);
        let report = lineage_with(
            "SELECT id, customers.name, e.kind FROM customers JOIN events e ON e.customer_id = customers.id",
            &schema,
        );
        assert_eq!(
            report.errors,
            vec![LineageError::AmbiguousColumn {
                column: "id".into(),
                candidates: vec!["customers".into(), "e".into()],
                span: report.errors[0].span(),
            }]
        );
        assert_eq!(report.columns[1].sources, vec![src("customers", "name")]);
        assert_eq!(report.columns[2].sources, vec![src("events", "kind")]);
    }

    #[test]
    fn test_clause_subquery_errors_do_not_leak() {
        let statement = parse("SELECT a FROM t WHERE EXISTS (SELECT * FROM u WHERE u.k = t.k)").unwrap();
        let report = Analyzer::default().analyze(&statement);
        assert!(report.is_complete(), "{:?}", report.errors);
        assert_eq!(report.sources, vec!["t", "u"]);
        assert!(Analyzer::default().analyze_strict(&statement).is_ok());

        let report = lineage("SELECT a FROM t WHERE a IN (SELECT b FROM u JOIN v ON u.k = v.k)");
        assert!(report.is_complete(), "{:?}", report.errors);
        assert_eq!(report.sources, vec!["t", "u", "v"]);
    }

    #[test]
    fn test_subqueries_in_every_clause_are_sources() {
        let report = lineage("SELECT a FROM t ORDER BY (SELECT max(x) FROM hidden)");
        assert_eq!(report.sources, vec!["t", "hidden"]);

        let report = lineage(
            "SELECT a, count(*) AS n FROM t \
             GROUP BY a, a IN (SELECT g FROM grouped) \
             WINDOW w AS (PARTITION BY EXISTS (SELECT 1 FROM partitioned)) \
             LIMIT (SELECT max(l) FROM limits) OFFSET (SELECT min(o) FROM offsets)",
        );
        assert_eq!(
            report.sources,
            vec!["t", "grouped", "partitioned", "limits", "offsets"]
        );
        assert!(report.is_complete(), "{:?}", report.errors);
    }

    #[test]
    fn test_qualified_table_star() {
        let schema = Schema::new().with_table("sales.orders", ["id", "amount"]);
        let report = lineage_with("SELECT sales.orders.* FROM sales.orders", &schema);
        assert!(report.is_complete(), "{:?}", report.errors);
        assert_eq!(
            report.columns[1],
            ColumnLineage::passthrough("amount", vec![src("sales.orders", "amount")])
        );
    }

    #[test]
    fn test_best_effort_ambiguity() {
        let schema = Schema::new()
            .with_table("a", ["id", "x"])
            .with_table("b", ["id", "y"]);
        let report = lineage_with("SELECT id, x, y FROM a JOIN b ON a.id = b.id", &schema);

        assert_eq!(report.columns.len(), 3);
        assert!(report.columns[0].sources.is_empty());
        assert_eq!(report.columns[1].sources, vec![src("a", "x")]);
        assert_eq!(report.columns[2].sources, vec![src("b", "y")]);
        assert_eq!(
            report.errors,
            vec![LineageError::AmbiguousColumn {
                column: "id".into(),
                candidates: vec!["a".into(), "b".into()],
                span: report.errors[0].span(),
            }]
        );
    }

    #[test]
    fn test_fail_fast_ambiguity() {
        let statement = parse("SELECT id FROM a JOIN b ON a.k = b.k").unwrap();
        let err = Analyzer::default().analyze_strict(&statement).unwrap_err();
        assert!(matches!(err, LineageError::AmbiguousColumn { ref column, .. } if column == "id"));
        assert_eq!(err.to_string(), "column id is ambiguous between a, b");

        let statement = parse("SELECT a.id FROM a JOIN b ON a.k = b.k").unwrap();
        assert!(Analyzer::default().analyze_strict(&statement).is_ok());
    }

    #[test]
    fn test_unknown_table_alias() {
        let report = lineage("SELECT z.a, b FROM t");
        assert!(matches!(
            &report.errors[..],
            [LineageError::UnknownTable { name, .. }] if name == "z"
        ));
        assert_eq!(report.columns[1].sources, vec![src("t", "b")]);
    }

    #[test]
    fn test_custom_catalog() {
        let catalog = FunctionCatalog::builtin().clone().with_aggregate("hll_merge");
        let statement = parse("SELECT hll_merge(sketch) AS users FROM daily").unwrap();
        let report = Analyzer::new(&catalog).analyze(&statement);
        assert_eq!(report.columns[0].kind, TransformKind::Aggregate);
        assert_eq!(report.columns[0].transform, "HLL_MERGE");
    }

    #[test]
    fn test_reanalysis_is_idempotent() {
        let schema = Schema::new().with_table("t", ["a", "b"]);
        let statement = parse("WITH c AS (SELECT * FROM t) SELECT a, sum(b) FROM c GROUP BY a").unwrap();
        let analyzer = Analyzer::default().with_schema(&schema);
        assert_eq!(analyzer.analyze(&statement), analyzer.analyze(&statement));
    }

    #[test]
    fn test_report_json_shape() {
        let report = lineage("SELECT sum(amount) AS total FROM orders");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "sources": ["orders"],
                "columns": [{
                    "name": "total",
                    "transform": "SUM",
                    "kind": "aggregate",
                    "sources": [{"table": "orders", "column": "amount"}]
                }]
            })
        );
    }
}
