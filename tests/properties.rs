//! Whole-pipeline properties: determinism, fixed diagnostics, lineage shape

mod common;

use std::thread;

use common::*;
use sqlineage::lineage::{Analyzer, FunctionCatalog, Schema, TransformKind};

const INVALID_START: &str = "statement must begin with SELECT or WITH";
const SCALAR_SUBQUERY: &str =
    "scalar subqueries in SELECT columns are not supported; rewrite using a CTE and JOIN";

const QUERIES: &[&str] = &[
    "SELECT a FROM t",
    "select distinct a, b AS c from s.t x where x.a > 1 and not b is null",
    "SELECT a FROM t WHERE a IN (SELECT b FROM u) OR EXISTS (SELECT 1 FROM v WHERE v.k = t.k)",
    "WITH a AS (SELECT id FROM t), b AS (SELECT id FROM a) SELECT id FROM b",
    "SELECT x::INTEGER, TRY_CAST(y AS DECIMAL(10, 2)) FROM t ORDER BY 1 DESC NULLS FIRST LIMIT 5 OFFSET 2",
    "SELECT CASE WHEN a BETWEEN 1 AND 2 THEN 'low' ELSE 'high' END AS band FROM t",
    "SELECT string_agg(name, ',' ORDER BY name) FILTER (WHERE active) AS names FROM users GROUP BY ALL",
    "SELECT a FROM t LEFT JOIN u USING (a) NATURAL JOIN v CROSS JOIN w",
    "SELECT a FROM t UNION SELECT b FROM u EXCEPT SELECT c FROM v",
    "SELECT [1, 2, 3][1] AS first, \"Quoted Col\" FROM \"My Table\"",
];

#[test]
fn test_parsing_is_deterministic() {
    for sql in QUERIES {
        assert_eq!(parse_ok(sql), parse_ok(sql), "{}", sql);
    }
}

#[test]
fn test_leading_keyword_is_required() {
    let inputs = [
        "",
        "   ",
        "-- only a comment",
        "INSERT INTO t VALUES (1)",
        "UPDATE t SET a = 1",
        "DELETE FROM t",
        "CREATE TABLE t (a INT)",
        "(SELECT 1)",
        "  /* block */ EXPLAIN SELECT 1",
        "'string first",
        "#",
    ];
    for input in inputs {
        assert_eq!(parse_err(input), INVALID_START, "{:?}", input);
    }

    for input in ["  -- lead\n  select 1", "/* c */ WITH a AS (SELECT 1) SELECT * FROM a"] {
        parse_ok(input);
    }
}

#[test]
fn test_scalar_subquery_rejection() {
    assert_eq!(parse_err("SELECT (SELECT 1) AS x FROM t"), SCALAR_SUBQUERY);
    assert_eq!(parse_err("SELECT a + (SELECT max(b) FROM u) FROM t"), SCALAR_SUBQUERY);
    assert_eq!(parse_err("SELECT EXISTS (SELECT 1 FROM u) FROM t"), SCALAR_SUBQUERY);

    parse_ok("SELECT a FROM t WHERE a IN (SELECT b FROM u)");
    parse_ok("SELECT d.x FROM (SELECT (a) AS x FROM t) d");
    parse_ok("WITH m AS (SELECT max(b) AS top FROM u) SELECT a, m.top FROM t CROSS JOIN m");
}

#[test]
fn test_documented_lineage_shapes() {
    let schema = Schema::new().with_table("t", ["a", "b"]);
    let report = lineage("SELECT * FROM t", Some(&schema));
    assert_eq!(report.columns.len(), 2);
    for (col, name) in report.columns.iter().zip(["a", "b"]) {
        assert_eq!(col.name, name);
        assert_eq!(col.kind, TransformKind::Passthrough);
        assert_eq!(col.sources, sources(&[("t", name)]));
    }

    let report = lineage("SELECT SUM(amount) AS total FROM orders", None);
    assert_eq!(report.columns.len(), 1);
    assert_eq!(column(&report, "total").transform, "SUM");
    assert_eq!(column(&report, "total").sources, sources(&[("orders", "amount")]));

    let report = lineage("SELECT CURRENT_TIMESTAMP AS ts FROM t", None);
    assert_eq!(column(&report, "ts").kind, TransformKind::Generator);
    assert!(column(&report, "ts").sources.is_empty());

    let report = lineage(
        "WITH a AS (SELECT id FROM t), b AS (SELECT id FROM a) SELECT id FROM b",
        None,
    );
    assert_eq!(report.sources, vec!["t"]);

    let report = lineage("SELECT MY_UDF(x) AS y FROM t", None);
    assert_eq!(column(&report, "y").transform, "");
    assert_eq!(column(&report, "y").sources, sources(&[("t", "x")]));
}

#[test]
fn test_reanalysis_is_idempotent() {
    let schema = fixture_schema();
    let analyzer = Analyzer::default().with_schema(&schema);
    for path in sql_files(&fixtures_dir()) {
        let statement = parse_ok(&std::fs::read_to_string(&path).unwrap());
        let first = analyzer.analyze(&statement);
        let second = analyzer.analyze(&statement);
        assert_eq!(first, second, "{}", path.display());
    }
}

#[test]
fn test_shared_analyzer_across_threads() {
    let schema = fixture_schema();
    assert!(!FunctionCatalog::builtin().is_aggregate("hll_count"));
    let catalog = FunctionCatalog::builtin().clone().with_aggregate("hll_count");
    let analyzer = Analyzer::new(&catalog).with_schema(&schema);
    let statement = parse_ok("SELECT hll_count(customer_id) AS n, * FROM customers");
    let expected = analyzer.analyze(&statement);
    assert_eq!(expected.columns.len(), 5);
    assert_eq!(column(&expected, "n").kind, TransformKind::Aggregate);
    assert_eq!(column(&expected, "n").transform, "HLL_COUNT");

    let (analyzer, statement) = (&analyzer, &statement);
    thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(move || analyzer.analyze(statement)))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_best_effort_and_strict_modes() {
    let sql = "SELECT customer_id, name, amount FROM customers JOIN orders ON true";
    let schema = fixture_schema();
    let statement = parse_ok(sql);
    let analyzer = Analyzer::default().with_schema(&schema);

    let report = analyzer.analyze(&statement);
    assert_eq!(report.errors.len(), 1);
    assert!(column(&report, "customer_id").sources.is_empty());
    assert_eq!(column(&report, "name").sources, sources(&[("customers", "name")]));
    assert_eq!(column(&report, "amount").sources, sources(&[("orders", "amount")]));

    let err = analyzer.analyze_strict(&statement).unwrap_err();
    assert_eq!(
        err.to_string(),
        "column customer_id is ambiguous between customers, orders"
    );
}
