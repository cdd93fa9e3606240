//! Function classification tables

use std::collections::HashSet;
use std::sync::OnceLock;

use serde::{Deserialize, Deserializer, Serialize};

const AGGREGATES: &[&str] = &[
    "SUM", "COUNT", "AVG", "MIN", "MAX", "ARRAY_AGG", "STRING_AGG", "LIST", "GROUP_CONCAT",
    "LISTAGG", "MEDIAN", "MODE", "STDDEV", "STDDEV_POP", "STDDEV_SAMP", "VARIANCE", "VAR_POP",
    "VAR_SAMP", "ANY_VALUE", "FIRST", "LAST", "ARG_MAX", "ARG_MIN", "MAX_BY", "MIN_BY",
    "BOOL_AND", "BOOL_OR", "BIT_AND", "BIT_OR", "COUNT_IF", "APPROX_COUNT_DISTINCT",
    "QUANTILE_CONT", "QUANTILE_DISC", "PERCENTILE_CONT", "PERCENTILE_DISC", "CORR",
    "COVAR_POP", "COVAR_SAMP", "HISTOGRAM",
];

/// Functions that are only meaningful with an `OVER` clause
const WINDOWS: &[&str] = &[
    "ROW_NUMBER", "RANK", "DENSE_RANK", "PERCENT_RANK", "CUME_DIST", "NTILE", "LAG", "LEAD",
    "FIRST_VALUE", "LAST_VALUE", "NTH_VALUE",
];

/// Functions producing values with no column input
const GENERATORS: &[&str] = &[
    "CURRENT_TIMESTAMP", "CURRENT_DATE", "CURRENT_TIME", "LOCALTIMESTAMP", "LOCALTIME", "NOW",
    "TODAY", "RANDOM", "UUID", "GEN_RANDOM_UUID",
];

/// Aggregate / window / generator name sets used to classify output columns.
///
/// Names are stored upper-case and matched case-insensitively. The catalog is
/// read-only during analysis and can be shared across threads.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionCatalog {
    #[serde(deserialize_with = "upper_names")]
    aggregates: HashSet<String>,
    #[serde(deserialize_with = "upper_names")]
    windows: HashSet<String>,
    #[serde(deserialize_with = "upper_names")]
    generators: HashSet<String>,
}

fn upper_names<'de, D>(deserializer: D) -> Result<HashSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = Vec::<String>::deserialize(deserializer)?;
    Ok(names.into_iter().map(|n| n.to_ascii_uppercase()).collect())
}

fn name_set(names: &[&str]) -> HashSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

impl FunctionCatalog {
    /// An empty catalog: every call classifies as passthrough
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in DuckDB-flavoured catalog, built once per process
    pub fn builtin() -> &'static FunctionCatalog {
        static BUILTIN: OnceLock<FunctionCatalog> = OnceLock::new();
        BUILTIN.get_or_init(|| FunctionCatalog {
            aggregates: name_set(AGGREGATES),
            windows: name_set(WINDOWS),
            generators: name_set(GENERATORS),
        })
    }

    pub fn with_aggregate(mut self, name: &str) -> Self {
        self.aggregates.insert(name.to_ascii_uppercase());
        self
    }

    pub fn with_window(mut self, name: &str) -> Self {
        self.windows.insert(name.to_ascii_uppercase());
        self
    }

    pub fn with_generator(mut self, name: &str) -> Self {
        self.generators.insert(name.to_ascii_uppercase());
        self
    }

    /// Add every name of `other` to this catalog
    pub fn extend(&mut self, other: &FunctionCatalog) {
        self.aggregates.extend(other.aggregates.iter().cloned());
        self.windows.extend(other.windows.iter().cloned());
        self.generators.extend(other.generators.iter().cloned());
    }

    pub fn is_aggregate(&self, name: &str) -> bool {
        self.aggregates.contains(&name.to_ascii_uppercase())
    }

    pub fn is_window(&self, name: &str) -> bool {
        self.windows.contains(&name.to_ascii_uppercase())
    }

    pub fn is_generator(&self, name: &str) -> bool {
        self.generators.contains(&name.to_ascii_uppercase())
    }
}
