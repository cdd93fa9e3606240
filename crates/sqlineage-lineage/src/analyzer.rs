//! Column-lineage analysis over a parsed statement

use sqlineage_ast::*;

use crate::report::push_unique;
use crate::scope::{EntryKind, Resolved, Scope, ScopeEntry};
use crate::{
    ColumnLineage, FunctionCatalog, LineageError, LineageReport, Schema, SourceColumn,
    TransformKind,
};

const TARGET: &str = "sqlineage.lineage";

/// Lineage analyzer configured with a function catalog and an optional schema.
///
/// Holds only shared references to immutable configuration; every `analyze`
/// call builds its own working state.
#[derive(Debug, Clone, Copy)]
pub struct Analyzer<'a> {
    catalog: &'a FunctionCatalog,
    schema: Option<&'a Schema>,
}

impl Default for Analyzer<'static> {
    fn default() -> Self {
        Self::new(FunctionCatalog::builtin())
    }
}

impl<'a> Analyzer<'a> {
    pub fn new(catalog: &'a FunctionCatalog) -> Self {
        Self {
            catalog,
            schema: None,
        }
    }

    pub fn with_schema(mut self, schema: &'a Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Best-effort analysis: every column is emitted, and each resolution
    /// failure is recorded in `report.errors`.
    pub fn analyze(&self, statement: &Statement) -> LineageReport {
        let span = tracing::debug_span!(
            target: TARGET,
            "analyze",
            columns = tracing::field::Empty,
            sources = tracing::field::Empty,
            errors = tracing::field::Empty
        );
        let _guard = span.enter();

        let mut pass = Pass {
            catalog: self.catalog,
            schema: self.schema,
            ctes: Vec::new(),
            errors: Vec::new(),
        };
        let relation = pass.statement(statement, None);

        let report = LineageReport {
            sources: relation.tables,
            columns: relation.columns,
            errors: pass.errors,
        };
        span.record("columns", report.columns.len() as u64);
        span.record("sources", report.sources.len() as u64);
        span.record("errors", report.errors.len() as u64);
        report
    }

    /// Fail-fast analysis: the first resolution failure is returned as `Err`
    pub fn analyze_strict(&self, statement: &Statement) -> Result<LineageReport, LineageError> {
        self.analyze(statement).into_result()
    }
}

/// Output columns of a query plus the physical tables it reads
#[derive(Debug, Clone, Default)]
struct Relation {
    columns: Vec<ColumnLineage>,
    tables: Vec<String>,
}

impl Relation {
    fn rename(&mut self, names: &[String]) {
        for (column, name) in self.columns.iter_mut().zip(names) {
            column.name = name.clone();
        }
    }

    /// Fold a set-operation branch into this relation, column by position
    fn union(&mut self, branch: Relation) {
        for (i, column) in branch.columns.into_iter().enumerate() {
            match self.columns.get_mut(i) {
                Some(existing) => {
                    for source in column.sources {
                        push_unique(&mut existing.sources, source);
                    }
                }
                None => self.columns.push(column),
            }
        }
        for table in branch.tables {
            push_unique(&mut self.tables, table);
        }
    }
}

/// Working state of one `analyze` call
struct Pass<'a> {
    catalog: &'a FunctionCatalog,
    schema: Option<&'a Schema>,
    /// CTEs visible at the current point, innermost last
    ctes: Vec<(String, Relation)>,
    errors: Vec<LineageError>,
}

impl<'a> Pass<'a> {
    fn error(&mut self, err: LineageError) {
        tracing::debug!(target: TARGET, error = %err, "lineage resolution failed");
        self.errors.push(err);
    }

    fn find_cte(&self, name: &str) -> Option<&Relation> {
        self.ctes
            .iter()
            .rev()
            .find(|(cte, _)| cte.eq_ignore_ascii_case(name))
            .map(|(_, relation)| relation)
    }

    fn statement(&mut self, statement: &Statement, parent: Option<&Scope<'_>>) -> Relation {
        let visible = self.ctes.len();

        if let Some(with) = &statement.with {
            for cte in &with.ctes {
                let relation = if with.recursive {
                    self.recursive_cte(cte, parent)
                } else {
                    let mut relation = self.statement(&cte.query, parent);
                    relation.rename(&cte.columns);
                    relation
                };
                self.ctes.push((cte.name.clone(), relation));
            }
        }

        let relation = self.body(&statement.body, parent);
        self.ctes.truncate(visible);
        relation
    }

    /// The anchor (first core) stands in for the CTE while its full body,
    /// which may reference itself, is analyzed.
    fn recursive_cte(&mut self, cte: &Cte, parent: Option<&Scope<'_>>) -> Relation {
        let errors = self.errors.len();
        let mut anchor = self.core(cte.query.body.first_core(), parent);
        anchor.rename(&cte.columns);
        self.errors.truncate(errors);

        self.ctes.push((cte.name.clone(), anchor));
        let mut relation = self.statement(&cte.query, parent);
        self.ctes.pop();
        relation.rename(&cte.columns);
        relation
    }

    fn body(&mut self, body: &SelectBody, parent: Option<&Scope<'_>>) -> Relation {
        let mut cores = body.cores().into_iter();
        let mut relation = match cores.next() {
            Some(first) => self.core(first, parent),
            None => Relation::default(),
        };
        for core in cores {
            let branch = self.core(core, parent);
            relation.union(branch);
        }
        relation
    }

    fn core(&mut self, core: &SelectCore, parent: Option<&Scope<'_>>) -> Relation {
        let mut tables = Vec::new();
        let mut scope = Scope::new(parent);

        if let Some(from) = &core.from {
            self.add_table(&mut scope, &from.source, parent, &mut tables);
            for join in &from.joins {
                self.add_table(&mut scope, &join.table, parent, &mut tables);
                let joined = scope.entries.len() - 1;

                match &join.constraint {
                    JoinConstraint::Using(columns) => {
                        for column in columns {
                            scope.merge_join_column(column, joined);
                        }
                    }
                    JoinConstraint::Natural => {
                        let shared: Vec<String> = scope.entries[joined]
                            .known_names()
                            .into_iter()
                            .filter(|name| {
                                scope.entries[..joined]
                                    .iter()
                                    .any(|e| e.known_names().iter().any(|n| n.eq_ignore_ascii_case(name)))
                            })
                            .collect();
                        for name in shared {
                            scope.merge_join_column(&name, joined);
                        }
                    }
                    JoinConstraint::On(_) | JoinConstraint::None => {}
                }
            }
        }

        // Tables read only by clause subqueries still count as sources. Their
        // own resolution failures never affect an output column.
        for expr in clause_exprs(core) {
            for subquery in expr.subqueries() {
                let errors = self.errors.len();
                let relation = self.statement(subquery, Some(&scope));
                self.errors.truncate(errors);
                for table in relation.tables {
                    push_unique(&mut tables, table);
                }
            }
        }

        let mut columns = Vec::new();
        for item in &core.items {
            match &item.kind {
                SelectItemKind::Star => self.expand_star(&scope, None, item.span, &mut columns),
                SelectItemKind::TableStar(table) => {
                    self.expand_star(&scope, Some(table), item.span, &mut columns)
                }
                SelectItemKind::Expr { expr, alias } => {
                    let column = self.select_expr(core, &scope, expr, alias.as_deref());
                    columns.push(column);
                }
            }
        }

        Relation { columns, tables }
    }

    fn add_table(
        &mut self,
        scope: &mut Scope<'_>,
        table: &TableRef,
        parent: Option<&Scope<'_>>,
        tables: &mut Vec<String>,
    ) {
        let visible = table.visible_name().map(str::to_string);
        let entry = match table {
            TableRef::Table(name) => {
                let cte = if name.is_qualified() {
                    None
                } else {
                    self.find_cte(&name.name).cloned()
                };

                match cte {
                    Some(relation) => {
                        for table in relation.tables {
                            push_unique(tables, table);
                        }
                        ScopeEntry {
                            name: visible,
                            kind: EntryKind::Known(relation.columns),
                        }
                    }
                    None => {
                        let qualified = name.qualified_name();
                        push_unique(tables, qualified.clone());
                        let kind = match self.schema.and_then(|s| s.lookup(name)) {
                            Some(columns) => EntryKind::Known(
                                columns
                                    .iter()
                                    .map(|c| {
                                        ColumnLineage::passthrough(
                                            c.clone(),
                                            vec![SourceColumn::new(qualified.clone(), c.clone())],
                                        )
                                    })
                                    .collect(),
                            ),
                            None => EntryKind::Opaque { table: qualified },
                        };
                        ScopeEntry {
                            name: visible,
                            kind,
                        }
                    }
                }
            }
            TableRef::Derived(derived) => {
                let relation = self.statement(&derived.query, parent);
                derived_entry(derived, visible, relation, tables)
            }
            TableRef::Lateral(derived) => {
                let relation = self.statement(&derived.query, Some(&*scope));
                derived_entry(derived, visible, relation, tables)
            }
        };
        scope.entries.push(entry);
    }

    fn expand_star(
        &mut self,
        scope: &Scope<'_>,
        qualifier: Option<&str>,
        span: Span,
        columns: &mut Vec<ColumnLineage>,
    ) {
        let entries: Vec<(usize, &ScopeEntry)> = match qualifier {
            // `s.t.*` names the entry visible as `t`
            Some(qualifier) => {
                let table = qualifier.rsplit('.').next().unwrap_or(qualifier);
                match scope.entries.iter().enumerate().find(|(_, e)| e.matches(table)) {
                    Some(found) => vec![found],
                    None => {
                        self.error(LineageError::UnknownTable {
                            name: qualifier.to_string(),
                            span,
                        });
                        return;
                    }
                }
            }
            None => scope.entries.iter().enumerate().collect(),
        };

        for (index, entry) in entries {
            match &entry.kind {
                EntryKind::Known(known) => {
                    for column in known {
                        // Join columns appear once, from their leftmost table
                        if qualifier.is_none() && scope.merged_with_earlier(&column.name, index) {
                            continue;
                        }
                        columns.push(column.clone());
                    }
                }
                EntryKind::Opaque { table } => {
                    tracing::warn!(
                        target: TARGET,
                        table = %table,
                        "cannot expand * without a schema entry"
                    );
                    self.error(LineageError::MissingSchema {
                        table: table.clone(),
                        span,
                    });
                }
            }
        }
    }

    fn select_expr(
        &mut self,
        core: &SelectCore,
        scope: &Scope<'_>,
        expr: &Expr,
        alias: Option<&str>,
    ) -> ColumnLineage {
        let top = expr.unparenthesized();
        let name = match (alias, &top.kind) {
            (Some(alias), _) => alias.to_string(),
            (None, ExprKind::Column(col)) => col.name.clone(),
            (None, _) => expr.to_string(),
        };

        let mut refs = Vec::new();
        collect_refs(core, top, &mut refs);

        let mut sources = Vec::new();
        let mut upstream: Option<(String, TransformKind)> = None;
        for (col, span) in &refs {
            match scope.resolve(col, *span) {
                Ok(Resolved::Column(column)) => {
                    for source in &column.sources {
                        push_unique(&mut sources, source.clone());
                    }
                    upstream = Some((column.transform.clone(), column.kind));
                }
                Ok(Resolved::Opaque(source)) => push_unique(&mut sources, source),
                Err(err) => self.error(err),
            }
        }

        let (transform, kind) = match &top.kind {
            ExprKind::Function(call) => self.classify(call, refs.is_empty()),
            // A bare reference carries the classification of what it points at
            ExprKind::Column(_) => upstream.unwrap_or_default(),
            _ => (String::new(), TransformKind::Passthrough),
        };

        tracing::trace!(
            target: TARGET,
            column = %name,
            kind = kind.as_str(),
            sources = sources.len(),
            "resolved output column"
        );
        ColumnLineage {
            name,
            transform,
            kind,
            sources,
        }
    }

    fn classify(&self, call: &FunctionCall, no_columns: bool) -> (String, TransformKind) {
        let name = call.name.to_ascii_uppercase();
        if call.over.is_some() || self.catalog.is_window(&name) {
            (name, TransformKind::Window)
        } else if self.catalog.is_aggregate(&name) {
            (name, TransformKind::Aggregate)
        } else if self.catalog.is_generator(&name) && no_columns {
            (name, TransformKind::Generator)
        } else {
            (String::new(), TransformKind::Passthrough)
        }
    }
}

fn derived_entry(
    derived: &DerivedTable,
    name: Option<String>,
    mut relation: Relation,
    tables: &mut Vec<String>,
) -> ScopeEntry {
    relation.rename(&derived.columns);
    for table in relation.tables {
        push_unique(tables, table);
    }
    ScopeEntry {
        name,
        kind: EntryKind::Known(relation.columns),
    }
}

/// Expressions of a core outside its select list, where subqueries may appear
fn clause_exprs(core: &SelectCore) -> Vec<&Expr> {
    let mut out: Vec<&Expr> = Vec::new();
    if let Some(from) = &core.from {
        for join in &from.joins {
            if let JoinConstraint::On(on) = &join.constraint {
                out.push(on);
            }
        }
    }
    out.extend(core.where_clause.iter());
    if let GroupBy::Exprs(exprs) = &core.group_by {
        out.extend(exprs.iter());
    }
    out.extend(core.having.iter());
    for window in &core.windows {
        out.extend(window.def.partition_by.iter());
        out.extend(window.def.order_by.iter().map(|o| &o.expr));
    }
    out.extend(core.qualify.iter());
    out.extend(core.order_by.iter().map(|o| &o.expr));
    out.extend(core.limit.iter());
    out.extend(core.offset.iter());
    out
}

/// Column references in source order. For a call: arguments, aggregate
/// ORDER BY, FILTER, then PARTITION BY and ORDER BY of its window, with
/// named windows expanded through the core's WINDOW clause.
fn collect_refs<'e>(core: &'e SelectCore, expr: &'e Expr, out: &mut Vec<(&'e ColumnRef, Span)>) {
    match &expr.kind {
        ExprKind::Column(col) => out.push((col, expr.span)),
        ExprKind::Function(call) => {
            for arg in &call.args {
                collect_refs(core, arg, out);
            }
            for item in &call.order_by {
                collect_refs(core, &item.expr, out);
            }
            if let Some(filter) = &call.filter {
                collect_refs(core, filter, out);
            }
            if let Some(over) = &call.over {
                let chain = window_chain(core, over);
                for def in chain.iter().copied() {
                    for partition in &def.partition_by {
                        collect_refs(core, partition, out);
                    }
                }
                for def in chain.iter().copied() {
                    for item in &def.order_by {
                        collect_refs(core, &item.expr, out);
                    }
                }
            }
        }
        _ => {
            for child in expr.children() {
                collect_refs(core, child, out);
            }
        }
    }
}

/// Window definitions from the outermost named base to the call's own
fn window_chain<'e>(core: &'e SelectCore, spec: &'e WindowSpec) -> Vec<&'e WindowDef> {
    let mut chain = Vec::new();
    let mut next = match spec {
        WindowSpec::Named(name) => core.named_window(name),
        WindowSpec::Inline(def) => {
            chain.push(def);
            def.base.as_deref().and_then(|base| core.named_window(base))
        }
    };
    while let Some(def) = next {
        if chain.len() > core.windows.len() {
            break;
        }
        chain.insert(0, def);
        next = def.base.as_deref().and_then(|base| core.named_window(base));
    }
    chain
}
