//! sqlineage CLI - Diagnostic harness for the SQL parser and lineage engine

use std::fs;
use std::path::{Path, PathBuf};

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use sqlineage_ast::Span;
use sqlineage_lexer::{tokenize_with, Dialect, IdentifierCase};
use sqlineage_lineage::{Analyzer, FunctionCatalog, LineageError, LineageReport, Schema};
use sqlineage_parser::{parse_with_dialect, ParseError};

#[derive(Parser)]
#[command(name = "sqlineage")]
#[command(about = "SQL SELECT parser and column-lineage analyzer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump the token sequence of a file
    Tokens {
        /// Input file
        file: PathBuf,
        /// Fold unquoted identifiers to lower case
        #[arg(long)]
        lowercase: bool,
    },
    /// Parse a file and output the AST as JSON
    Parse {
        /// Input file
        file: PathBuf,
        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
        /// Fold unquoted identifiers to lower case
        #[arg(long)]
        lowercase: bool,
    },
    /// Report column lineage for .sql files
    Lineage {
        /// Input files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// JSON object mapping table names to column lists
        #[arg(short, long)]
        schema: Option<PathBuf>,
        /// JSON file with extra aggregate / window / generator names
        #[arg(short, long)]
        functions: Option<PathBuf>,
        /// Fold unquoted identifiers to lower case
        #[arg(long)]
        lowercase: bool,
        /// Treat any resolution error as a failure
        #[arg(long)]
        strict: bool,
        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
    },
}

#[derive(Serialize)]
struct FileReport<'a> {
    file: String,
    #[serde(flatten)]
    report: &'a LineageReport,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let ok = match cli.command {
        Commands::Tokens { file, lowercase } => cmd_tokens(&file, dialect(lowercase)),
        Commands::Parse {
            file,
            pretty,
            lowercase,
        } => cmd_parse(&file, pretty, dialect(lowercase)),
        Commands::Lineage {
            paths,
            schema,
            functions,
            lowercase,
            strict,
            pretty,
        } => cmd_lineage(
            &paths,
            schema.as_deref(),
            functions.as_deref(),
            dialect(lowercase),
            strict,
            pretty,
        ),
    };

    if !ok {
        std::process::exit(1);
    }
}

fn dialect(lowercase: bool) -> Dialect {
    if lowercase {
        Dialect::with_identifier_case(IdentifierCase::Lowercase)
    } else {
        Dialect::duckdb()
    }
}

fn read_source(file: &Path) -> Option<String> {
    match fs::read_to_string(file) {
        Ok(s) => Some(s),
        Err(e) => {
            eprintln!("Error reading {}: {}", file.display(), e);
            None
        }
    }
}

fn cmd_tokens(file: &Path, dialect: Dialect) -> bool {
    let Some(source) = read_source(file) else {
        return false;
    };

    match tokenize_with(&source, &dialect) {
        Ok(tokens) => {
            for token in tokens {
                println!(
                    "{}:{}\t{:?}\t{}",
                    token.position.line, token.position.column, token.kind, token.text
                );
            }
            true
        }
        Err(e) => {
            let offset = e.position().offset;
            report(&source, file, ReportKind::Error, &e.to_string(), Span::new(offset, offset + 1));
            false
        }
    }
}

fn cmd_parse(file: &Path, pretty: bool, dialect: Dialect) -> bool {
    let Some(source) = read_source(file) else {
        return false;
    };

    match parse_with_dialect(&source, &dialect) {
        Ok(statement) => print_json(&statement, pretty),
        Err(e) => {
            report_parse_error(&source, file, &e);
            false
        }
    }
}

fn cmd_lineage(
    paths: &[PathBuf],
    schema: Option<&Path>,
    functions: Option<&Path>,
    dialect: Dialect,
    strict: bool,
    pretty: bool,
) -> bool {
    let schema: Option<Schema> = match schema.map(load_json).transpose() {
        Ok(schema) => schema,
        Err(()) => return false,
    };
    let mut catalog = FunctionCatalog::builtin().clone();
    if let Some(path) = functions {
        match load_json::<FunctionCatalog>(path) {
            Ok(extra) => catalog.extend(&extra),
            Err(()) => return false,
        }
    }

    let mut analyzer = Analyzer::new(&catalog);
    if let Some(schema) = &schema {
        analyzer = analyzer.with_schema(schema);
    }

    let files = collect_sql_files(paths);
    if files.is_empty() {
        eprintln!("No .sql files found");
        return false;
    }

    let mut all_ok = true;
    for file in &files {
        let Some(source) = read_source(file) else {
            all_ok = false;
            continue;
        };

        let statement = match parse_with_dialect(&source, &dialect) {
            Ok(statement) => statement,
            Err(e) => {
                report_parse_error(&source, file, &e);
                all_ok = false;
                continue;
            }
        };

        let lineage = analyzer.analyze(&statement);
        let kind = if strict { ReportKind::Error } else { ReportKind::Warning };
        for err in &lineage.errors {
            report_lineage_error(&source, file, kind, err);
        }
        if strict && !lineage.is_complete() {
            all_ok = false;
            continue;
        }

        let entry = FileReport {
            file: file.display().to_string(),
            report: &lineage,
        };
        all_ok &= print_json(&entry, pretty);
    }

    tracing::debug!(files = files.len(), ok = all_ok, "lineage batch finished");
    all_ok
}

/// Expand directories into their `.sql` files, sorted by path
fn collect_sql_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|p| p.extension().and_then(|ext| ext.to_str()) == Some("sql"))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    files
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ()> {
    let text = read_source(path).ok_or(())?;
    serde_json::from_str(&text).map_err(|e| {
        eprintln!("Error loading {}: {}", path.display(), e);
    })
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> bool {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match json {
        Ok(json) => {
            println!("{}", json);
            true
        }
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            false
        }
    }
}

fn report_parse_error(source: &str, file: &Path, error: &ParseError) {
    let offset = error.position().offset;
    report(source, file, ReportKind::Error, &error.to_string(), Span::new(offset, offset + 1));
}

fn report_lineage_error(source: &str, file: &Path, kind: ReportKind<'static>, error: &LineageError) {
    report(source, file, kind, &error.to_string(), error.span());
}

/// Render a diagnostic. Spans are byte offsets; ariadne labels count chars.
fn report(source: &str, file: &Path, kind: ReportKind<'static>, message: &str, span: Span) {
    let name = file.to_string_lossy().to_string();
    let start = char_offset(source, span.start);
    let end = char_offset(source, span.end).max(start);
    let color = match kind {
        ReportKind::Warning => Color::Yellow,
        _ => Color::Red,
    };

    let printed = Report::build(kind, name.clone(), start)
        .with_message(message)
        .with_label(
            Label::new((name.clone(), start..end))
                .with_message(message)
                .with_color(color),
        )
        .finish()
        .eprint((name, Source::from(source)));
    if let Err(e) = printed {
        eprintln!("{}: {}", file.display(), message);
        tracing::debug!(error = %e, "failed to render diagnostic");
    }
}

fn char_offset(source: &str, byte: usize) -> usize {
    source.char_indices().take_while(|(i, _)| *i < byte).count()
}
