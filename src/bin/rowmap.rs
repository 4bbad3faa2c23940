//! rowmap: raw inserts and queries from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Show the INSERT without running it
//! rowmap insert posts id=1 title=hi --dry-run
//!
//! # Run a query with bindings
//! rowmap query "SELECT * FROM posts WHERE id = ?" --bind 1
//!
//! # Which placeholders does a database use?
//! rowmap dialect postgres://localhost/app
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use rowmap::prelude::*;
use rowmap::transpiler;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rowmap")]
#[command(version)]
#[command(about = "Map records to rows - raw statements from the shell", long_about = None)]
#[command(after_help = "EXAMPLES:
    rowmap insert posts id=1 title=hi --dry-run
    rowmap query 'SELECT id, title FROM posts WHERE id = $1' --bind 7 --format json
    rowmap dialect sqlite::memory:")]
struct Cli {
    /// Database connection URL (overrides rowmap.toml)
    #[arg(long, env = "ROWMAP_DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Placeholder family: positional or numbered (inferred from the URL otherwise)
    #[arg(long, global = true)]
    dialect: Option<Dialect>,

    /// Verbose output (logs every statement)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert one row from column=value pairs
    Insert {
        /// Target table
        table: String,

        /// Column assignments, e.g. id=1 title=hello
        #[arg(required = true)]
        assignments: Vec<String>,

        /// Don't execute, just show the generated SQL
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
    /// Run a query and print the rows
    Query {
        /// The SQL to run
        sql: String,

        /// Parameter bindings, in placeholder order
        #[arg(short, long, value_delimiter = ',')]
        bind: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Show the placeholder family used for a connection URL
    Dialect {
        /// Connection URL
        url: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "rowmap=debug" } else { "rowmap=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Dialect { url } => {
            match Dialect::for_url(url) {
                Some(dialect) => println!("{}", dialect.to_string().cyan()),
                None => bail!("unknown URL scheme in '{}'", url),
            }
            Ok(())
        }
        Commands::Insert {
            table,
            assignments,
            dry_run,
        } => insert(cli, table, assignments, *dry_run).await,
        Commands::Query { sql, bind, format } => query(cli, sql, bind, format).await,
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load()
        .context("loading rowmap.toml")?
        .with_url_override(cli.database_url.clone());
    if cli.dialect.is_some() {
        config.database.dialect = cli.dialect;
    }
    Ok(config)
}

async fn insert(cli: &Cli, table: &str, assignments: &[String], dry_run: bool) -> Result<()> {
    let mut columns = Vec::with_capacity(assignments.len());
    let mut values = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let Some((column, literal)) = assignment.split_once('=') else {
            bail!("expected column=value, got '{}'", assignment);
        };
        columns.push(column.trim());
        values.push(parse_literal(literal));
    }

    let config = load_config(cli)?;

    // Dry run or no database URL - just show SQL
    if dry_run || config.database.url.is_none() {
        let dialect = config.database.dialect.unwrap_or_else(|| {
            config
                .database
                .url
                .as_deref()
                .and_then(Dialect::for_url)
                .unwrap_or_default()
        });
        print_statement(&transpiler::insert_sql(table, &columns, dialect), &values);
        return Ok(());
    }

    let mapping = Mapping::connect(&config).await?;
    let affected = mapping.insert_values(table, &columns, values).await?;
    println!("{} {} row(s) inserted", "✓".green(), affected);
    Ok(())
}

async fn query(cli: &Cli, sql: &str, bind: &[String], format: &OutputFormat) -> Result<()> {
    let config = load_config(cli)?;
    let bindings: Vec<Value> = bind.iter().map(|b| parse_literal(b)).collect();

    if config.database.url.is_none() {
        print_statement(sql, &bindings);
        println!();
        println!("{}", "No database URL: set --database-url or rowmap.toml to run it.".yellow());
        return Ok(());
    }

    let mapping = Mapping::connect(&config).await?;
    let rows = mapping.fetch_rows(sql, &bindings).await?;

    match format {
        OutputFormat::Json => {
            let objects: Vec<serde_json::Value> = rows
                .rows
                .iter()
                .map(|row| {
                    let fields = rows
                        .columns
                        .iter()
                        .cloned()
                        .zip(row.iter().map(value_to_json))
                        .collect::<serde_json::Map<_, _>>();
                    serde_json::Value::Object(fields)
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&objects)?);
        }
        OutputFormat::Table => print_table(&rows),
    }
    Ok(())
}

fn print_statement(sql: &str, values: &[Value]) {
    println!("{}", "Generated SQL:".green().bold());
    println!("{}", sql.white());
    if !values.is_empty() {
        println!();
        println!("{}", "Bindings:".green().bold());
        for (i, value) in values.iter().enumerate() {
            println!("  {} {}", format!("{}.", i + 1).dimmed(), value);
        }
    }
}

fn print_table(rows: &Rows) {
    if rows.is_empty() {
        println!("{}", "(no rows)".dimmed());
        return;
    }

    let cells: Vec<Vec<String>> = rows
        .rows
        .iter()
        .map(|row| row.iter().map(display_cell).collect())
        .collect();
    let widths: Vec<usize> = rows
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .map(|row| row.get(i).map_or(0, |c| c.chars().count()))
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = rows
        .columns
        .iter()
        .zip(&widths)
        .map(|(name, w)| format!("{:<w$}", name, w = *w))
        .collect();
    println!("{}", header.join(" | ").cyan().bold());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    println!("{}", rule.join("-+-").dimmed());
    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<w$}", cell, w = *w))
            .collect();
        println!("{}", line.join(" | "));
    }
    println!();
    println!("{}", format!("{} row(s)", rows.len()).dimmed());
}

fn display_cell(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::Json(j) => j.to_string(),
        other => other.to_string(),
    }
}

/// Parse a command line literal: null, true/false, integer, float, or text.
/// Quote with '...' to force text.
fn parse_literal(raw: &str) -> Value {
    let raw = raw.trim();
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return Value::Text(raw[1..raw.len() - 1].to_string());
    }
    match raw {
        "null" | "NULL" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(n) = raw.parse::<i64>() {
                Value::Int(n)
            } else if let Ok(f) = raw.parse::<f64>() {
                Value::Float(f)
            } else {
                Value::Text(raw.to_string())
            }
        }
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(n) => serde_json::Value::from(*n),
        Value::Float(f) => serde_json::Value::from(*f),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Bytes(b) => serde_json::Value::from(b.clone()),
        Value::Json(j) => j.clone(),
    }
}
