#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
//! `FleetQL` CLI - parse, lower, render and run RSQL queries
//!
//! Usage:
//!   `fleetql parse "name==edge*;updateStatus!=error" --entity targets`
//!   `fleetql sql "tag==canary" --entity targets --sort name:ASC`
//!   `fleetql query ./fleet.json --entity actions -q "distributionSet.name==DS1*"`

mod output;

use clap::{Parser, Subcommand};
use colored::Colorize;
use fleetql_core::{EntityKind, FilterEngine, FleetQlConfig, MemoryStore};
use output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fleetql")]
#[command(author, version, about = "FleetQL CLI - RSQL filtering for device fleets")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = "fleetql.toml", env = "FLEETQL_CONFIG")]
    config: PathBuf,

    /// Compare text case-insensitively
    #[arg(long, global = true)]
    ignore_case: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a query and print its syntax tree
    Parse {
        /// RSQL query
        query: String,

        /// Also bind and lower against this entity (e.g. targets, action)
        #[arg(short, long)]
        entity: Option<EntityKind>,
    },

    /// Render a query as parameterized SQL
    Sql {
        /// RSQL query
        query: String,

        /// Entity the query filters
        #[arg(short, long)]
        entity: EntityKind,

        /// Rows to skip
        #[arg(long)]
        offset: Option<i64>,

        /// Page size
        #[arg(long)]
        limit: Option<i64>,

        /// Sort keys as FIELD:ASC|DESC, repeatable
        #[arg(short, long)]
        sort: Vec<String>,
    },

    /// Run a query against a JSON data file
    Query {
        /// JSON file mapping collection names to document arrays
        data: PathBuf,

        /// Entity to list
        #[arg(short, long)]
        entity: EntityKind,

        /// RSQL query; all entities when omitted
        #[arg(short, long)]
        q: Option<String>,

        /// Rows to skip
        #[arg(long)]
        offset: Option<i64>,

        /// Page size
        #[arg(long)]
        limit: Option<i64>,

        /// Sort keys as FIELD:ASC|DESC, repeatable
        #[arg(short, long)]
        sort: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = FleetQlConfig::load_from_path(&cli.config)?;
    if cli.ignore_case {
        config.query.ignore_case = true;
    }
    config.validate()?;

    match cli.command {
        Commands::Parse { query, entity } => {
            let engine = FilterEngine::new(config);
            let expr = engine.parse(&query).inspect_err(|e| output::explain_error(&query, e))?;
            println!("{}", "Syntax tree".green().bold());
            println!("{}", serde_json::to_string_pretty(&*expr)?);

            if let Some(kind) = entity {
                let predicate = engine
                    .compile(kind, Some(&query))
                    .inspect_err(|e| output::explain_error(&query, e))?;
                println!("{}", format!("Predicate ({kind})").green().bold());
                println!("{}", serde_json::to_string_pretty(&predicate)?);
            }
        }
        Commands::Sql {
            query,
            entity,
            offset,
            limit,
            sort,
        } => {
            let engine = FilterEngine::new(config);
            let page = engine.page_request(entity, offset, limit, &sort)?;
            let sql = engine
                .render_sql(entity, Some(&query), &page)
                .inspect_err(|e| output::explain_error(&query, e))?;
            output::print_sql(&sql);
        }
        Commands::Query {
            data,
            entity,
            q,
            offset,
            limit,
            sort,
            format,
        } => {
            let store = MemoryStore::new();
            store.load_seed_file(&data)?;
            let engine = FilterEngine::new(config);
            let page = engine.page_request(entity, offset, limit, &sort)?;
            let result = engine
                .find(&store, entity, q.as_deref(), &page)
                .inspect_err(|e| output::explain_error(q.as_deref().unwrap_or_default(), e))?;
            output::print_page(&result, page.offset, format)?;
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
