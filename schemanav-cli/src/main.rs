//! Command-line browser for JSON Schema definitions.
//!
//! Every command takes a selection: a list of steps, each naming an item or,
//! prefixed with `@`, an option-index path such as `@1.0`.

#[macro_use]
extern crate log;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use schemanav::{Column, Inspector, ParseConfig, SelectionStep, get_options_in_schema_group};

mod loader;
mod print;

use loader::{NamedSchema, load_config, load_value, parse_named_schema};

#[derive(Parser)]
#[command(name = "schemanav")]
#[command(about = "Browse JSON Schema definitions column by column")]
#[command(version)]
struct Cli {
    /// Parse configuration file (`.toml` or `.json`)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Root schema as `NAME=FILE`, or `FILE` to name it after the file
    #[arg(short, long = "schema", value_parser = parse_named_schema, global = true)]
    schemas: Vec<NamedSchema>,

    /// Schema that is only reachable through `$ref`
    #[arg(short, long = "ref-schema", global = true)]
    ref_schemas: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the columns of a selection
    Columns {
        /// Selection steps
        steps: Vec<SelectionStep>,
    },
    /// Print the merged details of the last selected entry
    Details {
        /// Selection steps
        steps: Vec<SelectionStep>,
    },
    /// Print every leaf option path of the last selected entry
    Options {
        /// Selection steps
        steps: Vec<SelectionStep>,
    },
    /// Print the JSON schema of the parse configuration
    ConfigSchema,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Commands::ConfigSchema = cli.command {
        let schema = schemars::schema_for!(ParseConfig);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let inspector = inspector(&cli)?;
    match &cli.command {
        Commands::Columns { steps } => {
            let columns = inspector.columns(steps)?;
            print!("{}", print::render_columns(&columns)?);
        }
        Commands::Details { steps } => match inspector.details(steps)? {
            Some(details) => println!("{}", serde_json::to_string_pretty(&details)?),
            None => println!("{}", "nothing selected".yellow()),
        },
        Commands::Options { steps } => {
            let columns = inspector.columns(steps)?;
            match columns.iter().rev().find_map(Column::selection) {
                Some((group, _)) => {
                    let options = get_options_in_schema_group(group);
                    if !options.has_options() {
                        println!("{}", "no options".yellow());
                    }
                    for path in options.index_permutations() {
                        let name = options.option_name(&path).unwrap_or_default();
                        println!("{:<12}{name}", SelectionStep::Options(path).to_string().cyan());
                    }
                }
                None => println!("{}", "nothing selected".yellow()),
            }
        }
        Commands::ConfigSchema => {}
    }
    Ok(())
}

fn inspector(cli: &Cli) -> Result<Inspector> {
    let config = load_config(cli.config.as_deref())?;
    let roots = cli
        .schemas
        .iter()
        .map(|schema| Ok((schema.name.clone(), load_value(&schema.path)?)))
        .collect::<Result<Vec<_>>>()?;
    let ref_schemas = cli
        .ref_schemas
        .iter()
        .map(|path| load_value(path))
        .collect::<Result<Vec<_>>>()
        .context("Failed to load reference schemas")?;
    info!(
        "loaded {} root schemas and {} reference schemas",
        roots.len(),
        ref_schemas.len()
    );
    Ok(Inspector::new(roots, ref_schemas, config))
}
