//! # afp-cli
//!
//! Command-line front end for the AFP codecs.
//!
//! Converts between CSV, fixed-width ASCII and AfpDocument XML files, and
//! prints the entity graph read from a file as JSON.

use afp_io::{CodecOptions, Exporter, Importer};
use afp_model::{Entity, EntityRegistry};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "afp")]
#[command(about = "AFP tabular file converter")]
#[command(version)]
struct Cli {
    /// Path to a YAML options file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a file and write it in the format of the output extension
    Convert {
        /// Input file path
        input: PathBuf,

        /// Output file path
        output: PathBuf,

        /// Type name of the entity CSV rows are read into
        #[arg(short = 't', long = "type", default_value = "Entity")]
        type_name: String,
    },

    /// Read a file and print its entities as JSON
    Inspect {
        /// Input file path
        input: PathBuf,

        /// Type name of the entity CSV rows are read into
        #[arg(short = 't', long = "type", default_value = "Entity")]
        type_name: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = load_options(cli.config.as_deref())?;
    let importer = Importer::new()
        .with_options(options.import.clone())
        .with_registry(EntityRegistry::permissive());

    match cli.command {
        Commands::Convert {
            input,
            output,
            type_name,
        } => {
            tracing::info!(input = %input.display(), output = %output.display(), "Converting");
            let entities = importer
                .read_from_file(&input, Entity::new(type_name))
                .with_context(|| format!("failed to read '{}'", input.display()))?;
            let report = Exporter::new(&entities)
                .with_options(options.export)
                .write_to_file(&output)
                .with_context(|| format!("failed to write '{}'", output.display()))?;
            if !report.written {
                tracing::warn!(output = %output.display(), "Nothing was written");
            }
            print_json(&report)?;
        }
        Commands::Inspect { input, type_name } => {
            let entities = importer
                .read_from_file(&input, Entity::new(type_name))
                .with_context(|| format!("failed to read '{}'", input.display()))?;
            print_json(&entities)?;
        }
    }

    Ok(())
}

fn load_options(path: Option<&Path>) -> anyhow::Result<CodecOptions> {
    match path {
        Some(path) => {
            tracing::debug!(config = %path.display(), "Loading options");
            CodecOptions::load(path)
                .with_context(|| format!("invalid options file '{}'", path.display()))
        }
        None => Ok(CodecOptions::default()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
