//! JSL command line
//!
//! Verifies schemas and validates JSON documents against them.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jsl::{JslConfig, OutputFormat, Schema, SerdeSchema, ValidateError, Validator};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jsl")]
#[command(about = "Verify JSON Schema Language schemas and validate instances")]
struct Cli {
    /// Configuration file, layered over jsl.toml and JSL__* variables
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the form a schema resolves to
    Form {
        schema: PathBuf,
    },

    /// Check that a schema is correct
    Verify {
        schema: PathBuf,
    },

    /// Validate instances against a schema
    Validate {
        schema: PathBuf,

        /// Instance documents
        #[arg(required = true)]
        instances: Vec<PathBuf>,

        /// Stop after this many errors per instance (0 = unbounded)
        #[arg(long)]
        max_errors: Option<usize>,

        /// Reference depth limit (0 = unbounded)
        #[arg(long)]
        max_depth: Option<usize>,

        /// Reject properties the schema does not name
        #[arg(long)]
        strict: bool,

        /// Print single-line reports
        #[arg(long)]
        compact: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Form { schema } => {
            let schema: SerdeSchema = read_json(&schema)?;
            println!("{}", schema.form());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Verify { schema: path } => {
            let schema: SerdeSchema = read_json(&path)?;
            match schema.verify() {
                Ok(()) => {
                    println!("✅ {} - correct ({} form)", path.display(), schema.form());
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    println!("❌ {} - {}", path.display(), e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Commands::Validate {
            schema,
            instances,
            max_errors,
            max_depth,
            strict,
            compact,
        } => {
            let mut config = JslConfig::load_from(cli.config.as_deref())
                .context("failed to load configuration")?;
            if let Some(n) = max_errors {
                config.validator.max_errors = n;
            }
            if let Some(n) = max_depth {
                config.validator.max_depth = n;
            }
            if strict {
                config.validator.strict_instance_semantics = true;
            }
            if compact {
                config.output.format = OutputFormat::Compact;
            }

            let schema_path = schema;
            let schema = Schema::from_serde(read_json(&schema_path)?)
                .with_context(|| format!("incorrect schema {}", schema_path.display()))?;
            let validator = Validator::with_config(config.validator);

            let mut all_valid = true;
            for path in &instances {
                let instance: Value = read_json(path)?;
                let report = match validator.validate(&schema, &instance) {
                    Ok(mut result) => {
                        if config.output.sort_errors {
                            result.sort();
                        }
                        all_valid &= result.is_valid();
                        json!({
                            "instance": path.display().to_string(),
                            "valid": result.is_valid(),
                            "errors": result.reports(),
                        })
                    }
                    Err(ValidateError::MaxDepthExceeded) => {
                        eprintln!(
                            "❌ {} - maximum depth {} exceeded",
                            path.display(),
                            config.validator.max_depth
                        );
                        return Ok(ExitCode::from(2));
                    }
                };

                let rendered = match config.output.format {
                    OutputFormat::Pretty => serde_json::to_string_pretty(&report)?,
                    OutputFormat::Compact => serde_json::to_string(&report)?,
                };
                println!("{}", rendered);
            }

            Ok(if all_valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
