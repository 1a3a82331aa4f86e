//! rifgen CLI - record type generation from tabular layouts
//!
//! Reads a `layouts.yaml` project file and generates the configured record
//! types, or inspects a single layout section.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;

use rifgen::codegen::{generate_from_config, resolve, validate_config, BatchReport};
use rifgen::logging::{init_logging, LogFormat};
use rifgen::{LayoutParser, LayoutSource, Workbook};

#[derive(Parser)]
#[command(name = "rifgen")]
#[command(version, about = "Generate record types from tabular column layouts", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format: pretty, compact or json
    #[arg(long, default_value = "pretty", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate record types for every configured layout
    Generate {
        /// Path to the project configuration
        #[arg(short, long, default_value = "layouts.yaml")]
        config: PathBuf,

        /// Override the configured output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse and check every configured layout without writing files
    Validate {
        /// Path to the project configuration
        #[arg(short, long, default_value = "layouts.yaml")]
        config: PathBuf,
    },

    /// Print one parsed layout section with its resolved types
    Inspect {
        /// Workbook, CSV file or directory of CSV files
        #[arg(short, long)]
        resource: PathBuf,

        /// Section (worksheet or CSV file stem) to parse; lists the
        /// sections when omitted
        #[arg(short, long)]
        section: Option<String>,

        #[arg(short, long, value_enum, default_value_t = InspectFormat::Text)]
        format: InspectFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InspectFormat {
    Text,
    Json,
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // A subscriber may already be installed when embedded; keep going.
    let _ = init_logging(cli.verbose, cli.log_format);

    let result = match cli.command {
        Commands::Generate { config, output } => generate(config, output),
        Commands::Validate { config } => validate(config),
        Commands::Inspect {
            resource,
            section,
            format,
        } => inspect(resource, section, format),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    }
}

fn summarize(report: &BatchReport) -> bool {
    for diagnostic in report.diagnostics.errors() {
        eprintln!("{}", diagnostic);
    }
    println!(
        "{} generated, {} failed",
        report.generated.len(),
        report.failed.len()
    );
    report.is_ok()
}

fn generate(config: PathBuf, output: Option<PathBuf>) -> Result<bool, String> {
    let report = generate_from_config(&config, output.as_deref()).map_err(|e| e.to_string())?;
    for name in &report.outputs {
        println!("  wrote {}", name);
    }
    Ok(summarize(&report))
}

fn validate(config: PathBuf) -> Result<bool, String> {
    let report = validate_config(&config).map_err(|e| e.to_string())?;
    Ok(summarize(&report))
}

fn inspect(resource: PathBuf, section: Option<String>, format: InspectFormat) -> Result<bool, String> {
    let workbook = Workbook::open(&resource).map_err(|e| e.to_string())?;
    let Some(section) = section else {
        for name in workbook.section_names() {
            println!("{}", name);
        }
        return Ok(true);
    };
    let schema = LayoutParser::new()
        .parse(&workbook, &section)
        .map_err(|e| e.to_string())?;

    let mut all_resolved = true;
    match format {
        InspectFormat::Json => {
            let columns: Vec<serde_json::Value> = schema
                .columns()
                .map(|column| match resolve(column) {
                    Ok(resolved) => serde_json::json!({ "column": column, "resolved": resolved }),
                    Err(e) => {
                        all_resolved = false;
                        serde_json::json!({ "column": column, "error": e.to_string() })
                    }
                })
                .collect();
            let document = serde_json::json!({ "section": schema.section(), "columns": columns });
            let text = serde_json::to_string_pretty(&document).map_err(|e| e.to_string())?;
            println!("{}", text);
        }
        InspectFormat::Text => {
            println!("{} ({} columns)", schema.section(), schema.len());
            for (index, column) in schema.columns().enumerate() {
                let resolved = match resolve(column) {
                    Ok(resolved) => resolved.accessor().to_string(),
                    Err(e) => {
                        all_resolved = false;
                        format!("error: {}", e)
                    }
                };
                println!(
                    "  {:>3}  {:<24} {:<24} {}",
                    index,
                    column.name,
                    column.resolved_field_name(),
                    resolved
                );
            }
        }
    }
    Ok(all_resolved)
}
