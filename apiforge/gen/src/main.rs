//! apiforge code generator
//!
//! Generates DTOs, an axum server and a client SDK from a normalized API
//! model stored as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use apiforge_define::{ApiModel, BuildConfig};
use apiforge_gen::errors::GeneratorError;
use apiforge_gen::output::{DirectoryEmitter, DryRunEmitter, Emitter, generate};
use clap::Parser;
use colored::Colorize;
use tracing::{debug, info};
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// apiforge generator - turns an API model into server, client and DTO code
#[derive(Parser, Debug)]
#[command(name = "apiforge-gen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Normalized API model (JSON)
    #[arg(short, long, value_name = "FILE")]
    model: PathBuf,

    /// Build configuration (TOML); defaults apply when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output directory for generated code
    #[arg(short, long, default_value = "src/generated")]
    output: PathBuf,

    /// Print generated code without writing files
    #[arg(long)]
    dry_run: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output logs as JSON
    #[arg(long)]
    json: bool,
}

/// Initialize tracing subscriber based on verbosity and output format
fn init_tracing(verbose: u8, json: bool) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,apiforge_gen=info".to_string(),
            2 => "info,apiforge_gen=debug".to_string(),
            _ => "debug,apiforge_gen=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_file(verbose >= 3)
                    .with_line_number(verbose >= 3)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    }
}

fn load_model(path: &Path) -> Result<ApiModel, GeneratorError> {
    let source = fs::read_to_string(path).map_err(|e| GeneratorError::ModelError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&source).map_err(|e| GeneratorError::ModelError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn load_config(path: Option<&Path>) -> Result<BuildConfig, GeneratorError> {
    match path {
        Some(path) => Ok(BuildConfig::load(path)?),
        None => Ok(BuildConfig::default()),
    }
}

fn main() -> Result<(), GeneratorError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json);

    let model = load_model(&cli.model)?;
    let config = load_config(cli.config.as_deref())?;
    info!(
        title = %model.info.title,
        definitions = model.definitions.len(),
        operations = model.operations().count(),
        "loaded model"
    );
    for op in model.operations() {
        debug!(operation = %op.key(), "operation");
    }

    let mut directory;
    let mut dry_run = DryRunEmitter;
    let emitter: &mut dyn Emitter = if cli.dry_run {
        &mut dry_run
    } else {
        directory = DirectoryEmitter::new(&cli.output);
        &mut directory
    };

    match generate(&model, &config, emitter) {
        Ok(files) => {
            if !cli.dry_run {
                for file in &files {
                    eprintln!("{} {}", "wrote".green().bold(), cli.output.join(file).display());
                }
            }
            Ok(())
        }
        Err(GeneratorError::ArtifactsFailed { failures }) => {
            for (name, err) in &failures {
                eprintln!("{} {}: {}", "failed".red().bold(), name, err);
            }
            Err(GeneratorError::ArtifactsFailed { failures })
        }
        Err(err) => Err(err),
    }
}
