//! # tally-quote
//!
//! Prices an invoice described in a JSON file and prints the finalized
//! figures as JSON.
//!
//! ## Usage
//! ```bash
//! # Price a document with the default engine.toml
//! cargo run -p tally-editor --bin tally-quote -- invoice.json
//!
//! # Explicit config and a product list for productId lines
//! cargo run -p tally-editor --bin tally-quote -- invoice.json \
//!     --config ./engine.toml --catalog ./products.json
//!
//! # More logging (written to stderr)
//! RUST_LOG=tally_editor=trace cargo run -p tally-editor --bin tally-quote -- invoice.json
//! ```

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use tally_editor::quote::{build_quote, load_catalog, load_request};
use tally_editor::{EditorError, EngineConfig, ProductCatalog};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally_editor=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_help() {
    println!("Tally invoice quote");
    println!();
    println!("Usage: tally-quote <DOCUMENT> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>    Engine config file (default: platform config dir)");
    println!("  -p, --catalog <PATH>   Product list (JSON array) for productId lines");
    println!("  -h, --help             Show this help message");
}

struct Args {
    document: PathBuf,
    config: Option<PathBuf>,
    catalog: Option<PathBuf>,
}

/// Returns `None` when help was requested.
fn parse_args() -> Result<Option<Args>, String> {
    let args: Vec<String> = env::args().collect();

    let mut document = None;
    let mut config = None;
    let mut catalog = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                let value = args.get(i + 1).ok_or("--config needs a path")?;
                config = Some(PathBuf::from(value));
                i += 1;
            }
            "--catalog" | "-p" => {
                let value = args.get(i + 1).ok_or("--catalog needs a path")?;
                catalog = Some(PathBuf::from(value));
                i += 1;
            }
            "--help" | "-h" => return Ok(None),
            other if other.starts_with('-') => return Err(format!("Unknown option: {}", other)),
            other => document = Some(PathBuf::from(other)),
        }
        i += 1;
    }

    let document = document.ok_or("Missing document path")?;
    Ok(Some(Args {
        document,
        config,
        catalog,
    }))
}

fn run(args: Args) -> Result<(), EditorError> {
    let config = EngineConfig::load(args.config)?;
    let rates = config.rate_table()?;

    let catalog = args.catalog.as_deref().map(load_catalog).transpose()?;
    let request = load_request(&args.document)?;
    info!(
        document = %args.document.display(),
        lines = request.lines.len(),
        "Pricing document"
    );

    let snapshot = build_quote(
        &request,
        config.edit_context(),
        config.currency.default,
        &rates,
        catalog.as_ref().map(|c| c as &dyn ProductCatalog),
    )?;

    let json = serde_json::to_string_pretty(&snapshot)
        .map_err(|e| EditorError::DocumentLoadFailed(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();

    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{}", message);
            print_help();
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(code = ?e.code(), "{}", e);
            match serde_json::to_string(&e.to_body()) {
                Ok(body) => eprintln!("{}", body),
                Err(_) => eprintln!("{}", e),
            }
            ExitCode::FAILURE
        }
    }
}
