mod config;
mod logging;
mod output;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use config::{Settings, SourceKind};
use inventory_core::{Asset, Inventory, InventoryReport};
use output::OutputFormat;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "inventory", version, about = "Unified host inventory across NetBox, Qualys and CrowdStrike")]
struct Cli {
    /// Optional config file (YAML). If omitted, loads ./inventory.yaml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct CollectArgs {
    /// Only query these sources (repeatable). Default: every enabled source.
    #[arg(long = "source", value_enum)]
    sources: Vec<SourceKind>,
    /// Output format: text, json, or jsonl
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Output file (overwrites). Stdout if omitted.
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
    /// Write CSV instead of --format
    #[arg(long, default_value_t = false)]
    csv: bool,
    /// Query sources one after another instead of all at once
    #[arg(long, default_value_t = false)]
    sequential: bool,
    /// Exit with an error, and print nothing, if any source fails
    #[arg(long, default_value_t = false)]
    fail_fast: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print version information
    Version,
    /// List enabled sources and their endpoints
    Sources,
    /// Fetch raw records and show the first one with its field names. Default: every enabled source.
    Preview {
        #[arg(value_enum)]
        source: Option<SourceKind>,
    },
    /// Fetch and normalize assets from every source
    Collect {
        #[command(flatten)]
        opts: CollectArgs,
    },
    /// Case-insensitive search across all normalized assets
    Search {
        query: String,
        #[command(flatten)]
        opts: CollectArgs,
    },
    /// Per-source status: asset counts, failures and timings
    Report {
        /// Only query these sources (repeatable)
        #[arg(long = "source", value_enum)]
        sources: Vec<SourceKind>,
        /// Output format: text, json, or jsonl
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Query sources one after another instead of all at once
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    run(cli)
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let loaded_cfg = config::load_config(path)?;
    Settings::resolve(loaded_cfg, |k| std::env::var(k).ok())
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Version => {
            println!("inventory {} (core {})", env!("CARGO_PKG_VERSION"), inventory_core::version());
        }
        Commands::Sources => {
            let settings = load_settings(config_path)?;
            for s in &settings.sources {
                println!("{:<12} {}", s.kind.name(), s.url);
            }
        }
        Commands::Preview { source } => {
            let settings = load_settings(config_path)?;
            let endpoints = match source {
                Some(kind) => vec![settings.endpoint(kind)?],
                None => settings.select(&[]),
            };
            let transport = settings.http_transport()?;
            let rt = tokio::runtime::Runtime::new()?;
            let stdout = std::io::stdout();
            let mut w = stdout.lock();
            for (i, endpoint) in endpoints.into_iter().enumerate() {
                let adapter = endpoint.kind.build(&endpoint.url, transport.clone());
                let records = rt.block_on(adapter.fetch_raw())?;
                if i > 0 {
                    writeln!(w)?;
                }
                output::write_preview(&mut w, adapter.name(), &records)?;
            }
        }
        Commands::Collect { opts } => {
            let settings = load_settings(config_path)?;
            let report = run_collect(&settings, &opts)?;
            let assets: Vec<&Asset> = report.assets().iter().collect();
            emit_assets(&assets, &opts)?;
        }
        Commands::Search { query, opts } => {
            let settings = load_settings(config_path)?;
            let report = run_collect(&settings, &opts)?;
            let hits = report.search(&query);
            tracing::info!(query = %query, hits = hits.len(), "search finished");
            emit_assets(&hits, &opts)?;
        }
        Commands::Report { sources, format, sequential } => {
            let settings = load_settings(config_path)?;
            let inv = settings.build_inventory(&sources, settings.http_transport()?)?;
            let report = collect(&inv, sequential)?;
            let stdout = std::io::stdout();
            let mut w = stdout.lock();
            output::write_report(&mut w, &report, format)?;
        }
    }
    Ok(())
}

fn collect(inv: &Inventory, sequential: bool) -> Result<InventoryReport> {
    let rt = tokio::runtime::Runtime::new()?;
    let report = if sequential {
        rt.block_on(inv.collect())
    } else {
        rt.block_on(inv.collect_concurrent())
    };
    Ok(report)
}

fn run_collect(settings: &Settings, opts: &CollectArgs) -> Result<InventoryReport> {
    let inv = settings.build_inventory(&opts.sources, settings.http_transport()?)?;
    let report = collect(&inv, opts.sequential)?;
    for f in report.failures() {
        eprintln!("{}", f.describe());
    }
    if opts.fail_fast && !report.is_complete() {
        let failed = report.failures().count();
        return Err(anyhow!("{} of {} sources failed", failed, report.sources().len()));
    }
    Ok(report)
}

fn emit_assets(assets: &[&Asset], opts: &CollectArgs) -> Result<()> {
    let mut w: Box<dyn Write> = match &opts.out {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };
    if opts.csv {
        output::write_assets_csv(&mut w, assets)?;
    } else {
        output::write_assets(&mut w, assets, opts.format)?;
    }
    w.flush()?;
    if let Some(path) = &opts.out {
        eprintln!("wrote {} assets to {}", assets.len(), path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broken_config() -> PathBuf {
        let path = std::env::temp_dir().join(format!("inventory-broken-{}.yaml", std::process::id()));
        std::fs::write(&path, "timeout: [not, valid\n").unwrap();
        path
    }

    #[test]
    fn version_ignores_broken_config() {
        let path = broken_config();
        let cli = Cli::try_parse_from(["inventory", "--config", path.to_str().unwrap(), "version"]).unwrap();
        assert!(run(cli).is_ok());
        let cli = Cli::try_parse_from(["inventory", "--config", path.to_str().unwrap(), "sources"]).unwrap();
        assert!(run(cli).is_err());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn preview_source_is_optional() {
        let cli = Cli::try_parse_from(["inventory", "preview"]).unwrap();
        assert!(matches!(cli.command, Commands::Preview { source: None }));
        let cli = Cli::try_parse_from(["inventory", "preview", "qualys"]).unwrap();
        assert!(matches!(cli.command, Commands::Preview { source: Some(SourceKind::Qualys) }));
    }
}
