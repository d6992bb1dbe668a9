//! design-lit CLI: classify new papers and regenerate the living overview.
//!
//! Usage:
//!   design-lit run    [--config path] [-v|-q]
//!   design-lit render [--config path]
//!   design-lit stats  [--config path]

use clap::{Parser, Subcommand};
use design_lit::{
    group_by_phase, Config, DocumentOutcome, IngestionCoordinator, JsonlStore, OpenAiClient,
    RecordStore, RunReport,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "design-lit",
    version,
    about = "Classify new AI & design papers and regenerate the living overview"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Log warnings and errors only
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, classify and merge new papers, then regenerate the documents
    Run,
    /// Regenerate the documents from the current store only
    Render,
    /// Show record, enrichment status and per-phase counts
    Stats,
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<Config, String> {
    let config = Config::discover(path.as_deref()).map_err(|e| e.to_string())?;
    Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
}

fn build_coordinator(config: &Config) -> Result<IngestionCoordinator, String> {
    let client = OpenAiClient::new(&config.llm).map_err(|e| format!("Failed to create model client: {}", e))?;
    Ok(IngestionCoordinator::from_config(config, Arc::new(client)))
}

fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Runtime::new().map_err(|e| format!("failed to create tokio runtime: {}", e))
}

fn print_documents(report: &RunReport) {
    for doc in &report.documents {
        match &doc.outcome {
            DocumentOutcome::Written => println!("Wrote {}", doc.path.display()),
            DocumentOutcome::Kept { reason } => {
                println!("Kept previous {} ({})", doc.path.display(), reason)
            }
        }
    }
}

fn cmd_run(config: &Config) -> i32 {
    let coordinator = match build_coordinator(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let rt = match runtime() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    match rt.block_on(coordinator.run()) {
        Ok(report) => {
            println!(
                "Fetched {}, new {}, deferred {}: {} enriched, {} fallback, {} skipped",
                report.fetched,
                report.records.len(),
                report.deferred,
                report.enriched(),
                report.fallback(),
                report.skipped()
            );
            match report.stored_total {
                Some(total) => println!("Store now holds {} records", total),
                None => println!("No new records; store unchanged"),
            }
            print_documents(&report);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_render(config: &Config) -> i32 {
    let coordinator = match build_coordinator(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let rt = match runtime() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    match rt.block_on(coordinator.regenerate()) {
        Ok(documents) => {
            let report = RunReport {
                documents,
                ..RunReport::default()
            };
            print_documents(&report);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_stats(config: &Config) -> i32 {
    let store = JsonlStore::new(config.store_path.clone());
    let records = store.load();
    if records.is_empty() {
        println!("No records in {}", store.path().display());
        return 0;
    }

    let enriched: Vec<_> = records.iter().filter_map(|r| r.enrichment.as_ref()).collect();
    let fallback = enriched.iter().filter(|e| e.is_fallback()).count();

    println!("Records:      {}", records.len());
    println!("  classified: {}", enriched.len() - fallback);
    println!("  fallback:   {}", fallback);
    println!("  unenriched: {}", records.len() - enriched.len());
    println!();
    println!("{:<24}  {:>7}", "PHASE", "PAPERS");
    println!("{}", "-".repeat(33));
    for (phase, count) in group_by_phase(&records).counts() {
        println!("{:<24}  {:>7}", phase.label(), count);
    }
    0
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = match load_config(cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Run => cmd_run(&config),
        Commands::Render => cmd_render(&config),
        Commands::Stats => cmd_stats(&config),
    };
    std::process::exit(code);
}
