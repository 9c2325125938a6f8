//! gcdelta CLI
//!
//! Command-line interface for structural diffs of GenericCode files

use clap::{Parser, Subcommand};
use gcdelta_core::logging_facility::{init, Profile};
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "gcdelta")]
#[command(about = "gcdelta - Structural diff and rebuild history for GenericCode files", long_about = None)]
struct Cli {
    /// Record layout file (TOML); defaults to the GenericCode layout
    #[arg(long, global = true)]
    layout: Option<PathBuf>,

    /// Log output format on stderr
    #[arg(long, global = true, default_value = "pretty", value_parser = ["pretty", "json"])]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Summarize aggregates, dependencies and cycles of one file
    Analyze(commands::analyze::AnalyzeArgs),
    /// Print the from-scratch insertion plan of one file
    Plan(commands::plan::PlanArgs),
    /// Diff two versions of a file
    Diff(commands::diff::DiffArgs),
    /// Write per-step snapshots of a file's history
    History(commands::history::HistoryArgs),
}

fn main() {
    let cli = Cli::parse();
    init(Profile::from_format(&cli.log_format));

    let result = commands::load_layout(cli.layout.as_deref()).and_then(|layout| match cli.command {
        Commands::Analyze(args) => commands::analyze::execute(args, &layout),
        Commands::Plan(args) => commands::plan::execute(args, &layout),
        Commands::Diff(args) => commands::diff::execute(args, &layout),
        Commands::History(args) => commands::history::execute(args, &layout),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
