//! Plan command
//!
//! Usage: gcdelta plan <FILE> [--output <FILE>]

use super::{read_text, write_text, CommandResult};
use clap::Args;
use gcdelta_core::{build_aggregates, plan_build, FileState, RecordLayout};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// GenericCode file to plan
    pub file: PathBuf,

    /// Output file path (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn execute(args: PlanArgs, layout: &RecordLayout) -> CommandResult {
    let text = read_text(&args.file)?;
    let state = FileState::parse(&text, layout)?;
    let index = build_aggregates(&state, layout)?;
    let summary = plan_build(&index, &layout.unclassified_key).summary();

    if let Some(output_path) = args.output {
        write_text(&output_path, &summary)?;
        println!("✓ Plan written to {}", output_path.display());
    } else {
        print!("{}", summary);
    }

    Ok(())
}
