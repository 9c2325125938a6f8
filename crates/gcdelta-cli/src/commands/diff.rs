//! Diff command
//!
//! Usage: gcdelta diff <OLD> <NEW> [--json | --summary]

use super::{read_text, CommandResult};
use clap::Args;
use gcdelta_core::digest::compute_ops_digest;
use gcdelta_core::{diff_verified, render_human_summary, RecordLayout};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Previous version
    pub old: PathBuf,

    /// New version
    pub new: PathBuf,

    /// Print the ops as JSON
    #[arg(long, conflicts_with = "summary")]
    pub json: bool,

    /// Print a Markdown summary with the op-list digest
    #[arg(long)]
    pub summary: bool,
}

pub fn execute(args: DiffArgs, layout: &RecordLayout) -> CommandResult {
    let old_text = read_text(&args.old)?;
    let new_text = read_text(&args.new)?;
    let ops = diff_verified(&old_text, &new_text, layout)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&ops)?);
    } else if args.summary {
        print!("{}", render_human_summary(&ops));
        println!("\nDigest: `{}`", compute_ops_digest(&ops)?);
    } else if ops.is_empty() {
        println!("No changes");
    } else {
        for op in &ops {
            println!("{}", op.description());
        }
    }

    Ok(())
}
