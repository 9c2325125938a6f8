//! History command
//!
//! Usage: gcdelta history <NEW> [--old <OLD>] --out-dir <DIR>
//!
//! Writes one snapshot per step (`0001.gc`, `0002.gc`, ...) and a
//! `history.json` manifest.

use super::{read_text, write_text, CommandResult};
use clap::Args;
use gcdelta_core::errors::DeltaError;
use gcdelta_core::{first_appearance, transition, RecordLayout};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Version to build up to
    pub new: PathBuf,

    /// Previous version; omit for a first-appearance history
    #[arg(long)]
    pub old: Option<PathBuf>,

    /// Directory receiving the snapshots and manifest
    #[arg(long)]
    pub out_dir: PathBuf,
}

#[derive(Debug, Serialize)]
struct ManifestEntry<'a> {
    sequence: usize,
    description: &'a str,
    file: String,
    digest: &'a str,
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    digest: &'a str,
    steps: Vec<ManifestEntry<'a>>,
}

pub fn execute(args: HistoryArgs, layout: &RecordLayout) -> CommandResult {
    let new_text = read_text(&args.new)?;
    let history = match &args.old {
        Some(old) => transition(&read_text(old)?, &new_text, layout)?,
        None => first_appearance(&new_text, layout)?,
    };

    std::fs::create_dir_all(&args.out_dir).map_err(|e| DeltaError::Io {
        path: args.out_dir.display().to_string(),
        message: e.to_string(),
    })?;

    let mut entries = Vec::with_capacity(history.len());
    for step in &history.steps {
        let file = format!("{:04}.gc", step.sequence);
        write_text(&args.out_dir.join(&file), &step.text)?;
        entries.push(ManifestEntry {
            sequence: step.sequence,
            description: &step.description,
            file,
            digest: &step.digest,
        });
    }

    let manifest = Manifest {
        digest: &history.digest,
        steps: entries,
    };
    write_text(
        &args.out_dir.join("history.json"),
        &serde_json::to_string_pretty(&manifest)?,
    )?;

    println!(
        "✓ Wrote {} steps to {}",
        history.len(),
        args.out_dir.display()
    );
    for step in history.invalid_steps() {
        eprintln!(
            "warning: step {} ({}) leaves {} dangling reference(s)",
            step.sequence,
            step.description,
            step.dangling.len()
        );
    }

    Ok(())
}
