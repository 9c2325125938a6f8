//! Analyze command
//!
//! Usage: gcdelta analyze <FILE>

use super::{read_text, CommandResult};
use clap::Args;
use gcdelta_core::{build_aggregates, DependencyGraph, FileState, RecordLayout};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// GenericCode file to analyze
    pub file: PathBuf,
}

pub fn execute(args: AnalyzeArgs, layout: &RecordLayout) -> CommandResult {
    let text = read_text(&args.file)?;
    let state = FileState::parse(&text, layout)?;
    let index = build_aggregates(&state, layout)?;
    let graph = DependencyGraph::from_index(&index);
    let cycles = graph.cycles();

    let (attributes, references) = index.iter().fold((0, 0), |(a, r), agg| {
        (a + agg.attributes.len(), r + agg.references.len())
    });

    println!("File: {}", args.file.display());
    println!("Aggregates: {}", index.len());
    println!("Attribute rows: {}", attributes);
    println!("Reference rows: {}", references);
    println!("Unclassified rows: {}", index.unclassified().len());
    println!(
        "Graph: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    println!("Cycle groups: {}", cycles.len());
    for group in &cycles {
        println!("  - {}", group.members.join(" + "));
    }
    println!("Unresolved references: {}", index.unresolved().len());
    for r in index.unresolved() {
        println!("  - {} -> {} (line {})", r.from, r.target, r.line);
    }

    Ok(())
}
