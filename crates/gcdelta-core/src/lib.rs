//! gcdelta core - structural diff and reconstruction for GenericCode files
//!
//! This crate provides:
//! - A lossless block parser (header, record blocks, footer)
//! - Aggregate grouping and a type-class dependency graph with cycle detection
//! - Topological insertion planning for first-appearance builds
//! - A structural differ producing typed, self-contained change ops
//! - A pure applier, replay with round-trip verification, and a history builder
//!
//! ```
//! use gcdelta_core::{diff_verified, RecordLayout};
//!
//! let old = "<gc:CodeList>\n</gc:CodeList>\n";
//! let ops = diff_verified(old, old, &RecordLayout::default()).unwrap();
//! assert!(ops.is_empty());
//! ```

pub use gcdelta_core_types as core_types;

pub mod aggregate;
pub mod apply;
pub mod config;
pub mod diff;
pub mod digest;
pub mod errors;
pub mod graph;
pub mod history;
pub mod logging_facility;
pub mod parser;
pub mod planner;
pub mod record;
pub mod replay;
pub mod serialize;
pub mod state;
pub mod validity;

// Re-export commonly used types
pub use aggregate::{build_aggregates, Aggregate, AggregateIndex, UnresolvedReference};
pub use apply::apply;
pub use config::RecordLayout;
pub use diff::{diff, render_human_summary, ChangeKind, ChangeOp, FieldSpan, TargetOrder};
pub use errors::{DeltaError, ExError, ExErrorKind, Result};
pub use graph::{DependencyGraph, SccGroup};
pub use history::{first_appearance, transition, History, HistoryStep};
pub use planner::{plan_build, plan_insertion_order, BuildPlan, BuildStep};
pub use record::{Record, RecordKind};
pub use replay::{diff_verified, replay, verify_round_trip};
pub use serialize::serialize;
pub use state::{parse, FileState};
pub use validity::{dangling_references, DanglingReference};
