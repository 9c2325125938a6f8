//! Structural differ.
//!
//! Compares two parsed file states and produces the ordered change
//! operations that rebuild the new state from the old one.
//!
//! ## Entry point
//!
//! ```ignore
//! use gcdelta_core::diff::engine::diff;
//!
//! let ops = diff(&old, &new, &layout)?;
//! let summary = gcdelta_core::diff::human_summary::render_human_summary(&ops);
//! ```
//!
//! ## Guarantees
//!
//! - **Exact replay**: applying the ops to the old state in order yields a
//!   state that serializes to exactly the new text.
//! - **Determinism**: identical inputs produce identical op lists,
//!   descriptions included.
//! - **No-op**: a state diffed against itself yields no ops.
//! - **Schema first**: fields removed from the column set are stripped from
//!   old aggregates before content is compared, so a dropped column alone
//!   never produces `Modify` ops.

pub mod engine;
pub mod human_summary;
pub mod model;
pub mod schema;

pub use engine::diff;
pub use human_summary::render_human_summary;
pub use model::{ChangeKind, ChangeOp, FieldSpan, TargetOrder};
