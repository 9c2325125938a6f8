//! Structured logging
//!
//! Engine operations report through three macros that share one field
//! schema (`gcdelta_core_types::schema`):
//!
//! - `log_op_start!(op, fields..)`
//! - `log_op_end!(op, duration_ms = .., fields..)`
//! - `log_op_error!(op, err, duration_ms = .., fields..)`
//!
//! Binaries call [`init`] once; tests call
//! [`init_test_capture`] and assert on the captured events.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
