//! Canonical schema constants for structured logging and events
//!
//! These constants keep field keys consistent across every instrumented
//! engine operation.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Record identifiers
pub const FIELD_AGGREGATE_KEY: &str = "aggregate_key";
pub const FIELD_LINE: &str = "line";
pub const FIELD_STEP: &str = "step";

// Collection sizes
pub const FIELD_RECORD_COUNT: &str = "record_count";
pub const FIELD_AGGREGATE_COUNT: &str = "aggregate_count";
pub const FIELD_GROUP_COUNT: &str = "group_count";
pub const FIELD_OP_COUNT: &str = "op_count";
pub const FIELD_STEP_COUNT: &str = "step_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
