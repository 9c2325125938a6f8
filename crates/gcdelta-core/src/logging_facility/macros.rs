//! Operation boundary macros
//!
//! Every instrumented engine operation (parse, aggregation, planning, diff,
//! replay, history) emits a `start` event and exactly one of `end` or
//! `end_error`, all tagged with `component` and `op`.

/// Shared event body; not part of the public surface.
#[doc(hidden)]
#[macro_export]
macro_rules! __gcdelta_op_event {
    ($level:ident, $op:expr, $event:ident $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::$event
            $(, $($field)*)?
        )
    };
}

/// Log the start of an operation
///
/// ```
/// # use gcdelta_core::log_op_start;
/// log_op_start!("parse");
/// log_op_start!("diff", aggregate_count = 12);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__gcdelta_op_event!(info, $op, EVENT_START $(, $($field)*)?)
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use gcdelta_core::log_op_end;
/// log_op_end!("replay", duration_ms = 3, op_count = 2);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__gcdelta_op_event!(
            info, $op, EVENT_END, duration_ms = $duration $(, $($field)*)?
        )
    };
}

/// Log a failed operation with the error's kind and stable code
///
/// Accepts anything convertible into [`ExError`](crate::errors::ExError).
///
/// ```
/// # use gcdelta_core::{log_op_error, errors::DeltaError};
/// let err = DeltaError::MissingTypeClassKey { line: 7 };
/// log_op_error!("parse", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__gcdelta_op_event!(
            error,
            $op,
            EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code()
            $(, $($field)*)?
        )
    }};
}
