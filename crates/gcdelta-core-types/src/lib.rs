//! Core types shared across gcdelta facilities
//!
//! - **Schema constants**: canonical field keys and event names used by the
//!   logging macros and error reporting in `gcdelta-core`

pub mod schema;
