//! Foundational low-level utilities shared across AMC console crates.
//!
//! Provides time helpers used by store deserialization, window math, and
//! status reporting.

pub mod time_utils;

pub use time_utils::{current_unix_timestamp_ms, parse_timestamp_lenient};
