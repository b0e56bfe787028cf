//! Shared log-mirror domain primitives.
//!
//! This crate owns deterministic scheduling behavior and the mirror job's
//! contracts. It intentionally excludes AWS SDK and Lambda runtime concerns.
//! See `crates/log_mirror_core/README.md` for ownership boundaries.

pub mod calendar;
pub mod contract;
pub mod keys;
pub mod retry;
