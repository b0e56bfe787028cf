//! AWS-oriented adapters and the handler for the scheduled log-mirror job.
//!
//! This crate owns runtime integration details (the Lambda entry point, the
//! SSM, STS, and S3 adapters, logging, and configuration) and exposes a
//! single runtime module boundary for calendar, contract, key, and retry
//! primitives. See `crates/log_mirror_lambda/README.md` for ownership
//! boundaries.

pub mod adapters;
pub mod backoff;
pub mod config;
pub mod handlers;
pub mod logging;
pub mod runtime;
