//! Runtime-facing boundary over the deterministic core crate.

pub use log_mirror_core::{calendar, contract, keys, retry};
