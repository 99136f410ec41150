//! Core services.

pub mod build_clock;
pub mod candidates;
pub mod dedup;
pub mod failure_monitor;
pub mod locator;
pub mod path_store;
pub mod scheduler;
pub mod verifier;
