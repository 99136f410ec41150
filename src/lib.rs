//! Artifact Locator - Backend Library
//!
//! Locates and caches the NAS paths of CI build artifacts.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod nas;
pub mod retry;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
