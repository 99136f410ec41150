//! API module - HTTP handlers and routes.

pub mod handlers;
pub mod routes;

use sqlx::PgPool;
use std::sync::Arc;

use crate::config::Config;
use crate::services::dedup::DuplicateSuppressor;
use crate::services::failure_monitor::FailureMonitor;
use crate::services::locator::Locator;
use crate::services::path_store::PathStore;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub db: PgPool,
    pub locator: Arc<Locator>,
    pub store: Arc<dyn PathStore>,
    pub suppressor: Arc<DuplicateSuppressor>,
    pub monitor: Arc<FailureMonitor>,
}

pub type SharedState = Arc<AppState>;
