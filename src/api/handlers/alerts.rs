//! Failure monitor state for operators.

use axum::{extract::State, Json};

use crate::api::SharedState;
use crate::services::failure_monitor::MonitorSnapshot;

/// Current failure-monitor counters and window.
pub async fn alert_state(State(state): State<SharedState>) -> Json<MonitorSnapshot> {
    Json(state.monitor.snapshot())
}
