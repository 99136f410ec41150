//! Synchronous artifact path resolution.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::api::SharedState;
use crate::error::Result;
use crate::models::ArtifactPathRecord;

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub project: String,
    pub version: String,
    pub build: i32,
}

/// Resolve the NAS path for a build, running discovery on cache miss.
pub async fn resolve(
    State(state): State<SharedState>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<ArtifactPathRecord>> {
    let record = state
        .locator
        .resolve(&query.project, &query.version, query.build)
        .await?;
    Ok(Json(record))
}
