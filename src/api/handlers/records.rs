//! Cached path record listing.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::api::SharedState;
use crate::error::Result;
use crate::models::ArtifactPathRecord;

const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

/// Most recently verified path records.
pub async fn list_recent(
    State(state): State<SharedState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<ArtifactPathRecord>>> {
    let limit = query.limit.unwrap_or(50).clamp(1, MAX_LIMIT);
    let records = state.store.list_recent(limit).await?;
    Ok(Json(records))
}
