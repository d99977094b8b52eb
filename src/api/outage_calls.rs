//! Outage call API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use super::{created, pagination, success, ApiResult};
use crate::models::{CreateOutageCallRequest, ListQuery, OutageCall, Page};
use crate::AppState;

/// GET /api/outage-calls - List outage calls, newest first.
pub async fn list_outage_calls(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<OutageCall>> {
    success(
        state
            .directory
            .list_outage_calls(&query.filter(), pagination(&query))
            .await?,
    )
}

/// GET /api/outage-calls/{id} - Get a single outage call.
pub async fn get_outage_call(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<OutageCall> {
    success(state.directory.get_outage_call(id).await?)
}

/// POST /api/outage-calls - Open an outage call.
pub async fn create_outage_call(
    State(state): State<AppState>,
    Json(request): Json<CreateOutageCallRequest>,
) -> ApiResult<OutageCall> {
    created(state.directory.create_outage_call(request).await?)
}
