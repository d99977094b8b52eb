//! Team API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use super::{created, pagination, success, ApiResult};
use crate::models::{CreateTeamRequest, ListQuery, Page, TeamSummary, TeamView};
use crate::AppState;

/// GET /api/teams - List teams.
pub async fn list_teams(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<TeamSummary>> {
    let page = state
        .directory
        .list_teams(&query.filter(), pagination(&query))
        .await?;
    success(page.map(|t| state.projector.team_summary(t)))
}

/// GET /api/teams/{id} - Get a single team.
pub async fn get_team(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<TeamView> {
    let team = state.directory.get_team(id).await?;
    success(state.projector.team_view(team))
}

/// POST /api/teams - Create a new team.
pub async fn create_team(
    State(state): State<AppState>,
    Json(request): Json<CreateTeamRequest>,
) -> ApiResult<TeamView> {
    let team = state.directory.create_team(request).await?;
    created(state.projector.team_view(team))
}

/// DELETE /api/teams/{id} - Delete a team.
pub async fn delete_team(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.directory.delete_team(id).await?;
    success(())
}

/// PATCH /api/teams/{id}/metadata - Shallow-merge keys into the team's metadata.
pub async fn merge_team_metadata(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<Value>,
) -> ApiResult<TeamView> {
    let team = state.metadata.merge_team_metadata(id, &patch).await?;
    success(state.projector.team_view(team))
}
