//! Member API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{created, pagination, success, ApiResult};
use crate::models::{
    AssignTeamRequest, CreateMemberRequest, ListQuery, MemberView, MemberWorkload,
    OutageCallAssignee, Page,
};
use crate::AppState;

/// GET /api/members - List members, optionally filtered by team.
pub async fn list_members(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<MemberView>> {
    let page = state
        .directory
        .list_members(&query.filter(), pagination(&query))
        .await?;
    success(page.map(|m| state.projector.member_view(m)))
}

/// GET /api/members/{id} - Get a single member.
pub async fn get_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<MemberView> {
    let member = state.directory.get_member(id).await?;
    success(state.projector.member_view(member))
}

/// POST /api/members - Create a new member.
pub async fn create_member(
    State(state): State<AppState>,
    Json(request): Json<CreateMemberRequest>,
) -> ApiResult<MemberView> {
    let member = state.directory.create_member(request).await?;
    created(state.projector.member_view(member))
}

/// DELETE /api/members/{id} - Delete a member and all of their assignments.
pub async fn delete_member(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.directory.delete_member(id).await?;
    success(())
}

/// PATCH /api/members/{id}/metadata - Shallow-merge keys into the member's metadata.
pub async fn merge_member_metadata(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<Value>,
) -> ApiResult<MemberView> {
    let member = state.metadata.merge_member_metadata(id, &patch).await?;
    success(state.projector.member_view(member))
}

/// PUT /api/members/{id}/team - Move a member into a team.
pub async fn assign_member_team(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignTeamRequest>,
) -> ApiResult<MemberView> {
    let member = state
        .directory
        .assign_member_team(id, request.team_id)
        .await?;
    success(state.projector.member_view(member))
}

#[derive(Debug, Default, Deserialize)]
pub struct MemberAssignmentsQuery {
    #[serde(default)]
    pub active: Option<bool>,
}

/// GET /api/members/{id}/assignments - Outage calls a member is assigned to.
pub async fn list_member_assignments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<MemberAssignmentsQuery>,
) -> ApiResult<Vec<OutageCallAssignee>> {
    let rows = if query.active.unwrap_or(false) {
        state.assignments.list_active_by_member(id).await?
    } else {
        state.assignments.list_by_member(id).await?
    };
    success(rows)
}

/// GET /api/members/{id}/workload - Count of active assignments.
pub async fn get_member_workload(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<MemberWorkload> {
    success(state.assignments.member_workload(id).await?)
}
