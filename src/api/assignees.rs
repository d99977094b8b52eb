//! Outage call assignee API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{created, success, ApiResult};
use crate::models::{
    AssignMemberRequest, AssignmentPatch, AssignmentStats, BulkAssignRequest, BulkReport,
    BulkUnassignRequest, OutageCallAssignee,
};
use crate::services::AssignmentSpec;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AssigneeQuery {
    #[serde(default)]
    pub role: Option<String>,
}

/// GET /api/outage-calls/{id}/assignees - List assignees, optionally for one role.
pub async fn list_assignees(
    State(state): State<AppState>,
    Path(outage_call_id): Path<Uuid>,
    Query(query): Query<AssigneeQuery>,
) -> ApiResult<Vec<OutageCallAssignee>> {
    let rows = match query.role.as_deref() {
        Some(role) => {
            let role = state.validator.role(role)?;
            state.assignments.list_by_role(outage_call_id, role).await?
        }
        None => state.assignments.list_by_outage_call(outage_call_id).await?,
    };
    success(rows)
}

/// POST /api/outage-calls/{id}/assignees - Assign one member.
pub async fn create_assignee(
    State(state): State<AppState>,
    Path(outage_call_id): Path<Uuid>,
    Json(request): Json<AssignMemberRequest>,
) -> ApiResult<OutageCallAssignee> {
    let assignment = state
        .assignments
        .create(
            outage_call_id,
            request.member_id,
            request.role,
            request.assigned_at,
            request.is_active,
        )
        .await?;
    created(assignment)
}

/// POST /api/outage-calls/{id}/assignees/bulk - Assign several members, reporting each entry.
pub async fn bulk_assign(
    State(state): State<AppState>,
    Path(outage_call_id): Path<Uuid>,
    Json(request): Json<BulkAssignRequest>,
) -> ApiResult<BulkReport> {
    let specs = request
        .members
        .into_iter()
        .map(|m| AssignmentSpec {
            member_id: m.member_id,
            role: m.role,
            assigned_at: m.assigned_at,
            is_active: m.is_active,
        })
        .collect();

    let outcome = state.assignments.bulk_assign(outage_call_id, specs).await?;
    success(outcome.into_report())
}

/// POST /api/outage-calls/{id}/assignees/bulk-unassign - Remove several members.
pub async fn bulk_unassign(
    State(state): State<AppState>,
    Path(outage_call_id): Path<Uuid>,
    Json(request): Json<BulkUnassignRequest>,
) -> ApiResult<BulkReport> {
    let outcome = state
        .assignments
        .bulk_unassign(outage_call_id, request.member_ids)
        .await?;
    success(outcome.into_report())
}

/// GET /api/outage-calls/{id}/assignees/stats - Total and per-role counts.
pub async fn assignee_stats(
    State(state): State<AppState>,
    Path(outage_call_id): Path<Uuid>,
) -> ApiResult<AssignmentStats> {
    success(state.assignments.stats(outage_call_id).await?)
}

/// GET /api/outage-calls/{id}/assignees/{member_id} - Get one assignment.
pub async fn get_assignee(
    State(state): State<AppState>,
    Path((outage_call_id, member_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<OutageCallAssignee> {
    success(state.assignments.get(outage_call_id, member_id).await?)
}

/// PATCH /api/outage-calls/{id}/assignees/{member_id} - Change role and/or active flag.
pub async fn update_assignee(
    State(state): State<AppState>,
    Path((outage_call_id, member_id)): Path<(Uuid, Uuid)>,
    Json(patch): Json<AssignmentPatch>,
) -> ApiResult<OutageCallAssignee> {
    success(
        state
            .assignments
            .update(outage_call_id, member_id, patch)
            .await?,
    )
}

/// DELETE /api/outage-calls/{id}/assignees/{member_id} - Unassign a member.
pub async fn delete_assignee(
    State(state): State<AppState>,
    Path((outage_call_id, member_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<()> {
    state
        .assignments
        .unassign(outage_call_id, member_id)
        .await?;
    success(())
}
