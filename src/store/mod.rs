//! Storage capabilities consumed by the services.
//!
//! Each collaborator is its own trait so services depend only on what they use and tests can
//! plug in [`fake::FakeStore`] instead of SQLite.

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    AssignmentPatch, Component, ListFilter, Member, OutageCall, OutageCallAssignee, Team,
};
use crate::services::pagination::Pagination;

#[async_trait]
pub trait TeamStore: Send + Sync {
    async fn get_team(&self, id: Uuid) -> Result<Option<Team>, AppError>;
    /// Returns the requested page together with the total number of matching rows.
    async fn list_teams(
        &self,
        filter: &ListFilter,
        page: Pagination,
    ) -> Result<(Vec<Team>, i64), AppError>;
    async fn insert_team(&self, team: &Team) -> Result<(), AppError>;
    async fn delete_team(&self, id: Uuid) -> Result<bool, AppError>;
    /// Overwrite the whole metadata document. `None` when the team no longer exists.
    async fn update_team_metadata(
        &self,
        id: Uuid,
        metadata: &Value,
    ) -> Result<Option<Team>, AppError>;
}

#[async_trait]
pub trait MemberStore: Send + Sync {
    async fn get_member(&self, id: Uuid) -> Result<Option<Member>, AppError>;
    async fn list_members(
        &self,
        filter: &ListFilter,
        page: Pagination,
    ) -> Result<(Vec<Member>, i64), AppError>;
    async fn insert_member(&self, member: &Member) -> Result<(), AppError>;
    async fn delete_member(&self, id: Uuid) -> Result<bool, AppError>;
    async fn update_member_metadata(
        &self,
        id: Uuid,
        metadata: &Value,
    ) -> Result<Option<Member>, AppError>;
    async fn update_member_team(
        &self,
        id: Uuid,
        team_id: Uuid,
    ) -> Result<Option<Member>, AppError>;
}

#[async_trait]
pub trait ComponentStore: Send + Sync {
    async fn get_component(&self, id: Uuid) -> Result<Option<Component>, AppError>;
    async fn list_components(
        &self,
        filter: &ListFilter,
        page: Pagination,
    ) -> Result<(Vec<Component>, i64), AppError>;
    async fn insert_component(&self, component: &Component) -> Result<(), AppError>;
}

#[async_trait]
pub trait OutageCallStore: Send + Sync {
    async fn get_outage_call(&self, id: Uuid) -> Result<Option<OutageCall>, AppError>;
    async fn list_outage_calls(
        &self,
        filter: &ListFilter,
        page: Pagination,
    ) -> Result<(Vec<OutageCall>, i64), AppError>;
    async fn insert_outage_call(&self, call: &OutageCall) -> Result<(), AppError>;
}

#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn assignment_exists(
        &self,
        outage_call_id: Uuid,
        member_id: Uuid,
    ) -> Result<bool, AppError>;
    async fn get_assignment(
        &self,
        outage_call_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<OutageCallAssignee>, AppError>;
    /// Must reject a second row for the same pair with
    /// [`AppError::MemberAlreadyAssigned`], whatever the caller checked beforehand.
    async fn insert_assignment(&self, record: &OutageCallAssignee) -> Result<(), AppError>;
    async fn delete_assignment(&self, outage_call_id: Uuid, member_id: Uuid)
        -> Result<bool, AppError>;
    /// Apply `patch` in one write. `None` when no row exists for the pair.
    async fn update_assignment(
        &self,
        outage_call_id: Uuid,
        member_id: Uuid,
        patch: AssignmentPatch,
    ) -> Result<Option<OutageCallAssignee>, AppError>;
    async fn list_by_outage_call(
        &self,
        outage_call_id: Uuid,
    ) -> Result<Vec<OutageCallAssignee>, AppError>;
    async fn list_by_member(&self, member_id: Uuid) -> Result<Vec<OutageCallAssignee>, AppError>;
}

/// Everything the SQLite repository provides.
pub trait PortalStore:
    TeamStore + MemberStore + ComponentStore + OutageCallStore + AssignmentStore
{
}

impl<T> PortalStore for T where
    T: TeamStore + MemberStore + ComponentStore + OutageCallStore + AssignmentStore
{
}
