//! In-memory store used by service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{AssignmentStore, ComponentStore, MemberStore, OutageCallStore, TeamStore};
use crate::errors::AppError;
use crate::models::{
    AssignmentPatch, Component, ListFilter, Member, OutageCall, OutageCallAssignee, Team,
};
use crate::services::pagination::Pagination;

#[derive(Default)]
pub struct FakeStore {
    pub teams: Mutex<HashMap<Uuid, Team>>,
    pub members: Mutex<HashMap<Uuid, Member>>,
    pub components: Mutex<HashMap<Uuid, Component>>,
    pub outage_calls: Mutex<HashMap<Uuid, OutageCall>>,
    /// Insertion order is kept so list results are deterministic.
    pub assignments: Mutex<Vec<OutageCallAssignee>>,
    /// Makes `assignment_exists` answer `false`, as a stale read under a concurrent writer would.
    pub stale_exists: AtomicBool,
    pub fail_assignment_writes: AtomicBool,
    pub fail_metadata_writes: AtomicBool,
}

fn page_of<T: Clone>(mut rows: Vec<T>, page: Pagination) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    let start = (page.offset.max(0) as usize).min(rows.len());
    let items = rows
        .drain(start..)
        .take(page.page_size as usize)
        .collect();
    (items, total)
}

fn name_matches(name: &str, filter: &ListFilter) -> bool {
    filter
        .name_contains
        .as_ref()
        .map_or(true, |q| name.to_lowercase().contains(&q.to_lowercase()))
}

fn store_failure() -> AppError {
    AppError::Store("injected failure".to_string())
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_team(&self, name: &str, metadata: Option<Value>) -> Team {
        let now = Utc::now();
        let team = Team {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            metadata,
            created_at: now,
            updated_at: now,
        };
        self.teams.lock().await.insert(team.id, team.clone());
        team
    }

    pub async fn add_member(&self, name: &str, metadata: Option<Value>) -> Member {
        let now = Utc::now();
        let member = Member {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: None,
            team_id: None,
            metadata,
            created_at: now,
            updated_at: now,
        };
        self.members.lock().await.insert(member.id, member.clone());
        member
    }

    pub async fn add_outage_call(&self, title: &str) -> OutageCall {
        let now = Utc::now();
        let call = OutageCall {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            team_id: None,
            created_at: now,
            updated_at: now,
        };
        self.outage_calls.lock().await.insert(call.id, call.clone());
        call
    }
}

#[async_trait]
impl TeamStore for FakeStore {
    async fn get_team(&self, id: Uuid) -> Result<Option<Team>, AppError> {
        Ok(self.teams.lock().await.get(&id).cloned())
    }

    async fn list_teams(
        &self,
        filter: &ListFilter,
        page: Pagination,
    ) -> Result<(Vec<Team>, i64), AppError> {
        let mut rows: Vec<Team> = self
            .teams
            .lock()
            .await
            .values()
            .filter(|t| name_matches(&t.name, filter))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(page_of(rows, page))
    }

    async fn insert_team(&self, team: &Team) -> Result<(), AppError> {
        self.teams.lock().await.insert(team.id, team.clone());
        Ok(())
    }

    async fn delete_team(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.teams.lock().await.remove(&id).is_some())
    }

    async fn update_team_metadata(
        &self,
        id: Uuid,
        metadata: &Value,
    ) -> Result<Option<Team>, AppError> {
        if self.fail_metadata_writes.load(Ordering::SeqCst) {
            return Err(store_failure());
        }
        let mut teams = self.teams.lock().await;
        Ok(teams.get_mut(&id).map(|team| {
            team.metadata = Some(metadata.clone());
            team.updated_at = Utc::now();
            team.clone()
        }))
    }
}

#[async_trait]
impl MemberStore for FakeStore {
    async fn get_member(&self, id: Uuid) -> Result<Option<Member>, AppError> {
        Ok(self.members.lock().await.get(&id).cloned())
    }

    async fn list_members(
        &self,
        filter: &ListFilter,
        page: Pagination,
    ) -> Result<(Vec<Member>, i64), AppError> {
        let mut rows: Vec<Member> = self
            .members
            .lock()
            .await
            .values()
            .filter(|m| name_matches(&m.name, filter))
            .filter(|m| filter.team_id.is_none() || m.team_id == filter.team_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(page_of(rows, page))
    }

    async fn insert_member(&self, member: &Member) -> Result<(), AppError> {
        self.members.lock().await.insert(member.id, member.clone());
        Ok(())
    }

    async fn delete_member(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.members.lock().await.remove(&id).is_some())
    }

    async fn update_member_metadata(
        &self,
        id: Uuid,
        metadata: &Value,
    ) -> Result<Option<Member>, AppError> {
        if self.fail_metadata_writes.load(Ordering::SeqCst) {
            return Err(store_failure());
        }
        let mut members = self.members.lock().await;
        Ok(members.get_mut(&id).map(|member| {
            member.metadata = Some(metadata.clone());
            member.updated_at = Utc::now();
            member.clone()
        }))
    }

    async fn update_member_team(
        &self,
        id: Uuid,
        team_id: Uuid,
    ) -> Result<Option<Member>, AppError> {
        let mut members = self.members.lock().await;
        Ok(members.get_mut(&id).map(|member| {
            member.team_id = Some(team_id);
            member.updated_at = Utc::now();
            member.clone()
        }))
    }
}

#[async_trait]
impl ComponentStore for FakeStore {
    async fn get_component(&self, id: Uuid) -> Result<Option<Component>, AppError> {
        Ok(self.components.lock().await.get(&id).cloned())
    }

    async fn list_components(
        &self,
        filter: &ListFilter,
        page: Pagination,
    ) -> Result<(Vec<Component>, i64), AppError> {
        let mut rows: Vec<Component> = self
            .components
            .lock()
            .await
            .values()
            .filter(|c| name_matches(&c.name, filter))
            .filter(|c| filter.team_id.is_none() || c.owner_team_id == filter.team_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(page_of(rows, page))
    }

    async fn insert_component(&self, component: &Component) -> Result<(), AppError> {
        self.components
            .lock()
            .await
            .insert(component.id, component.clone());
        Ok(())
    }
}

#[async_trait]
impl OutageCallStore for FakeStore {
    async fn get_outage_call(&self, id: Uuid) -> Result<Option<OutageCall>, AppError> {
        Ok(self.outage_calls.lock().await.get(&id).cloned())
    }

    async fn list_outage_calls(
        &self,
        filter: &ListFilter,
        page: Pagination,
    ) -> Result<(Vec<OutageCall>, i64), AppError> {
        let mut rows: Vec<OutageCall> = self
            .outage_calls
            .lock()
            .await
            .values()
            .filter(|c| name_matches(&c.title, filter))
            .filter(|c| filter.team_id.is_none() || c.team_id == filter.team_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_of(rows, page))
    }

    async fn insert_outage_call(&self, call: &OutageCall) -> Result<(), AppError> {
        self.outage_calls.lock().await.insert(call.id, call.clone());
        Ok(())
    }
}

#[async_trait]
impl AssignmentStore for FakeStore {
    async fn assignment_exists(
        &self,
        outage_call_id: Uuid,
        member_id: Uuid,
    ) -> Result<bool, AppError> {
        if self.stale_exists.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(self.get_assignment(outage_call_id, member_id).await?.is_some())
    }

    async fn get_assignment(
        &self,
        outage_call_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<OutageCallAssignee>, AppError> {
        Ok(self
            .assignments
            .lock()
            .await
            .iter()
            .find(|a| a.outage_call_id == outage_call_id && a.member_id == member_id)
            .cloned())
    }

    async fn insert_assignment(&self, record: &OutageCallAssignee) -> Result<(), AppError> {
        if self.fail_assignment_writes.load(Ordering::SeqCst) {
            return Err(store_failure());
        }
        let mut rows = self.assignments.lock().await;
        if rows
            .iter()
            .any(|a| a.outage_call_id == record.outage_call_id && a.member_id == record.member_id)
        {
            return Err(AppError::MemberAlreadyAssigned {
                outage_call_id: record.outage_call_id,
                member_id: record.member_id,
            });
        }
        rows.push(record.clone());
        Ok(())
    }

    async fn delete_assignment(
        &self,
        outage_call_id: Uuid,
        member_id: Uuid,
    ) -> Result<bool, AppError> {
        if self.fail_assignment_writes.load(Ordering::SeqCst) {
            return Err(store_failure());
        }
        let mut rows = self.assignments.lock().await;
        let before = rows.len();
        rows.retain(|a| !(a.outage_call_id == outage_call_id && a.member_id == member_id));
        Ok(rows.len() != before)
    }

    async fn update_assignment(
        &self,
        outage_call_id: Uuid,
        member_id: Uuid,
        patch: AssignmentPatch,
    ) -> Result<Option<OutageCallAssignee>, AppError> {
        if self.fail_assignment_writes.load(Ordering::SeqCst) {
            return Err(store_failure());
        }
        let mut rows = self.assignments.lock().await;
        Ok(rows
            .iter_mut()
            .find(|a| a.outage_call_id == outage_call_id && a.member_id == member_id)
            .map(|row| {
                if let Some(role) = patch.role {
                    row.role = role;
                }
                if let Some(active) = patch.is_active {
                    row.is_active = active;
                }
                row.updated_at = Utc::now();
                row.clone()
            }))
    }

    async fn list_by_outage_call(
        &self,
        outage_call_id: Uuid,
    ) -> Result<Vec<OutageCallAssignee>, AppError> {
        Ok(self
            .assignments
            .lock()
            .await
            .iter()
            .filter(|a| a.outage_call_id == outage_call_id)
            .cloned()
            .collect())
    }

    async fn list_by_member(&self, member_id: Uuid) -> Result<Vec<OutageCallAssignee>, AppError> {
        Ok(self
            .assignments
            .lock()
            .await
            .iter()
            .filter(|a| a.member_id == member_id)
            .cloned()
            .collect())
    }
}
