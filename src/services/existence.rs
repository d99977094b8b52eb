//! Existence checks for referenced entities.

use std::sync::Arc;

use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Component, Member, OutageCall, Team};
use crate::store::{ComponentStore, MemberStore, OutageCallStore, TeamStore};

/// Kinds of entity that other records point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    OutageCall,
    Member,
    Team,
    Component,
}

impl EntityKind {
    /// The kind-specific not-found error for `id`.
    pub fn not_found(self, id: Uuid) -> AppError {
        match self {
            EntityKind::OutageCall => AppError::OutageCallNotFound(id),
            EntityKind::Member => AppError::MemberNotFound(id),
            EntityKind::Team => AppError::TeamNotFound(id),
            EntityKind::Component => AppError::ComponentNotFound(id),
        }
    }
}

/// Read-only lookups used before every relational mutation.
#[derive(Clone)]
pub struct ExistenceOracle {
    outage_calls: Arc<dyn OutageCallStore>,
    members: Arc<dyn MemberStore>,
    teams: Arc<dyn TeamStore>,
    components: Arc<dyn ComponentStore>,
}

impl ExistenceOracle {
    pub fn new(
        outage_calls: Arc<dyn OutageCallStore>,
        members: Arc<dyn MemberStore>,
        teams: Arc<dyn TeamStore>,
        components: Arc<dyn ComponentStore>,
    ) -> Self {
        Self {
            outage_calls,
            members,
            teams,
            components,
        }
    }

    /// Build an oracle whose every capability is served by the same store.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: OutageCallStore + MemberStore + TeamStore + ComponentStore + 'static,
    {
        Self::new(store.clone(), store.clone(), store.clone(), store)
    }

    pub async fn exists(&self, kind: EntityKind, id: Uuid) -> Result<bool, AppError> {
        Ok(match kind {
            EntityKind::OutageCall => self.outage_calls.get_outage_call(id).await?.is_some(),
            EntityKind::Member => self.members.get_member(id).await?.is_some(),
            EntityKind::Team => self.teams.get_team(id).await?.is_some(),
            EntityKind::Component => self.components.get_component(id).await?.is_some(),
        })
    }

    /// Fail with the kind-specific not-found error unless the entity exists.
    pub async fn ensure(&self, kind: EntityKind, id: Uuid) -> Result<(), AppError> {
        if self.exists(kind, id).await? {
            Ok(())
        } else {
            Err(kind.not_found(id))
        }
    }

    pub async fn outage_call(&self, id: Uuid) -> Result<OutageCall, AppError> {
        self.outage_calls
            .get_outage_call(id)
            .await?
            .ok_or(AppError::OutageCallNotFound(id))
    }

    pub async fn member(&self, id: Uuid) -> Result<Member, AppError> {
        self.members
            .get_member(id)
            .await?
            .ok_or(AppError::MemberNotFound(id))
    }

    pub async fn team(&self, id: Uuid) -> Result<Team, AppError> {
        self.teams
            .get_team(id)
            .await?
            .ok_or(AppError::TeamNotFound(id))
    }

    pub async fn component(&self, id: Uuid) -> Result<Component, AppError> {
        self.components
            .get_component(id)
            .await?
            .ok_or(AppError::ComponentNotFound(id))
    }

    /// Check an optional team reference.
    pub async fn ensure_team_ref(&self, team_id: Option<Uuid>) -> Result<(), AppError> {
        match team_id {
            Some(id) => self.ensure(EntityKind::Team, id).await,
            None => Ok(()),
        }
    }
}
