//! Outage-call assignee management.
//!
//! Every mutation checks that both the outage call and the member exist before touching the
//! assignment store. The store's uniqueness constraint is authoritative for the
//! one-row-per-pair rule; the prior existence check only gives callers an early, precise error.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use super::existence::{EntityKind, ExistenceOracle};
use super::validation::Validator;
use crate::errors::AppError;
use crate::models::{
    AssigneeRole, AssignmentPatch, AssignmentStats, BulkItemReport, BulkReport, MemberWorkload,
    OutageCallAssignee, RoleCounts,
};
use crate::store::AssignmentStore;

/// One member entry of a bulk assignment.
#[derive(Debug, Clone)]
pub struct AssignmentSpec {
    pub member_id: Uuid,
    pub role: AssigneeRole,
    pub assigned_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

/// Result of one bulk entry, keyed by its position in the request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItem<T> {
    pub index: usize,
    pub member_id: Uuid,
    pub result: Result<T, AppError>,
}

/// Per-entry results of a bulk operation, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkOutcome<T> {
    pub items: Vec<BulkItem<T>>,
}

impl<T> BulkOutcome<T> {
    pub fn successes(&self) -> impl Iterator<Item = &T> {
        self.items.iter().filter_map(|i| i.result.as_ref().ok())
    }

    pub fn errors(&self) -> impl Iterator<Item = &AppError> {
        self.items.iter().filter_map(|i| i.result.as_ref().err())
    }

    pub fn succeeded(&self) -> usize {
        self.successes().count()
    }

    pub fn failed(&self) -> usize {
        self.errors().count()
    }
}

impl BulkOutcome<OutageCallAssignee> {
    pub fn into_report(self) -> BulkReport {
        build_report(self, Some)
    }
}

impl BulkOutcome<()> {
    pub fn into_report(self) -> BulkReport {
        build_report(self, |_| None)
    }
}

fn build_report<T>(
    outcome: BulkOutcome<T>,
    to_assignment: impl Fn(T) -> Option<OutageCallAssignee>,
) -> BulkReport {
    let succeeded = outcome.succeeded();
    let failed = outcome.failed();
    let results = outcome
        .items
        .into_iter()
        .map(|item| match item.result {
            Ok(value) => BulkItemReport {
                index: item.index,
                member_id: item.member_id,
                ok: true,
                assignment: to_assignment(value),
                error: None,
            },
            Err(err) => BulkItemReport {
                index: item.index,
                member_id: item.member_id,
                ok: false,
                assignment: None,
                error: Some(err.details()),
            },
        })
        .collect();

    BulkReport {
        succeeded,
        failed,
        results,
    }
}

#[derive(Clone)]
pub struct AssignmentService {
    oracle: ExistenceOracle,
    store: Arc<dyn AssignmentStore>,
    validator: Arc<Validator>,
}

impl AssignmentService {
    pub fn new(
        oracle: ExistenceOracle,
        store: Arc<dyn AssignmentStore>,
        validator: Arc<Validator>,
    ) -> Self {
        Self {
            oracle,
            store,
            validator,
        }
    }

    async fn ensure_pair(&self, outage_call_id: Uuid, member_id: Uuid) -> Result<(), AppError> {
        self.oracle
            .ensure(EntityKind::OutageCall, outage_call_id)
            .await?;
        self.oracle.ensure(EntityKind::Member, member_id).await
    }

    /// Assign a member to an outage call.
    ///
    /// `assigned_at` defaults to now and `is_active` to true.
    pub async fn create(
        &self,
        outage_call_id: Uuid,
        member_id: Uuid,
        role: AssigneeRole,
        assigned_at: Option<DateTime<Utc>>,
        is_active: Option<bool>,
    ) -> Result<OutageCallAssignee, AppError> {
        self.ensure_pair(outage_call_id, member_id).await?;

        if self.is_assigned(outage_call_id, member_id).await? {
            return Err(AppError::MemberAlreadyAssigned {
                outage_call_id,
                member_id,
            });
        }

        let now = super::now();
        let record = OutageCallAssignee {
            outage_call_id,
            member_id,
            role,
            assigned_at: assigned_at.map_or(now, |at| at.trunc_subsecs(6)),
            is_active: is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        // A concurrent writer may still win between the check and this insert; the store
        // reports that as MemberAlreadyAssigned too.
        self.store.insert_assignment(&record).await?;

        tracing::info!(
            %outage_call_id,
            %member_id,
            role = role.as_str(),
            "Member assigned to outage call"
        );
        Ok(record)
    }

    pub async fn unassign(&self, outage_call_id: Uuid, member_id: Uuid) -> Result<(), AppError> {
        self.ensure_pair(outage_call_id, member_id).await?;

        let not_assigned = AppError::MemberNotAssigned {
            outage_call_id,
            member_id,
        };
        if !self.is_assigned(outage_call_id, member_id).await? {
            return Err(not_assigned);
        }
        // Someone else may have removed the row since the check.
        if !self
            .store
            .delete_assignment(outage_call_id, member_id)
            .await?
        {
            return Err(not_assigned);
        }

        tracing::info!(%outage_call_id, %member_id, "Member unassigned from outage call");
        Ok(())
    }

    /// Assign each member in order. A failing entry never stops the rest of the batch.
    pub async fn bulk_assign(
        &self,
        outage_call_id: Uuid,
        members: Vec<AssignmentSpec>,
    ) -> Result<BulkOutcome<OutageCallAssignee>, AppError> {
        self.validator.non_empty_batch(members.len())?;

        let mut items = Vec::with_capacity(members.len());
        for (index, spec) in members.into_iter().enumerate() {
            let result = self
                .create(
                    outage_call_id,
                    spec.member_id,
                    spec.role,
                    spec.assigned_at,
                    spec.is_active,
                )
                .await;
            if let Err(e) = &result {
                tracing::warn!(%outage_call_id, member_id = %spec.member_id, index, "Bulk assign entry failed: {}", e);
            }
            items.push(BulkItem {
                index,
                member_id: spec.member_id,
                result,
            });
        }

        Ok(BulkOutcome { items })
    }

    /// Unassign each member in order, collecting per-entry failures.
    pub async fn bulk_unassign(
        &self,
        outage_call_id: Uuid,
        member_ids: Vec<Uuid>,
    ) -> Result<BulkOutcome<()>, AppError> {
        self.validator.non_empty_batch(member_ids.len())?;

        let mut items = Vec::with_capacity(member_ids.len());
        for (index, member_id) in member_ids.into_iter().enumerate() {
            let result = self.unassign(outage_call_id, member_id).await;
            if let Err(e) = &result {
                tracing::warn!(%outage_call_id, %member_id, index, "Bulk unassign entry failed: {}", e);
            }
            items.push(BulkItem {
                index,
                member_id,
                result,
            });
        }

        Ok(BulkOutcome { items })
    }

    /// Change role and/or active flag of an existing assignment in a single store write.
    pub async fn update(
        &self,
        outage_call_id: Uuid,
        member_id: Uuid,
        patch: AssignmentPatch,
    ) -> Result<OutageCallAssignee, AppError> {
        if patch.is_empty() {
            return Err(AppError::Validation(
                "Nothing to update: provide role and/or isActive".to_string(),
            ));
        }
        self.ensure_pair(outage_call_id, member_id).await?;

        let updated = self
            .store
            .update_assignment(outage_call_id, member_id, patch)
            .await?
            .ok_or(AppError::MemberNotAssigned {
                outage_call_id,
                member_id,
            })?;

        tracing::info!(
            %outage_call_id,
            %member_id,
            role = updated.role.as_str(),
            is_active = updated.is_active,
            "Assignment updated"
        );
        Ok(updated)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn update_role(
        &self,
        outage_call_id: Uuid,
        member_id: Uuid,
        role: AssigneeRole,
    ) -> Result<OutageCallAssignee, AppError> {
        let patch = AssignmentPatch {
            role: Some(role),
            is_active: None,
        };
        self.update(outage_call_id, member_id, patch).await
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn set_active(
        &self,
        outage_call_id: Uuid,
        member_id: Uuid,
        is_active: bool,
    ) -> Result<OutageCallAssignee, AppError> {
        let patch = AssignmentPatch {
            role: None,
            is_active: Some(is_active),
        };
        self.update(outage_call_id, member_id, patch).await
    }

    /// Pair lookup without validating either entity.
    pub async fn is_assigned(&self, outage_call_id: Uuid, member_id: Uuid) -> Result<bool, AppError> {
        self.store.assignment_exists(outage_call_id, member_id).await
    }

    pub async fn get(
        &self,
        outage_call_id: Uuid,
        member_id: Uuid,
    ) -> Result<OutageCallAssignee, AppError> {
        self.ensure_pair(outage_call_id, member_id).await?;
        self.store
            .get_assignment(outage_call_id, member_id)
            .await?
            .ok_or(AppError::MemberNotAssigned {
                outage_call_id,
                member_id,
            })
    }

    // ==================== QUERIES ====================
    //
    // Role and count helpers without a route of their own are kept for in-process callers.

    pub async fn list_by_outage_call(
        &self,
        outage_call_id: Uuid,
    ) -> Result<Vec<OutageCallAssignee>, AppError> {
        self.oracle
            .ensure(EntityKind::OutageCall, outage_call_id)
            .await?;
        self.store.list_by_outage_call(outage_call_id).await
    }

    pub async fn list_by_member(&self, member_id: Uuid) -> Result<Vec<OutageCallAssignee>, AppError> {
        self.oracle.ensure(EntityKind::Member, member_id).await?;
        self.store.list_by_member(member_id).await
    }

    pub async fn list_active_by_member(
        &self,
        member_id: Uuid,
    ) -> Result<Vec<OutageCallAssignee>, AppError> {
        let mut rows = self.list_by_member(member_id).await?;
        rows.retain(|a| a.is_active);
        Ok(rows)
    }

    pub async fn list_by_role(
        &self,
        outage_call_id: Uuid,
        role: AssigneeRole,
    ) -> Result<Vec<OutageCallAssignee>, AppError> {
        let mut rows = self.list_by_outage_call(outage_call_id).await?;
        rows.retain(|a| a.role == role);
        Ok(rows)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn list_primary(
        &self,
        outage_call_id: Uuid,
    ) -> Result<Vec<OutageCallAssignee>, AppError> {
        self.list_by_role(outage_call_id, AssigneeRole::Primary)
            .await
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn list_secondary(
        &self,
        outage_call_id: Uuid,
    ) -> Result<Vec<OutageCallAssignee>, AppError> {
        self.list_by_role(outage_call_id, AssigneeRole::Secondary)
            .await
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn list_observers(
        &self,
        outage_call_id: Uuid,
    ) -> Result<Vec<OutageCallAssignee>, AppError> {
        self.list_by_role(outage_call_id, AssigneeRole::Observer)
            .await
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn assignment_count(&self, outage_call_id: Uuid) -> Result<usize, AppError> {
        Ok(self.list_by_outage_call(outage_call_id).await?.len())
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn assignment_count_by_role(
        &self,
        outage_call_id: Uuid,
        role: AssigneeRole,
    ) -> Result<usize, AppError> {
        Ok(self.list_by_role(outage_call_id, role).await?.len())
    }

    /// Total and per-role counts from a single listing.
    pub async fn stats(&self, outage_call_id: Uuid) -> Result<AssignmentStats, AppError> {
        let rows = self.list_by_outage_call(outage_call_id).await?;
        let mut by_role = RoleCounts::default();
        for row in &rows {
            match row.role {
                AssigneeRole::Primary => by_role.primary += 1,
                AssigneeRole::Secondary => by_role.secondary += 1,
                AssigneeRole::Observer => by_role.observer += 1,
            }
        }
        Ok(AssignmentStats {
            outage_call_id,
            total: rows.len(),
            by_role,
        })
    }

    /// Number of active assignments held by a member.
    pub async fn member_workload(&self, member_id: Uuid) -> Result<MemberWorkload, AppError> {
        let active = self.list_active_by_member(member_id).await?;
        Ok(MemberWorkload {
            member_id,
            active_assignments: active.len(),
        })
    }
}
