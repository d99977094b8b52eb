//! Outage call assignee model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ErrorDetails;

/// Responsibility level of an assignee on an outage call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AssigneeRole {
    Primary,
    Secondary,
    Observer,
}

impl AssigneeRole {
    pub const ALL: [AssigneeRole; 3] = [
        AssigneeRole::Primary,
        AssigneeRole::Secondary,
        AssigneeRole::Observer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssigneeRole::Primary => "primary",
            AssigneeRole::Secondary => "secondary",
            AssigneeRole::Observer => "observer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == s)
    }
}

/// A member attached to an outage call. At most one row exists per
/// `(outage_call_id, member_id)` pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutageCallAssignee {
    pub outage_call_id: Uuid,
    pub member_id: Uuid,
    pub role: AssigneeRole,
    pub assigned_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for assigning a single member.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignMemberRequest {
    pub member_id: Uuid,
    pub role: AssigneeRole,
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Request body for assigning several members at once.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAssignRequest {
    pub members: Vec<AssignMemberRequest>,
}

/// Request body for removing several members at once.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUnassignRequest {
    pub member_ids: Vec<Uuid>,
}

/// Partial update of an assignment. Absent fields are left untouched.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentPatch {
    #[serde(default)]
    pub role: Option<AssigneeRole>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl AssignmentPatch {
    pub fn is_empty(&self) -> bool {
        self.role.is_none() && self.is_active.is_none()
    }
}

/// Outcome of one entry of a bulk request, reported by input position.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemReport {
    pub index: usize,
    pub member_id: Uuid,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment: Option<OutageCallAssignee>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

/// Response body of the bulk endpoints.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BulkReport {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BulkItemReport>,
}

/// Per-role assignment counts.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct RoleCounts {
    pub primary: usize,
    pub secondary: usize,
    pub observer: usize,
}

/// Assignment counts for one outage call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentStats {
    pub outage_call_id: Uuid,
    pub total: usize,
    pub by_role: RoleCounts,
}

/// Number of active assignments a member currently holds.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MemberWorkload {
    pub member_id: Uuid,
    pub active_assignments: usize,
}
