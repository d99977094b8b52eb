//! SQLite repository implementing every store capability.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    AssigneeRole, AssignmentPatch, Component, ListFilter, Member, OutageCall, OutageCallAssignee,
    Team,
};
use crate::services::pagination::Pagination;
use crate::store::{AssignmentStore, ComponentStore, MemberStore, OutageCallStore, TeamStore};

const TEAM_COLUMNS: &str = "id, name, description, metadata, created_at, updated_at";
const MEMBER_COLUMNS: &str = "id, name, email, team_id, metadata, created_at, updated_at";
const COMPONENT_COLUMNS: &str =
    "id, name, title, description, owner_team_id, metadata, created_at, updated_at";
const OUTAGE_CALL_COLUMNS: &str = "id, title, description, team_id, created_at, updated_at";
const ASSIGNEE_COLUMNS: &str =
    "outage_call_id, member_id, role, assigned_at, is_active, created_at, updated_at";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// ==================== TEAMS ====================

#[async_trait]
impl TeamStore for Repository {
    async fn get_team(&self, id: Uuid) -> Result<Option<Team>, AppError> {
        let row = sqlx::query(&format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(team_from_row).transpose()
    }

    async fn list_teams(
        &self,
        filter: &ListFilter,
        page: Pagination,
    ) -> Result<(Vec<Team>, i64), AppError> {
        let condition = "(? IS NULL OR instr(lower(name), lower(?)) > 0)";

        let total: i64 = sqlx::query(&format!(
            "SELECT COUNT(*) AS total FROM teams WHERE {condition}"
        ))
        .bind(&filter.name_contains)
        .bind(&filter.name_contains)
        .fetch_one(&self.pool)
        .await?
        .try_get("total")?;

        let rows = sqlx::query(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE {condition} ORDER BY name, id LIMIT ? OFFSET ?"
        ))
        .bind(&filter.name_contains)
        .bind(&filter.name_contains)
        .bind(page.page_size)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        let teams = rows.iter().map(team_from_row).collect::<Result<_, _>>()?;
        Ok((teams, total))
    }

    async fn insert_team(&self, team: &Team) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO teams (id, name, description, metadata, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(team.id.to_string())
        .bind(&team.name)
        .bind(&team.description)
        .bind(metadata_to_column(&team.metadata)?)
        .bind(timestamp(&team.created_at))
        .bind(timestamp(&team.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_team(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM teams WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_team_metadata(
        &self,
        id: Uuid,
        metadata: &Value,
    ) -> Result<Option<Team>, AppError> {
        let row = sqlx::query(&format!(
            "UPDATE teams SET metadata = ?, updated_at = ? WHERE id = ? RETURNING {TEAM_COLUMNS}"
        ))
        .bind(serde_json::to_string(metadata)?)
        .bind(timestamp(&Utc::now()))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(team_from_row).transpose()
    }
}

// ==================== MEMBERS ====================

#[async_trait]
impl MemberStore for Repository {
    async fn get_member(&self, id: Uuid) -> Result<Option<Member>, AppError> {
        let row = sqlx::query(&format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(member_from_row).transpose()
    }

    async fn list_members(
        &self,
        filter: &ListFilter,
        page: Pagination,
    ) -> Result<(Vec<Member>, i64), AppError> {
        let condition =
            "(? IS NULL OR instr(lower(name), lower(?)) > 0) AND (? IS NULL OR team_id = ?)";
        let team_id = filter.team_id.map(|id| id.to_string());

        let total: i64 = sqlx::query(&format!(
            "SELECT COUNT(*) AS total FROM members WHERE {condition}"
        ))
        .bind(&filter.name_contains)
        .bind(&filter.name_contains)
        .bind(&team_id)
        .bind(&team_id)
        .fetch_one(&self.pool)
        .await?
        .try_get("total")?;

        let rows = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE {condition} ORDER BY name, id LIMIT ? OFFSET ?"
        ))
        .bind(&filter.name_contains)
        .bind(&filter.name_contains)
        .bind(&team_id)
        .bind(&team_id)
        .bind(page.page_size)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        let members = rows.iter().map(member_from_row).collect::<Result<_, _>>()?;
        Ok((members, total))
    }

    async fn insert_member(&self, member: &Member) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO members (id, name, email, team_id, metadata, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(member.id.to_string())
        .bind(&member.name)
        .bind(&member.email)
        .bind(member.team_id.map(|id| id.to_string()))
        .bind(metadata_to_column(&member.metadata)?)
        .bind(timestamp(&member.created_at))
        .bind(timestamp(&member.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_member(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_member_metadata(
        &self,
        id: Uuid,
        metadata: &Value,
    ) -> Result<Option<Member>, AppError> {
        let row = sqlx::query(&format!(
            "UPDATE members SET metadata = ?, updated_at = ? WHERE id = ? RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(serde_json::to_string(metadata)?)
        .bind(timestamp(&Utc::now()))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(member_from_row).transpose()
    }

    async fn update_member_team(
        &self,
        id: Uuid,
        team_id: Uuid,
    ) -> Result<Option<Member>, AppError> {
        let row = sqlx::query(&format!(
            "UPDATE members SET team_id = ?, updated_at = ? WHERE id = ? RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(team_id.to_string())
        .bind(timestamp(&Utc::now()))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(member_from_row).transpose()
    }
}

// ==================== COMPONENTS ====================

#[async_trait]
impl ComponentStore for Repository {
    async fn get_component(&self, id: Uuid) -> Result<Option<Component>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {COMPONENT_COLUMNS} FROM components WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(component_from_row).transpose()
    }

    async fn list_components(
        &self,
        filter: &ListFilter,
        page: Pagination,
    ) -> Result<(Vec<Component>, i64), AppError> {
        let condition =
            "(? IS NULL OR instr(lower(name), lower(?)) > 0) AND (? IS NULL OR owner_team_id = ?)";
        let team_id = filter.team_id.map(|id| id.to_string());

        let total: i64 = sqlx::query(&format!(
            "SELECT COUNT(*) AS total FROM components WHERE {condition}"
        ))
        .bind(&filter.name_contains)
        .bind(&filter.name_contains)
        .bind(&team_id)
        .bind(&team_id)
        .fetch_one(&self.pool)
        .await?
        .try_get("total")?;

        let rows = sqlx::query(&format!(
            "SELECT {COMPONENT_COLUMNS} FROM components WHERE {condition} ORDER BY name, id LIMIT ? OFFSET ?"
        ))
        .bind(&filter.name_contains)
        .bind(&filter.name_contains)
        .bind(&team_id)
        .bind(&team_id)
        .bind(page.page_size)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        let components = rows
            .iter()
            .map(component_from_row)
            .collect::<Result<_, _>>()?;
        Ok((components, total))
    }

    async fn insert_component(&self, component: &Component) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO components (id, name, title, description, owner_team_id, metadata, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(component.id.to_string())
        .bind(&component.name)
        .bind(&component.title)
        .bind(&component.description)
        .bind(component.owner_team_id.map(|id| id.to_string()))
        .bind(metadata_to_column(&component.metadata)?)
        .bind(timestamp(&component.created_at))
        .bind(timestamp(&component.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// ==================== OUTAGE CALLS ====================

#[async_trait]
impl OutageCallStore for Repository {
    async fn get_outage_call(&self, id: Uuid) -> Result<Option<OutageCall>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {OUTAGE_CALL_COLUMNS} FROM outage_calls WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(outage_call_from_row).transpose()
    }

    async fn list_outage_calls(
        &self,
        filter: &ListFilter,
        page: Pagination,
    ) -> Result<(Vec<OutageCall>, i64), AppError> {
        let condition =
            "(? IS NULL OR instr(lower(title), lower(?)) > 0) AND (? IS NULL OR team_id = ?)";
        let team_id = filter.team_id.map(|id| id.to_string());

        let total: i64 = sqlx::query(&format!(
            "SELECT COUNT(*) AS total FROM outage_calls WHERE {condition}"
        ))
        .bind(&filter.name_contains)
        .bind(&filter.name_contains)
        .bind(&team_id)
        .bind(&team_id)
        .fetch_one(&self.pool)
        .await?
        .try_get("total")?;

        let rows = sqlx::query(&format!(
            "SELECT {OUTAGE_CALL_COLUMNS} FROM outage_calls WHERE {condition} ORDER BY created_at DESC, id LIMIT ? OFFSET ?"
        ))
        .bind(&filter.name_contains)
        .bind(&filter.name_contains)
        .bind(&team_id)
        .bind(&team_id)
        .bind(page.page_size)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        let calls = rows
            .iter()
            .map(outage_call_from_row)
            .collect::<Result<_, _>>()?;
        Ok((calls, total))
    }

    async fn insert_outage_call(&self, call: &OutageCall) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO outage_calls (id, title, description, team_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(call.id.to_string())
        .bind(&call.title)
        .bind(&call.description)
        .bind(call.team_id.map(|id| id.to_string()))
        .bind(timestamp(&call.created_at))
        .bind(timestamp(&call.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// ==================== ASSIGNEES ====================

#[async_trait]
impl AssignmentStore for Repository {
    async fn assignment_exists(
        &self,
        outage_call_id: Uuid,
        member_id: Uuid,
    ) -> Result<bool, AppError> {
        let row = sqlx::query(
            "SELECT 1 FROM outage_call_assignees WHERE outage_call_id = ? AND member_id = ?",
        )
        .bind(outage_call_id.to_string())
        .bind(member_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn get_assignment(
        &self,
        outage_call_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<OutageCallAssignee>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {ASSIGNEE_COLUMNS} FROM outage_call_assignees WHERE outage_call_id = ? AND member_id = ?"
        ))
        .bind(outage_call_id.to_string())
        .bind(member_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(assignee_from_row).transpose()
    }

    async fn insert_assignment(&self, record: &OutageCallAssignee) -> Result<(), AppError> {
        let result = sqlx::query(
            "INSERT INTO outage_call_assignees (outage_call_id, member_id, role, assigned_at, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.outage_call_id.to_string())
        .bind(record.member_id.to_string())
        .bind(record.role.as_str())
        .bind(timestamp(&record.assigned_at))
        .bind(record.is_active as i32)
        .bind(timestamp(&record.created_at))
        .bind(timestamp(&record.updated_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tracing::debug!(
                    outage_call_id = %record.outage_call_id,
                    member_id = %record.member_id,
                    "Assignment insert hit the unique index"
                );
                Err(AppError::MemberAlreadyAssigned {
                    outage_call_id: record.outage_call_id,
                    member_id: record.member_id,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_assignment(
        &self,
        outage_call_id: Uuid,
        member_id: Uuid,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM outage_call_assignees WHERE outage_call_id = ? AND member_id = ?",
        )
        .bind(outage_call_id.to_string())
        .bind(member_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_assignment(
        &self,
        outage_call_id: Uuid,
        member_id: Uuid,
        patch: AssignmentPatch,
    ) -> Result<Option<OutageCallAssignee>, AppError> {
        // Single statement: either both fields change or nothing does.
        let row = sqlx::query(&format!(
            r#"UPDATE outage_call_assignees
               SET role = COALESCE(?, role), is_active = COALESCE(?, is_active), updated_at = ?
               WHERE outage_call_id = ? AND member_id = ?
               RETURNING {ASSIGNEE_COLUMNS}"#
        ))
        .bind(patch.role.map(|r| r.as_str()))
        .bind(patch.is_active.map(|b| b as i32))
        .bind(timestamp(&Utc::now()))
        .bind(outage_call_id.to_string())
        .bind(member_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(assignee_from_row).transpose()
    }

    async fn list_by_outage_call(
        &self,
        outage_call_id: Uuid,
    ) -> Result<Vec<OutageCallAssignee>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {ASSIGNEE_COLUMNS} FROM outage_call_assignees WHERE outage_call_id = ? ORDER BY assigned_at, member_id"
        ))
        .bind(outage_call_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(assignee_from_row).collect()
    }

    async fn list_by_member(&self, member_id: Uuid) -> Result<Vec<OutageCallAssignee>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {ASSIGNEE_COLUMNS} FROM outage_call_assignees WHERE member_id = ? ORDER BY assigned_at, outage_call_id"
        ))
        .bind(member_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(assignee_from_row).collect()
    }
}

// Helper functions for row conversion

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn metadata_to_column(metadata: &Option<Value>) -> Result<Option<String>, AppError> {
    Ok(metadata.as_ref().map(serde_json::to_string).transpose()?)
}

fn uuid_col(row: &SqliteRow, column: &str) -> Result<Uuid, AppError> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw)
        .map_err(|e| AppError::Internal(format!("Corrupt uuid in column {}: {}", column, e)))
}

fn opt_uuid_col(row: &SqliteRow, column: &str) -> Result<Option<Uuid>, AppError> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| {
        Uuid::parse_str(&s)
            .map_err(|e| AppError::Internal(format!("Corrupt uuid in column {}: {}", column, e)))
    })
    .transpose()
}

fn timestamp_col(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, AppError> {
    let raw: String = row.try_get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Internal(format!("Corrupt timestamp in column {}: {}", column, e)))
}

/// Unparseable documents read back as absent so projections and merges keep working.
fn metadata_col(row: &SqliteRow) -> Result<Option<Value>, AppError> {
    let raw: Option<String> = row.try_get("metadata")?;
    Ok(raw.and_then(|s| match serde_json::from_str::<Value>(&s) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring malformed metadata document: {}", e);
            None
        }
    }))
}

fn team_from_row(row: &SqliteRow) -> Result<Team, AppError> {
    Ok(Team {
        id: uuid_col(row, "id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        metadata: metadata_col(row)?,
        created_at: timestamp_col(row, "created_at")?,
        updated_at: timestamp_col(row, "updated_at")?,
    })
}

fn member_from_row(row: &SqliteRow) -> Result<Member, AppError> {
    Ok(Member {
        id: uuid_col(row, "id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        team_id: opt_uuid_col(row, "team_id")?,
        metadata: metadata_col(row)?,
        created_at: timestamp_col(row, "created_at")?,
        updated_at: timestamp_col(row, "updated_at")?,
    })
}

fn component_from_row(row: &SqliteRow) -> Result<Component, AppError> {
    Ok(Component {
        id: uuid_col(row, "id")?,
        name: row.try_get("name")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        owner_team_id: opt_uuid_col(row, "owner_team_id")?,
        metadata: metadata_col(row)?,
        created_at: timestamp_col(row, "created_at")?,
        updated_at: timestamp_col(row, "updated_at")?,
    })
}

fn outage_call_from_row(row: &SqliteRow) -> Result<OutageCall, AppError> {
    Ok(OutageCall {
        id: uuid_col(row, "id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        team_id: opt_uuid_col(row, "team_id")?,
        created_at: timestamp_col(row, "created_at")?,
        updated_at: timestamp_col(row, "updated_at")?,
    })
}

fn assignee_from_row(row: &SqliteRow) -> Result<OutageCallAssignee, AppError> {
    let role: String = row.try_get("role")?;
    let is_active: i32 = row.try_get("is_active")?;
    Ok(OutageCallAssignee {
        outage_call_id: uuid_col(row, "outage_call_id")?,
        member_id: uuid_col(row, "member_id")?,
        role: AssigneeRole::parse(&role)
            .ok_or_else(|| AppError::Internal(format!("Unknown assignee role {:?}", role)))?,
        assigned_at: timestamp_col(row, "assigned_at")?,
        is_active: is_active != 0,
        created_at: timestamp_col(row, "created_at")?,
        updated_at: timestamp_col(row, "updated_at")?,
    })
}
