//! Partial updates of team and member metadata documents.
//!
//! The merge is one level deep: each top-level key of the patch replaces the stored value
//! wholesale, every other top-level key is kept as is.
//!
//! Read, merge and write are separate store calls, so two concurrent merges on the same entity
//! can lose the keys of whichever wrote first.

use std::sync::Arc;

use serde_json::{Map, Value};
use uuid::Uuid;

use super::validation::Validator;
use crate::errors::AppError;
use crate::models::{Member, Team};
use crate::store::{MemberStore, TeamStore};

/// Shallow-merge `patch` onto `current`.
///
/// A missing or non-object `current` is treated as `{}`. Nested objects under a patched key
/// are replaced, not merged.
pub fn merge_document(current: Option<&Value>, patch: &Map<String, Value>) -> Value {
    let mut merged = match current {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    for (key, value) in patch {
        merged.insert(key.clone(), value.clone());
    }
    Value::Object(merged)
}

#[derive(Clone)]
pub struct MetadataService {
    teams: Arc<dyn TeamStore>,
    members: Arc<dyn MemberStore>,
    validator: Arc<Validator>,
}

impl MetadataService {
    pub fn new(
        teams: Arc<dyn TeamStore>,
        members: Arc<dyn MemberStore>,
        validator: Arc<Validator>,
    ) -> Self {
        Self {
            teams,
            members,
            validator,
        }
    }

    pub async fn merge_team_metadata(&self, team_id: Uuid, patch: &Value) -> Result<Team, AppError> {
        let patch = self.validator.metadata_patch(patch)?;
        let team = self
            .teams
            .get_team(team_id)
            .await?
            .ok_or(AppError::TeamNotFound(team_id))?;

        let merged = merge_document(team.metadata.as_ref(), patch);
        let updated = self
            .teams
            .update_team_metadata(team_id, &merged)
            .await?
            .ok_or(AppError::TeamNotFound(team_id))?;

        tracing::info!(%team_id, keys = patch.len(), "Team metadata merged");
        Ok(updated)
    }

    pub async fn merge_member_metadata(
        &self,
        member_id: Uuid,
        patch: &Value,
    ) -> Result<Member, AppError> {
        let patch = self.validator.metadata_patch(patch)?;
        let member = self
            .members
            .get_member(member_id)
            .await?
            .ok_or(AppError::MemberNotFound(member_id))?;

        let merged = merge_document(member.metadata.as_ref(), patch);
        let updated = self
            .members
            .update_member_metadata(member_id, &merged)
            .await?
            .ok_or(AppError::MemberNotFound(member_id))?;

        tracing::info!(%member_id, keys = patch.len(), "Member metadata merged");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use serde_json::json;

    use super::*;
    use crate::store::fake::FakeStore;

    fn service(store: &Arc<FakeStore>) -> MetadataService {
        MetadataService::new(store.clone(), store.clone(), Arc::new(Validator::new()))
    }

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_merge_preserves_untouched_keys() {
        let current = json!({"color": "blue", "jira": {"team": "X"}});
        let merged = merge_document(Some(&current), &obj(json!({"color": "red"})));
        assert_eq!(merged, json!({"color": "red", "jira": {"team": "X"}}));
        assert_eq!(merged["jira"], current["jira"]);
    }

    #[test]
    fn test_merge_replaces_nested_value_wholesale() {
        let current = json!({"color": "blue", "jira": {"team": "X", "board": 7}});
        let merged = merge_document(Some(&current), &obj(json!({"jira": {"team": "Y"}})));
        assert_eq!(merged["jira"], json!({"team": "Y"}));
        assert_eq!(merged["color"], "blue");
    }

    #[test]
    fn test_merge_onto_missing_or_malformed_document() {
        let patch = obj(json!({"slack": "#ops"}));
        assert_eq!(merge_document(None, &patch), json!({"slack": "#ops"}));
        assert_eq!(
            merge_document(Some(&json!("garbage")), &patch),
            json!({"slack": "#ops"})
        );
    }

    #[test]
    fn test_merge_with_empty_patch_is_identity() {
        let current = json!({"a": [1, 2, {"b": null}]});
        assert_eq!(merge_document(Some(&current), &Map::new()), current);
    }

    #[tokio::test]
    async fn test_team_metadata_merge_persists() {
        let store = Arc::new(FakeStore::new());
        let team = store
            .add_team("platform", Some(json!({"color": "blue", "jira": {"team": "X"}})))
            .await;
        let svc = service(&store);

        let updated = svc
            .merge_team_metadata(team.id, &json!({"color": "red"}))
            .await
            .unwrap();

        assert_eq!(
            updated.metadata,
            Some(json!({"color": "red", "jira": {"team": "X"}}))
        );
        let stored = store.teams.lock().await.get(&team.id).cloned().unwrap();
        assert_eq!(stored.metadata, updated.metadata);
    }

    #[tokio::test]
    async fn test_member_metadata_merge_and_not_found() {
        let store = Arc::new(FakeStore::new());
        let member = store.add_member("alan", None).await;
        let svc = service(&store);

        let updated = svc
            .merge_member_metadata(member.id, &json!({"jira": {"user": "alan.t"}}))
            .await
            .unwrap();
        assert_eq!(updated.metadata, Some(json!({"jira": {"user": "alan.t"}})));

        let ghost = Uuid::new_v4();
        assert_eq!(
            svc.merge_member_metadata(ghost, &json!({"a": 1}))
                .await
                .unwrap_err(),
            AppError::MemberNotFound(ghost)
        );
        assert_eq!(
            svc.merge_team_metadata(ghost, &json!({"a": 1}))
                .await
                .unwrap_err(),
            AppError::TeamNotFound(ghost)
        );
    }

    #[tokio::test]
    async fn test_non_object_patch_is_rejected() {
        let store = Arc::new(FakeStore::new());
        let team = store.add_team("platform", None).await;
        let svc = service(&store);

        assert!(matches!(
            svc.merge_team_metadata(team.id, &json!(["color"])).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_store_failure_leaves_document_untouched() {
        let store = Arc::new(FakeStore::new());
        let team = store.add_team("platform", Some(json!({"color": "blue"}))).await;
        let svc = service(&store);
        store.fail_metadata_writes.store(true, Ordering::SeqCst);

        assert!(matches!(
            svc.merge_team_metadata(team.id, &json!({"color": "red"})).await,
            Err(AppError::Store(_))
        ));
        let stored = store.teams.lock().await.get(&team.id).cloned().unwrap();
        assert_eq!(stored.metadata, Some(json!({"color": "blue"})));
    }
}
