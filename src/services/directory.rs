//! Plain CRUD for teams, members, components and outage calls.
//!
//! Any team reference is checked before the write that stores it.

use std::sync::Arc;

use uuid::Uuid;

use super::existence::{EntityKind, ExistenceOracle};
use super::pagination::Pagination;
use super::validation::Validator;
use crate::errors::AppError;
use crate::models::{
    Component, CreateComponentRequest, CreateMemberRequest, CreateOutageCallRequest,
    CreateTeamRequest, ListFilter, Member, OutageCall, Page, Team,
};
use crate::store::{ComponentStore, MemberStore, OutageCallStore, PortalStore, TeamStore};

fn page<T: serde::Serialize>((items, total): (Vec<T>, i64), pagination: Pagination) -> Page<T> {
    Page {
        items,
        page: pagination.page,
        page_size: pagination.page_size,
        total,
    }
}

#[derive(Clone)]
pub struct DirectoryService {
    oracle: ExistenceOracle,
    teams: Arc<dyn TeamStore>,
    members: Arc<dyn MemberStore>,
    components: Arc<dyn ComponentStore>,
    outage_calls: Arc<dyn OutageCallStore>,
    validator: Arc<Validator>,
}

impl DirectoryService {
    pub fn new<S: PortalStore + 'static>(store: Arc<S>, validator: Arc<Validator>) -> Self {
        Self {
            oracle: ExistenceOracle::from_store(store.clone()),
            teams: store.clone(),
            members: store.clone(),
            components: store.clone(),
            outage_calls: store,
            validator,
        }
    }

    // ==================== TEAMS ====================

    pub async fn create_team(&self, request: CreateTeamRequest) -> Result<Team, AppError> {
        let now = super::now();
        let team = Team {
            id: Uuid::new_v4(),
            name: self.validator.required_text("name", &request.name)?,
            description: self.validator.optional_text(request.description.as_deref()),
            metadata: self.validator.metadata_document(request.metadata)?,
            created_at: now,
            updated_at: now,
        };
        self.teams.insert_team(&team).await?;
        tracing::info!(team_id = %team.id, name = %team.name, "Team created");
        Ok(team)
    }

    pub async fn get_team(&self, id: Uuid) -> Result<Team, AppError> {
        self.oracle.team(id).await
    }

    pub async fn list_teams(
        &self,
        filter: &ListFilter,
        pagination: Pagination,
    ) -> Result<Page<Team>, AppError> {
        let rows = self.teams.list_teams(filter, pagination).await?;
        Ok(page(rows, pagination))
    }

    pub async fn delete_team(&self, id: Uuid) -> Result<(), AppError> {
        if !self.teams.delete_team(id).await? {
            return Err(AppError::TeamNotFound(id));
        }
        tracing::info!(team_id = %id, "Team deleted");
        Ok(())
    }

    // ==================== MEMBERS ====================

    pub async fn create_member(&self, request: CreateMemberRequest) -> Result<Member, AppError> {
        let name = self.validator.required_text("name", &request.name)?;
        let email = self.validator.optional_email(request.email.as_deref())?;
        let metadata = self.validator.metadata_document(request.metadata)?;
        self.oracle.ensure_team_ref(request.team_id).await?;

        let now = super::now();
        let member = Member {
            id: Uuid::new_v4(),
            name,
            email,
            team_id: request.team_id,
            metadata,
            created_at: now,
            updated_at: now,
        };
        self.members.insert_member(&member).await?;
        tracing::info!(member_id = %member.id, "Member created");
        Ok(member)
    }

    pub async fn get_member(&self, id: Uuid) -> Result<Member, AppError> {
        self.oracle.member(id).await
    }

    pub async fn list_members(
        &self,
        filter: &ListFilter,
        pagination: Pagination,
    ) -> Result<Page<Member>, AppError> {
        self.oracle.ensure_team_ref(filter.team_id).await?;
        let rows = self.members.list_members(filter, pagination).await?;
        Ok(page(rows, pagination))
    }

    pub async fn delete_member(&self, id: Uuid) -> Result<(), AppError> {
        if !self.members.delete_member(id).await? {
            return Err(AppError::MemberNotFound(id));
        }
        tracing::info!(member_id = %id, "Member deleted");
        Ok(())
    }

    /// Move a member into a team; the team must exist first.
    pub async fn assign_member_team(&self, member_id: Uuid, team_id: Uuid) -> Result<Member, AppError> {
        self.oracle.ensure(EntityKind::Member, member_id).await?;
        self.oracle.ensure(EntityKind::Team, team_id).await?;

        let member = self
            .members
            .update_member_team(member_id, team_id)
            .await?
            .ok_or(AppError::MemberNotFound(member_id))?;
        tracing::info!(%member_id, %team_id, "Member moved to team");
        Ok(member)
    }

    // ==================== COMPONENTS ====================

    pub async fn create_component(
        &self,
        request: CreateComponentRequest,
    ) -> Result<Component, AppError> {
        let name = self.validator.required_text("name", &request.name)?;
        let metadata = self.validator.metadata_document(request.metadata)?;
        self.oracle.ensure_team_ref(request.owner_team_id).await?;

        let now = super::now();
        let component = Component {
            id: Uuid::new_v4(),
            name,
            title: self.validator.optional_text(request.title.as_deref()),
            description: self.validator.optional_text(request.description.as_deref()),
            owner_team_id: request.owner_team_id,
            metadata,
            created_at: now,
            updated_at: now,
        };
        self.components.insert_component(&component).await?;
        tracing::info!(component_id = %component.id, "Component created");
        Ok(component)
    }

    pub async fn get_component(&self, id: Uuid) -> Result<Component, AppError> {
        self.oracle.component(id).await
    }

    pub async fn list_components(
        &self,
        filter: &ListFilter,
        pagination: Pagination,
    ) -> Result<Page<Component>, AppError> {
        self.oracle.ensure_team_ref(filter.team_id).await?;
        let rows = self.components.list_components(filter, pagination).await?;
        Ok(page(rows, pagination))
    }

    // ==================== OUTAGE CALLS ====================

    pub async fn create_outage_call(
        &self,
        request: CreateOutageCallRequest,
    ) -> Result<OutageCall, AppError> {
        let title = self.validator.required_text("title", &request.title)?;
        self.oracle.ensure_team_ref(request.team_id).await?;

        let now = super::now();
        let call = OutageCall {
            id: Uuid::new_v4(),
            title,
            description: self.validator.optional_text(request.description.as_deref()),
            team_id: request.team_id,
            created_at: now,
            updated_at: now,
        };
        self.outage_calls.insert_outage_call(&call).await?;
        tracing::info!(outage_call_id = %call.id, "Outage call opened");
        Ok(call)
    }

    pub async fn get_outage_call(&self, id: Uuid) -> Result<OutageCall, AppError> {
        self.oracle.outage_call(id).await
    }

    pub async fn list_outage_calls(
        &self,
        filter: &ListFilter,
        pagination: Pagination,
    ) -> Result<Page<OutageCall>, AppError> {
        self.oracle.ensure_team_ref(filter.team_id).await?;
        let rows = self.outage_calls.list_outage_calls(filter, pagination).await?;
        Ok(page(rows, pagination))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::services::pagination::normalize;
    use crate::store::fake::FakeStore;

    fn service(store: &Arc<FakeStore>) -> DirectoryService {
        DirectoryService::new(store.clone(), Arc::new(Validator::new()))
    }

    fn member_request(name: &str, team_id: Option<Uuid>) -> CreateMemberRequest {
        CreateMemberRequest {
            name: name.to_string(),
            email: None,
            team_id,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_member_requires_existing_team() {
        let store = Arc::new(FakeStore::new());
        let svc = service(&store);
        let ghost = Uuid::new_v4();

        assert_eq!(
            svc.create_member(member_request("edsger", Some(ghost)))
                .await
                .unwrap_err(),
            AppError::TeamNotFound(ghost)
        );
        assert!(store.members.lock().await.is_empty());

        let team = store.add_team("compilers", None).await;
        let member = svc
            .create_member(member_request("edsger", Some(team.id)))
            .await
            .unwrap();
        assert_eq!(member.team_id, Some(team.id));
    }

    #[tokio::test]
    async fn test_assign_member_team_checks_both_sides() {
        let store = Arc::new(FakeStore::new());
        let svc = service(&store);
        let member = store.add_member("donald", None).await;
        let team = store.add_team("typesetting", None).await;
        let ghost = Uuid::new_v4();

        assert_eq!(
            svc.assign_member_team(member.id, ghost).await.unwrap_err(),
            AppError::TeamNotFound(ghost)
        );
        assert_eq!(
            svc.assign_member_team(ghost, team.id).await.unwrap_err(),
            AppError::MemberNotFound(ghost)
        );
        let moved = svc.assign_member_team(member.id, team.id).await.unwrap();
        assert_eq!(moved.team_id, Some(team.id));
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let store = Arc::new(FakeStore::new());
        let svc = service(&store);

        let err = svc
            .create_team(CreateTeamRequest {
                name: "  ".to_string(),
                description: None,
                metadata: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = svc
            .create_component(CreateComponentRequest {
                name: "api".to_string(),
                title: None,
                description: None,
                owner_team_id: None,
                metadata: Some(json!("not an object")),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut request = member_request("john", None);
        request.email = Some("john-at-example".to_string());
        assert!(matches!(
            svc.create_member(request).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_list_teams_paginates_and_filters() {
        let store = Arc::new(FakeStore::new());
        let svc = service(&store);
        for i in 0..25 {
            store.add_team(&format!("team-{i:02}"), None).await;
        }
        store.add_team("zeta-payments", None).await;

        let page = svc
            .list_teams(&ListFilter::default(), normalize(2, 10))
            .await
            .unwrap();
        assert_eq!(page.total, 26);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.page, 2);
        assert_eq!(page.items[0].name, "team-10");

        let filter = ListFilter {
            name_contains: Some("PAY".to_string()),
            team_id: None,
        };
        let page = svc.list_teams(&filter, normalize(1, 20)).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "zeta-payments");
    }

    #[tokio::test]
    async fn test_outage_call_lifecycle() {
        let store = Arc::new(FakeStore::new());
        let svc = service(&store);

        let call = svc
            .create_outage_call(CreateOutageCallRequest {
                title: " checkout 500s ".to_string(),
                description: Some(String::new()),
                team_id: None,
            })
            .await
            .unwrap();
        assert_eq!(call.title, "checkout 500s");
        assert_eq!(call.description, None);
        assert_eq!(svc.get_outage_call(call.id).await.unwrap(), call);

        let ghost = Uuid::new_v4();
        assert_eq!(
            svc.get_outage_call(ghost).await.unwrap_err(),
            AppError::OutageCallNotFound(ghost)
        );
    }

    #[tokio::test]
    async fn test_delete_missing_team() {
        let store = Arc::new(FakeStore::new());
        let svc = service(&store);
        let ghost = Uuid::new_v4();
        assert_eq!(
            svc.delete_team(ghost).await.unwrap_err(),
            AppError::TeamNotFound(ghost)
        );
    }
}
