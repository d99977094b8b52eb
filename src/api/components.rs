//! Component API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use super::{created, pagination, success, ApiResult};
use crate::models::{ComponentSummary, ComponentView, CreateComponentRequest, ListQuery, Page};
use crate::AppState;

/// GET /api/components - List components, optionally filtered by owner team.
pub async fn list_components(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<ComponentSummary>> {
    let page = state
        .directory
        .list_components(&query.filter(), pagination(&query))
        .await?;
    success(page.map(|c| state.projector.component_summary(c)))
}

/// GET /api/components/{id} - Get a single component with its derived links.
pub async fn get_component(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ComponentView> {
    let component = state.directory.get_component(id).await?;
    success(state.projector.component_view(component))
}

/// POST /api/components - Register a component.
pub async fn create_component(
    State(state): State<AppState>,
    Json(request): Json<CreateComponentRequest>,
) -> ApiResult<ComponentView> {
    let component = state.directory.create_component(request).await?;
    created(state.projector.component_view(component))
}
