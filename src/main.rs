//! Developer Portal Backend
//!
//! REST backend for teams, members, components and outage-call assignments with SQLite
//! persistence.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod services;
mod store;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Config, LogFormat};
use db::Repository;
use services::{
    AssignmentService, DirectoryService, ExistenceOracle, MetadataService, Projector, Validator,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub directory: DirectoryService,
    pub assignments: AssignmentService,
    pub metadata: MetadataService,
    pub projector: Arc<Projector>,
    pub validator: Arc<Validator>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire every service onto one repository.
    pub fn new(repo: Arc<Repository>, config: Config) -> Self {
        let validator = Arc::new(Validator::new());
        Self {
            directory: DirectoryService::new(repo.clone(), validator.clone()),
            assignments: AssignmentService::new(
                ExistenceOracle::from_store(repo.clone()),
                repo.clone(),
                validator.clone(),
            ),
            metadata: MetadataService::new(repo.clone(), repo, validator.clone()),
            projector: Arc::new(Projector::new(config.sonar_base_url.clone())),
            validator,
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    init_logging(&config);

    tracing::info!("Starting Developer Portal Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_key.is_none() {
        tracing::warn!("No API key configured (DEVPORTAL_API_KEY). Authentication is disabled!");
    }

    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let bind_addr = config.bind_addr;
    let app = create_router(AppState::new(repo, config));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_key = state.config.api_key.clone();

    let api_routes = Router::new()
        // Teams
        .route("/teams", get(api::list_teams).post(api::create_team))
        .route("/teams/{id}", get(api::get_team).delete(api::delete_team))
        .route("/teams/{id}/metadata", patch(api::merge_team_metadata))
        // Members
        .route("/members", get(api::list_members).post(api::create_member))
        .route(
            "/members/{id}",
            get(api::get_member).delete(api::delete_member),
        )
        .route(
            "/members/{id}/metadata",
            patch(api::merge_member_metadata),
        )
        .route("/members/{id}/team", put(api::assign_member_team))
        .route(
            "/members/{id}/assignments",
            get(api::list_member_assignments),
        )
        .route("/members/{id}/workload", get(api::get_member_workload))
        // Components
        .route(
            "/components",
            get(api::list_components).post(api::create_component),
        )
        .route("/components/{id}", get(api::get_component))
        // Outage calls
        .route(
            "/outage-calls",
            get(api::list_outage_calls).post(api::create_outage_call),
        )
        .route("/outage-calls/{id}", get(api::get_outage_call))
        // Assignees
        .route(
            "/outage-calls/{id}/assignees",
            get(api::list_assignees).post(api::create_assignee),
        )
        .route("/outage-calls/{id}/assignees/bulk", post(api::bulk_assign))
        .route(
            "/outage-calls/{id}/assignees/bulk-unassign",
            post(api::bulk_unassign),
        )
        .route(
            "/outage-calls/{id}/assignees/stats",
            get(api::assignee_stats),
        )
        .route(
            "/outage-calls/{id}/assignees/{member_id}",
            get(api::get_assignee)
                .patch(api::update_assignee)
                .delete(api::delete_assignee),
        )
        .layer(middleware::from_fn(move |req, next| {
            auth::api_key_layer(api_key.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
