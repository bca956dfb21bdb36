//! Read-only JSON views of the public listings.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::services::account_service::{self, ProfileListing, ProfilePage};
use crate::services::portfolio_service::{self, ProjectListing};
use crate::web::models::ApiListingQuery;
use crate::web::{AppState, error::AppError};

const MAX_API_LIMIT: u64 = 50;

fn api_limit(query: &ApiListingQuery, default: u64) -> u64 {
    query.limit.unwrap_or(default).clamp(1, MAX_API_LIMIT)
}

pub async fn list_projects(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ApiListingQuery>,
) -> Result<Json<ProjectListing>, AppError> {
    let listing = portfolio_service::list_projects_page(
        &app_state.db_pool,
        &query.q,
        query.page_number(),
        api_limit(&query, app_state.config.page_size),
    )
    .await?;
    Ok(Json(listing))
}

pub async fn list_profiles(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ApiListingQuery>,
) -> Result<Json<ProfileListing>, AppError> {
    let listing = account_service::list_profiles_page(
        &app_state.db_pool,
        &query.q,
        query.page_number(),
        api_limit(&query, app_state.config.page_size),
    )
    .await?;
    Ok(Json(listing))
}

pub async fn get_profile(
    State(app_state): State<Arc<AppState>>,
    Path(profile_id): Path<Uuid>,
) -> Result<Json<ProfilePage>, AppError> {
    let page = account_service::profile_page(&app_state.db_pool, profile_id).await?;
    Ok(Json(page))
}

pub async fn health_check() -> &'static str {
    "OK"
}
