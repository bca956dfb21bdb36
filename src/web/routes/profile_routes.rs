use axum::{
    extract::{Extension, Path, Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use uuid::Uuid;

use crate::services::account_service;
use crate::web::flash::{recover_with_flash, take_flash};
use crate::web::models::{Identity, ListingQuery};
use crate::web::templates::base_context;
use crate::web::{AppState, error::AppError};

pub async fn profiles_page(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Query(query): Query<ListingQuery>,
) -> Result<Response, AppError> {
    let listing = account_service::list_profiles_page(
        &app_state.db_pool,
        &query.search_query,
        query.page_number(),
        app_state.config.page_size,
    )
    .await?;

    let (jar, flashes) = take_flash(jar);
    let mut context = base_context(&identity, &flashes);
    context.insert("listing", &listing);
    Ok((jar, app_state.render("users/profiles.html", &context)?).into_response())
}

pub async fn profile_page(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Path(profile_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let page = match account_service::profile_page(&app_state.db_pool, profile_id).await {
        Ok(page) => page,
        Err(e) => return recover_with_flash(jar, e, "/profiles"),
    };

    let (jar, flashes) = take_flash(jar);
    let mut context = base_context(&identity, &flashes);
    context.insert("page", &page);
    context.insert("is_self", &(identity.profile_id() == Some(profile_id)));
    Ok((jar, app_state.render("users/user_profile.html", &context)?).into_response())
}
