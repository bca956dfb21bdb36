use axum::{
    extract::{Extension, Form, Path, Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use uuid::Uuid;

use crate::services::portfolio_service;
use crate::web::flash::{recover_with_flash, redirect_with_error, redirect_with_flash, take_flash, FlashLevel};
use crate::web::models::{Identity, ListingQuery, ProjectForm, ReviewForm};
use crate::web::templates::base_context;
use crate::web::{AppState, error::AppError};

pub async fn projects_page(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Query(query): Query<ListingQuery>,
) -> Result<Response, AppError> {
    let listing = portfolio_service::list_projects_page(
        &app_state.db_pool,
        &query.search_query,
        query.page_number(),
        app_state.config.page_size,
    )
    .await?;

    let (jar, flashes) = take_flash(jar);
    let mut context = base_context(&identity, &flashes);
    context.insert("listing", &listing);
    Ok((jar, app_state.render("projects.html", &context)?).into_response())
}

pub async fn project_page(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Path(project_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let detail = match portfolio_service::project_detail(&app_state.db_pool, project_id).await {
        Ok(detail) => detail,
        Err(e) => return recover_with_flash(jar, e, "/projects"),
    };

    let viewer = identity.profile_id();
    let is_owner = viewer == Some(detail.project.owner_id);
    let has_reviewed = viewer
        .is_some_and(|id| detail.reviews.iter().any(|r| r.review.owner_id == id));

    let (jar, flashes) = take_flash(jar);
    let mut context = base_context(&identity, &flashes);
    context.insert("detail", &detail);
    context.insert("is_owner", &is_owner);
    context.insert("has_reviewed", &has_reviewed);
    Ok((jar, app_state.render("single_project.html", &context)?).into_response())
}

pub async fn submit_review(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Path(project_id): Path<Uuid>,
    Form(form): Form<ReviewForm>,
) -> Response {
    let back = format!("/project/{project_id}");
    if !identity.is_authenticated() {
        return redirect_with_flash(jar, FlashLevel::Error, "Please log in to leave a review.", "/login");
    }
    match portfolio_service::add_review(&app_state.db_pool, &identity, project_id, form).await {
        Ok(_) => redirect_with_flash(
            jar,
            FlashLevel::Success,
            "Your review was successfully submitted!",
            &back,
        ),
        Err(e) => redirect_with_error(jar, &e, &back),
    }
}

fn render_project_form(
    app_state: &AppState,
    identity: &Identity,
    jar: CookieJar,
    form_title: &str,
    action: &str,
    values: &serde_json::Value,
) -> Result<Response, AppError> {
    let (jar, flashes) = take_flash(jar);
    let mut context = base_context(identity, &flashes);
    context.insert("form_title", form_title);
    context.insert("action", action);
    context.insert("values", values);
    Ok((jar, app_state.render("project_form.html", &context)?).into_response())
}

pub async fn create_project_form(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    render_project_form(
        &app_state,
        &identity,
        jar,
        "Create Project",
        "/create-project",
        &serde_json::json!({}),
    )
}

pub async fn create_project(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Form(form): Form<ProjectForm>,
) -> Response {
    match portfolio_service::create_project(&app_state.db_pool, &identity, form).await {
        Ok(_) => redirect_with_flash(jar, FlashLevel::Success, "Project was created!", "/account"),
        Err(e) => redirect_with_error(jar, &e, "/create-project"),
    }
}

pub async fn update_project_form(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Path(project_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let detail = match portfolio_service::owned_project(&app_state.db_pool, &identity, project_id).await {
        Ok(detail) => detail,
        Err(e) => return recover_with_flash(jar, e, "/projects"),
    };
    let tags: Vec<&str> = detail.tags.iter().map(|t| t.name.as_str()).collect();
    let values = serde_json::json!({
        "title": detail.project.title,
        "description": detail.project.description,
        "featured_image": detail.project.featured_image,
        "demo_link": detail.project.demo_link,
        "source_link": detail.project.source_link,
        "tags": tags.join(", "),
    });
    render_project_form(
        &app_state,
        &identity,
        jar,
        "Update Project",
        &format!("/update-project/{project_id}"),
        &values,
    )
}

pub async fn update_project(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Path(project_id): Path<Uuid>,
    Form(form): Form<ProjectForm>,
) -> Response {
    match portfolio_service::update_project(&app_state.db_pool, &identity, project_id, form).await {
        Ok(_) => redirect_with_flash(jar, FlashLevel::Success, "Project was updated!", "/account"),
        Err(e) => redirect_with_error(jar, &e, &format!("/update-project/{project_id}")),
    }
}

pub async fn delete_project_form(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Path(project_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let detail = match portfolio_service::owned_project(&app_state.db_pool, &identity, project_id).await {
        Ok(detail) => detail,
        Err(e) => return recover_with_flash(jar, e, "/projects"),
    };
    let (jar, flashes) = take_flash(jar);
    let mut context = base_context(&identity, &flashes);
    context.insert("object_name", &detail.project.title);
    context.insert("action", &format!("/delete-project/{project_id}"));
    context.insert("back", "/account");
    Ok((jar, app_state.render("delete.html", &context)?).into_response())
}

pub async fn delete_project(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Path(project_id): Path<Uuid>,
) -> Response {
    match portfolio_service::delete_project(&app_state.db_pool, &identity, project_id).await {
        Ok(()) => redirect_with_flash(jar, FlashLevel::Success, "Project was deleted!", "/account"),
        Err(e) => redirect_with_error(jar, &e, "/account"),
    }
}
