use axum::{
    extract::{Extension, Form, Path, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use uuid::Uuid;

use crate::services::account_service;
use crate::web::flash::{recover_with_flash, redirect_with_error, redirect_with_flash, take_flash, FlashLevel};
use crate::web::models::{AccountForm, AuthenticatedUser, Identity, SkillForm};
use crate::web::routes::auth_routes::start_session;
use crate::web::templates::base_context;
use crate::web::{AppState, error::AppError};

pub async fn account_page(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let page = match account_service::account(&app_state.db_pool, &identity).await {
        Ok(page) => page,
        Err(e) => return recover_with_flash(jar, e, "/profiles"),
    };
    let (jar, flashes) = take_flash(jar);
    let mut context = base_context(&identity, &flashes);
    context.insert("page", &page);
    Ok((jar, app_state.render("users/account.html", &context)?).into_response())
}

pub async fn edit_account_form(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let profile = match account_service::own_profile(&app_state.db_pool, &identity).await {
        Ok(profile) => profile,
        Err(e) => return recover_with_flash(jar, e, "/profiles"),
    };
    let (jar, flashes) = take_flash(jar);
    let mut context = base_context(&identity, &flashes);
    context.insert("profile", &profile);
    Ok((jar, app_state.render("users/profile_form.html", &context)?).into_response())
}

pub async fn edit_account(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Form(form): Form<AccountForm>,
) -> Result<Response, AppError> {
    let profile = match account_service::update_account(&app_state.db_pool, &identity, form).await {
        Ok(profile) => profile,
        Err(e) => return recover_with_flash(jar, e, "/edit-account"),
    };

    // The session carries the username, so a rename needs a fresh token.
    let jar = match identity.user() {
        Some(user) if user.username != profile.username => {
            let renamed = AuthenticatedUser {
                username: profile.username.clone(),
                ..user.clone()
            };
            start_session(&app_state, jar, &renamed)?
        }
        _ => jar,
    };
    Ok(redirect_with_flash(
        jar,
        FlashLevel::Success,
        "Account was updated successfully!",
        "/account",
    ))
}

fn render_skill_form(
    app_state: &AppState,
    identity: &Identity,
    jar: CookieJar,
    action: &str,
    values: &serde_json::Value,
) -> Result<Response, AppError> {
    let (jar, flashes) = take_flash(jar);
    let mut context = base_context(identity, &flashes);
    context.insert("action", action);
    context.insert("values", values);
    Ok((jar, app_state.render("users/skill_form.html", &context)?).into_response())
}

pub async fn create_skill_form(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    render_skill_form(&app_state, &identity, jar, "/create-skill", &serde_json::json!({}))
}

pub async fn create_skill(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Form(form): Form<SkillForm>,
) -> Response {
    match account_service::create_skill(&app_state.db_pool, &identity, form).await {
        Ok(_) => redirect_with_flash(jar, FlashLevel::Success, "Skill was added successfully!", "/account"),
        Err(e) => redirect_with_error(jar, &e, "/create-skill"),
    }
}

pub async fn update_skill_form(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Path(skill_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let skill = match account_service::owned_skill(&app_state.db_pool, &identity, skill_id).await {
        Ok(skill) => skill,
        Err(e) => return recover_with_flash(jar, e, "/account"),
    };
    let values = serde_json::json!({
        "name": skill.name,
        "description": skill.description,
    });
    render_skill_form(
        &app_state,
        &identity,
        jar,
        &format!("/update-skill/{skill_id}"),
        &values,
    )
}

pub async fn update_skill(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Path(skill_id): Path<Uuid>,
    Form(form): Form<SkillForm>,
) -> Response {
    match account_service::update_skill(&app_state.db_pool, &identity, skill_id, form).await {
        Ok(_) => redirect_with_flash(jar, FlashLevel::Success, "Skill was updated successfully!", "/account"),
        Err(e) => redirect_with_error(jar, &e, &format!("/update-skill/{skill_id}")),
    }
}

pub async fn delete_skill_form(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Path(skill_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let skill = match account_service::owned_skill(&app_state.db_pool, &identity, skill_id).await {
        Ok(skill) => skill,
        Err(e) => return recover_with_flash(jar, e, "/account"),
    };
    let (jar, flashes) = take_flash(jar);
    let mut context = base_context(&identity, &flashes);
    context.insert("object_name", &skill.name);
    context.insert("action", &format!("/delete-skill/{skill_id}"));
    context.insert("back", "/account");
    Ok((jar, app_state.render("delete.html", &context)?).into_response())
}

pub async fn delete_skill(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Path(skill_id): Path<Uuid>,
) -> Response {
    match account_service::delete_skill(&app_state.db_pool, &identity, skill_id).await {
        Ok(()) => redirect_with_flash(jar, FlashLevel::Success, "Skill was deleted successfully!", "/account"),
        Err(e) => redirect_with_error(jar, &e, "/account"),
    }
}
