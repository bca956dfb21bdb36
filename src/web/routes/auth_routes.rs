use axum::{
    extract::{Extension, Form, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use tracing::info;

use crate::services::auth_service;
use crate::web::flash::{recover_with_flash, redirect_with_flash, take_flash, FlashLevel};
use crate::web::middleware::auth::SESSION_COOKIE;
use crate::web::models::{AuthenticatedUser, Identity, LoginForm, RegisterForm};
use crate::web::templates::base_context;
use crate::web::{AppState, error::AppError};

/// Issues the session cookie for `user`.
pub(crate) fn start_session(
    app_state: &AppState,
    jar: CookieJar,
    user: &AuthenticatedUser,
) -> Result<CookieJar, AppError> {
    let token = auth_service::create_session_token(user, &app_state.config.session_secret)?;
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(app_state.config.secure_cookies)
        .max_age(time::Duration::hours(24))
        .build();
    Ok(jar.add(cookie))
}

fn render_auth_page(
    app_state: &AppState,
    identity: &Identity,
    jar: CookieJar,
    page: &str,
) -> Result<Response, AppError> {
    if identity.is_authenticated() {
        return Ok(Redirect::to("/profiles").into_response());
    }
    let (jar, flashes) = take_flash(jar);
    let mut context = base_context(identity, &flashes);
    context.insert("page", page);
    Ok((jar, app_state.render("users/login_register.html", &context)?).into_response())
}

pub async fn login_form(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    render_auth_page(&app_state, &identity, jar, "login")
}

pub async fn register_form(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    render_auth_page(&app_state, &identity, jar, "register")
}

pub async fn login(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let user = match auth_service::login_user(&app_state.db_pool, form).await {
        Ok(user) => user,
        Err(e) => return recover_with_flash(jar, e, "/login"),
    };
    info!(user_id = %user.user_id, "User logged in.");
    let jar = start_session(&app_state, jar, &user)?;
    Ok(redirect_with_flash(jar, FlashLevel::Info, "User was logged in!", "/profiles"))
}

pub async fn register(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let user = match auth_service::register_user(&app_state.db_pool, form).await {
        Ok(user) => user,
        Err(e) => return recover_with_flash(jar, e, "/register"),
    };
    let jar = start_session(&app_state, jar, &user)?;
    Ok(redirect_with_flash(
        jar,
        FlashLevel::Success,
        "User account was created!",
        "/edit-account",
    ))
}

pub async fn logout(jar: CookieJar) -> Response {
    let expired = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    redirect_with_flash(jar.add(expired), FlashLevel::Info, "User was logged out!", "/login")
}
