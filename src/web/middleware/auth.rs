use axum::{
    body::Body as AxumBody,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::debug;

use crate::services::auth_service;
use crate::web::flash::{redirect_with_flash, FlashLevel};
use crate::web::models::Identity;
use crate::web::AppState;

pub const SESSION_COOKIE: &str = "session";

/// Resolves the session cookie into an `Identity` request extension.
/// Missing or invalid sessions make the request anonymous.
pub async fn identify(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Response {
    let identity = jar
        .get(SESSION_COOKIE)
        .and_then(|c| auth_service::decode_session_token(c.value(), &state.config.session_secret))
        .map(Identity::User)
        .unwrap_or_default();
    req.extensions_mut().insert(identity);
    next.run(req).await
}

/// Sends anonymous visitors to the login page.
pub async fn require_auth(jar: CookieJar, req: Request<AxumBody>, next: Next) -> Response {
    let authenticated = req
        .extensions()
        .get::<Identity>()
        .is_some_and(Identity::is_authenticated);
    if !authenticated {
        debug!(path = %req.uri().path(), "Anonymous request to a protected page.");
        return redirect_with_flash(jar, FlashLevel::Error, "Please log in first.", "/login");
    }
    next.run(req).await
}
