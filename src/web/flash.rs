//! One-shot messages carried across a redirect in a cookie.

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::services::ServiceError;
use crate::web::error::AppError;

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

/// Messages currently stored in the jar. A malformed cookie reads as empty.
pub fn read_flash(jar: &CookieJar) -> Vec<FlashMessage> {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return Vec::new();
    };
    urlencoding::decode(cookie.value())
        .ok()
        .and_then(|json| serde_json::from_str(&json).ok())
        .unwrap_or_default()
}

/// Appends a message to the flash cookie.
pub fn push_flash(jar: CookieJar, level: FlashLevel, text: impl Into<String>) -> CookieJar {
    let mut messages = read_flash(&jar);
    messages.push(FlashMessage {
        level,
        text: text.into(),
    });
    let json = match serde_json::to_string(&messages) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "Failed to encode flash messages.");
            return jar;
        }
    };
    let cookie = Cookie::build((FLASH_COOKIE, urlencoding::encode(&json).into_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

/// Reads the pending messages and expires the cookie.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Vec<FlashMessage>) {
    let messages = read_flash(&jar);
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, messages);
    }
    let expired = Cookie::build((FLASH_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    (jar.add(expired), messages)
}

/// `303 See Other` to `to`, carrying one flash message.
pub fn redirect_with_flash(
    jar: CookieJar,
    level: FlashLevel,
    text: impl Into<String>,
    to: &str,
) -> Response {
    (push_flash(jar, level, text), Redirect::to(to)).into_response()
}

/// Turns a failed use case into an error flash and a redirect.
pub fn redirect_with_error(jar: CookieJar, err: &ServiceError, to: &str) -> Response {
    let text = match err {
        ServiceError::NotFound(msg)
        | ServiceError::Forbidden(msg)
        | ServiceError::InvalidInput(msg)
        | ServiceError::Conflict(msg) => msg.clone(),
        ServiceError::InvalidCredentials => "Username or password is incorrect.".to_string(),
        other => {
            warn!(error = %other, "Request failed.");
            "Something went wrong, please try again.".to_string()
        }
    };
    redirect_with_flash(jar, FlashLevel::Error, text, to)
}

/// Page handlers' error path: user-facing failures become a flash and a
/// redirect to `to`, internal failures stay server errors.
pub fn recover_with_flash(jar: CookieJar, err: ServiceError, to: &str) -> Result<Response, AppError> {
    match err {
        ServiceError::Db(_) | ServiceError::PasswordHashing(_) | ServiceError::TokenCreation(_) => {
            Err(AppError::from(err))
        }
        other => Ok(redirect_with_error(jar, &other, to)),
    }
}
