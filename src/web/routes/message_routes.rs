use axum::{
    extract::{Extension, Form, Path, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use uuid::Uuid;

use crate::services::account_service;
use crate::web::flash::{recover_with_flash, redirect_with_error, redirect_with_flash, take_flash, FlashLevel};
use crate::web::models::{Identity, MessageForm};
use crate::web::templates::base_context;
use crate::web::{AppState, error::AppError};

pub async fn inbox_page(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let inbox = match account_service::inbox(&app_state.db_pool, &identity).await {
        Ok(inbox) => inbox,
        Err(e) => return recover_with_flash(jar, e, "/profiles"),
    };
    let (jar, flashes) = take_flash(jar);
    let mut context = base_context(&identity, &flashes);
    context.insert("inbox", &inbox);
    Ok((jar, app_state.render("users/inbox.html", &context)?).into_response())
}

pub async fn message_page(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Path(message_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let message = match account_service::read_message(&app_state.db_pool, &identity, message_id).await {
        Ok(message) => message,
        Err(e) => return recover_with_flash(jar, e, "/inbox"),
    };
    let (jar, flashes) = take_flash(jar);
    let mut context = base_context(&identity, &flashes);
    context.insert("message", &message);
    Ok((jar, app_state.render("users/message.html", &context)?).into_response())
}

pub async fn create_message_form(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Path(recipient_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let recipient = match account_service::recipient(&app_state.db_pool, recipient_id).await {
        Ok(recipient) => recipient,
        Err(e) => return recover_with_flash(jar, e, "/profiles"),
    };
    let (jar, flashes) = take_flash(jar);
    let mut context = base_context(&identity, &flashes);
    context.insert("recipient", &recipient);
    Ok((jar, app_state.render("users/message_form.html", &context)?).into_response())
}

pub async fn create_message(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Path(recipient_id): Path<Uuid>,
    Form(form): Form<MessageForm>,
) -> Response {
    match account_service::send_message(&app_state.db_pool, &identity, recipient_id, form).await {
        Ok(_) => redirect_with_flash(
            jar,
            FlashLevel::Success,
            "Your message was successfully sent!",
            &format!("/profile/{recipient_id}"),
        ),
        Err(e) => redirect_with_error(jar, &e, &format!("/create-message/{recipient_id}")),
    }
}
