use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use crate::db::services as db_services;
use crate::services::{conflict_on_unique, ServiceError};
use crate::web::models::{AuthenticatedUser, Claims, LoginForm, RegisterForm};

pub const MIN_PASSWORD_LEN: usize = 8;
const SESSION_HOURS: i64 = 24;
const DUPLICATE_ACCOUNT: &str = "Username or email already exists.";

/// Checks a registration form before anything touches the database.
pub fn validate_registration(form: &RegisterForm) -> Result<(), ServiceError> {
    if form.username.trim().is_empty() || form.email.trim().is_empty() {
        return Err(ServiceError::InvalidInput(
            "Username and email are required.".to_string(),
        ));
    }
    if form.password != form.password2 {
        return Err(ServiceError::InvalidInput("Passwords do not match.".to_string()));
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::InvalidInput(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    Ok(())
}

/// Registers a user together with their profile.
///
/// If the profile cannot be created the user row is removed again, so a
/// failed registration never leaves a login without a profile behind.
pub async fn register_user(
    db: &DatabaseConnection,
    form: RegisterForm,
) -> Result<AuthenticatedUser, ServiceError> {
    validate_registration(&form)?;
    let username = form.username.trim();
    let email = form.email.trim();

    if db_services::find_user_by_username_or_email(db, username, email)
        .await?
        .is_some()
    {
        return Err(ServiceError::Conflict(DUPLICATE_ACCOUNT.to_string()));
    }

    let password_hash = hash(&form.password, DEFAULT_COST)
        .map_err(|e| ServiceError::PasswordHashing(e.to_string()))?;

    let user = db_services::create_user(db, username, email, &password_hash)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_ACCOUNT))?;

    let profile = match db_services::create_profile(db, user.id, username, email).await {
        Ok(profile) => profile,
        Err(e) => {
            error!(user_id = %user.id, error = %e, "Failed to create profile, removing user.");
            if let Err(cleanup) = db_services::delete_user(db, user.id).await {
                warn!(user_id = %user.id, error = %cleanup, "Failed to remove user after profile error.");
            }
            return Err(ServiceError::Db(e));
        }
    };

    info!(user_id = %user.id, profile_id = %profile.id, "Registered new user.");
    Ok(AuthenticatedUser {
        user_id: user.id,
        profile_id: profile.id,
        username: user.username,
    })
}

/// Verifies a username/password pair. Unknown users and wrong passwords give
/// the same error.
pub async fn login_user(
    db: &DatabaseConnection,
    form: LoginForm,
) -> Result<AuthenticatedUser, ServiceError> {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        return Err(ServiceError::InvalidCredentials);
    }

    let user = db_services::find_user_by_username(db, username)
        .await?
        .ok_or(ServiceError::InvalidCredentials)?;

    let valid_password = verify(&form.password, &user.password_hash)
        .map_err(|e| ServiceError::PasswordHashing(e.to_string()))?;
    if !valid_password {
        return Err(ServiceError::InvalidCredentials);
    }

    let profile = db_services::find_profile_by_user_id(db, user.id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Profile not found.".to_string()))?;

    Ok(AuthenticatedUser {
        user_id: user.id,
        profile_id: profile.id,
        username: user.username,
    })
}

pub fn create_session_token(
    user: &AuthenticatedUser,
    secret: &str,
) -> Result<String, ServiceError> {
    let expiration = (Utc::now() + Duration::hours(SESSION_HOURS)).timestamp() as usize;
    let claims = Claims {
        sub: user.username.clone(),
        user_id: user.user_id,
        profile_id: user.profile_id,
        exp: expiration,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| ServiceError::TokenCreation(e.to_string()))
}

/// Decodes a session token. Expired or tampered tokens yield `None`.
pub fn decode_session_token(token: &str, secret: &str) -> Option<AuthenticatedUser> {
    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    ) {
        Ok(data) => Some(AuthenticatedUser {
            user_id: data.claims.user_id,
            profile_id: data.claims.profile_id,
            username: data.claims.sub,
        }),
        Err(e) => {
            warn!(error = ?e, "Rejected session token.");
            None
        }
    }
}
