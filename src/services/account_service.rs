//! Profile, skill and inbox use cases.

use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::db::entities::{message, profile, skill};
use crate::db::models::{Inbox, ProfileCard, ProfileDetail, ProjectCard};
use crate::db::services::{self as db_services, NewMessage, ProfileFields};
use crate::services::pagination::{offset_for, paginate, Pagination};
use crate::services::{non_empty, required, ServiceError};
use crate::web::models::{AccountForm, AuthenticatedUser, Identity, MessageForm, SkillForm};

#[derive(Debug, Clone, Serialize)]
pub struct ProfileListing {
    pub profiles: Vec<ProfileCard>,
    pub pagination: Pagination,
    pub search_query: String,
}

/// A profile page: skills with a description are featured as top skills.
#[derive(Debug, Clone, Serialize)]
pub struct ProfilePage {
    pub profile: profile::Model,
    pub top_skills: Vec<skill::Model>,
    pub other_skills: Vec<skill::Model>,
    pub projects: Vec<ProjectCard>,
}

impl From<ProfileDetail> for ProfilePage {
    fn from(detail: ProfileDetail) -> Self {
        let (top_skills, other_skills) = split_skills(detail.skills);
        ProfilePage {
            profile: detail.profile,
            top_skills,
            other_skills,
            projects: detail.projects,
        }
    }
}

pub fn split_skills(skills: Vec<skill::Model>) -> (Vec<skill::Model>, Vec<skill::Model>) {
    skills.into_iter().partition(|s| {
        s.description
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty())
    })
}

fn require_user(identity: &Identity) -> Result<&AuthenticatedUser, ServiceError> {
    identity
        .user()
        .ok_or_else(|| ServiceError::Forbidden("You must be logged in.".to_string()))
}

// --- Profiles ---

pub async fn list_profiles_page(
    db: &DatabaseConnection,
    search: &str,
    page: i64,
    page_size: u64,
) -> Result<ProfileListing, ServiceError> {
    let search = search.trim();
    let total = db_services::count_profiles(db, search).await?;
    let pagination = paginate(page, total, page_size);
    let offset = offset_for(pagination.current_page, page_size);
    let profiles = db_services::list_profiles(db, search, offset, page_size.max(1)).await?;
    Ok(ProfileListing {
        profiles,
        pagination,
        search_query: search.to_string(),
    })
}

pub async fn profile_page(
    db: &DatabaseConnection,
    profile_id: Uuid,
) -> Result<ProfilePage, ServiceError> {
    db_services::load_profile_detail(db, profile_id)
        .await?
        .map(ProfilePage::from)
        .ok_or_else(|| ServiceError::NotFound("Profile not found.".to_string()))
}

/// The account page of the acting user.
pub async fn account(
    db: &DatabaseConnection,
    identity: &Identity,
) -> Result<ProfilePage, ServiceError> {
    let user = require_user(identity)?;
    profile_page(db, user.profile_id).await
}

pub async fn own_profile(
    db: &DatabaseConnection,
    identity: &Identity,
) -> Result<profile::Model, ServiceError> {
    let user = require_user(identity)?;
    db_services::find_profile_by_id(db, user.profile_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Profile not found.".to_string()))
}

/// Updates the acting user's profile and keeps the login username in step.
pub async fn update_account(
    db: &DatabaseConnection,
    identity: &Identity,
    form: AccountForm,
) -> Result<profile::Model, ServiceError> {
    let user = require_user(identity)?;
    let fields = ProfileFields {
        name: required(&form.name, "Name")?,
        email: required(&form.email, "Email")?,
        username: required(&form.username, "Username")?,
        location: non_empty(form.location),
        short_intro: non_empty(form.short_intro),
        bio: non_empty(form.bio),
        profile_image: non_empty(form.profile_image),
        social_github: non_empty(form.social_github),
        social_linkedin: non_empty(form.social_linkedin),
        social_website: non_empty(form.social_website),
    };

    let existing = db_services::find_profile_by_id(db, user.profile_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Profile not found.".to_string()))?;

    if fields.username != user.username {
        if let Some(taken) = db_services::find_user_by_username(db, &fields.username).await? {
            if taken.id != user.user_id {
                return Err(ServiceError::Conflict("Username is already taken.".to_string()));
            }
        }
    }

    let new_username = fields.username.clone();
    let updated = db_services::update_profile(db, existing, fields).await?;

    let account = db_services::find_user_by_id(db, user.user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found.".to_string()))?;
    if account.username != new_username {
        db_services::update_username(db, account, &new_username).await?;
    }

    info!(profile_id = %updated.id, "Account updated.");
    Ok(updated)
}

// --- Skills ---

pub async fn create_skill(
    db: &DatabaseConnection,
    identity: &Identity,
    form: SkillForm,
) -> Result<skill::Model, ServiceError> {
    let user = require_user(identity)?;
    let name = required(&form.name, "Skill name")?;
    let skill =
        db_services::create_skill(db, user.profile_id, &name, non_empty(form.description)).await?;
    Ok(skill)
}

/// Loads a skill of the acting user. Skills of other users look missing.
pub async fn owned_skill(
    db: &DatabaseConnection,
    identity: &Identity,
    skill_id: Uuid,
) -> Result<skill::Model, ServiceError> {
    let user = require_user(identity)?;
    db_services::find_owned_skill(db, skill_id, user.profile_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Skill not found.".to_string()))
}

pub async fn update_skill(
    db: &DatabaseConnection,
    identity: &Identity,
    skill_id: Uuid,
    form: SkillForm,
) -> Result<skill::Model, ServiceError> {
    let existing = owned_skill(db, identity, skill_id).await?;
    let name = required(&form.name, "Skill name")?;
    let skill =
        db_services::update_skill(db, existing, &name, non_empty(form.description)).await?;
    Ok(skill)
}

pub async fn delete_skill(
    db: &DatabaseConnection,
    identity: &Identity,
    skill_id: Uuid,
) -> Result<(), ServiceError> {
    let existing = owned_skill(db, identity, skill_id).await?;
    db_services::delete_skill(db, existing).await?;
    Ok(())
}

// --- Messages ---

pub async fn inbox(db: &DatabaseConnection, identity: &Identity) -> Result<Inbox, ServiceError> {
    let user = require_user(identity)?;
    let messages = db_services::messages_for_recipient(db, user.profile_id).await?;
    let unread_count = db_services::unread_message_count(db, user.profile_id).await?;
    Ok(Inbox {
        messages,
        unread_count,
    })
}

/// Opens a message of the acting user's inbox, marking it read.
pub async fn read_message(
    db: &DatabaseConnection,
    identity: &Identity,
    message_id: Uuid,
) -> Result<message::Model, ServiceError> {
    let user = require_user(identity)?;
    let message = db_services::find_message_for_recipient(db, message_id, user.profile_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Message not found.".to_string()))?;
    if message.is_read {
        return Ok(message);
    }
    Ok(db_services::mark_message_read(db, message).await?)
}

/// Resolves who a message is from. A logged in sender's profile name and
/// email win over whatever the form says.
pub fn message_from(
    sender: Option<&profile::Model>,
    recipient_id: Uuid,
    form: MessageForm,
) -> Result<NewMessage, ServiceError> {
    let subject = required(&form.subject, "Subject")?;
    let body = required(&form.body, "Message")?;
    let (sender_id, name, email) = match sender {
        Some(profile) => (Some(profile.id), profile.name.clone(), profile.email.clone()),
        None => (
            None,
            required(form.name.as_deref().unwrap_or_default(), "Name")?,
            required(form.email.as_deref().unwrap_or_default(), "Email")?,
        ),
    };
    Ok(NewMessage {
        sender_id,
        recipient_id,
        name,
        email,
        subject,
        body,
    })
}

pub async fn recipient(
    db: &DatabaseConnection,
    profile_id: Uuid,
) -> Result<profile::Model, ServiceError> {
    db_services::find_profile_by_id(db, profile_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Recipient not found.".to_string()))
}

pub async fn send_message(
    db: &DatabaseConnection,
    identity: &Identity,
    recipient_id: Uuid,
    form: MessageForm,
) -> Result<message::Model, ServiceError> {
    let recipient = recipient(db, recipient_id).await?;

    let sender = match identity.profile_id() {
        Some(profile_id) => db_services::find_profile_by_id(db, profile_id).await?,
        None => None,
    };

    let new_message = message_from(sender.as_ref(), recipient.id, form)?;
    let message = db_services::create_message(db, new_message).await?;
    info!(message_id = %message.id, recipient_id = %recipient.id, "Message sent.");
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn skill_with(description: Option<&str>) -> skill::Model {
        skill::Model {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Rust".into(),
            description: description.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sender_profile() -> profile::Model {
        profile::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Grace Hopper".into(),
            email: "grace@example.com".into(),
            username: "grace".into(),
            location: None,
            short_intro: None,
            bio: None,
            profile_image: profile::DEFAULT_PROFILE_IMAGE.into(),
            social_github: None,
            social_linkedin: None,
            social_website: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn form() -> MessageForm {
        MessageForm {
            name: Some("Someone".into()),
            email: Some("someone@example.com".into()),
            subject: "Hello".into(),
            body: "Nice project".into(),
        }
    }

    #[test]
    fn test_split_skills_by_description() {
        let (top, other) = split_skills(vec![
            skill_with(Some("Systems work")),
            skill_with(None),
            skill_with(Some("  ")),
            skill_with(Some("Web")),
        ]);
        assert_eq!(top.len(), 2);
        assert_eq!(other.len(), 2);
    }

    #[test]
    fn test_message_from_logged_in_sender_uses_profile() {
        let sender = sender_profile();
        let recipient = Uuid::new_v4();
        let message = message_from(Some(&sender), recipient, form()).unwrap();
        assert_eq!(message.sender_id, Some(sender.id));
        assert_eq!(message.name, "Grace Hopper");
        assert_eq!(message.email, "grace@example.com");
        assert_eq!(message.recipient_id, recipient);
    }

    #[test]
    fn test_message_from_anonymous_requires_contact() {
        let message = message_from(None, Uuid::new_v4(), form()).unwrap();
        assert_eq!(message.sender_id, None);
        assert_eq!(message.name, "Someone");

        let mut missing = form();
        missing.email = None;
        assert!(matches!(
            message_from(None, Uuid::new_v4(), missing),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_message_requires_subject_and_body() {
        let mut blank = form();
        blank.body = "   ".into();
        assert!(message_from(None, Uuid::new_v4(), blank).is_err());
    }
}
