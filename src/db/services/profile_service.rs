use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::db::entities::{profile, skill};
use crate::db::models::{ProfileCard, ProfileDetail};
use crate::db::services::{projects_for_owner, search_condition};

const SEARCH_COLUMNS: [profile::Column; 3] = [
    profile::Column::Name,
    profile::Column::ShortIntro,
    profile::Column::Bio,
];

/// Profile fields the owner can edit from the account form.
#[derive(Debug, Clone, Default)]
pub struct ProfileFields {
    pub name: String,
    pub email: String,
    pub username: String,
    pub location: Option<String>,
    pub short_intro: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub social_github: Option<String>,
    pub social_linkedin: Option<String>,
    pub social_website: Option<String>,
}

// --- Profile Service Functions ---

/// Creates the initial profile of a freshly registered user.
pub async fn create_profile<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    username: &str,
    email: &str,
) -> Result<profile::Model, DbErr> {
    let now = Utc::now();
    let new_profile = profile::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        name: Set(username.to_owned()),
        email: Set(email.to_owned()),
        username: Set(username.to_owned()),
        location: Set(None),
        short_intro: Set(None),
        bio: Set(None),
        profile_image: Set(profile::DEFAULT_PROFILE_IMAGE.to_string()),
        social_github: Set(None),
        social_linkedin: Set(None),
        social_website: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    new_profile.insert(db).await
}

pub async fn find_profile_by_id<C: ConnectionTrait>(
    db: &C,
    profile_id: Uuid,
) -> Result<Option<profile::Model>, DbErr> {
    profile::Entity::find_by_id(profile_id).one(db).await
}

pub async fn find_profile_by_user_id<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> Result<Option<profile::Model>, DbErr> {
    profile::Entity::find()
        .filter(profile::Column::UserId.eq(user_id))
        .one(db)
        .await
}

pub async fn count_profiles<C: ConnectionTrait>(db: &C, search: &str) -> Result<u64, DbErr> {
    let mut query = profile::Entity::find();
    if let Some(cond) = search_condition(&SEARCH_COLUMNS, search) {
        query = query.filter(cond);
    }
    query.count(db).await
}

/// One page of profiles matching `search`, oldest first, each with its skills.
pub async fn list_profiles<C: ConnectionTrait>(
    db: &C,
    search: &str,
    offset: u64,
    limit: u64,
) -> Result<Vec<ProfileCard>, DbErr> {
    let mut query = profile::Entity::find();
    if let Some(cond) = search_condition(&SEARCH_COLUMNS, search) {
        query = query.filter(cond);
    }

    let profiles = query
        .order_by_asc(profile::Column::CreatedAt)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;

    let ids: Vec<Uuid> = profiles.iter().map(|p| p.id).collect();
    let mut skills = skills_for_profiles(db, &ids).await?;

    Ok(profiles
        .into_iter()
        .map(|profile| ProfileCard {
            skills: skills.remove(&profile.id).unwrap_or_default(),
            profile,
        })
        .collect())
}

/// Loads a profile with its skills and projects (projects carry their tags).
pub async fn load_profile_detail<C: ConnectionTrait>(
    db: &C,
    profile_id: Uuid,
) -> Result<Option<ProfileDetail>, DbErr> {
    let Some(profile) = find_profile_by_id(db, profile_id).await? else {
        return Ok(None);
    };
    let mut skills = skills_for_profiles(db, &[profile_id]).await?;
    let projects = projects_for_owner(db, profile_id).await?;
    Ok(Some(ProfileDetail {
        skills: skills.remove(&profile_id).unwrap_or_default(),
        projects,
        profile,
    }))
}

async fn skills_for_profiles<C: ConnectionTrait>(
    db: &C,
    profile_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<skill::Model>>, DbErr> {
    if profile_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let skills = skill::Entity::find()
        .filter(skill::Column::OwnerId.is_in(profile_ids.iter().copied()))
        .order_by_asc(skill::Column::CreatedAt)
        .all(db)
        .await?;
    let mut map: HashMap<Uuid, Vec<skill::Model>> = HashMap::new();
    for skill in skills {
        map.entry(skill.owner_id).or_default().push(skill);
    }
    Ok(map)
}

/// Overwrites the editable profile fields. A `None` image keeps the current one.
pub async fn update_profile<C: ConnectionTrait>(
    db: &C,
    existing: profile::Model,
    fields: ProfileFields,
) -> Result<profile::Model, DbErr> {
    let mut active = existing.into_active_model();
    active.name = Set(fields.name);
    active.email = Set(fields.email);
    active.username = Set(fields.username);
    active.location = Set(fields.location);
    active.short_intro = Set(fields.short_intro);
    active.bio = Set(fields.bio);
    if let Some(image) = fields.profile_image {
        active.profile_image = Set(image);
    }
    active.social_github = Set(fields.social_github);
    active.social_linkedin = Set(fields.social_linkedin);
    active.social_website = Set(fields.social_website);
    active.updated_at = Set(Utc::now());
    active.update(db).await
}
