use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    ModelTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::db::entities::skill;

// --- Skill Service Functions ---

pub async fn create_skill<C: ConnectionTrait>(
    db: &C,
    owner_id: Uuid,
    name: &str,
    description: Option<String>,
) -> Result<skill::Model, DbErr> {
    let now = Utc::now();
    let new_skill = skill::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner_id),
        name: Set(name.to_owned()),
        description: Set(description),
        created_at: Set(now),
        updated_at: Set(now),
    };
    new_skill.insert(db).await
}

/// Finds a skill only if it belongs to `owner_id`.
pub async fn find_owned_skill<C: ConnectionTrait>(
    db: &C,
    skill_id: Uuid,
    owner_id: Uuid,
) -> Result<Option<skill::Model>, DbErr> {
    skill::Entity::find_by_id(skill_id)
        .filter(skill::Column::OwnerId.eq(owner_id))
        .one(db)
        .await
}

pub async fn update_skill<C: ConnectionTrait>(
    db: &C,
    existing: skill::Model,
    name: &str,
    description: Option<String>,
) -> Result<skill::Model, DbErr> {
    let mut active = existing.into_active_model();
    active.name = Set(name.to_owned());
    active.description = Set(description);
    active.updated_at = Set(Utc::now());
    active.update(db).await
}

pub async fn delete_skill<C: ConnectionTrait>(db: &C, existing: skill::Model) -> Result<u64, DbErr> {
    let result = existing.delete(db).await?;
    Ok(result.rows_affected)
}
