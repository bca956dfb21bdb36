use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use crate::db::entities::review::{self, VoteValue};

// --- Review Service Functions ---

pub async fn create_review<C: ConnectionTrait>(
    db: &C,
    project_id: Uuid,
    owner_id: Uuid,
    value: VoteValue,
    body: &str,
) -> Result<review::Model, DbErr> {
    let now = Utc::now();
    let model = review::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(project_id),
        owner_id: Set(owner_id),
        body: Set(body.to_owned()),
        value: Set(value),
        created_at: Set(now),
        updated_at: Set(now),
    };
    model.insert(db).await
}

pub async fn has_reviewed<C: ConnectionTrait>(
    db: &C,
    project_id: Uuid,
    owner_id: Uuid,
) -> Result<bool, DbErr> {
    let count = review::Entity::find()
        .filter(review::Column::ProjectId.eq(project_id))
        .filter(review::Column::OwnerId.eq(owner_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Returns `(total, up)` vote counts of a project.
pub async fn vote_counts<C: ConnectionTrait>(db: &C, project_id: Uuid) -> Result<(u64, u64), DbErr> {
    let total = review::Entity::find()
        .filter(review::Column::ProjectId.eq(project_id))
        .count(db)
        .await?;
    let up = review::Entity::find()
        .filter(review::Column::ProjectId.eq(project_id))
        .filter(review::Column::Value.eq(VoteValue::Up))
        .count(db)
        .await?;
    Ok((total, up))
}
