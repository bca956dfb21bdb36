use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::db::entities::message;

/// A message ready to be stored. Name and email are copied from the sender's
/// profile, or taken from the form for anonymous senders.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: Option<Uuid>,
    pub recipient_id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub body: String,
}

// --- Message Service Functions ---

pub async fn create_message<C: ConnectionTrait>(
    db: &C,
    new_message: NewMessage,
) -> Result<message::Model, DbErr> {
    let now = Utc::now();
    let model = message::ActiveModel {
        id: Set(Uuid::new_v4()),
        sender_id: Set(new_message.sender_id),
        recipient_id: Set(new_message.recipient_id),
        name: Set(new_message.name),
        email: Set(new_message.email),
        subject: Set(new_message.subject),
        body: Set(new_message.body),
        is_read: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    };
    model.insert(db).await
}

/// Inbox of a profile: unread first, then newest first.
pub async fn messages_for_recipient<C: ConnectionTrait>(
    db: &C,
    recipient_id: Uuid,
) -> Result<Vec<message::Model>, DbErr> {
    message::Entity::find()
        .filter(message::Column::RecipientId.eq(recipient_id))
        .order_by_asc(message::Column::IsRead)
        .order_by_desc(message::Column::CreatedAt)
        .all(db)
        .await
}

/// Finds a message only if it was sent to `recipient_id`.
pub async fn find_message_for_recipient<C: ConnectionTrait>(
    db: &C,
    message_id: Uuid,
    recipient_id: Uuid,
) -> Result<Option<message::Model>, DbErr> {
    message::Entity::find_by_id(message_id)
        .filter(message::Column::RecipientId.eq(recipient_id))
        .one(db)
        .await
}

pub async fn mark_message_read<C: ConnectionTrait>(
    db: &C,
    existing: message::Model,
) -> Result<message::Model, DbErr> {
    let mut active = existing.into_active_model();
    active.is_read = Set(true);
    active.updated_at = Set(Utc::now());
    active.update(db).await
}

pub async fn unread_message_count<C: ConnectionTrait>(
    db: &C,
    recipient_id: Uuid,
) -> Result<u64, DbErr> {
    message::Entity::find()
        .filter(message::Column::RecipientId.eq(recipient_id))
        .filter(message::Column::IsRead.eq(false))
        .count(db)
        .await
}
