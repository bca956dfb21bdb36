use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::db::entities::{profile, project, review};
use crate::db::models::{ProjectCard, ProjectDetail, ReviewWithAuthor};
use crate::db::services::{search_condition, tags_for_project, tags_for_projects};

const SEARCH_COLUMNS: [project::Column; 2] = [project::Column::Title, project::Column::Description];

/// Editable fields of a project, shared by create and update.
#[derive(Debug, Clone, Default)]
pub struct ProjectFields {
    pub title: String,
    pub description: String,
    pub featured_image: Option<String>,
    pub demo_link: Option<String>,
    pub source_link: Option<String>,
}

// --- Project Service Functions ---

pub async fn count_projects<C: ConnectionTrait>(db: &C, search: &str) -> Result<u64, DbErr> {
    let mut query = project::Entity::find();
    if let Some(cond) = search_condition(&SEARCH_COLUMNS, search) {
        query = query.filter(cond);
    }
    query.count(db).await
}

/// One page of projects matching `search`, best voted first, with owners and tags.
pub async fn list_projects<C: ConnectionTrait>(
    db: &C,
    search: &str,
    offset: u64,
    limit: u64,
) -> Result<Vec<ProjectCard>, DbErr> {
    let mut query = project::Entity::find();
    if let Some(cond) = search_condition(&SEARCH_COLUMNS, search) {
        query = query.filter(cond);
    }
    let projects = query
        .order_by_desc(project::Column::VoteRatio)
        .order_by_desc(project::Column::VoteTotal)
        .order_by_asc(project::Column::Title)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;

    project_cards(db, projects).await
}

/// Projects owned by a profile, newest first.
pub async fn projects_for_owner<C: ConnectionTrait>(
    db: &C,
    owner_id: Uuid,
) -> Result<Vec<ProjectCard>, DbErr> {
    let projects = project::Entity::find()
        .filter(project::Column::OwnerId.eq(owner_id))
        .order_by_desc(project::Column::CreatedAt)
        .all(db)
        .await?;
    project_cards(db, projects).await
}

/// Attaches owners and tags to a batch of projects: two extra queries, whatever the batch size.
async fn project_cards<C: ConnectionTrait>(
    db: &C,
    projects: Vec<project::Model>,
) -> Result<Vec<ProjectCard>, DbErr> {
    let ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();
    let mut tags = tags_for_projects(db, &ids).await?;

    let owner_ids: Vec<Uuid> = projects.iter().map(|p| p.owner_id).collect();
    let owners: HashMap<Uuid, profile::Model> = if owner_ids.is_empty() {
        HashMap::new()
    } else {
        profile::Entity::find()
            .filter(profile::Column::Id.is_in(owner_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect()
    };

    Ok(projects
        .into_iter()
        .map(|project| ProjectCard {
            owner: owners.get(&project.owner_id).cloned(),
            tags: tags.remove(&project.id).unwrap_or_default(),
            project,
        })
        .collect())
}

pub async fn find_project<C: ConnectionTrait>(
    db: &C,
    project_id: Uuid,
) -> Result<Option<project::Model>, DbErr> {
    project::Entity::find_by_id(project_id).one(db).await
}

/// Loads a project with its owner, tags and reviews (each with its author).
pub async fn load_project_detail<C: ConnectionTrait>(
    db: &C,
    project_id: Uuid,
) -> Result<Option<ProjectDetail>, DbErr> {
    let Some(project) = find_project(db, project_id).await? else {
        return Ok(None);
    };

    let reviews = review::Entity::find()
        .filter(review::Column::ProjectId.eq(project_id))
        .order_by_desc(review::Column::CreatedAt)
        .all(db)
        .await?;

    let mut profile_ids: Vec<Uuid> = reviews.iter().map(|r| r.owner_id).collect();
    profile_ids.push(project.owner_id);
    let profiles: HashMap<Uuid, profile::Model> = profile::Entity::find()
        .filter(profile::Column::Id.is_in(profile_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let tags = tags_for_project(db, project_id).await?;

    Ok(Some(ProjectDetail {
        owner: profiles.get(&project.owner_id).cloned(),
        tags,
        reviews: reviews
            .into_iter()
            .map(|review| ReviewWithAuthor {
                author: profiles.get(&review.owner_id).cloned(),
                review,
            })
            .collect(),
        project,
    }))
}

/// Creates a new project owned by `owner_id`.
pub async fn create_project<C: ConnectionTrait>(
    db: &C,
    owner_id: Uuid,
    fields: ProjectFields,
) -> Result<project::Model, DbErr> {
    let now = Utc::now();
    let new_project = project::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner_id),
        title: Set(fields.title),
        description: Set(fields.description),
        featured_image: Set(fields
            .featured_image
            .unwrap_or_else(|| project::DEFAULT_FEATURED_IMAGE.to_string())),
        demo_link: Set(fields.demo_link),
        source_link: Set(fields.source_link),
        vote_total: Set(0),
        vote_ratio: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    };
    new_project.insert(db).await
}

/// Updates a project's editable fields. A `None` featured image keeps the current one.
pub async fn update_project<C: ConnectionTrait>(
    db: &C,
    existing: project::Model,
    fields: ProjectFields,
) -> Result<project::Model, DbErr> {
    let mut active = existing.into_active_model();
    active.title = Set(fields.title);
    active.description = Set(fields.description);
    if let Some(image) = fields.featured_image {
        active.featured_image = Set(image);
    }
    active.demo_link = Set(fields.demo_link);
    active.source_link = Set(fields.source_link);
    active.updated_at = Set(Utc::now());
    active.update(db).await
}

/// Deletes a project. The ON DELETE CASCADE handles project_tags and reviews.
pub async fn delete_project<C: ConnectionTrait>(db: &C, project_id: Uuid) -> Result<u64, DbErr> {
    let result = project::Entity::delete_by_id(project_id).exec(db).await?;
    Ok(result.rows_affected)
}

/// Stores recomputed vote counters.
pub async fn set_project_votes<C: ConnectionTrait>(
    db: &C,
    project: project::Model,
    vote_total: i32,
    vote_ratio: i32,
) -> Result<project::Model, DbErr> {
    let mut active = project.into_active_model();
    active.vote_total = Set(vote_total);
    active.vote_ratio = Set(vote_ratio);
    active.update(db).await
}
