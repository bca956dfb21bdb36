//! Project use cases: listing, detail, owner-only editing and reviews.

use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::entities::{project, review};
use crate::db::models::{ProjectCard, ProjectDetail};
use crate::db::services::{self as db_services, ProjectFields};
use crate::services::pagination::{offset_for, paginate, Pagination};
use crate::services::tag_reconciler::{reconcile_tags, ReconcileMode};
use crate::services::{conflict_on_unique, non_empty, required, ServiceError};
use crate::web::models::{AuthenticatedUser, Identity, ProjectForm, ReviewForm};

const ALREADY_REVIEWED: &str = "You have already reviewed this project.";

/// A page of the project listing, ready for a template or the API.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectListing {
    pub projects: Vec<ProjectCard>,
    pub pagination: Pagination,
    pub search_query: String,
}

pub async fn list_projects_page(
    db: &DatabaseConnection,
    search: &str,
    page: i64,
    page_size: u64,
) -> Result<ProjectListing, ServiceError> {
    let search = search.trim();
    let total = db_services::count_projects(db, search).await?;
    let pagination = paginate(page, total, page_size);
    let offset = offset_for(pagination.current_page, page_size);
    let projects = db_services::list_projects(db, search, offset, page_size.max(1)).await?;
    Ok(ProjectListing {
        projects,
        pagination,
        search_query: search.to_string(),
    })
}

pub async fn project_detail(
    db: &DatabaseConnection,
    project_id: Uuid,
) -> Result<ProjectDetail, ServiceError> {
    db_services::load_project_detail(db, project_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Project not found.".to_string()))
}

/// Returns the acting user if they own `project`.
pub fn ensure_owner<'a>(
    identity: &'a Identity,
    project: &project::Model,
) -> Result<&'a AuthenticatedUser, ServiceError> {
    let user = identity
        .user()
        .ok_or_else(|| ServiceError::Forbidden("You must be logged in.".to_string()))?;
    if user.profile_id != project.owner_id {
        return Err(ServiceError::Forbidden(
            "You are not the owner of this project.".to_string(),
        ));
    }
    Ok(user)
}

/// Loads a project for editing, checking ownership first.
pub async fn owned_project(
    db: &DatabaseConnection,
    identity: &Identity,
    project_id: Uuid,
) -> Result<ProjectDetail, ServiceError> {
    let detail = project_detail(db, project_id).await?;
    ensure_owner(identity, &detail.project)?;
    Ok(detail)
}

fn project_fields(form: ProjectForm) -> Result<(ProjectFields, String), ServiceError> {
    let fields = ProjectFields {
        title: required(&form.title, "Title")?,
        description: form.description.trim().to_string(),
        featured_image: non_empty(form.featured_image),
        demo_link: non_empty(form.demo_link),
        source_link: non_empty(form.source_link),
    };
    Ok((fields, form.tags))
}

pub async fn create_project(
    db: &DatabaseConnection,
    identity: &Identity,
    form: ProjectForm,
) -> Result<project::Model, ServiceError> {
    let user = identity
        .user()
        .ok_or_else(|| ServiceError::Forbidden("You must be logged in.".to_string()))?;
    let (fields, raw_tags) = project_fields(form)?;

    let project = db_services::create_project(db, user.profile_id, fields).await?;
    info!(project_id = %project.id, owner_id = %user.profile_id, "Project created.");

    apply_tags(db, project.id, &raw_tags, ReconcileMode::Create).await;
    Ok(project)
}

/// Updates the row first; only once that succeeds are the tags replaced.
pub async fn update_project(
    db: &DatabaseConnection,
    identity: &Identity,
    project_id: Uuid,
    form: ProjectForm,
) -> Result<project::Model, ServiceError> {
    let existing = db_services::find_project(db, project_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Project not found.".to_string()))?;
    ensure_owner(identity, &existing)?;
    let (fields, raw_tags) = project_fields(form)?;

    let project = db_services::update_project(db, existing, fields).await?;
    info!(project_id = %project.id, "Project updated.");

    apply_tags(db, project.id, &raw_tags, ReconcileMode::Replace).await;
    Ok(project)
}

pub async fn delete_project(
    db: &DatabaseConnection,
    identity: &Identity,
    project_id: Uuid,
) -> Result<(), ServiceError> {
    let existing = db_services::find_project(db, project_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Project not found.".to_string()))?;
    ensure_owner(identity, &existing)?;
    db_services::delete_project(db, existing.id).await?;
    info!(%project_id, "Project deleted.");
    Ok(())
}

// A tag failure never fails the surrounding project write.
async fn apply_tags(db: &DatabaseConnection, project_id: Uuid, raw_tags: &str, mode: ReconcileMode) {
    match reconcile_tags(db, project_id, raw_tags, mode).await {
        Ok(outcome) if !outcome.skipped.is_empty() => {
            warn!(%project_id, skipped = ?outcome.skipped, "Some tags were not applied.");
        }
        Ok(_) => {}
        Err(e) => warn!(%project_id, error = %e, "Tag reconciliation aborted."),
    }
}

/// Percentage of up votes, rounded to the nearest integer. Zero without votes.
pub fn vote_ratio(up: u64, total: u64) -> i32 {
    if total == 0 {
        return 0;
    }
    ((up as f64 * 100.0) / total as f64).round() as i32
}

/// Records a review and refreshes the project's vote counters.
///
/// Owners cannot review their own project and each user reviews a project
/// at most once.
pub async fn add_review(
    db: &DatabaseConnection,
    identity: &Identity,
    project_id: Uuid,
    form: ReviewForm,
) -> Result<review::Model, ServiceError> {
    let user = identity
        .user()
        .ok_or_else(|| ServiceError::Forbidden("Please log in to leave a review.".to_string()))?;
    let project = db_services::find_project(db, project_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Project not found.".to_string()))?;

    if project.owner_id == user.profile_id {
        return Err(ServiceError::Forbidden(
            "You cannot review your own work.".to_string(),
        ));
    }
    if db_services::has_reviewed(db, project_id, user.profile_id).await? {
        return Err(ServiceError::Conflict(ALREADY_REVIEWED.to_string()));
    }

    // A concurrent submission can pass the check above; the unique index catches it.
    let review =
        db_services::create_review(db, project_id, user.profile_id, form.value, form.body.trim())
            .await
            .map_err(|e| conflict_on_unique(e, ALREADY_REVIEWED))?;

    let (total, up) = db_services::vote_counts(db, project_id).await?;
    let ratio = vote_ratio(up, total);
    db_services::set_project_votes(db, project, total as i32, ratio).await?;
    info!(%project_id, total, ratio, "Review recorded.");
    Ok(review)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::entities::review::VoteValue;
    use chrono::Utc;
    use sea_orm::{DbBackend, MockDatabase, Value};
    use std::collections::BTreeMap;

    fn project_owned_by(owner_id: Uuid) -> project::Model {
        project::Model {
            id: Uuid::new_v4(),
            owner_id,
            title: "Search engine".into(),
            description: String::new(),
            featured_image: project::DEFAULT_FEATURED_IMAGE.into(),
            demo_link: None,
            source_link: None,
            vote_total: 0,
            vote_ratio: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn identity_for(profile_id: Uuid) -> Identity {
        Identity::User(AuthenticatedUser {
            user_id: Uuid::new_v4(),
            profile_id,
            username: "dev".into(),
        })
    }

    #[test]
    fn test_vote_ratio_rounds() {
        assert_eq!(vote_ratio(0, 0), 0);
        assert_eq!(vote_ratio(1, 1), 100);
        assert_eq!(vote_ratio(1, 3), 33);
        assert_eq!(vote_ratio(2, 3), 67);
        assert_eq!(vote_ratio(0, 4), 0);
    }

    #[test]
    fn test_ensure_owner_accepts_owner() {
        let owner = Uuid::new_v4();
        let identity = identity_for(owner);
        let user = ensure_owner(&identity, &project_owned_by(owner)).unwrap();
        assert_eq!(user.profile_id, owner);
    }

    #[test]
    fn test_ensure_owner_rejects_others_and_anonymous() {
        let project = project_owned_by(Uuid::new_v4());
        assert!(matches!(
            ensure_owner(&identity_for(Uuid::new_v4()), &project),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            ensure_owner(&Identity::Anonymous, &project),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[test]
    fn test_project_fields_require_title() {
        let form = ProjectForm {
            title: "   ".into(),
            ..Default::default()
        };
        assert!(matches!(project_fields(form), Err(ServiceError::InvalidInput(_))));
    }

    #[test]
    fn test_project_fields_normalise_optionals() {
        let form = ProjectForm {
            title: " Crawler ".into(),
            description: "A crawler".into(),
            featured_image: Some(" ".into()),
            demo_link: Some("https://demo.example".into()),
            source_link: None,
            tags: "rust, web".into(),
        };
        let (fields, tags) = project_fields(form).unwrap();
        assert_eq!(fields.title, "Crawler");
        assert_eq!(fields.featured_image, None);
        assert_eq!(fields.demo_link.as_deref(), Some("https://demo.example"));
        assert_eq!(tags, "rust, web");
    }

    fn review_form() -> ReviewForm {
        ReviewForm {
            value: VoteValue::Up,
            body: "Clean code".into(),
        }
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }

    #[tokio::test]
    async fn test_owner_cannot_review_own_project() {
        let owner = Uuid::new_v4();
        let project = project_owned_by(owner);
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![project.clone()]])
            .into_connection();

        let err = add_review(&db, &identity_for(owner), project.id, review_form())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_second_review_is_a_conflict() {
        let project = project_owned_by(Uuid::new_v4());
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![project.clone()]])
            .append_query_results([vec![count_row(1)]])
            .into_connection();

        let err = add_review(&db, &identity_for(Uuid::new_v4()), project.id, review_form())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(msg) if msg == ALREADY_REVIEWED));
    }
}
