use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::db::entities::{project_tag, tag};
use crate::services::tag_reconciler::TagStore;

// --- Tag Service Functions ---

/// Looks a tag up by its exact (case-sensitive) name.
pub async fn find_tag_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<Option<tag::Model>, DbErr> {
    tag::Entity::find()
        .filter(tag::Column::Name.eq(name))
        .one(db)
        .await
}

/// Returns the tag with this name, inserting it first if needed.
///
/// The insert ignores conflicts on `name`, so when two requests race on the
/// same new name one insert wins and both read back the same row.
pub async fn find_or_create_tag<C: ConnectionTrait>(db: &C, name: &str) -> Result<tag::Model, DbErr> {
    if let Some(existing) = find_tag_by_name(db, name).await? {
        return Ok(existing);
    }

    let candidate = tag::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_owned()),
        created_at: Set(Utc::now()),
    };
    tag::Entity::insert(candidate)
        .on_conflict(OnConflict::column(tag::Column::Name).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;

    find_tag_by_name(db, name)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Tag '{name}' missing after insert")))
}

/// Associates a tag with a project. Ignores conflicts if the association already exists.
pub async fn associate_tag_with_project<C: ConnectionTrait>(
    db: &C,
    project_id: Uuid,
    tag_id: Uuid,
) -> Result<u64, DbErr> {
    let link = project_tag::ActiveModel {
        project_id: Set(project_id),
        tag_id: Set(tag_id),
    };
    project_tag::Entity::insert(link)
        .on_conflict(
            OnConflict::columns([project_tag::Column::ProjectId, project_tag::Column::TagId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await
}

/// Removes all tag associations of a project. Tag rows are left alone.
pub async fn clear_project_tags<C: ConnectionTrait>(db: &C, project_id: Uuid) -> Result<u64, DbErr> {
    let result = project_tag::Entity::delete_many()
        .filter(project_tag::Column::ProjectId.eq(project_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Loads the tags of several projects with two queries, keyed by project id.
/// Each list is ordered by tag name.
pub async fn tags_for_projects<C: ConnectionTrait>(
    db: &C,
    project_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<tag::Model>>, DbErr> {
    if project_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let links = project_tag::Entity::find()
        .filter(project_tag::Column::ProjectId.is_in(project_ids.iter().copied()))
        .all(db)
        .await?;
    if links.is_empty() {
        return Ok(HashMap::new());
    }

    let tag_ids: HashSet<Uuid> = links.iter().map(|l| l.tag_id).collect();
    let tags: HashMap<Uuid, tag::Model> = tag::Entity::find()
        .filter(tag::Column::Id.is_in(tag_ids))
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    let mut by_project: HashMap<Uuid, Vec<tag::Model>> = HashMap::new();
    for link in links {
        if let Some(tag) = tags.get(&link.tag_id) {
            by_project.entry(link.project_id).or_default().push(tag.clone());
        }
    }
    for list in by_project.values_mut() {
        list.sort_by(|a, b| a.name.cmp(&b.name));
    }
    Ok(by_project)
}

/// Retrieves all tags for a specific project.
pub async fn tags_for_project<C: ConnectionTrait>(
    db: &C,
    project_id: Uuid,
) -> Result<Vec<tag::Model>, DbErr> {
    let mut map = tags_for_projects(db, &[project_id]).await?;
    Ok(map.remove(&project_id).unwrap_or_default())
}

#[async_trait]
impl TagStore for DatabaseConnection {
    async fn find_or_create_tag(&self, name: &str) -> Result<tag::Model, DbErr> {
        find_or_create_tag(self, name).await
    }

    async fn associate_tag(&self, project_id: Uuid, tag_id: Uuid) -> Result<(), DbErr> {
        associate_tag_with_project(self, project_id, tag_id).await.map(|_| ())
    }

    async fn clear_project_tags(&self, project_id: Uuid) -> Result<u64, DbErr> {
        clear_project_tags(self, project_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, MockDatabase, MockExecResult};

    fn tag_named(name: &str) -> tag::Model {
        tag::Model {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }

    fn exec_result(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn test_existing_tag_is_returned_without_insert() {
        let existing = tag_named("rust");
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .into_connection();

        let found = find_or_create_tag(&db, "rust").await.unwrap();
        assert_eq!(found, existing);
        assert_eq!(db.into_transaction_log().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_tag_is_inserted_then_read_back() {
        let stored = tag_named("axum");
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([Vec::<tag::Model>::new(), vec![stored.clone()]])
            .append_exec_results([exec_result(1)])
            .into_connection();

        let found = TagStore::find_or_create_tag(&db, "axum").await.unwrap();
        assert_eq!(found, stored);

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 3);
        let insert = format!("{:?}", log[1]);
        assert!(insert.contains("ON CONFLICT"), "{insert}");
        assert!(insert.contains("DO NOTHING"), "{insert}");
    }

    #[tokio::test]
    async fn test_lost_insert_race_reads_the_winning_row() {
        // Another request created the tag between our lookup and insert.
        let winner = tag_named("sea-orm");
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([Vec::<tag::Model>::new(), vec![winner.clone()]])
            .append_exec_results([exec_result(0)])
            .into_connection();

        let found = find_or_create_tag(&db, "sea-orm").await.unwrap();
        assert_eq!(found.id, winner.id);
    }

    #[tokio::test]
    async fn test_tag_missing_after_insert_is_an_error() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([Vec::<tag::Model>::new(), Vec::<tag::Model>::new()])
            .append_exec_results([exec_result(0)])
            .into_connection();

        let err = find_or_create_tag(&db, "ghost").await.unwrap_err();
        assert!(matches!(err, DbErr::RecordNotFound(_)));
    }

    #[tokio::test]
    async fn test_existing_link_is_left_alone() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_exec_results([exec_result(0)])
            .into_connection();

        let inserted = associate_tag_with_project(&db, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(inserted, 0);

        let log = db.into_transaction_log();
        let insert = format!("{:?}", log[0]);
        assert!(insert.contains("ON CONFLICT"), "{insert}");
    }

    #[tokio::test]
    async fn test_store_association_ignores_duplicates() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_exec_results([exec_result(1), exec_result(0)])
            .into_connection();
        let (project_id, tag_id) = (Uuid::new_v4(), Uuid::new_v4());

        assert!(TagStore::associate_tag(&db, project_id, tag_id).await.is_ok());
        assert!(TagStore::associate_tag(&db, project_id, tag_id).await.is_ok());
    }
}
