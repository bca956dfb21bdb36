use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, DbErr, EntityName, EntityTrait, Schema};
use tracing::{debug, info};

use crate::db::entities::prelude::*;
use crate::db::entities::review;

/// Creates any missing table from the entity definitions.
///
/// Tables are created parents first so every foreign key has its target.
/// Existing tables are left untouched; there is no column migration.
pub async fn ensure_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    create_table(db, User).await?;
    create_table(db, Profile).await?;
    create_table(db, Skill).await?;
    create_table(db, Project).await?;
    create_table(db, Tag).await?;
    create_table(db, ProjectTag).await?;
    create_table(db, Review).await?;
    create_table(db, Message).await?;

    let backend = db.get_database_backend();
    db.execute(backend.build(&review_owner_index())).await?;
    info!("Database schema is up to date.");
    Ok(())
}

/// One review per (project, reviewer), enforced by the database.
pub(crate) fn review_owner_index() -> IndexCreateStatement {
    Index::create()
        .name("idx_reviews_project_owner")
        .table(Review)
        .col(review::Column::ProjectId)
        .col(review::Column::OwnerId)
        .unique()
        .if_not_exists()
        .to_owned()
}

async fn create_table<C, E>(db: &C, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let table = entity.table_name().to_owned();
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    debug!(%table, "Ensured table exists.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_ensure_schema_creates_tables_then_review_index() {
        let results = (0..9).map(|_| MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        });
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_exec_results(results)
            .into_connection();

        ensure_schema(&db).await.unwrap();

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 9);
        let first = format!("{:?}", log[0]);
        assert!(first.contains("CREATE TABLE IF NOT EXISTS"), "{first}");
        let last = format!("{:?}", log[8]);
        assert!(last.contains("CREATE UNIQUE INDEX"), "{last}");
        assert!(last.contains("idx_reviews_project_owner"), "{last}");
    }
}
