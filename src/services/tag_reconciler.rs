use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::entities::tag;

/// Storage operations the reconciler needs. Implemented for the live
/// `DatabaseConnection` in `db::services::tag_service`.
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Returns the tag called exactly `name`, creating it if absent. Must be
    /// safe to call concurrently for the same name.
    async fn find_or_create_tag(&self, name: &str) -> Result<tag::Model, DbErr>;

    /// Links `tag_id` to `project_id`. Linking an existing pair is a no-op.
    async fn associate_tag(&self, project_id: Uuid, tag_id: Uuid) -> Result<(), DbErr>;

    /// Removes every tag link of `project_id`, leaving the tags themselves.
    async fn clear_project_tags(&self, project_id: Uuid) -> Result<u64, DbErr>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    /// Adds the given tags to whatever the project already has.
    Create,
    /// Drops the project's current tag links first.
    Replace,
}

#[derive(Debug, Error)]
pub enum TagError {
    #[error("Tag store unavailable: {0}")]
    PersistenceFailure(DbErr),
}

/// What a reconciliation pass managed to do.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagReconciliation {
    pub associated: Vec<String>,
    pub skipped: Vec<String>,
}

/// Splits a comma separated tag field into trimmed, non-empty, distinct names.
/// Names are compared exactly, so `Rust` and `rust` are both kept.
pub fn parse_tag_names(raw: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for candidate in raw.split(',').map(str::trim) {
        if candidate.is_empty() || names.iter().any(|n| n == candidate) {
            continue;
        }
        names.push(candidate.to_string());
    }
    names
}

/// Brings the tag links of `project_id` in line with `raw_tags`.
///
/// Best effort: a tag that cannot be resolved or linked is logged and
/// skipped. Only a store that cannot be reached at all aborts the pass, and
/// links made before that point stay in place.
pub async fn reconcile_tags<S>(
    store: &S,
    project_id: Uuid,
    raw_tags: &str,
    mode: ReconcileMode,
) -> Result<TagReconciliation, TagError>
where
    S: TagStore + ?Sized,
{
    if mode == ReconcileMode::Replace {
        let removed = store
            .clear_project_tags(project_id)
            .await
            .map_err(TagError::PersistenceFailure)?;
        debug!(%project_id, removed, "Cleared existing project tags.");
    }

    let mut outcome = TagReconciliation::default();

    for name in parse_tag_names(raw_tags) {
        let tag = match store.find_or_create_tag(&name).await {
            Ok(tag) => tag,
            Err(e) if is_unreachable(&e) => return Err(TagError::PersistenceFailure(e)),
            Err(e) => {
                warn!(%project_id, tag = %name, error = %e, "Failed to resolve tag, skipping.");
                outcome.skipped.push(name);
                continue;
            }
        };

        match store.associate_tag(project_id, tag.id).await {
            Ok(()) => outcome.associated.push(name),
            Err(e) if is_unreachable(&e) => return Err(TagError::PersistenceFailure(e)),
            Err(e) => {
                warn!(%project_id, tag = %name, error = %e, "Failed to associate tag, skipping.");
                outcome.skipped.push(name);
            }
        }
    }

    Ok(outcome)
}

fn is_unreachable(err: &DbErr) -> bool {
    matches!(err, DbErr::Conn(_) | DbErr::ConnectionAcquire(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{ConnAcquireErr, RuntimeErr};
    use std::collections::HashSet;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct State {
        tags: Vec<tag::Model>,
        links: HashSet<(Uuid, Uuid)>,
        fail_associate_for: HashSet<String>,
        unreachable_after_links: Option<usize>,
    }

    /// In-memory store that enforces tag name uniqueness the way the unique
    /// index does in Postgres.
    #[derive(Default, Clone)]
    struct MemoryTagStore {
        state: Arc<Mutex<State>>,
    }

    impl MemoryTagStore {
        pub(crate) async fn tag_count(&self) -> usize {
            self.state.lock().await.tags.len()
        }

        pub(crate) async fn tag_names_for(&self, project_id: Uuid) -> Vec<String> {
            let state = self.state.lock().await;
            let mut names: Vec<String> = state
                .tags
                .iter()
                .filter(|t| state.links.contains(&(project_id, t.id)))
                .map(|t| t.name.clone())
                .collect();
            names.sort();
            names
        }

        async fn link_count_for(&self, project_id: Uuid) -> usize {
            let state = self.state.lock().await;
            state.links.iter().filter(|(p, _)| *p == project_id).count()
        }

        async fn fail_associate_for(&self, name: &str) {
            self.state.lock().await.fail_associate_for.insert(name.to_string());
        }

        async fn go_unreachable_after(&self, links: usize) {
            self.state.lock().await.unreachable_after_links = Some(links);
        }
    }

    #[async_trait]
    impl TagStore for MemoryTagStore {
        async fn find_or_create_tag(&self, name: &str) -> Result<tag::Model, DbErr> {
            // Yield first so concurrent callers interleave between lookup and insert.
            tokio::task::yield_now().await;
            let mut state = self.state.lock().await;
            if let Some(existing) = state.tags.iter().find(|t| t.name == name) {
                return Ok(existing.clone());
            }
            let tag = tag::Model {
                id: Uuid::new_v4(),
                name: name.to_string(),
                created_at: Utc::now(),
            };
            state.tags.push(tag.clone());
            Ok(tag)
        }

        async fn associate_tag(&self, project_id: Uuid, tag_id: Uuid) -> Result<(), DbErr> {
            let mut state = self.state.lock().await;
            if let Some(limit) = state.unreachable_after_links {
                if state.links.len() >= limit {
                    return Err(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout));
                }
            }
            let name = state
                .tags
                .iter()
                .find(|t| t.id == tag_id)
                .map(|t| t.name.clone())
                .unwrap_or_default();
            if state.fail_associate_for.contains(&name) {
                return Err(DbErr::Custom(format!("association rejected for {name}")));
            }
            state.links.insert((project_id, tag_id));
            Ok(())
        }

        async fn clear_project_tags(&self, project_id: Uuid) -> Result<u64, DbErr> {
            let mut state = self.state.lock().await;
            if state.unreachable_after_links == Some(0) {
                return Err(DbErr::Conn(RuntimeErr::Internal("connection refused".into())));
            }
            let before = state.links.len();
            state.links.retain(|(p, _)| *p != project_id);
            Ok((before - state.links.len()) as u64)
        }
    }

    #[test]
    fn test_parse_tag_names_trims_and_skips_empty() {
        assert_eq!(
            parse_tag_names(" rust, axum ,, ,postgres,"),
            vec!["rust", "axum", "postgres"]
        );
        assert!(parse_tag_names("").is_empty());
        assert!(parse_tag_names(" , ,").is_empty());
    }

    #[test]
    fn test_parse_tag_names_dedups_exact_matches_only() {
        assert_eq!(
            parse_tag_names("Rust,rust, Rust ,web"),
            vec!["Rust", "rust", "web"]
        );
    }

    #[tokio::test]
    async fn test_create_associates_each_distinct_name() {
        let store = MemoryTagStore::default();
        let project = Uuid::new_v4();

        let outcome = reconcile_tags(&store, project, "rust, web, rust", ReconcileMode::Create)
            .await
            .unwrap();

        assert_eq!(outcome.associated, vec!["rust", "web"]);
        assert!(outcome.skipped.is_empty());
        assert_eq!(store.tag_names_for(project).await, vec!["rust", "web"]);
        assert_eq!(store.tag_count().await, 2);
    }

    #[tokio::test]
    async fn test_reconcile_twice_is_idempotent() {
        let store = MemoryTagStore::default();
        let project = Uuid::new_v4();

        reconcile_tags(&store, project, "rust,web", ReconcileMode::Create).await.unwrap();
        reconcile_tags(&store, project, "rust,web", ReconcileMode::Create).await.unwrap();

        assert_eq!(store.link_count_for(project).await, 2);
        assert_eq!(store.tag_count().await, 2);
    }

    #[tokio::test]
    async fn test_replace_with_empty_list_clears_links() {
        let store = MemoryTagStore::default();
        let project = Uuid::new_v4();
        reconcile_tags(&store, project, "rust,web", ReconcileMode::Create).await.unwrap();

        let outcome = reconcile_tags(&store, project, " , ", ReconcileMode::Replace)
            .await
            .unwrap();

        assert!(outcome.associated.is_empty());
        assert_eq!(store.link_count_for(project).await, 0);
        // Orphaned tags stay around.
        assert_eq!(store.tag_count().await, 2);
    }

    #[tokio::test]
    async fn test_replace_swaps_the_tag_set() {
        let store = MemoryTagStore::default();
        let project = Uuid::new_v4();
        let other = Uuid::new_v4();
        reconcile_tags(&store, project, "rust,web", ReconcileMode::Create).await.unwrap();
        reconcile_tags(&store, other, "rust", ReconcileMode::Create).await.unwrap();

        reconcile_tags(&store, project, "web,cli", ReconcileMode::Replace).await.unwrap();

        assert_eq!(store.tag_names_for(project).await, vec!["cli", "web"]);
        assert_eq!(store.tag_names_for(other).await, vec!["rust"]);
        assert_eq!(store.tag_count().await, 3);
    }

    #[tokio::test]
    async fn test_failed_association_is_skipped() {
        let store = MemoryTagStore::default();
        let project = Uuid::new_v4();
        store.fail_associate_for("broken").await;

        let outcome = reconcile_tags(&store, project, "rust,broken,web", ReconcileMode::Create)
            .await
            .unwrap();

        assert_eq!(outcome.associated, vec!["rust", "web"]);
        assert_eq!(outcome.skipped, vec!["broken"]);
        assert_eq!(store.tag_names_for(project).await, vec!["rust", "web"]);
    }

    #[tokio::test]
    async fn test_unreachable_store_keeps_completed_links() {
        let store = MemoryTagStore::default();
        let project = Uuid::new_v4();
        store.go_unreachable_after(1).await;

        let result = reconcile_tags(&store, project, "first,second,third", ReconcileMode::Create).await;

        assert!(matches!(result, Err(TagError::PersistenceFailure(_))));
        assert_eq!(store.tag_names_for(project).await, vec!["first"]);
    }

    #[tokio::test]
    async fn test_replace_fails_when_clear_cannot_reach_store() {
        let store = MemoryTagStore::default();
        store.go_unreachable_after(0).await;

        let result = reconcile_tags(&store, Uuid::new_v4(), "rust", ReconcileMode::Replace).await;

        assert!(matches!(result, Err(TagError::PersistenceFailure(_))));
        assert_eq!(store.tag_count().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reconciles_create_one_tag_per_name() {
        let store = MemoryTagStore::default();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        let a = {
            let store = store.clone();
            tokio::spawn(async move {
                reconcile_tags(&store, first, "fresh,shared", ReconcileMode::Create).await
            })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move {
                reconcile_tags(&store, second, "shared,fresh", ReconcileMode::Create).await
            })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        assert_eq!(store.tag_count().await, 2);
        assert_eq!(store.tag_names_for(first).await, vec!["fresh", "shared"]);
        assert_eq!(store.tag_names_for(second).await, vec!["fresh", "shared"]);
    }
}
