//! The `services` module provides the data access layer. Each sub-module owns
//! the queries for one entity family and returns entity models or the
//! aggregates from `db::models`; nothing here knows about HTTP or sessions.

use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{ColumnTrait, Condition};

pub mod message_service;
pub mod profile_service;
pub mod project_service;
pub mod review_service;
pub mod skill_service;
pub mod tag_service;
pub mod user_service;

pub use message_service::*;
pub use profile_service::*;
pub use project_service::*;
pub use review_service::*;
pub use skill_service::*;
pub use tag_service::*;
pub use user_service::*;

const LIKE_ESCAPE: char = '\\';

/// Escapes `LIKE` metacharacters so user input only ever matches literally.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive "column contains needle" expression.
fn contains_ci<C: ColumnTrait>(column: C, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&needle.to_lowercase()));
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
}

/// ORs `contains_ci` over `columns`; `None` when the search text is blank.
pub(crate) fn search_condition<C: ColumnTrait>(columns: &[C], search: &str) -> Option<Condition> {
    let needle = search.trim();
    if needle.is_empty() {
        return None;
    }
    let condition = columns
        .iter()
        .fold(Condition::any(), |cond, col| cond.add(contains_ci(*col, needle)));
    Some(condition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::entities::project;
    use sea_orm::{DbBackend, EntityTrait, QueryFilter, QueryTrait};

    #[test]
    fn test_escape_like_quotes_metacharacters() {
        assert_eq!(escape_like("rust"), "rust");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_blank_search_has_no_condition() {
        assert!(search_condition(&[project::Column::Title], "   ").is_none());
    }

    #[test]
    fn test_search_condition_declares_escape() {
        let cond = search_condition(&[project::Column::Title, project::Column::Description], "50%")
            .unwrap();
        let sql = project::Entity::find()
            .filter(cond)
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains("ESCAPE"), "{sql}");
        assert!(sql.contains("LOWER"), "{sql}");
        assert!(!sql.contains("%50%%"), "{sql}");
    }
}
