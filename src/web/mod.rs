use axum::{middleware as axum_middleware, response::Html, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tera::{Context, Tera};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::web::{error::AppError, middleware::auth, routes::Access};

pub mod error;
pub mod flash;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod static_files;
pub mod templates;

pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub templates: Arc<Tera>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn render(&self, template: &str, context: &Context) -> Result<Html<String>, AppError> {
        Ok(Html(self.templates.render(template, context)?))
    }
}

/// Builds the application router from the route table. Authenticated
/// entries get the login redirect; every request gets an `Identity`.
pub fn create_axum_router(
    db_pool: DatabaseConnection,
    templates: Arc<Tera>,
    config: Arc<ServerConfig>,
) -> Router {
    let app_state = Arc::new(AppState {
        db_pool,
        templates,
        config,
    });

    let router = routes::route_table()
        .into_iter()
        .fold(Router::new(), |router, entry| {
            let method_router = match entry.access {
                Access::Public => entry.method_router,
                Access::Authenticated => entry
                    .method_router
                    .route_layer(axum_middleware::from_fn(auth::require_auth)),
            };
            router.route(entry.path, method_router)
        });

    router
        .with_state(app_state.clone())
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth::identify,
        ))
        .layer(TraceLayer::new_for_http())
}
