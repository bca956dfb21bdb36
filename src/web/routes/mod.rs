//! The route table: every path the application serves, with its access level.

use axum::routing::{get, MethodRouter};
use std::sync::Arc;

use crate::web::static_files::static_handler;
use crate::web::AppState;

pub mod account_routes;
pub mod api_routes;
pub mod auth_routes;
pub mod message_routes;
pub mod profile_routes;
pub mod project_routes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Anonymous requests are redirected to `/login`.
    Authenticated,
}

pub struct RouteEntry {
    pub path: &'static str,
    pub access: Access,
    pub method_router: MethodRouter<Arc<AppState>>,
}

impl RouteEntry {
    fn public(path: &'static str, method_router: MethodRouter<Arc<AppState>>) -> Self {
        RouteEntry {
            path,
            access: Access::Public,
            method_router,
        }
    }

    fn authenticated(path: &'static str, method_router: MethodRouter<Arc<AppState>>) -> Self {
        RouteEntry {
            path,
            access: Access::Authenticated,
            method_router,
        }
    }
}

pub fn route_table() -> Vec<RouteEntry> {
    vec![
        // Projects
        RouteEntry::public("/", get(project_routes::projects_page)),
        RouteEntry::public("/projects", get(project_routes::projects_page)),
        RouteEntry::public(
            "/project/{id}",
            get(project_routes::project_page).post(project_routes::submit_review),
        ),
        RouteEntry::authenticated(
            "/create-project",
            get(project_routes::create_project_form).post(project_routes::create_project),
        ),
        RouteEntry::authenticated(
            "/update-project/{id}",
            get(project_routes::update_project_form).post(project_routes::update_project),
        ),
        RouteEntry::authenticated(
            "/delete-project/{id}",
            get(project_routes::delete_project_form).post(project_routes::delete_project),
        ),
        // Profiles
        RouteEntry::public("/profiles", get(profile_routes::profiles_page)),
        RouteEntry::public("/profile/{id}", get(profile_routes::profile_page)),
        // Session
        RouteEntry::public(
            "/login",
            get(auth_routes::login_form).post(auth_routes::login),
        ),
        RouteEntry::public(
            "/register",
            get(auth_routes::register_form).post(auth_routes::register),
        ),
        RouteEntry::public("/logout", get(auth_routes::logout)),
        // Account
        RouteEntry::authenticated("/account", get(account_routes::account_page)),
        RouteEntry::authenticated(
            "/edit-account",
            get(account_routes::edit_account_form).post(account_routes::edit_account),
        ),
        RouteEntry::authenticated(
            "/create-skill",
            get(account_routes::create_skill_form).post(account_routes::create_skill),
        ),
        RouteEntry::authenticated(
            "/update-skill/{id}",
            get(account_routes::update_skill_form).post(account_routes::update_skill),
        ),
        RouteEntry::authenticated(
            "/delete-skill/{id}",
            get(account_routes::delete_skill_form).post(account_routes::delete_skill),
        ),
        // Messages
        RouteEntry::authenticated("/inbox", get(message_routes::inbox_page)),
        RouteEntry::authenticated("/message/{id}", get(message_routes::message_page)),
        RouteEntry::public(
            "/create-message/{id}",
            get(message_routes::create_message_form).post(message_routes::create_message),
        ),
        // JSON API
        RouteEntry::public("/api/projects", get(api_routes::list_projects)),
        RouteEntry::public("/api/profiles", get(api_routes::list_profiles)),
        RouteEntry::public("/api/profiles/{id}", get(api_routes::get_profile)),
        RouteEntry::public("/api/health", get(api_routes::health_check)),
        // Assets
        RouteEntry::public("/static/{*path}", get(static_handler)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::db::entities::profile;
    use crate::services::auth_service;
    use crate::web::middleware::auth::SESSION_COOKIE;
    use crate::web::models::AuthenticatedUser;
    use crate::web::{create_axum_router, templates::load_templates};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use sea_orm::{DatabaseConnection, DbBackend, DbErr, MockDatabase, RuntimeErr};
    use std::collections::HashSet;
    use tower::ServiceExt;
    use uuid::Uuid;

    const SECRET: &str = "router-test-secret";

    fn test_router() -> Router {
        test_router_with(DatabaseConnection::Disconnected)
    }

    fn test_router_with(db: DatabaseConnection) -> Router {
        let config = ServerConfig {
            database_url: "postgres://unused".into(),
            session_secret: SECRET.into(),
            listen_addr: "127.0.0.1:0".into(),
            page_size: 3,
            log_dir: "logs".into(),
            secure_cookies: false,
        };
        let templates = load_templates().unwrap();
        create_axum_router(db, Arc::new(templates), Arc::new(config))
    }

    fn session_cookie(user: &AuthenticatedUser) -> String {
        let token = auth_service::create_session_token(user, SECRET).unwrap();
        format!("{SESSION_COOKIE}={token}")
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn concrete_path(path: &str) -> String {
        path.replace("{id}", &Uuid::new_v4().to_string())
            .replace("{*path}", "styles.css")
    }

    #[test]
    fn test_paths_are_unique() {
        let table = route_table();
        let paths: HashSet<&str> = table.iter().map(|e| e.path).collect();
        assert_eq!(paths.len(), table.len());
    }

    #[test]
    fn test_owner_pages_require_authentication() {
        let table = route_table();
        for path in ["/account", "/inbox", "/create-project", "/update-skill/{id}"] {
            let entry = table.iter().find(|e| e.path == path).unwrap();
            assert_eq!(entry.access, Access::Authenticated, "{path}");
        }
        for path in ["/", "/projects", "/profiles", "/login", "/create-message/{id}"] {
            let entry = table.iter().find(|e| e.path == path).unwrap();
            assert_eq!(entry.access, Access::Public, "{path}");
        }
    }

    #[tokio::test]
    async fn test_anonymous_requests_to_protected_routes_redirect_to_login() {
        let router = test_router();
        let protected: Vec<&str> = route_table()
            .iter()
            .filter(|e| e.access == Access::Authenticated)
            .map(|e| e.path)
            .collect();
        assert!(!protected.is_empty());

        for path in protected {
            let response = router
                .clone()
                .oneshot(get_request(&concrete_path(path)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
            assert_eq!(response.headers()[header::LOCATION], "/login", "{path}");
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = test_router().oneshot(get_request("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_login_page_renders_without_database() {
        let response = test_router().oneshot(get_request("/login")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("name=\"password\""));
    }

    #[tokio::test]
    async fn test_static_assets_are_served_with_mime_type() {
        let response = test_router()
            .oneshot(get_request("/static/styles.css"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");

        let missing = test_router()
            .oneshot(get_request("/static/missing.css"))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_database_failure_surfaces_as_server_error() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_errors([DbErr::Conn(RuntimeErr::Internal(
                "connection refused".into(),
            ))])
            .into_connection();

        let response = test_router_with(db)
            .oneshot(get_request("/projects"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_missing_own_profile_redirects_with_flash() {
        let user = AuthenticatedUser {
            user_id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
            username: "ada".into(),
        };
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([Vec::<profile::Model>::new()])
            .into_connection();
        let request = Request::builder()
            .uri("/account")
            .header(header::COOKIE, session_cookie(&user))
            .body(Body::empty())
            .unwrap();

        let response = test_router_with(db).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/profiles");
        let flash = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.starts_with("flash="));
        assert!(flash);
    }

    #[tokio::test]
    async fn test_valid_session_cookie_passes_auth_gate() {
        let user = AuthenticatedUser {
            user_id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
            username: "ada".into(),
        };
        let request = Request::builder()
            .uri("/create-project")
            .header(header::COOKIE, session_cookie(&user))
            .body(Body::empty())
            .unwrap();

        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_tampered_session_cookie_is_anonymous() {
        let request = Request::builder()
            .uri("/account")
            .header(header::COOKIE, format!("{SESSION_COOKIE}=garbage"))
            .body(Body::empty())
            .unwrap();

        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }
}
