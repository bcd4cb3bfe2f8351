// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, exams},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, student_middleware},
};

/// Upload limit for question import files.
const IMPORT_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, student exams, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            "http://localhost:3000".parse().expect("static origin"),
            "http://127.0.0.1:3000".parse().expect("static origin"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new().route("/login", post(auth::login));

    let student_routes = Router::new()
        .route("/exams", get(exams::list_exams))
        .route("/exams/{id}/sessions", post(exams::start_session))
        .route(
            "/sessions/{id}",
            get(exams::get_session).delete(exams::dispose_session),
        )
        .route(
            "/sessions/{id}/answers/{question_id}",
            put(exams::set_answer),
        )
        .route("/sessions/{id}/navigate", post(exams::navigate))
        .route("/sessions/{id}/submit", post(exams::submit))
        .route("/sessions/{id}/result", get(exams::get_result))
        // Auth first, then the role check
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/exams", get(admin::list_exams))
        .route("/exams/{id}", get(admin::get_exam))
        .route("/draft", get(admin::get_draft).put(admin::update_draft))
        .route("/draft/questions", post(admin::add_question))
        .route("/draft/questions/{id}", delete(admin::remove_question))
        .route(
            "/draft/import",
            post(admin::import_file).layer(DefaultBodyLimit::max(IMPORT_BODY_LIMIT)),
        )
        .route("/draft/import-text", post(admin::import_text))
        .route("/draft/generate", post(admin::generate))
        .route("/draft/commit", post(admin::commit_draft))
        .route("/templates/{format}", get(admin::template))
        .route(
            "/students",
            get(admin::list_students).post(admin::create_student),
        )
        .route("/students/{id}", delete(admin::delete_student))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", student_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{
        authoring::import::tests::CannedGenerator,
        config::{Config, GeminiConfig},
        seed,
        store::{InMemoryExamStore, InMemoryStudentStore},
    };

    fn app() -> Router {
        let config = Config {
            jwt_secret: "router_test_secret".to_string(),
            jwt_expiration: 60,
            rust_log: "error".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            admin_username: "admin".to_string(),
            admin_password: "password123".to_string(),
            gemini: GeminiConfig::default(),
            tick_millis: 1000,
        };
        let state = AppState::new(
            config,
            Arc::new(InMemoryExamStore::new(seed::demo_exams())),
            Arc::new(InMemoryStudentStore::new(seed::demo_students())),
            Arc::new(CannedGenerator::default()),
        )
        .unwrap();
        create_router(state)
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        for uri in ["/api/exams", "/api/admin/students", "/api/admin/draft"] {
            let response = app()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/exams")
                    .header(header::AUTHORIZATION, "Bearer not.a.jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
