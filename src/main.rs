//src/main.rs

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod jobs;
mod middleware;
mod models;
mod services;

use crate::{
    config::{AppState, Config},
    docs::ApiDoc,
    jobs::alert_generator::spawn_alert_generator,
    middleware::{activity::activity_logger, auth::auth_guard},
};

// Three 5MB files plus the multipart framing.
const UPLOAD_BODY_LIMIT: usize = 16 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info,sqlx=warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::new(config).await?;

    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("Database migrations applied");

    app_state.documents.ensure_dirs().await?;

    let sweep = app_state.config.alert_sweep_enabled.then(|| {
        spawn_alert_generator(app_state.alert_generator(), app_state.config.alert_sweep_interval)
    });

    let pool = app_state.db_pool.clone();
    let bind_addr = app_state.config.bind_addr.clone();
    let app = build_router(app_state)?;

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = sweep {
        handle.abort();
    }
    pool.close().await;

    tracing::info!("Server stopped");
    Ok(())
}

fn cors_layer(origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let Some(origin) = origin else {
        return Ok(CorsLayer::permissive());
    };
    let origin: HeaderValue = origin.parse()?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

pub fn build_router(app_state: AppState) -> anyhow::Result<Router> {
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/", get(handlers::users::list_users).post(handlers::users::invite_user))
        .route("/invite", post(handlers::users::invite_user))
        .route(
            "/{id}",
            put(handlers::users::update_user).delete(handlers::users::delete_user),
        );

    let profile_routes = Router::new()
        .route(
            "/{id}",
            get(handlers::profile::get_profile).put(handlers::profile::update_profile),
        )
        .route("/change-password/{id}", put(handlers::profile::change_password));

    let staff_routes = Router::new()
        .route("/", get(handlers::staff::list_staff).post(handlers::staff::create_staff))
        .route(
            "/{id}",
            get(handlers::staff::get_staff)
                .put(handlers::staff::update_staff)
                .delete(handlers::staff::delete_staff),
        )
        .route("/{id}/update-records", post(handlers::staff::update_staff_records));

    let policy_routes = Router::new()
        .route("/", get(handlers::policy::list_policies).post(handlers::policy::create_policy))
        .route(
            "/{id}",
            get(handlers::policy::get_policy)
                .put(handlers::policy::update_policy)
                .delete(handlers::policy::delete_policy),
        )
        .route("/{id}/acknowledge", post(handlers::policy::acknowledge_policy));

    let audit_routes = Router::new()
        .route(
            "/",
            get(handlers::audit::list_checklist).post(handlers::audit::create_checklist_item),
        )
        .route(
            "/{id}",
            get(handlers::audit::get_checklist_item)
                .put(handlers::audit::update_checklist_item)
                .delete(handlers::audit::delete_checklist_item),
        )
        .route("/{id}/evidence", post(handlers::audit::upload_evidence));

    let report_routes = Router::new()
        .route("/", get(handlers::reports::list_reports).post(handlers::reports::create_report))
        .route(
            "/{id}",
            get(handlers::reports::get_report)
                .put(handlers::reports::update_report)
                .delete(handlers::reports::delete_report),
        );

    let alert_routes = Router::new()
        .route("/", get(handlers::alerts::list_alerts))
        .route(
            "/{id}",
            get(handlers::alerts::get_alert).delete(handlers::alerts::dismiss_alert),
        );

    // Everything below requires a bearer token; successful writes are recorded.
    let protected = Router::new()
        .nest("/api/users", user_routes)
        .nest("/api/profile", profile_routes)
        .nest("/api/staff", staff_routes)
        .nest("/api/policy", policy_routes)
        .nest("/api/audit-checklist", audit_routes)
        .nest("/api/reports", report_routes)
        .route("/api/dashboard", get(handlers::dashboard::get_overview))
        .nest("/api/alerts", alert_routes)
        .route("/api/activity-logs", get(handlers::activity::list_activity_logs))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            activity_logger,
        ))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));

    let cors = cors_layer(app_state.config.cors_origin.as_deref())?;
    let documents = ServeDir::new(app_state.documents.root());

    Ok(Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .merge(protected)
        .nest_service("/documents", documents)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::{User, UserRole, UserStatus};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use chrono::Utc;
    use http_body_util::BodyExt;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_config() -> Config {
        Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/carehome_test".to_string()),
            "JWT_SECRET" => Some("router-test-secret".to_string()),
            "ALERT_SWEEP_ENABLED" => Some("false".to_string()),
            _ => None,
        })
        .unwrap()
    }

    // The pool never connects; these routes are rejected or answered before any query
    // other than the activity logger's name lookup, which gives up quickly and is skipped.
    fn test_state() -> AppState {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy(&config.database_url)
            .unwrap();
        AppState::with_pool(config, pool)
    }

    fn token_for(state: &AppState, role: UserRole) -> String {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            home_id: Uuid::new_v4(),
            name: "Router Test".into(),
            email: "router@example.com".into(),
            password_hash: String::new(),
            role,
            status: UserStatus::Active,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        state.jwt.issue(&user).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = build_router(test_state()).unwrap();
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let app = build_router(test_state()).unwrap();
        let response = app
            .oneshot(Request::get("/api/staff").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid or missing authentication token");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = build_router(test_state()).unwrap();
        let response = app
            .oneshot(
                Request::get("/api/dashboard")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn readonly_caller_cannot_create_staff() {
        let state = test_state();
        let token = token_for(&state, UserRole::Readonly);
        let app = build_router(state).unwrap();

        let response = app
            .oneshot(
                Request::post("/api/staff")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"Ada","email":"ada@example.com","role":"Carer"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Admin access required");
    }

    #[tokio::test]
    async fn staff_caller_cannot_invite_users() {
        let state = test_state();
        let token = token_for(&state, UserRole::Staff);
        let app = build_router(state).unwrap();

        let response = app
            .oneshot(
                Request::post("/api/users/invite")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"Ben","email":"ben@example.com","role":"staff"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn register_validates_before_touching_the_database() {
        let app = build_router(test_state()).unwrap();
        let response = app
            .oneshot(
                Request::post("/api/auth/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"","email":"nope","password":"123"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["details"]["email"].is_array());
        assert!(body["details"]["password"].is_array());
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = build_router(test_state()).unwrap();
        let response = app
            .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["paths"]["/api/dashboard"].is_object());
    }

    #[test]
    fn invalid_cors_origin_is_a_startup_error() {
        assert!(cors_layer(Some("http://ok.example")).is_ok());
        assert!(cors_layer(Some("bad\norigin")).is_err());
        assert!(cors_layer(None).is_ok());
    }
}
