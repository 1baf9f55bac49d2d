//! Test utilities for integration testing (available with `test-utils` feature).

use crate::{
    api::models::residents::{CurrentUser, ResidentRole},
    auth::{password, session::create_session_token},
    config::{Config, PoolSettings},
    db::{
        handlers::{Repository, Residents},
        models::residents::{ResidentCreateDBRequest, ResidentDBResponse},
    },
    AppState,
};
use axum::Router;
use axum_test::TestServer;
use sqlx::PgPool;
use uuid::Uuid;

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        admin_email: "admin@test.com".to_string(),
        admin_password: None,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        database: crate::config::DatabaseConfig {
            // Overridden by the sqlx test pool
            url: "postgres://localhost:5432/courtyard_test".to_string(),
            pool: PoolSettings {
                max_connections: 1,
                min_connections: 1,
                ..Default::default()
            },
        },
        auth: crate::config::AuthConfig {
            native: crate::config::NativeAuthConfig {
                enabled: true,
                password: crate::config::PasswordConfig {
                    // Weak parameters so password tests stay fast
                    argon2_memory_kib: 1024,
                    argon2_iterations: 1,
                    ..Default::default()
                },
                session: crate::config::SessionConfig {
                    cookie_secure: false,
                    ..Default::default()
                },
            },
            security: crate::config::SecurityConfig::default(),
        },
        enable_metrics: false,
        ..Default::default()
    }
}

pub async fn create_test_resident(pool: &PgPool, role: ResidentRole) -> ResidentDBResponse {
    create_resident_inner(pool, role, None).await
}

pub async fn create_test_resident_with_password(pool: &PgPool, role: ResidentRole, password: &str) -> ResidentDBResponse {
    let hash = password::hash_string(password).expect("Failed to hash test password");
    create_resident_inner(pool, role, Some(hash)).await
}

async fn create_resident_inner(pool: &PgPool, role: ResidentRole, password_hash: Option<String>) -> ResidentDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut repo = Residents::new(&mut conn);
    let tag = Uuid::new_v4().simple().to_string();

    let request = ResidentCreateDBRequest {
        username: format!("resident_{tag}"),
        email: format!("resident_{tag}@example.com"),
        phone: format!("+27{}", &tag[..9]),
        display_name: Some("Test Resident".to_string()),
        role,
        apartment_id: None,
        password_hash,
    };

    repo.create(&request).await.expect("Failed to create test resident")
}

/// Build a [`TestServer`] around the given router with a freshly created resident
/// already authenticated via a bearer token.
pub async fn authenticated_server(
    pool: &PgPool,
    role: ResidentRole,
    router: fn(AppState) -> Router,
) -> (TestServer, ResidentDBResponse) {
    let config = create_test_config();
    let state = AppState::builder().db(pool.clone()).config(config.clone()).build();

    let resident = create_test_resident(pool, role).await;
    let token = create_session_token(&CurrentUser::from(resident.clone()), &config).expect("Failed to create session token");

    let mut server = TestServer::new(router(state)).expect("Failed to create test server");
    let bearer = axum::http::HeaderValue::from_str(&format!("Bearer {token}")).expect("Token should be a valid header value");
    server.add_header(axum::http::header::AUTHORIZATION, bearer);

    (server, resident)
}

pub fn residents_router(state: AppState) -> Router {
    use crate::api::handlers::residents;
    use axum::routing::get;

    Router::new()
        .route("/residents", get(residents::list_residents).post(residents::create_resident))
        .route("/residents/current", get(residents::get_current_resident))
        .route(
            "/residents/{resident_id}",
            get(residents::get_resident)
                .put(residents::update_resident)
                .delete(residents::delete_resident),
        )
        .with_state(state)
}

pub fn apartments_router(state: AppState) -> Router {
    use crate::api::handlers::apartments;
    use axum::routing::get;

    Router::new()
        .route("/apartments", get(apartments::list_apartments).post(apartments::create_apartment))
        .route(
            "/apartments/{apartment_id}",
            get(apartments::get_apartment)
                .put(apartments::update_apartment)
                .delete(apartments::delete_apartment),
        )
        .with_state(state)
}

pub fn payments_router(state: AppState) -> Router {
    use crate::api::handlers::payments;
    use axum::routing::{get, post};

    Router::new()
        .route("/payments", get(payments::list_payments).post(payments::create_payment))
        .route(
            "/payments/{payment_id}",
            get(payments::get_payment).patch(payments::update_payment).delete(payments::delete_payment),
        )
        .route("/fees", get(payments::list_fees))
        .route("/payment-status", get(payments::payment_status))
        .route("/payments/callback", post(payments::payment_callback))
        .with_state(state)
}

pub fn notifications_router(state: AppState) -> Router {
    use crate::api::handlers::notifications;
    use axum::routing::{get, patch};

    Router::new()
        .route(
            "/notifications",
            get(notifications::list_notifications).post(notifications::create_notification),
        )
        .route(
            "/notifications/{notification_id}",
            get(notifications::get_notification)
                .put(notifications::update_notification)
                .delete(notifications::delete_notification),
        )
        .route("/notifications/{notification_id}/send", patch(notifications::send_notification))
        .with_state(state)
}

pub fn service_requests_router(state: AppState) -> Router {
    use crate::api::handlers::service_requests;
    use axum::routing::get;

    Router::new()
        .route(
            "/service-requests",
            get(service_requests::list_service_requests).post(service_requests::create_service_request),
        )
        .route(
            "/service-requests/{request_id}",
            get(service_requests::get_service_request)
                .patch(service_requests::update_service_request)
                .delete(service_requests::delete_service_request),
        )
        .with_state(state)
}
