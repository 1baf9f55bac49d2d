use axum::{extract::State, Json};

use crate::{
    api::models::{
        auth::{AuthResponse, AuthSuccessResponse, ChangePasswordRequest, LoginRequest, LoginResponse, LogoutResponse},
        residents::{CurrentUser, ResidencyStatus, ResidentResponse},
    },
    auth::{password, password::Argon2Params, session},
    db::{
        handlers::{Repository, Residents},
        models::residents::ResidentUpdateDBRequest,
    },
    errors::Error,
    AppState,
};

/// Login with email and password
#[utoipa::path(
    post,
    path = "/authentication/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    // Check if native auth is enabled
    if !state.config.auth.native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut resident_repo = Residents::new(&mut pool_conn);

    // Find resident by email
    let resident = resident_repo
        .get_by_email(&request.email)
        .await?
        .ok_or_else(|| Error::Unauthenticated {
            message: Some("Invalid email or password".to_string()),
        })?;

    // Former residents keep their row but can no longer log in
    if resident.status != ResidencyStatus::Active {
        return Err(Error::Unauthenticated {
            message: Some("Invalid email or password".to_string()),
        });
    }

    // Check if the resident has a password set
    let password_hash = resident.password_hash.as_ref().ok_or_else(|| Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    })?;

    // Verify password on a blocking thread to avoid blocking async runtime
    let password = request.password.clone();
    let hash = password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Invalid email or password".to_string()),
        });
    }

    // Create session token
    let current_user = CurrentUser::from(resident.clone());
    let token = session::create_session_token(&current_user, &state.config)?;

    // Set session cookie
    let cookie = create_session_cookie(&token, &state.config);

    let auth_response = AuthResponse {
        user: ResidentResponse::from(resident),
        token,
        message: "Login successful".to_string(),
    };

    Ok(LoginResponse { auth_response, cookie })
}

/// Logout (clear session)
#[utoipa::path(
    post,
    path = "/authentication/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = AuthSuccessResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> Result<LogoutResponse, Error> {
    // Create expired cookie to clear session
    let cookie = format!(
        "{}=; Path=/; HttpOnly; Secure; SameSite=Strict; Max-Age=0",
        state.config.auth.native.session.cookie_name
    );

    let auth_response = AuthSuccessResponse {
        message: "Logout successful".to_string(),
    };

    Ok(LogoutResponse { auth_response, cookie })
}

/// Change password for the authenticated resident
#[utoipa::path(
    post,
    path = "/authentication/password-change",
    request_body = ChangePasswordRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Password changed successfully", body = AuthSuccessResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Current password is incorrect"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<AuthSuccessResponse>, Error> {
    // Check if native auth is enabled
    if !state.config.auth.native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut resident_repo = Residents::new(&mut pool_conn);

    // Get the resident from database
    let resident = resident_repo
        .get_by_id(current_user.id)
        .await?
        .ok_or_else(|| Error::Unauthenticated {
            message: Some("Resident not found".to_string()),
        })?;

    // Residents created without a password cannot change one
    let password_hash = resident.password_hash.as_ref().ok_or_else(|| Error::BadRequest {
        message: "No password is set for this account".to_string(),
    })?;

    // Verify current password
    let current_password = request.current_password.clone();
    let hash = password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&current_password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Current password is incorrect".to_string()),
        });
    }

    // Validate new password length
    let password_config = &state.config.auth.native.password;
    if request.new_password.len() < password_config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }
    if request.new_password.len() > password_config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", password_config.max_length),
        });
    }

    // Hash new password
    let params = Argon2Params {
        memory_kib: password_config.argon2_memory_kib,
        iterations: password_config.argon2_iterations,
        parallelism: password_config.argon2_parallelism,
    };
    let new_password_hash = tokio::task::spawn_blocking({
        let password = request.new_password.clone();
        move || password::hash_string_with_params(&password, Some(params))
    })
    .await
    .map_err(|e| Error::Internal {
        operation: format!("spawn password hashing task: {e}"),
    })??;

    // Update password
    let update_request = ResidentUpdateDBRequest {
        password_hash: Some(new_password_hash),
        ..Default::default()
    };

    resident_repo.update(current_user.id, &update_request).await?;

    Ok(Json(AuthSuccessResponse {
        message: "Password changed successfully".to_string(),
    }))
}

/// Helper function to create a session cookie
fn create_session_cookie(token: &str, config: &crate::config::Config) -> String {
    let session_config = &config.auth.native.session;
    let max_age = config.auth.security.jwt_expiry.as_secs();

    format!(
        "{}={}; Path=/; HttpOnly; Secure={}; SameSite={}; Max-Age={}",
        session_config.cookie_name, token, session_config.cookie_secure, session_config.cookie_same_site, max_age
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::models::residents::ResidentRole,
        test_utils::{create_test_config, create_test_resident_with_password},
    };
    use axum_test::TestServer;
    use sqlx::PgPool;

    fn auth_router(state: AppState) -> axum::Router {
        axum::Router::new()
            .route("/authentication/login", axum::routing::post(login))
            .route("/authentication/logout", axum::routing::post(logout))
            .route("/authentication/password-change", axum::routing::post(change_password))
            .with_state(state)
    }

    #[sqlx::test]
    async fn test_login_success(pool: PgPool) {
        let config = create_test_config();
        let resident = create_test_resident_with_password(&pool, ResidentRole::Resident, "password123").await;
        let state = AppState::builder().db(pool).config(config).build();

        let server = TestServer::new(auth_router(state)).unwrap();

        let response = server
            .post("/authentication/login")
            .json(&LoginRequest {
                email: resident.email.clone(),
                password: "password123".to_string(),
            })
            .await;

        response.assert_status(axum::http::StatusCode::OK);
        assert!(response.headers().get("set-cookie").is_some());

        let body: AuthResponse = response.json();
        assert_eq!(body.user.email, resident.email);
        assert!(!body.token.is_empty());
        assert_eq!(body.message, "Login successful");
    }

    #[sqlx::test]
    async fn test_login_wrong_password(pool: PgPool) {
        let config = create_test_config();
        let resident = create_test_resident_with_password(&pool, ResidentRole::Resident, "password123").await;
        let state = AppState::builder().db(pool).config(config).build();

        let server = TestServer::new(auth_router(state)).unwrap();

        let response = server
            .post("/authentication/login")
            .json(&LoginRequest {
                email: resident.email,
                password: "wrong-password".to_string(),
            })
            .await;

        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_login_unknown_email(pool: PgPool) {
        let config = create_test_config();
        let state = AppState::builder().db(pool).config(config).build();

        let server = TestServer::new(auth_router(state)).unwrap();

        let response = server
            .post("/authentication/login")
            .json(&LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await;

        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_login_inactive_resident_rejected(pool: PgPool) {
        let config = create_test_config();
        let resident = create_test_resident_with_password(&pool, ResidentRole::Resident, "password123").await;

        // Soft delete the resident, the row survives but login must fail
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Residents::new(&mut conn);
        assert!(repo.delete(resident.id).await.unwrap());
        drop(conn);

        let state = AppState::builder().db(pool).config(config).build();
        let server = TestServer::new(auth_router(state)).unwrap();

        let response = server
            .post("/authentication/login")
            .json(&LoginRequest {
                email: resident.email,
                password: "password123".to_string(),
            })
            .await;

        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_logout_clears_cookie(pool: PgPool) {
        let config = create_test_config();
        let state = AppState::builder().db(pool).config(config).build();

        let server = TestServer::new(auth_router(state)).unwrap();

        let response = server.post("/authentication/logout").await;
        response.assert_status(axum::http::StatusCode::OK);

        let cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));
    }

    #[sqlx::test]
    async fn test_change_password_flow(pool: PgPool) {
        let config = create_test_config();
        let resident = create_test_resident_with_password(&pool, ResidentRole::Resident, "old-password").await;
        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();

        let server = TestServer::new(auth_router(state)).unwrap();

        // Login to get a token
        let login_response = server
            .post("/authentication/login")
            .json(&LoginRequest {
                email: resident.email.clone(),
                password: "old-password".to_string(),
            })
            .await;
        login_response.assert_status(axum::http::StatusCode::OK);
        let auth: AuthResponse = login_response.json();

        // Change the password with a Bearer token
        let response = server
            .post("/authentication/password-change")
            .authorization_bearer(&auth.token)
            .json(&ChangePasswordRequest {
                current_password: "old-password".to_string(),
                new_password: "new-password-456".to_string(),
            })
            .await;
        response.assert_status(axum::http::StatusCode::OK);

        // Old password no longer works
        let response = server
            .post("/authentication/login")
            .json(&LoginRequest {
                email: resident.email.clone(),
                password: "old-password".to_string(),
            })
            .await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);

        // New one does
        let response = server
            .post("/authentication/login")
            .json(&LoginRequest {
                email: resident.email,
                password: "new-password-456".to_string(),
            })
            .await;
        response.assert_status(axum::http::StatusCode::OK);
    }

    #[sqlx::test]
    async fn test_change_password_wrong_current(pool: PgPool) {
        let config = create_test_config();
        let resident = create_test_resident_with_password(&pool, ResidentRole::Resident, "correct-password").await;
        let state = AppState::builder().db(pool).config(config).build();

        let server = TestServer::new(auth_router(state)).unwrap();

        let login_response = server
            .post("/authentication/login")
            .json(&LoginRequest {
                email: resident.email,
                password: "correct-password".to_string(),
            })
            .await;
        let auth: AuthResponse = login_response.json();

        let response = server
            .post("/authentication/password-change")
            .authorization_bearer(&auth.token)
            .json(&ChangePasswordRequest {
                current_password: "not-the-password".to_string(),
                new_password: "whatever-new-1".to_string(),
            })
            .await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_change_password_too_short(pool: PgPool) {
        let config = create_test_config();
        let resident = create_test_resident_with_password(&pool, ResidentRole::Resident, "correct-password").await;
        let state = AppState::builder().db(pool).config(config).build();

        let server = TestServer::new(auth_router(state)).unwrap();

        let login_response = server
            .post("/authentication/login")
            .json(&LoginRequest {
                email: resident.email,
                password: "correct-password".to_string(),
            })
            .await;
        let auth: AuthResponse = login_response.json();

        let response = server
            .post("/authentication/password-change")
            .authorization_bearer(&auth.token)
            .json(&ChangePasswordRequest {
                current_password: "correct-password".to_string(),
                new_password: "short".to_string(),
            })
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }
}
