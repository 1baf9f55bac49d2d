//! API models for authentication payloads and responses.
//!
//! Login and logout responses carry a `Set-Cookie` header alongside their JSON
//! body, so they implement [`IntoResponse`] directly instead of being wrapped
//! in `Json` by the handler.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::models::residents::ResidentResponse;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login payload: the resident profile plus the session token.
///
/// The token is also set as an HttpOnly cookie; it is returned in the body so
/// API clients can send it as `Authorization: Bearer <token>` instead.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: ResidentResponse,
    pub token: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthSuccessResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Login response with session cookie
pub struct LoginResponse {
    pub auth_response: AuthResponse,
    pub cookie: String,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, Json(self.auth_response)).into_response();

        if let Ok(cookie_value) = HeaderValue::from_str(&self.cookie) {
            response.headers_mut().insert(SET_COOKIE, cookie_value);
        }

        response
    }
}

/// Logout response with expired session cookie
pub struct LogoutResponse {
    pub auth_response: AuthSuccessResponse,
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, Json(self.auth_response)).into_response();

        if let Ok(cookie_value) = HeaderValue::from_str(&self.cookie) {
            response.headers_mut().insert(SET_COOKIE, cookie_value);
        }

        response
    }
}
