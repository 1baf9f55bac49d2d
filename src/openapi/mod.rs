//! OpenAPI documentation for the management API.
//!
//! The generated spec is served at `/api-docs/openapi.json` with an interactive
//! viewer at `/admin/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api::{handlers, models};

/// Registers the session cookie and bearer token security schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "session_token".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "courtyard_session",
                    "Session cookie issued by POST /authentication/login",
                ))),
            );
            components.security_schemes.insert(
                "bearer_token".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "The session JWT returned in the login response body, sent as \
                             `Authorization: Bearer <token>`.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::change_password,
        handlers::residents::list_residents,
        handlers::residents::create_resident,
        handlers::residents::get_current_resident,
        handlers::residents::get_resident,
        handlers::residents::update_resident,
        handlers::residents::delete_resident,
        handlers::apartments::list_apartments,
        handlers::apartments::create_apartment,
        handlers::apartments::get_apartment,
        handlers::apartments::update_apartment,
        handlers::apartments::delete_apartment,
        handlers::payments::list_payments,
        handlers::payments::create_payment,
        handlers::payments::get_payment,
        handlers::payments::update_payment,
        handlers::payments::delete_payment,
        handlers::payments::list_fees,
        handlers::payments::payment_status,
        handlers::payments::payment_callback,
        handlers::notifications::list_notifications,
        handlers::notifications::create_notification,
        handlers::notifications::get_notification,
        handlers::notifications::update_notification,
        handlers::notifications::send_notification,
        handlers::notifications::delete_notification,
        handlers::service_requests::list_service_requests,
        handlers::service_requests::create_service_request,
        handlers::service_requests::get_service_request,
        handlers::service_requests::update_service_request,
        handlers::service_requests::delete_service_request,
    ),
    components(schemas(
        models::auth::LoginRequest,
        models::auth::AuthResponse,
        models::auth::AuthSuccessResponse,
        models::auth::ChangePasswordRequest,
        models::residents::ResidentRole,
        models::residents::ResidencyStatus,
        models::residents::ResidentCreate,
        models::residents::ResidentUpdate,
        models::residents::ResidentResponse,
        models::residents::CurrentUser,
        models::apartments::ApartmentCreate,
        models::apartments::ApartmentUpdate,
        models::apartments::ApartmentResponse,
        models::payments::PaymentState,
        models::payments::PaymentCreate,
        models::payments::PaymentUpdate,
        models::payments::PaymentResponse,
        models::payments::FeeResponse,
        models::payments::PaymentStatusResponse,
        models::payments::PaymentCallbackRequest,
        models::payments::PaymentCallbackResponse,
        models::notifications::NotificationCreate,
        models::notifications::NotificationUpdate,
        models::notifications::NotificationResponse,
        models::service_requests::RequestStatus,
        models::service_requests::ServiceRequestCreate,
        models::service_requests::ServiceRequestUpdate,
        models::service_requests::ServiceRequestResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "authentication", description = "Login, logout and password management"),
        (name = "residents", description = "Resident accounts and roles"),
        (name = "apartments", description = "Apartment registry"),
        (name = "payments", description = "Payments, fees and provider callbacks"),
        (name = "notifications", description = "Building notices and per-apartment messages"),
        (name = "service-requests", description = "Maintenance and service requests"),
    ),
    info(
        title = "Courtyard Management API",
        description = "REST API for apartment building management: residents, apartments, \
                       payments, notifications and service requests.",
    )
)]
pub struct ApiDoc;
