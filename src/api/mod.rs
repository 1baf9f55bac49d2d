//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Authentication** (`/authentication/*`): Login, logout, password change
//! - **Residents** (`/api/v1/residents/*`): Resident accounts and profiles
//! - **Apartments** (`/api/v1/apartments/*`): Apartment records
//! - **Payments** (`/api/v1/payments/*`, `/api/v1/fees`): Dues and payment state
//! - **Notifications** (`/api/v1/notifications/*`): Announcements to apartments
//! - **Service requests** (`/api/v1/service-requests/*`): Resident maintenance requests
//! - **Payment callback** (`/payments/callback`, `/payment-status`): Provider-facing endpoints at root level
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`.
//! API documentation is available at `/admin/docs` when the server is running.

pub mod handlers;
pub mod models;
