//! HTTP request handlers for all API endpoints.
//!
//! This module contains Axum route handlers organized by resource type.
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Authentication and authorization checks
//! - Business logic execution via database repositories
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`apartments`]: Apartment registry CRUD operations
//! - [`auth`]: Login, logout, and password management
//! - [`notifications`]: Building notices, editing, and send tracking
//! - [`payments`]: Payments, outstanding fees, status lookup, and the provider callback
//! - [`residents`]: Resident directory CRUD and profile management
//! - [`service_requests`]: Maintenance request filing and lifecycle
//!
//! # Authentication
//!
//! Most handlers require authentication via session cookies or Bearer tokens.
//! Role requirements are declared with the
//! [`RequiresPermission`](crate::auth::permissions::RequiresPermission)
//! extractor.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which automatically converts to
//! appropriate HTTP status codes and response bodies.

pub mod apartments;
pub mod auth;
pub mod notifications;
pub mod payments;
pub mod residents;
pub mod service_requests;
