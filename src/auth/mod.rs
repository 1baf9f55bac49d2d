//! Authentication and authorization system.
//!
//! # Authentication Methods
//!
//! The system supports two ways of presenting the same JWT session token:
//!
//! ## 1. Session Cookie
//!
//! Browser-based authentication using secure HTTP-only cookies:
//! - Residents log in via `/authentication/login` with email/password
//! - The JWT is stored in a secure, HTTP-only cookie
//! - Tokens expire after the configured `jwt_expiry`
//!
//! ## 2. Bearer Token
//!
//! Header-based authentication for programmatic clients:
//! - The login response body carries the same JWT
//! - Passed in `Authorization: Bearer <token>` header
//!
//! # Authorization
//!
//! Access control is role based. Each [`ResidentRole`] grants a fixed set of
//! (resource, operation) pairs; `*Own` grants are restricted to the caller's
//! own records. See [`permissions`] for the full matrix.
//!
//! # Modules
//!
//! - [`current_user`]: Extractor for getting the authenticated resident in handlers
//! - [`password`]: Password hashing and verification using Argon2
//! - [`permissions`]: Permission checking and access control logic
//! - [`session`]: JWT session token creation and verification
//!
//! [`ResidentRole`]: crate::api::models::residents::ResidentRole

pub mod current_user;
pub mod password;
pub mod permissions;
pub mod session;
