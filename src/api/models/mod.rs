//! API request and response data models.
//!
//! This module contains the data structures used for HTTP request deserialization
//! and response serialization. These models define the public API contract.
//!
//! API models are distinct from database models, allowing independent evolution
//! of API and storage representations. All models are annotated with `utoipa`
//! for automatic API docs.

pub mod apartments;
pub mod auth;
pub mod notifications;
pub mod pagination;
pub mod payments;
pub mod residents;
pub mod service_requests;
