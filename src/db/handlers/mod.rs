//! Repository implementations for database access.
//!
//! This module provides repository structs for each major entity in the system.
//! Repositories follow a consistent pattern and implement the [`Repository`] trait.
//!
//! # Design Pattern
//!
//! Each repository:
//! - Wraps a SQLx connection or transaction
//! - Provides strongly-typed CRUD operations
//! - Handles query construction and parameter binding
//! - Returns domain models from [`crate::db::models`]
//!
//! # Common Pattern
//!
//! ```ignore
//! use courtyard::db::handlers::{Residents, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut repo = Residents::new(&mut tx);
//!     let residents = repo.list(&filter).await?;
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod apartments;
pub mod notifications;
pub mod payments;
pub mod repository;
pub mod residents;
pub mod service_requests;

pub use apartments::Apartments;
pub use notifications::Notifications;
pub use payments::Payments;
pub use repository::Repository;
pub use residents::Residents;
pub use service_requests::ServiceRequests;
