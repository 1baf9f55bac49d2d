//! Database record models matching table schemas.
//!
//! This module contains struct definitions that directly correspond to database
//! table rows. These models are used by repositories to return query results
//! and accept insertion/update data.
//!
//! Database models are distinct from API models so that storage and API
//! representations can evolve independently. Conversions to API models live
//! next to the API model definitions.

pub mod apartments;
pub mod notifications;
pub mod payments;
pub mod residents;
pub mod service_requests;
