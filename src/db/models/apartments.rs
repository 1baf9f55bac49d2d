//! Database models for apartments.

use crate::api::models::apartments::{ApartmentCreate, ApartmentUpdate};
use crate::types::ApartmentId;
use chrono::{DateTime, Utc};

/// Database request for creating a new apartment
#[derive(Debug, Clone)]
pub struct ApartmentCreateDBRequest {
    pub number: String,
    pub floor: Option<i32>,
    pub notes: Option<String>,
}

impl From<ApartmentCreate> for ApartmentCreateDBRequest {
    fn from(api: ApartmentCreate) -> Self {
        Self {
            number: api.number,
            floor: api.floor,
            notes: api.notes,
        }
    }
}

/// Database request for updating an apartment
#[derive(Debug, Clone, Default)]
pub struct ApartmentUpdateDBRequest {
    pub number: Option<String>,
    pub floor: Option<i32>,
    pub notes: Option<String>,
}

impl From<ApartmentUpdate> for ApartmentUpdateDBRequest {
    fn from(api: ApartmentUpdate) -> Self {
        Self {
            number: api.number,
            floor: api.floor,
            notes: api.notes,
        }
    }
}

/// Database response for an apartment
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApartmentDBResponse {
    pub id: ApartmentId,
    pub number: String,
    pub floor: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
