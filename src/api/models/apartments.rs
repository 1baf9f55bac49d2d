//! API request/response models for apartments.

use crate::db::models::apartments::ApartmentDBResponse;
use crate::types::ApartmentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApartmentCreate {
    pub number: String,
    pub floor: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ApartmentUpdate {
    pub number: Option<String>,
    pub floor: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApartmentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ApartmentId,
    pub number: String,
    pub floor: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ApartmentDBResponse> for ApartmentResponse {
    fn from(db: ApartmentDBResponse) -> Self {
        Self {
            id: db.id,
            number: db.number,
            floor: db.floor,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
