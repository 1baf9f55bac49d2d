//! API request/response models for residents.

use super::pagination::Pagination;
use crate::db::models::residents::ResidentDBResponse;
use crate::types::{ApartmentId, ResidentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Role enum for the different jobs around the building
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "resident_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResidentRole {
    Management,
    Resident,
    Accountant,
    Security,
}

/// Whether a resident currently lives in the building. Departed residents are
/// kept as inactive rows rather than deleted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "residency_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResidencyStatus {
    Active,
    Inactive,
}

// Resident request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResidentCreate {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub display_name: Option<String>,
    /// Defaults to `resident` when omitted
    pub role: Option<ResidentRole>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub apartment_id: Option<ApartmentId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ResidentUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub display_name: Option<String>,
    pub role: Option<ResidentRole>,
    pub status: Option<ResidencyStatus>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub apartment_id: Option<ApartmentId>,
}

// Resident response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResidentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ResidentId,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub display_name: Option<String>,
    pub role: ResidentRole,
    pub status: ResidencyStatus,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub apartment_id: Option<ApartmentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ResidentDBResponse> for ResidentResponse {
    fn from(db: ResidentDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            phone: db.phone,
            display_name: db.display_name,
            role: db.role,
            status: db.status,
            apartment_id: db.apartment_id,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query parameters for listing residents
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListResidentsQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Search query to filter residents by display_name, username, or email (case-insensitive substring match)
    pub search: Option<String>,

    /// Filter by residency status (default: active)
    pub status: Option<ResidencyStatus>,

    /// Filter by role
    pub role: Option<ResidentRole>,
}

/// The authenticated resident, as resolved from a session token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: ResidentId,
    pub username: String,
    pub email: String,
    pub role: ResidentRole,
    pub display_name: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub apartment_id: Option<ApartmentId>,
}

impl From<ResidentDBResponse> for CurrentUser {
    fn from(db: ResidentDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            role: db.role,
            display_name: db.display_name,
            apartment_id: db.apartment_id,
        }
    }
}
