//! API request/response models for service requests.

use super::pagination::Pagination;
use crate::db::models::service_requests::ServiceRequestDBResponse;
use crate::types::{ResidentId, ServiceRequestId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Lifecycle status of a service request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Open,
    InProgress,
    Resolved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceRequestCreate {
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ServiceRequestUpdate {
    pub status: Option<RequestStatus>,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceRequestResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ServiceRequestId,
    #[schema(value_type = String, format = "uuid")]
    pub resident_id: ResidentId,
    pub content: String,
    pub status: RequestStatus,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ServiceRequestDBResponse> for ServiceRequestResponse {
    fn from(db: ServiceRequestDBResponse) -> Self {
        Self {
            id: db.id,
            resident_id: db.resident_id,
            content: db.content,
            status: db.status,
            feedback: db.feedback,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query parameters for listing service requests
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListServiceRequestsQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Filter by status
    pub status: Option<RequestStatus>,
}
