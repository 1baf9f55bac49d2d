//! Database models for service requests.

use crate::api::models::service_requests::RequestStatus;
use crate::types::{ResidentId, ServiceRequestId};
use chrono::{DateTime, Utc};

/// Database request for creating a new service request
#[derive(Debug, Clone)]
pub struct ServiceRequestCreateDBRequest {
    pub resident_id: ResidentId,
    pub content: String,
}

/// Database request for updating a service request (status and/or feedback)
#[derive(Debug, Clone, Default)]
pub struct ServiceRequestUpdateDBRequest {
    pub status: Option<RequestStatus>,
    pub feedback: Option<String>,
}

/// Database response for a service request
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceRequestDBResponse {
    pub id: ServiceRequestId,
    pub resident_id: ResidentId,
    pub content: String,
    pub status: RequestStatus,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
