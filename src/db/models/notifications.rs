//! Database models for notifications.

use crate::api::models::notifications::NotificationCreate;
use crate::types::{ApartmentId, NotificationId};
use chrono::{DateTime, Utc};

/// Database request for creating a new notification
#[derive(Debug, Clone)]
pub struct NotificationCreateDBRequest {
    /// Target apartment; `None` means a broadcast to all apartments
    pub apartment_id: Option<ApartmentId>,
    pub content: String,
}

impl From<NotificationCreate> for NotificationCreateDBRequest {
    fn from(api: NotificationCreate) -> Self {
        Self {
            apartment_id: api.apartment_id,
            content: api.content,
        }
    }
}

/// Database request for editing a notification's content
#[derive(Debug, Clone)]
pub struct NotificationUpdateDBRequest {
    pub content: Option<String>,
}

/// Database response for a notification
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationDBResponse {
    pub id: NotificationId,
    pub apartment_id: Option<ApartmentId>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}
