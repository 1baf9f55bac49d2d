use crate::{
    api::models::{
        notifications::{ListNotificationsQuery, NotificationCreate, NotificationResponse, NotificationUpdate},
        pagination::PaginatedResponse,
    },
    auth::permissions::{can_access_all, operation, resource, RequiresPermission},
    db::{
        errors::DbError,
        handlers::{notifications::NotificationFilter, Notifications, Repository},
        models::notifications::{NotificationCreateDBRequest, NotificationUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{NotificationId, Operation, Resource},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

/// List notifications
#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    params(ListNotificationsQuery),
    responses(
        (status = 200, description = "List of notifications", body = PaginatedResponse<NotificationResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<ListNotificationsQuery>,
    perm: RequiresPermission<resource::Notifications, operation::ReadOwn>,
) -> Result<Json<PaginatedResponse<NotificationResponse>>> {
    let user = perm.user;
    let (skip, limit) = query.pagination.params();

    let mut filter = NotificationFilter::new(skip, limit);
    if can_access_all(&user, Resource::Notifications, Operation::ReadAll) {
        filter.apartment_id = query.apartment_id;
    } else {
        // Residents see their apartment's notices plus broadcasts; with no
        // apartment assigned, broadcasts only
        match user.apartment_id {
            Some(apartment_id) => filter.apartment_id = Some(apartment_id),
            None => filter.only_broadcast = true,
        }
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Notifications::new(&mut pool_conn);

    let notifications = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    let data = notifications.into_iter().map(NotificationResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total_count, skip, limit)))
}

/// Create a notification
#[utoipa::path(
    post,
    path = "/notifications",
    tag = "notifications",
    request_body = NotificationCreate,
    responses(
        (status = 201, description = "Notification created, not yet sent", body = NotificationResponse),
        (status = 400, description = "Empty content"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn create_notification(
    State(state): State<AppState>,
    _perm: RequiresPermission<resource::Notifications, operation::CreateAll>,
    Json(request): Json<NotificationCreate>,
) -> Result<(StatusCode, Json<NotificationResponse>)> {
    if request.content.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "content is required".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Notifications::new(&mut pool_conn);

    let db_request = NotificationCreateDBRequest {
        apartment_id: request.apartment_id,
        content: request.content,
    };
    let notification = repo.create(&db_request).await?;

    Ok((StatusCode::CREATED, Json(NotificationResponse::from(notification))))
}

/// Get a notification by ID
#[utoipa::path(
    get,
    path = "/notifications/{notification_id}",
    tag = "notifications",
    params(
        ("notification_id" = String, Path, description = "Notification ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Notification found", body = NotificationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Notification not found"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn get_notification(
    State(state): State<AppState>,
    Path(notification_id): Path<NotificationId>,
    perm: RequiresPermission<resource::Notifications, operation::ReadOwn>,
) -> Result<Json<NotificationResponse>> {
    let user = perm.user;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Notifications::new(&mut pool_conn);

    let notification = repo.get_by_id(notification_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Notification".to_string(),
        id: notification_id.to_string(),
    })?;

    // Other apartments' notices read as 404; broadcasts are visible to all
    let visible = can_access_all(&user, Resource::Notifications, Operation::ReadAll)
        || notification.apartment_id.is_none()
        || notification.apartment_id == user.apartment_id;
    if !visible {
        return Err(Error::NotFound {
            resource: "Notification".to_string(),
            id: notification_id.to_string(),
        });
    }

    Ok(Json(NotificationResponse::from(notification)))
}

/// Edit a notification's content
#[utoipa::path(
    put,
    path = "/notifications/{notification_id}",
    tag = "notifications",
    params(
        ("notification_id" = String, Path, description = "Notification ID (UUID)"),
    ),
    request_body = NotificationUpdate,
    responses(
        (status = 200, description = "Notification updated", body = NotificationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Notification not found"),
        (status = 409, description = "Notification already sent"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn update_notification(
    State(state): State<AppState>,
    Path(notification_id): Path<NotificationId>,
    _perm: RequiresPermission<resource::Notifications, operation::UpdateAll>,
    Json(request): Json<NotificationUpdate>,
) -> Result<Json<NotificationResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Notifications::new(&mut pool_conn);

    let db_request = NotificationUpdateDBRequest { content: request.content };

    match repo.update(notification_id, &db_request).await {
        Ok(notification) => Ok(Json(NotificationResponse::from(notification))),
        // Edits only apply while unsent; work out which rule was broken
        Err(DbError::NotFound) => match repo.get_by_id(notification_id).await? {
            Some(_) => Err(Error::Conflict {
                message: format!("Notification {notification_id} has already been sent and can no longer be edited"),
            }),
            None => Err(Error::NotFound {
                resource: "Notification".to_string(),
                id: notification_id.to_string(),
            }),
        },
        Err(e) => Err(Error::Database(e)),
    }
}

/// Mark a notification as sent
#[utoipa::path(
    patch,
    path = "/notifications/{notification_id}/send",
    tag = "notifications",
    params(
        ("notification_id" = String, Path, description = "Notification ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Notification marked as sent", body = NotificationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Notification not found"),
        (status = 409, description = "Notification already sent"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn send_notification(
    State(state): State<AppState>,
    Path(notification_id): Path<NotificationId>,
    _perm: RequiresPermission<resource::Notifications, operation::UpdateAll>,
) -> Result<Json<NotificationResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Notifications::new(&mut pool_conn);

    match repo.mark_sent(notification_id).await? {
        Some(notification) => Ok(Json(NotificationResponse::from(notification))),
        None => match repo.get_by_id(notification_id).await? {
            Some(_) => Err(Error::Conflict {
                message: format!("Notification {notification_id} has already been sent"),
            }),
            None => Err(Error::NotFound {
                resource: "Notification".to_string(),
                id: notification_id.to_string(),
            }),
        },
    }
}

/// Delete a notification
#[utoipa::path(
    delete,
    path = "/notifications/{notification_id}",
    tag = "notifications",
    params(
        ("notification_id" = String, Path, description = "Notification ID (UUID)"),
    ),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Notification not found"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    Path(notification_id): Path<NotificationId>,
    _perm: RequiresPermission<resource::Notifications, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Notifications::new(&mut pool_conn);

    if !repo.delete(notification_id).await? {
        return Err(Error::NotFound {
            resource: "Notification".to_string(),
            id: notification_id.to_string(),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::models::residents::ResidentRole,
        db::models::apartments::ApartmentCreateDBRequest,
        test_utils::{authenticated_server, notifications_router},
    };
    use sqlx::PgPool;

    async fn seed_apartment(pool: &PgPool, number: &str) -> crate::types::ApartmentId {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = crate::db::handlers::Apartments::new(&mut conn);
        repo.create(&ApartmentCreateDBRequest {
            number: number.to_string(),
            floor: None,
            notes: None,
        })
        .await
        .unwrap()
        .id
    }

    async fn seed_notification(server: &axum_test::TestServer, apartment_id: Option<crate::types::ApartmentId>) -> NotificationResponse {
        let response = server
            .post("/notifications")
            .json(&NotificationCreate {
                apartment_id,
                content: "Water outage on Saturday morning".to_string(),
            })
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }

    #[sqlx::test]
    async fn test_create_starts_unsent(pool: PgPool) {
        let (server, _manager) = authenticated_server(&pool, ResidentRole::Management, notifications_router).await;

        let notification = seed_notification(&server, None).await;
        assert!(notification.sent_at.is_none());
        assert!(notification.apartment_id.is_none());
    }

    #[sqlx::test]
    async fn test_edit_then_send_then_conflict(pool: PgPool) {
        let (server, _manager) = authenticated_server(&pool, ResidentRole::Management, notifications_router).await;
        let notification = seed_notification(&server, None).await;

        // Unsent notifications can be edited
        let response = server
            .put(&format!("/notifications/{}", notification.id))
            .json(&NotificationUpdate {
                content: Some("Water outage moved to Sunday".to_string()),
            })
            .await;
        response.assert_status(axum::http::StatusCode::OK);

        // Sending works once
        let response = server.patch(&format!("/notifications/{}/send", notification.id)).await;
        response.assert_status(axum::http::StatusCode::OK);
        let sent: NotificationResponse = response.json();
        assert!(sent.sent_at.is_some());

        // A second send is a conflict
        let response = server.patch(&format!("/notifications/{}/send", notification.id)).await;
        response.assert_status(axum::http::StatusCode::CONFLICT);

        // And so is editing after the fact
        let response = server
            .put(&format!("/notifications/{}", notification.id))
            .json(&NotificationUpdate {
                content: Some("Too late".to_string()),
            })
            .await;
        response.assert_status(axum::http::StatusCode::CONFLICT);
    }

    #[sqlx::test]
    async fn test_send_unknown_notification(pool: PgPool) {
        let (server, _manager) = authenticated_server(&pool, ResidentRole::Management, notifications_router).await;

        let response = server.patch(&format!("/notifications/{}/send", uuid::Uuid::new_v4())).await;
        response.assert_status(axum::http::StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn test_resident_list_includes_broadcasts_only_without_apartment(pool: PgPool) {
        let apartment_id = seed_apartment(&pool, "4B").await;
        let (manager_server, _manager) = authenticated_server(&pool, ResidentRole::Management, notifications_router).await;
        seed_notification(&manager_server, None).await;
        seed_notification(&manager_server, Some(apartment_id)).await;

        // The test resident has no apartment, so only the broadcast shows up
        let (server, _me) = authenticated_server(&pool, ResidentRole::Resident, notifications_router).await;
        let response = server.get("/notifications").await;
        response.assert_status(axum::http::StatusCode::OK);
        let body: PaginatedResponse<NotificationResponse> = response.json();
        assert_eq!(body.data.len(), 1);
        assert!(body.data[0].apartment_id.is_none());
    }

    #[sqlx::test]
    async fn test_resident_cannot_read_other_apartments_notice(pool: PgPool) {
        let apartment_id = seed_apartment(&pool, "7A").await;
        let (manager_server, _manager) = authenticated_server(&pool, ResidentRole::Management, notifications_router).await;
        let scoped = seed_notification(&manager_server, Some(apartment_id)).await;
        let broadcast = seed_notification(&manager_server, None).await;

        let (server, _me) = authenticated_server(&pool, ResidentRole::Resident, notifications_router).await;

        let response = server.get(&format!("/notifications/{}", scoped.id)).await;
        response.assert_status(axum::http::StatusCode::NOT_FOUND);

        let response = server.get(&format!("/notifications/{}", broadcast.id)).await;
        response.assert_status(axum::http::StatusCode::OK);
    }

    #[sqlx::test]
    async fn test_security_reads_but_cannot_create(pool: PgPool) {
        let (manager_server, _manager) = authenticated_server(&pool, ResidentRole::Management, notifications_router).await;
        seed_notification(&manager_server, None).await;

        let (server, _security) = authenticated_server(&pool, ResidentRole::Security, notifications_router).await;

        let response = server.get("/notifications").await;
        response.assert_status(axum::http::StatusCode::OK);

        let response = server
            .post("/notifications")
            .json(&NotificationCreate {
                apartment_id: None,
                content: "Not allowed".to_string(),
            })
            .await;
        response.assert_status(axum::http::StatusCode::FORBIDDEN);
    }
}
