use crate::{
    api::models::{
        pagination::PaginatedResponse,
        service_requests::{ListServiceRequestsQuery, ServiceRequestCreate, ServiceRequestResponse, ServiceRequestUpdate},
    },
    auth::permissions::{can_access_all, operation, resource, RequiresPermission},
    db::{
        handlers::{service_requests::ServiceRequestFilter, Repository, ServiceRequests},
        models::service_requests::{ServiceRequestCreateDBRequest, ServiceRequestUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{Operation, Permission, Resource, ServiceRequestId},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

/// List service requests
#[utoipa::path(
    get,
    path = "/service-requests",
    tag = "service-requests",
    params(ListServiceRequestsQuery),
    responses(
        (status = 200, description = "List of service requests", body = PaginatedResponse<ServiceRequestResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn list_service_requests(
    State(state): State<AppState>,
    Query(query): Query<ListServiceRequestsQuery>,
    perm: RequiresPermission<resource::ServiceRequests, operation::ReadOwn>,
) -> Result<Json<PaginatedResponse<ServiceRequestResponse>>> {
    let user = perm.user;
    let (skip, limit) = query.pagination.params();

    let mut filter = ServiceRequestFilter::new(skip, limit);
    filter.status = query.status;
    // Residents only see their own requests
    if !can_access_all(&user, Resource::ServiceRequests, Operation::ReadAll) {
        filter.resident_id = Some(user.id);
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ServiceRequests::new(&mut pool_conn);

    let requests = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    let data = requests.into_iter().map(ServiceRequestResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total_count, skip, limit)))
}

/// File a service request
#[utoipa::path(
    post,
    path = "/service-requests",
    tag = "service-requests",
    request_body = ServiceRequestCreate,
    responses(
        (status = 201, description = "Service request filed", body = ServiceRequestResponse),
        (status = 400, description = "Empty content"),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn create_service_request(
    State(state): State<AppState>,
    perm: RequiresPermission<resource::ServiceRequests, operation::CreateOwn>,
    Json(request): Json<ServiceRequestCreate>,
) -> Result<(StatusCode, Json<ServiceRequestResponse>)> {
    let user = perm.user;

    if request.content.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "content is required".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ServiceRequests::new(&mut pool_conn);

    // Requests are always filed in the caller's name
    let db_request = ServiceRequestCreateDBRequest {
        resident_id: user.id,
        content: request.content,
    };
    let service_request = repo.create(&db_request).await?;

    Ok((StatusCode::CREATED, Json(ServiceRequestResponse::from(service_request))))
}

/// Get a service request by ID
#[utoipa::path(
    get,
    path = "/service-requests/{request_id}",
    tag = "service-requests",
    params(
        ("request_id" = String, Path, description = "Service request ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Service request found", body = ServiceRequestResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Service request not found"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn get_service_request(
    State(state): State<AppState>,
    Path(request_id): Path<ServiceRequestId>,
    perm: RequiresPermission<resource::ServiceRequests, operation::ReadOwn>,
) -> Result<Json<ServiceRequestResponse>> {
    let user = perm.user;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ServiceRequests::new(&mut pool_conn);

    let service_request = repo.get_by_id(request_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Service request".to_string(),
        id: request_id.to_string(),
    })?;

    // Other residents' requests read as 404
    if !can_access_all(&user, Resource::ServiceRequests, Operation::ReadAll) && service_request.resident_id != user.id {
        return Err(Error::NotFound {
            resource: "Service request".to_string(),
            id: request_id.to_string(),
        });
    }

    Ok(Json(ServiceRequestResponse::from(service_request)))
}

/// Update a service request
///
/// Management moves requests through their lifecycle (status and feedback);
/// the filing resident may only attach feedback to their own request.
#[utoipa::path(
    patch,
    path = "/service-requests/{request_id}",
    tag = "service-requests",
    params(
        ("request_id" = String, Path, description = "Service request ID (UUID)"),
    ),
    request_body = ServiceRequestUpdate,
    responses(
        (status = 200, description = "Service request updated", body = ServiceRequestResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Service request not found"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn update_service_request(
    State(state): State<AppState>,
    Path(request_id): Path<ServiceRequestId>,
    perm: RequiresPermission<resource::ServiceRequests, operation::UpdateOwn>,
    Json(request): Json<ServiceRequestUpdate>,
) -> Result<Json<ServiceRequestResponse>> {
    let user = perm.user;
    let is_manager = can_access_all(&user, Resource::ServiceRequests, Operation::UpdateAll);

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ServiceRequests::new(&mut pool_conn);

    if !is_manager {
        let existing = repo.get_by_id(request_id).await?.ok_or_else(|| Error::NotFound {
            resource: "Service request".to_string(),
            id: request_id.to_string(),
        })?;
        if existing.resident_id != user.id {
            return Err(Error::NotFound {
                resource: "Service request".to_string(),
                id: request_id.to_string(),
            });
        }
        // Status transitions are management's call
        if request.status.is_some() {
            return Err(Error::InsufficientPermissions {
                required: Permission::Allow(Resource::ServiceRequests, Operation::UpdateAll),
                action: Operation::UpdateAll,
                resource: Resource::ServiceRequests.to_string(),
            });
        }
    }

    let db_request = ServiceRequestUpdateDBRequest {
        status: request.status,
        feedback: request.feedback,
    };
    let service_request = repo.update(request_id, &db_request).await?;

    Ok(Json(ServiceRequestResponse::from(service_request)))
}

/// Delete a service request
#[utoipa::path(
    delete,
    path = "/service-requests/{request_id}",
    tag = "service-requests",
    params(
        ("request_id" = String, Path, description = "Service request ID (UUID)"),
    ),
    responses(
        (status = 204, description = "Service request deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Service request not found"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn delete_service_request(
    State(state): State<AppState>,
    Path(request_id): Path<ServiceRequestId>,
    perm: RequiresPermission<resource::ServiceRequests, operation::DeleteOwn>,
) -> Result<StatusCode> {
    let user = perm.user;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ServiceRequests::new(&mut pool_conn);

    // Residents may withdraw their own requests, management any
    if !can_access_all(&user, Resource::ServiceRequests, Operation::DeleteAll) {
        let existing = repo.get_by_id(request_id).await?.ok_or_else(|| Error::NotFound {
            resource: "Service request".to_string(),
            id: request_id.to_string(),
        })?;
        if existing.resident_id != user.id {
            return Err(Error::NotFound {
                resource: "Service request".to_string(),
                id: request_id.to_string(),
            });
        }
    }

    if !repo.delete(request_id).await? {
        return Err(Error::NotFound {
            resource: "Service request".to_string(),
            id: request_id.to_string(),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}
