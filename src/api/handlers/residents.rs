use crate::{
    api::models::{
        pagination::PaginatedResponse,
        residents::{CurrentUser, ListResidentsQuery, ResidencyStatus, ResidentCreate, ResidentResponse, ResidentUpdate},
    },
    auth::permissions::{can_access_all, operation, resource, RequiresPermission},
    db::{
        handlers::{residents::ResidentFilter, Repository, Residents},
        models::residents::{ResidentCreateDBRequest, ResidentUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{Operation, Permission, Resource, ResidentId},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

/// List residents
#[utoipa::path(
    get,
    path = "/residents",
    tag = "residents",
    params(ListResidentsQuery),
    responses(
        (status = 200, description = "List of residents", body = PaginatedResponse<ResidentResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn list_residents(
    State(state): State<AppState>,
    Query(query): Query<ListResidentsQuery>,
    _perm: RequiresPermission<resource::Residents, operation::ReadAll>,
) -> Result<Json<PaginatedResponse<ResidentResponse>>> {
    let (skip, limit) = query.pagination.params();

    let mut filter = ResidentFilter::new(skip, limit);
    filter.search = query.search;
    filter.role = query.role;
    if let Some(status) = query.status {
        filter.status = Some(status);
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Residents::new(&mut pool_conn);

    let residents = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    let data = residents.into_iter().map(ResidentResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total_count, skip, limit)))
}

/// Register a new resident
#[utoipa::path(
    post,
    path = "/residents",
    tag = "residents",
    request_body = ResidentCreate,
    responses(
        (status = 201, description = "Resident created", body = ResidentResponse),
        (status = 400, description = "Missing required fields"),
        (status = 409, description = "Username or email already taken"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn create_resident(
    State(state): State<AppState>,
    _perm: RequiresPermission<resource::Residents, operation::CreateAll>,
    Json(request): Json<ResidentCreate>,
) -> Result<(StatusCode, Json<ResidentResponse>)> {
    // Contact details are mandatory for every resident
    if request.username.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "username is required".to_string(),
        });
    }
    if request.email.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "email is required".to_string(),
        });
    }
    if request.phone.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "phone is required".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Residents::new(&mut pool_conn);

    let db_request = ResidentCreateDBRequest::from(request);
    let resident = repo.create(&db_request).await?;

    Ok((StatusCode::CREATED, Json(ResidentResponse::from(resident))))
}

/// Get the authenticated resident's own profile
#[utoipa::path(
    get,
    path = "/residents/current",
    tag = "residents",
    responses(
        (status = 200, description = "Current resident", body = ResidentResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn get_current_resident(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ResidentResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Residents::new(&mut pool_conn);

    let resident = repo.get_by_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Resident".to_string(),
        id: current_user.id.to_string(),
    })?;

    Ok(Json(ResidentResponse::from(resident)))
}

/// Get a resident by ID
#[utoipa::path(
    get,
    path = "/residents/{resident_id}",
    tag = "residents",
    params(
        ("resident_id" = String, Path, description = "Resident ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Resident found", body = ResidentResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Resident not found"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn get_resident(
    State(state): State<AppState>,
    Path(resident_id): Path<ResidentId>,
    perm: RequiresPermission<resource::Residents, operation::ReadOwn>,
) -> Result<Json<ResidentResponse>> {
    let user = perm.user;

    // Callers without ReadAll only see their own record. Report 404 rather
    // than 403 so IDs of other residents are not confirmed to exist.
    if !can_access_all(&user, Resource::Residents, Operation::ReadAll) && resident_id != user.id {
        return Err(Error::NotFound {
            resource: "Resident".to_string(),
            id: resident_id.to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Residents::new(&mut pool_conn);

    let resident = repo.get_by_id(resident_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Resident".to_string(),
        id: resident_id.to_string(),
    })?;

    Ok(Json(ResidentResponse::from(resident)))
}

/// Update a resident
#[utoipa::path(
    put,
    path = "/residents/{resident_id}",
    tag = "residents",
    params(
        ("resident_id" = String, Path, description = "Resident ID (UUID)"),
    ),
    request_body = ResidentUpdate,
    responses(
        (status = 200, description = "Resident updated", body = ResidentResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Resident not found"),
        (status = 409, description = "Username or email already taken"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn update_resident(
    State(state): State<AppState>,
    Path(resident_id): Path<ResidentId>,
    perm: RequiresPermission<resource::Residents, operation::UpdateOwn>,
    Json(request): Json<ResidentUpdate>,
) -> Result<Json<ResidentResponse>> {
    let user = perm.user;
    let is_manager = can_access_all(&user, Resource::Residents, Operation::UpdateAll);

    if !is_manager && resident_id != user.id {
        return Err(Error::NotFound {
            resource: "Resident".to_string(),
            id: resident_id.to_string(),
        });
    }

    // Only managers may reassign roles, residency status, or apartments
    if !is_manager && (request.role.is_some() || request.status.is_some() || request.apartment_id.is_some()) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Residents, Operation::UpdateAll),
            action: Operation::UpdateAll,
            resource: Resource::Residents.to_string(),
        });
    }

    let db_request = ResidentUpdateDBRequest {
        username: request.username,
        email: request.email,
        phone: request.phone,
        display_name: request.display_name,
        role: request.role,
        status: request.status,
        apartment_id: request.apartment_id,
        password_hash: None,
    };

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Residents::new(&mut pool_conn);

    let resident = repo.update(resident_id, &db_request).await?;

    Ok(Json(ResidentResponse::from(resident)))
}

/// Soft delete a resident (mark as inactive)
#[utoipa::path(
    delete,
    path = "/residents/{resident_id}",
    tag = "residents",
    params(
        ("resident_id" = String, Path, description = "Resident ID (UUID)"),
    ),
    responses(
        (status = 204, description = "Resident marked inactive"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Resident not found"),
        (status = 409, description = "Resident already inactive"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn delete_resident(
    State(state): State<AppState>,
    Path(resident_id): Path<ResidentId>,
    _perm: RequiresPermission<resource::Residents, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Residents::new(&mut pool_conn);

    // The soft delete only flips active residents; disambiguate a no-op
    // into 404 (unknown) or 409 (already inactive)
    if !repo.delete(resident_id).await? {
        let resident = repo.get_by_id(resident_id).await?.ok_or_else(|| Error::NotFound {
            resource: "Resident".to_string(),
            id: resident_id.to_string(),
        })?;
        debug_assert_eq!(resident.status, ResidencyStatus::Inactive);
        return Err(Error::Conflict {
            message: format!("Resident {resident_id} is already inactive"),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}
