use crate::{
    api::models::{
        apartments::{ApartmentCreate, ApartmentResponse, ApartmentUpdate},
        pagination::{PaginatedResponse, Pagination},
    },
    auth::permissions::{can_access_all, operation, resource, RequiresPermission},
    db::{
        handlers::{apartments::ApartmentFilter, Apartments, Repository},
        models::apartments::{ApartmentCreateDBRequest, ApartmentUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{ApartmentId, Operation, Resource},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

/// List apartments
#[utoipa::path(
    get,
    path = "/apartments",
    tag = "apartments",
    params(Pagination),
    responses(
        (status = 200, description = "List of apartments", body = PaginatedResponse<ApartmentResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn list_apartments(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    _perm: RequiresPermission<resource::Apartments, operation::ReadAll>,
) -> Result<Json<PaginatedResponse<ApartmentResponse>>> {
    let (skip, limit) = pagination.params();
    let filter = ApartmentFilter::new(skip, limit);

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Apartments::new(&mut pool_conn);

    let apartments = repo.list(&filter).await?;
    let total_count = repo.count().await?;

    let data = apartments.into_iter().map(ApartmentResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total_count, skip, limit)))
}

/// Register a new apartment
#[utoipa::path(
    post,
    path = "/apartments",
    tag = "apartments",
    request_body = ApartmentCreate,
    responses(
        (status = 201, description = "Apartment created", body = ApartmentResponse),
        (status = 400, description = "Missing apartment number"),
        (status = 409, description = "Apartment number already exists"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn create_apartment(
    State(state): State<AppState>,
    _perm: RequiresPermission<resource::Apartments, operation::CreateAll>,
    Json(request): Json<ApartmentCreate>,
) -> Result<(StatusCode, Json<ApartmentResponse>)> {
    if request.number.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "number is required".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Apartments::new(&mut pool_conn);

    let db_request = ApartmentCreateDBRequest {
        number: request.number,
        floor: request.floor,
        notes: request.notes,
    };
    let apartment = repo.create(&db_request).await?;

    Ok((StatusCode::CREATED, Json(ApartmentResponse::from(apartment))))
}

/// Get an apartment by ID
#[utoipa::path(
    get,
    path = "/apartments/{apartment_id}",
    tag = "apartments",
    params(
        ("apartment_id" = String, Path, description = "Apartment ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Apartment found", body = ApartmentResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Apartment not found"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn get_apartment(
    State(state): State<AppState>,
    Path(apartment_id): Path<ApartmentId>,
    perm: RequiresPermission<resource::Apartments, operation::ReadOwn>,
) -> Result<Json<ApartmentResponse>> {
    let user = perm.user;

    // Residents may only look up their own apartment; 404 keeps other
    // apartment IDs unconfirmed
    if !can_access_all(&user, Resource::Apartments, Operation::ReadAll) && user.apartment_id != Some(apartment_id) {
        return Err(Error::NotFound {
            resource: "Apartment".to_string(),
            id: apartment_id.to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Apartments::new(&mut pool_conn);

    let apartment = repo.get_by_id(apartment_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Apartment".to_string(),
        id: apartment_id.to_string(),
    })?;

    Ok(Json(ApartmentResponse::from(apartment)))
}

/// Update an apartment
#[utoipa::path(
    put,
    path = "/apartments/{apartment_id}",
    tag = "apartments",
    params(
        ("apartment_id" = String, Path, description = "Apartment ID (UUID)"),
    ),
    request_body = ApartmentUpdate,
    responses(
        (status = 200, description = "Apartment updated", body = ApartmentResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Apartment not found"),
        (status = 409, description = "Apartment number already exists"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn update_apartment(
    State(state): State<AppState>,
    Path(apartment_id): Path<ApartmentId>,
    _perm: RequiresPermission<resource::Apartments, operation::UpdateAll>,
    Json(request): Json<ApartmentUpdate>,
) -> Result<Json<ApartmentResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Apartments::new(&mut pool_conn);

    let db_request = ApartmentUpdateDBRequest {
        number: request.number,
        floor: request.floor,
        notes: request.notes,
    };
    let apartment = repo.update(apartment_id, &db_request).await?;

    Ok(Json(ApartmentResponse::from(apartment)))
}

/// Delete an apartment
#[utoipa::path(
    delete,
    path = "/apartments/{apartment_id}",
    tag = "apartments",
    params(
        ("apartment_id" = String, Path, description = "Apartment ID (UUID)"),
    ),
    responses(
        (status = 204, description = "Apartment deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Apartment not found"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn delete_apartment(
    State(state): State<AppState>,
    Path(apartment_id): Path<ApartmentId>,
    _perm: RequiresPermission<resource::Apartments, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Apartments::new(&mut pool_conn);

    if !repo.delete(apartment_id).await? {
        return Err(Error::NotFound {
            resource: "Apartment".to_string(),
            id: apartment_id.to_string(),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}
