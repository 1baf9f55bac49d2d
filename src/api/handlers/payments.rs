use crate::{
    api::models::{
        pagination::{PaginatedResponse, Pagination},
        payments::{
            FeeResponse, ListPaymentsQuery, PaymentCallbackRequest, PaymentCallbackResponse, PaymentCreate, PaymentResponse,
            PaymentStatusQuery, PaymentStatusResponse, PaymentUpdate,
        },
    },
    auth::permissions::{can_access_all, operation, resource, RequiresPermission},
    db::{
        handlers::{payments::PaymentFilter, Payments, Repository},
        models::payments::{PaymentCreateDBRequest, PaymentUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{Operation, PaymentId, Permission, Resource},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{info, warn};

/// Generate a transaction reference for a new payment.
///
/// References are handed to the payment provider and echoed back in the
/// callback, so they must be unique and unguessable enough not to collide.
fn generate_transaction_reference() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..16).map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char).collect();
    format!("TXN-{suffix}")
}

/// List payments
#[utoipa::path(
    get,
    path = "/payments",
    tag = "payments",
    params(ListPaymentsQuery),
    responses(
        (status = 200, description = "List of payments", body = PaginatedResponse<PaymentResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<ListPaymentsQuery>,
    perm: RequiresPermission<resource::Payments, operation::ReadOwn>,
) -> Result<Json<PaginatedResponse<PaymentResponse>>> {
    let user = perm.user;
    let (skip, limit) = query.pagination.params();

    let mut filter = PaymentFilter::new(skip, limit);
    filter.state = query.state;
    // Residents only ever see their own payments, whatever the filter says
    if can_access_all(&user, Resource::Payments, Operation::ReadAll) {
        filter.resident_id = query.resident_id;
    } else {
        filter.resident_id = Some(user.id);
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Payments::new(&mut pool_conn);

    let payments = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    let data = payments.into_iter().map(PaymentResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total_count, skip, limit)))
}

/// Create a payment
#[utoipa::path(
    post,
    path = "/payments",
    tag = "payments",
    request_body = PaymentCreate,
    responses(
        (status = 201, description = "Payment created in pending state", body = PaymentResponse),
        (status = 400, description = "Invalid amount"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn create_payment(
    State(state): State<AppState>,
    perm: RequiresPermission<resource::Payments, operation::CreateOwn>,
    Json(request): Json<PaymentCreate>,
) -> Result<(StatusCode, Json<PaymentResponse>)> {
    let user = perm.user;

    if request.amount <= Decimal::ZERO {
        return Err(Error::BadRequest {
            message: "Amount must be greater than zero".to_string(),
        });
    }

    // Residents may only raise payments against themselves
    if !can_access_all(&user, Resource::Payments, Operation::CreateAll) && request.resident_id != user.id {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Payments, Operation::CreateAll),
            action: Operation::CreateAll,
            resource: Resource::Payments.to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Payments::new(&mut pool_conn);

    let db_request = PaymentCreateDBRequest {
        resident_id: request.resident_id,
        amount: request.amount,
        description: request.description,
        transaction_reference: generate_transaction_reference(),
        provider: request.provider,
    };
    let payment = repo.create(&db_request).await?;

    Ok((StatusCode::CREATED, Json(PaymentResponse::from(payment))))
}

/// Get a payment by ID
#[utoipa::path(
    get,
    path = "/payments/{payment_id}",
    tag = "payments",
    params(
        ("payment_id" = String, Path, description = "Payment ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Payment found", body = PaymentResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Payment not found"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<PaymentId>,
    perm: RequiresPermission<resource::Payments, operation::ReadOwn>,
) -> Result<Json<PaymentResponse>> {
    let user = perm.user;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Payments::new(&mut pool_conn);

    let payment = repo.get_by_id(payment_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Payment".to_string(),
        id: payment_id.to_string(),
    })?;

    // Someone else's payment reads as 404 to avoid confirming the ID
    if !can_access_all(&user, Resource::Payments, Operation::ReadAll) && payment.resident_id != user.id {
        return Err(Error::NotFound {
            resource: "Payment".to_string(),
            id: payment_id.to_string(),
        });
    }

    Ok(Json(PaymentResponse::from(payment)))
}

/// Update a payment
#[utoipa::path(
    patch,
    path = "/payments/{payment_id}",
    tag = "payments",
    params(
        ("payment_id" = String, Path, description = "Payment ID (UUID)"),
    ),
    request_body = PaymentUpdate,
    responses(
        (status = 200, description = "Payment updated", body = PaymentResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Payment not found"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn update_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<PaymentId>,
    _perm: RequiresPermission<resource::Payments, operation::UpdateAll>,
    Json(request): Json<PaymentUpdate>,
) -> Result<Json<PaymentResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Payments::new(&mut pool_conn);

    let db_request = PaymentUpdateDBRequest {
        state: request.state,
        description: request.description,
    };
    let payment = repo.update(payment_id, &db_request).await?;

    Ok(Json(PaymentResponse::from(payment)))
}

/// Delete a payment
#[utoipa::path(
    delete,
    path = "/payments/{payment_id}",
    tag = "payments",
    params(
        ("payment_id" = String, Path, description = "Payment ID (UUID)"),
    ),
    responses(
        (status = 204, description = "Payment deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Payment not found"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn delete_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<PaymentId>,
    _perm: RequiresPermission<resource::Payments, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Payments::new(&mut pool_conn);

    if !repo.delete(payment_id).await? {
        return Err(Error::NotFound {
            resource: "Payment".to_string(),
            id: payment_id.to_string(),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

/// List outstanding fees
#[utoipa::path(
    get,
    path = "/fees",
    tag = "payments",
    params(Pagination),
    responses(
        (status = 200, description = "Pending payments with resident and apartment context", body = [FeeResponse]),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn list_fees(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    perm: RequiresPermission<resource::Payments, operation::ReadOwn>,
) -> Result<Json<Vec<FeeResponse>>> {
    let user = perm.user;
    let (skip, limit) = pagination.params();

    // Residents see their own outstanding fees, accountants and managers all
    let resident_scope = if can_access_all(&user, Resource::Payments, Operation::ReadAll) {
        None
    } else {
        Some(user.id)
    };

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Payments::new(&mut pool_conn);

    let fees = repo.list_fees(resident_scope, skip, limit).await?;

    Ok(Json(fees.into_iter().map(FeeResponse::from).collect()))
}

/// Look up payment status by transaction reference
///
/// Unauthenticated: this backs the provider return page, where the payer
/// only holds the reference. The response shape reveals nothing beyond what
/// the payer already knows.
#[utoipa::path(
    get,
    path = "/payment-status",
    tag = "payments",
    params(PaymentStatusQuery),
    responses(
        (status = 200, description = "Payment status", body = PaymentStatusResponse),
        (status = 404, description = "Unknown transaction reference"),
    )
)]
pub async fn payment_status(
    State(state): State<AppState>,
    Query(query): Query<PaymentStatusQuery>,
) -> Result<Json<PaymentStatusResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Payments::new(&mut pool_conn);

    let payment = repo.get_by_reference(&query.reference).await?.ok_or_else(|| Error::NotFound {
        resource: "Payment".to_string(),
        id: query.reference.clone(),
    })?;

    Ok(Json(PaymentStatusResponse::from(payment)))
}

/// Payment provider callback
///
/// Unauthenticated: called by the provider, not by residents. A successful
/// status transitions the referenced payment from pending to paid exactly
/// once; replays are answered with 409 and unknown references with 404.
#[utoipa::path(
    post,
    path = "/payments/callback",
    tag = "payments",
    request_body = PaymentCallbackRequest,
    responses(
        (status = 200, description = "Callback processed", body = PaymentCallbackResponse),
        (status = 404, description = "Unknown transaction reference"),
        (status = 409, description = "Payment already processed"),
    )
)]
#[tracing::instrument(skip_all, fields(reference = %request.transaction_reference, status = %request.status))]
pub async fn payment_callback(
    State(state): State<AppState>,
    Json(request): Json<PaymentCallbackRequest>,
) -> Result<Json<PaymentCallbackResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Payments::new(&mut pool_conn);

    if request.status != "success" {
        // Failed or cancelled attempts leave the payment pending so the
        // resident can retry with the same reference
        warn!(
            provider = request.provider.as_deref().unwrap_or("unknown"),
            "Payment callback reported non-success status"
        );

        // Still 404 for references we have never issued
        repo.get_by_reference(&request.transaction_reference)
            .await?
            .ok_or_else(|| Error::NotFound {
                resource: "Payment".to_string(),
                id: request.transaction_reference.clone(),
            })?;

        return Ok(Json(PaymentCallbackResponse {
            message: format!("Status '{}' acknowledged", request.status),
        }));
    }

    match repo
        .mark_paid_by_reference(&request.transaction_reference, request.provider_reference.as_deref())
        .await?
    {
        Some(payment) => {
            info!(payment_id = %payment.id, "Payment confirmed by provider callback");
            Ok(Json(PaymentCallbackResponse {
                message: "Payment recorded".to_string(),
            }))
        }
        None => {
            // No pending row matched: either the reference is unknown or the
            // payment was already settled by an earlier callback
            match repo.get_by_reference(&request.transaction_reference).await? {
                Some(_) => Err(Error::Conflict {
                    message: format!("Payment {} has already been processed", request.transaction_reference),
                }),
                None => Err(Error::NotFound {
                    resource: "Payment".to_string(),
                    id: request.transaction_reference.clone(),
                }),
            }
        }
    }
}
