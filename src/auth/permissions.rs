//! Permission checking and access control logic.
//!
//! Permissions are derived entirely from the resident's role. Each role grants
//! a fixed set of (resource, operation) pairs, where `*All` operations cover
//! the whole collection and `*Own` operations only cover entities belonging to
//! the caller (their own record, payments, apartment and so on).
//!
//! Handlers declare their requirement with the [`RequiresPermission`]
//! extractor, e.g. `RequiresPermission<resource::Payments, operation::ReadOwn>`.
//! The extractor authenticates the caller and rejects with 403 if their role
//! does not grant the requested operation.

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    api::models::residents::{CurrentUser, ResidentRole},
    errors::{Error, Result},
    types::{Operation, Permission, Resource},
    AppState,
};

/// Marker types for resources, used as type parameters to [`RequiresPermission`].
pub mod resource {
    use crate::types::Resource;

    pub trait ResourceMarker: Send + Sync {
        const RESOURCE: Resource;
    }

    macro_rules! resource_marker {
        ($name:ident) => {
            pub struct $name;
            impl ResourceMarker for $name {
                const RESOURCE: Resource = Resource::$name;
            }
        };
    }

    resource_marker!(Residents);
    resource_marker!(Apartments);
    resource_marker!(Payments);
    resource_marker!(Notifications);
    resource_marker!(ServiceRequests);
}

/// Marker types for operations, used as type parameters to [`RequiresPermission`].
pub mod operation {
    use crate::types::Operation;

    pub trait OperationMarker: Send + Sync {
        const OPERATION: Operation;
    }

    macro_rules! operation_marker {
        ($name:ident) => {
            pub struct $name;
            impl OperationMarker for $name {
                const OPERATION: Operation = Operation::$name;
            }
        };
    }

    operation_marker!(CreateAll);
    operation_marker!(CreateOwn);
    operation_marker!(ReadAll);
    operation_marker!(ReadOwn);
    operation_marker!(UpdateAll);
    operation_marker!(UpdateOwn);
    operation_marker!(DeleteAll);
    operation_marker!(DeleteOwn);
}

/// Extractor that authenticates the caller and checks a role-based permission.
///
/// Carries the authenticated resident so handlers that also need the caller's
/// identity don't have to extract it twice.
pub struct RequiresPermission<R, O> {
    pub user: CurrentUser,
    _marker: PhantomData<(R, O)>,
}

impl<R, O> FromRequestParts<AppState> for RequiresPermission<R, O>
where
    R: resource::ResourceMarker,
    O: operation::OperationMarker,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        require_permission(&user, R::RESOURCE, O::OPERATION)?;
        Ok(Self {
            user,
            _marker: PhantomData,
        })
    }
}

/// Check whether a granted operation satisfies a requested one.
///
/// An `*All` grant always satisfies the matching `*Own` request.
fn operation_satisfies(granted: Operation, requested: Operation) -> bool {
    if granted == requested {
        return true;
    }
    matches!(
        (granted, requested),
        (Operation::CreateAll, Operation::CreateOwn)
            | (Operation::ReadAll, Operation::ReadOwn)
            | (Operation::UpdateAll, Operation::UpdateOwn)
            | (Operation::DeleteAll, Operation::DeleteOwn)
    )
}

/// The grants attached to a role.
fn role_grants(role: ResidentRole) -> &'static [(Resource, Operation)] {
    use Operation::*;
    use Resource::*;

    match role {
        ResidentRole::Management => &[
            (Residents, CreateAll),
            (Residents, ReadAll),
            (Residents, UpdateAll),
            (Residents, DeleteAll),
            (Apartments, CreateAll),
            (Apartments, ReadAll),
            (Apartments, UpdateAll),
            (Apartments, DeleteAll),
            (Payments, CreateAll),
            (Payments, ReadAll),
            (Payments, UpdateAll),
            (Payments, DeleteAll),
            (Notifications, CreateAll),
            (Notifications, ReadAll),
            (Notifications, UpdateAll),
            (Notifications, DeleteAll),
            (ServiceRequests, ReadAll),
            (ServiceRequests, UpdateAll),
            (ServiceRequests, DeleteAll),
        ],
        ResidentRole::Accountant => &[
            (Payments, CreateAll),
            (Payments, ReadAll),
            (Payments, UpdateAll),
            (Payments, DeleteAll),
            (Residents, ReadAll),
            (Apartments, ReadAll),
        ],
        ResidentRole::Security => &[
            (Notifications, ReadAll),
            (Residents, ReadAll),
        ],
        ResidentRole::Resident => &[
            (Residents, ReadOwn),
            (Residents, UpdateOwn),
            (Apartments, ReadOwn),
            (Payments, CreateOwn),
            (Payments, ReadOwn),
            (Notifications, ReadOwn),
            (ServiceRequests, CreateOwn),
            (ServiceRequests, ReadOwn),
            (ServiceRequests, UpdateOwn),
            (ServiceRequests, DeleteOwn),
        ],
    }
}

/// Check whether a resident's role grants an operation on a resource.
pub fn has_permission(user: &CurrentUser, resource: Resource, operation: Operation) -> bool {
    role_grants(user.role)
        .iter()
        .any(|&(r, op)| r == resource && operation_satisfies(op, operation))
}

/// Require that a resident's role grants an operation on a resource.
///
/// Returns `Error::InsufficientPermissions` (403) otherwise.
pub fn require_permission(user: &CurrentUser, resource: Resource, operation: Operation) -> Result<()> {
    if has_permission(user, resource, operation) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            required: Permission::Allow(resource, operation),
            action: operation,
            resource: resource.to_string(),
        })
    }
}

/// Whether the resident can operate on the whole collection rather than only
/// their own entities. Handlers use this to decide between scoped and
/// unscoped queries.
pub fn can_access_all(user: &CurrentUser, resource: Resource, operation: Operation) -> bool {
    let all_op = match operation {
        Operation::CreateAll | Operation::CreateOwn => Operation::CreateAll,
        Operation::ReadAll | Operation::ReadOwn => Operation::ReadAll,
        Operation::UpdateAll | Operation::UpdateOwn => Operation::UpdateAll,
        Operation::DeleteAll | Operation::DeleteOwn => Operation::DeleteAll,
    };
    has_permission(user, resource, all_op)
}
