//! Ownership policy for edit/delete operations on owned resources

use crate::{error::AppError, models::user::Role};

/// Admin always passes; everyone else must own the resource.
pub fn can_access(requester_id: i64, requester_role: Role, resource_owner_id: i64) -> bool {
    requester_role.is_admin() || requester_id == resource_owner_id
}

/// [`can_access`] as a guard for handlers
pub fn ensure_can_access(
    requester_id: i64,
    requester_role: Role,
    resource_owner_id: i64,
) -> Result<(), AppError> {
    if can_access(requester_id, requester_role, resource_owner_id) {
        return Ok(());
    }

    tracing::warn!(
        requester_id,
        role = %requester_role,
        resource_owner_id,
        "Permission denied"
    );
    Err(AppError::Forbidden)
}
