use crate::api_error::ApiError;
use crate::quotation_get::get_quotation;
use crate::storage_helpers::open_storage;

/// Soft delete: the row survives with status `deleted` and disappears from
/// default reads.
pub(crate) fn delete_quotation(id: i64, user_id: &str) -> Result<(), ApiError> {
    get_quotation(id, user_id)?;

    let storage = open_storage().ok_or_else(ApiError::storage_unavailable)?;
    let changed = storage
        .soft_delete_quotation(id, user_id)
        .map_err(|err| ApiError::internal(format!("delete quotation failed: {err}")))?;
    if !changed {
        return Err(ApiError::not_found("quotation not found"));
    }
    log::info!("event=quotation_deleted id={id} user={user_id}");
    Ok(())
}
