use cotizador_core::storage::{is_valid_quotation_status, Quotation, QuotationUpdate};

use crate::api_error::ApiError;
use crate::quotation_get::get_quotation;
use crate::storage_helpers::open_storage;

pub(crate) fn validate_status_value(value: &str) -> Result<(), ApiError> {
    if is_valid_quotation_status(value) {
        return Ok(());
    }
    Err(ApiError::new(
        422,
        format!("status '{value}' is not one of active, archived, deleted"),
    ))
}

/// Applies a metadata update and returns the refreshed row.
pub(crate) fn update_quotation(
    id: i64,
    user_id: &str,
    update: QuotationUpdate,
) -> Result<Quotation, ApiError> {
    if let Some(status) = update.status.as_deref() {
        validate_status_value(status)?;
    }
    // Deleted rows reject updates the same way missing rows do.
    get_quotation(id, user_id)?;

    let storage = open_storage().ok_or_else(ApiError::storage_unavailable)?;
    let changed = storage
        .update_quotation(id, user_id, &update)
        .map_err(|err| ApiError::internal(format!("update quotation failed: {err}")))?;
    if !changed {
        return Err(ApiError::not_found("quotation not found"));
    }
    drop(storage);
    get_quotation(id, user_id)
}
