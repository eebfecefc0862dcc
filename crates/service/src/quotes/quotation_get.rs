use cotizador_core::storage::Quotation;

use crate::api_error::ApiError;
use crate::storage_helpers::open_storage;

/// Fetches one quotation owned by the caller. Soft-deleted rows behave as
/// gone.
pub(crate) fn get_quotation(id: i64, user_id: &str) -> Result<Quotation, ApiError> {
    let storage = open_storage().ok_or_else(ApiError::storage_unavailable)?;
    let quotation = storage
        .find_quotation(id, user_id)
        .map_err(|err| ApiError::internal(format!("read quotation failed: {err}")))?
        .ok_or_else(|| ApiError::not_found("quotation not found"))?;
    if quotation.status == "deleted" {
        return Err(ApiError::not_found("quotation not found"));
    }
    Ok(quotation)
}
