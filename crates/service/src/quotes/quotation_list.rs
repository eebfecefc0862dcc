use cotizador_core::storage::Quotation;

use crate::api_error::ApiError;
use crate::storage_helpers::open_storage;

/// Lists the caller's quotations newest first. Without an explicit status
/// filter, storage excludes soft-deleted rows before pagination applies.
pub(crate) fn list_quotations(
    user_id: &str,
    status: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Quotation>, ApiError> {
    let storage = open_storage().ok_or_else(ApiError::storage_unavailable)?;
    storage
        .list_quotations(user_id, status, limit, offset)
        .map_err(|err| ApiError::internal(format!("list quotations failed: {err}")))
}
