use std::time::Instant;

use cotizador_core::quote::{QuoteRequest, QuoteResponse};
use cotizador_core::storage::{now_ts, SoapCallLog};

use crate::api_error::ApiError;
use crate::sicetac::{SicetacClient, SicetacConfig, SicetacError};
use crate::storage_helpers::open_storage;

/// Runs one SICETAC quotation and records the upstream call outcome.
/// Stateless: nothing about the quote itself is persisted here.
pub(crate) fn quote_direct(request: &QuoteRequest) -> Result<QuoteResponse, ApiError> {
    let config = SicetacConfig::from_env();
    let endpoint = config.endpoint.clone();
    let client = SicetacClient::from_config(config)?;

    let started = Instant::now();
    let result = client.fetch_quotes(request);
    record_call_outcome(&endpoint, &result, started.elapsed().as_millis() as i64);
    Ok(result?)
}

fn record_call_outcome(
    endpoint: &str,
    result: &Result<QuoteResponse, SicetacError>,
    duration_ms: i64,
) {
    // Requests rejected before the wire never show up in the call log.
    let (status, error) = match result {
        Ok(_) => ("ok", None),
        Err(SicetacError::Validation(_)) | Err(SicetacError::Configuration(_)) => return,
        Err(err @ SicetacError::Transport { .. }) => ("transport_error", Some(err.to_string())),
        Err(err @ SicetacError::RemoteService(_)) => ("remote_error", Some(err.to_string())),
        Err(err @ SicetacError::EmptyResult) => ("empty_result", Some(err.to_string())),
        Err(err @ SicetacError::InvalidResponse(_)) => {
            ("invalid_response", Some(err.to_string()))
        }
    };
    let Some(storage) = open_storage() else {
        return;
    };
    let record = SoapCallLog {
        endpoint: endpoint.to_string(),
        status: status.to_string(),
        error,
        duration_ms,
        created_at: now_ts(),
    };
    if let Err(err) = storage.insert_soap_call_log(&record) {
        log::warn!("event=call_log_write_failed error={err}");
    }
}
