use cotizador_core::quote::{QuoteRequest, QuoteResponse};
use cotizador_core::storage::{now_ts, Quotation};
use serde::Deserialize;

use crate::api_error::ApiError;
use crate::quote_direct::quote_direct;
use crate::storage_helpers::open_storage;

#[derive(Debug, Deserialize)]
pub(crate) struct QuotationCreateBody {
    pub(crate) request: QuoteRequest,
    #[serde(default)]
    pub(crate) company_name: Option<String>,
    #[serde(default)]
    pub(crate) notes: Option<String>,
}

/// Quotes against SICETAC and stores the outcome as one quotation row owned
/// by the caller. `total_cost` is the cheapest minimum payable among the
/// returned tariffs.
pub(crate) fn create_quotation(
    body: QuotationCreateBody,
    user_id: &str,
) -> Result<Quotation, ApiError> {
    let response = quote_direct(&body.request)?;
    let (total_cost, quotes_json) = stored_quote_payload(&response)?;

    let storage = open_storage().ok_or_else(ApiError::storage_unavailable)?;
    let mut record = Quotation {
        id: 0,
        created_at: now_ts(),
        updated_at: now_ts(),
        period: body.request.period.trim().to_string(),
        configuration: body.request.configuration.trim().to_uppercase(),
        origin_code: body.request.origin.trim().to_string(),
        destination_code: body.request.destination.trim().to_string(),
        cargo_type: body.request.cargo_type.clone(),
        unit_type: body.request.unit_type.clone(),
        logistics_hours: body.request.logistics_hours,
        quotes_json,
        user_id: user_id.to_string(),
        company_name: body.company_name,
        notes: body.notes,
        status: "active".to_string(),
        total_cost,
        selected_quote_index: None,
    };
    let id = storage
        .insert_quotation(&record)
        .map_err(|err| ApiError::internal(format!("store quotation failed: {err}")))?;
    record.id = id;
    log::info!("event=quotation_created id={id} user={user_id}");
    Ok(record)
}

/// The stored column keeps the whole response (request echo plus quotes);
/// `total_cost` is the lowest minimum payable, or absent with zero quotes.
fn stored_quote_payload(response: &QuoteResponse) -> Result<(Option<f64>, String), ApiError> {
    let total_cost = response
        .quotes
        .iter()
        .map(|quote| quote.minimum_payable)
        .fold(None, |lowest: Option<f64>, value| {
            Some(match lowest {
                Some(current) => current.min(value),
                None => value,
            })
        });
    let quotes_json = serde_json::to_string(response)
        .map_err(|err| ApiError::internal(format!("serialize quotes failed: {err}")))?;
    Ok((total_cost, quotes_json))
}

#[cfg(test)]
mod tests {
    use super::{stored_quote_payload, QuotationCreateBody};
    use cotizador_core::quote::{QuoteRequest, QuoteResponse, TariffQuote};

    fn request() -> QuoteRequest {
        QuoteRequest {
            period: "202401".to_string(),
            configuration: "3S3".to_string(),
            origin: "11001000".to_string(),
            destination: "05001000".to_string(),
            cargo_type: None,
            unit_type: None,
            logistics_hours: 2.0,
            variables: None,
        }
    }

    fn tariff(minimum_payable: f64) -> TariffQuote {
        TariffQuote {
            route_code: None,
            route_name: None,
            unit_type: None,
            cargo_type: None,
            mobilization_value: minimum_payable,
            ton_value: None,
            hour_value: None,
            distance_km: None,
            minimum_payable,
        }
    }

    #[test]
    fn body_takes_a_nested_request_object() {
        let body: QuotationCreateBody = serde_json::from_str(
            r#"{"request":{"period":"202401","configuration":"3S3","origin":"11001000","destination":"05001000"},"company_name":"Liftit"}"#,
        )
        .expect("deserialize");
        assert_eq!(body.request.period, "202401");
        assert_eq!(body.company_name.as_deref(), Some("Liftit"));
        assert!(body.notes.is_none());
    }

    #[test]
    fn stored_payload_keeps_request_and_quotes_with_lowest_total() {
        let response = QuoteResponse {
            request: request(),
            quotes: vec![tariff(120_000.0), tariff(110_000.0)],
        };

        let (total_cost, quotes_json) = stored_quote_payload(&response).expect("payload");
        assert_eq!(total_cost, Some(110_000.0));

        let value: serde_json::Value = serde_json::from_str(&quotes_json).expect("json");
        assert_eq!(
            value
                .get("request")
                .and_then(|r| r.get("period"))
                .and_then(|p| p.as_str()),
            Some("202401")
        );
        assert_eq!(
            value.get("quotes").and_then(|q| q.as_array()).map(|q| q.len()),
            Some(2)
        );
    }

    #[test]
    fn stored_payload_without_quotes_has_no_total() {
        let response = QuoteResponse {
            request: request(),
            quotes: Vec::new(),
        };
        let (total_cost, _) = stored_quote_payload(&response).expect("payload");
        assert_eq!(total_cost, None);
    }
}
