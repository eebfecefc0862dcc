use std::io::Read;

use cotizador_core::quote::QuoteRequest;
use cotizador_core::storage::{Quotation, QuotationUpdate};
use serde_json::{json, Value};
use tiny_http::{Header, Method, Request, Response};

use crate::api_error::ApiError;
use crate::bearer_guard::{authenticate, Identity};
use crate::quotation_create::{create_quotation, QuotationCreateBody};
use crate::quotation_delete::delete_quotation;
use crate::quotation_get::get_quotation;
use crate::quotation_list::list_quotations;
use crate::quotation_update::update_quotation;
use crate::quote_direct::quote_direct;

const MAX_BODY_BYTES: u64 = 1024 * 1024;

pub(crate) fn handle_backend_request(mut request: Request) {
    let method = request.method().clone();
    let url = request.url().to_string();
    let (path, query) = split_path_and_query(&url);

    let outcome = route(&mut request, &method, path, query);
    let (status, body) = match outcome {
        Ok((status, body)) => (status, body),
        Err(err) => {
            if err.status >= 500 {
                log::warn!("event=request_failed path={path} status={} detail={}", err.status, err.detail);
            }
            (err.status, json!({ "detail": err.detail }))
        }
    };
    respond_json(request, status, &body);
}

fn route(
    request: &mut Request,
    method: &Method,
    path: &str,
    query: &str,
) -> Result<(u16, Value), ApiError> {
    if matches!(method, Method::Get) && path == "/healthz" {
        return Ok((
            200,
            json!({ "status": "ok", "version": cotizador_core::core_version() }),
        ));
    }

    let identity = authenticate(header_value(request, "Authorization").as_deref())?;

    match (method, path) {
        (Method::Post, "/quote") => {
            let quote_request: QuoteRequest = read_json_body(request)?;
            let response = quote_direct(&quote_request)?;
            let body = serde_json::to_value(&response)
                .map_err(|err| ApiError::internal(format!("serialize response failed: {err}")))?;
            Ok((200, body))
        }
        (Method::Post, "/quotes") => {
            let body: QuotationCreateBody = read_json_body(request)?;
            let quotation = create_quotation(body, &identity.user_id)?;
            Ok((201, quotation_to_json(&quotation)?))
        }
        (Method::Get, "/quotes") => list_route(&identity, query),
        (method, path) => match path.strip_prefix("/quotes/") {
            Some(raw_id) => {
                let id = raw_id
                    .parse::<i64>()
                    .map_err(|_| ApiError::not_found("quotation not found"))?;
                id_route(request, method, id, &identity)
            }
            None => Err(ApiError::not_found("not found")),
        },
    }
}

fn list_route(identity: &Identity, query: &str) -> Result<(u16, Value), ApiError> {
    let status = query_param(query, "status");
    if let Some(status) = status.as_deref() {
        crate::quotation_update::validate_status_value(status)?;
    }
    let limit = query_param(query, "limit")
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(100);
    let offset = query_param(query, "offset")
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(0);
    let rows = list_quotations(&identity.user_id, status.as_deref(), limit, offset)?;
    let items: Result<Vec<Value>, ApiError> = rows.iter().map(quotation_to_json).collect();
    Ok((200, Value::Array(items?)))
}

fn id_route(
    request: &mut Request,
    method: &Method,
    id: i64,
    identity: &Identity,
) -> Result<(u16, Value), ApiError> {
    match method {
        Method::Get => {
            let quotation = get_quotation(id, &identity.user_id)?;
            Ok((200, quotation_to_json(&quotation)?))
        }
        Method::Patch => {
            let update: QuotationUpdate = read_json_body(request)?;
            let quotation = update_quotation(id, &identity.user_id, update)?;
            Ok((200, quotation_to_json(&quotation)?))
        }
        Method::Delete => {
            delete_quotation(id, &identity.user_id)?;
            Ok((200, json!({ "status": "deleted", "id": id })))
        }
        _ => Err(ApiError::not_found("not found")),
    }
}

/// Stored rows carry the whole quote response as a JSON string column;
/// API responses expand the quote list back into an array.
fn quotation_to_json(quotation: &Quotation) -> Result<Value, ApiError> {
    let mut value = serde_json::to_value(quotation)
        .map_err(|err| ApiError::internal(format!("serialize quotation failed: {err}")))?;
    if let Value::Object(map) = &mut value {
        let stored = map
            .remove("quotes_json")
            .and_then(|raw| raw.as_str().and_then(|s| serde_json::from_str::<Value>(s).ok()));
        let quotes = match stored {
            Some(Value::Object(mut response)) => response
                .remove("quotes")
                .filter(|q| q.is_array())
                .unwrap_or(Value::Array(Vec::new())),
            Some(quotes @ Value::Array(_)) => quotes,
            _ => Value::Array(Vec::new()),
        };
        map.insert("quotes".to_string(), quotes);
    }
    Ok(value)
}

fn read_json_body<T: serde::de::DeserializeOwned>(request: &mut Request) -> Result<T, ApiError> {
    let mut body = String::new();
    request
        .as_reader()
        .take(MAX_BODY_BYTES)
        .read_to_string(&mut body)
        .map_err(|err| ApiError::bad_request(format!("read body failed: {err}")))?;
    serde_json::from_str(&body).map_err(|err| ApiError::new(422, format!("invalid body: {err}")))
}

// `HeaderField::equiv` wants a static name, which header lookups here
// always have.
fn header_value(request: &Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|header| header.field.equiv(name))
        .map(|header| header.value.as_str().to_string())
}

fn split_path_and_query(url: &str) -> (&str, &str) {
    match url.split_once('?') {
        Some((path, query)) => (path, query),
        None => (url, ""),
    }
}

fn query_param(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key == name && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

fn respond_json(request: Request, status: u16, body: &Value) {
    let mut response = Response::from_string(body.to_string()).with_status_code(status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response.add_header(header);
    }
    if let Err(err) = request.respond(response) {
        log::warn!("event=respond_failed error={err}");
    }
}
