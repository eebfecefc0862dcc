use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, Request as HttpRequest, Response, StatusCode, Uri};
use axum::routing::any;
use axum::Router;
use reqwest::Client;
use std::io;

use crate::http::headers::{filter_request_headers, merge_upstream_headers, text_response};
use crate::http::proxy_bridge::run_proxy_server;

const DEFAULT_FRONT_PROXY_MAX_BODY_BYTES: usize = 1024 * 1024;
const ENV_FRONT_PROXY_MAX_BODY_BYTES: &str = "COTIZADOR_FRONT_PROXY_MAX_BODY_BYTES";
const ENV_CORS_ALLOW_ORIGIN: &str = "COTIZADOR_CORS_ALLOW_ORIGIN";
const CORS_METHODS: &str = "GET, POST, PATCH, DELETE, OPTIONS";
const CORS_HEADERS: &str = "Authorization, Content-Type";

#[derive(Clone)]
struct ProxyState {
    backend_base_url: String,
    client: Client,
}

fn build_backend_base_url(backend_addr: &str) -> String {
    format!("http://{backend_addr}")
}

fn build_target_url(backend_base_url: &str, uri: &Uri) -> String {
    let path_and_query = uri.path_and_query().map(|value| value.as_str()).unwrap_or("/");
    format!("{backend_base_url}{path_and_query}")
}

fn front_proxy_max_body_bytes() -> usize {
    std::env::var(ENV_FRONT_PROXY_MAX_BODY_BYTES)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_FRONT_PROXY_MAX_BODY_BYTES)
}

fn cors_allow_origin() -> String {
    std::env::var(ENV_CORS_ALLOW_ORIGIN)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "*".to_string())
}

fn apply_cors_headers(response: &mut Response<Body>) {
    let headers = response.headers_mut();
    if let Ok(origin) = HeaderValue::from_str(&cors_allow_origin()) {
        headers.insert("Access-Control-Allow-Origin", origin);
    }
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static(CORS_METHODS),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static(CORS_HEADERS),
    );
}

fn preflight_response() -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    apply_cors_headers(&mut response);
    response
}

async fn proxy_handler(
    State(state): State<ProxyState>,
    request: HttpRequest<Body>,
) -> Response<Body> {
    if request.method() == Method::OPTIONS {
        return preflight_response();
    }

    let (parts, body) = request.into_parts();
    let target_url = build_target_url(&state.backend_base_url, &parts.uri);
    let max_body_bytes = front_proxy_max_body_bytes();

    if let Some(content_length) = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
    {
        if content_length > max_body_bytes as u64 {
            let mut response = text_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("request body too large: content-length={content_length}"),
            );
            apply_cors_headers(&mut response);
            return response;
        }
    }

    let outbound_headers = filter_request_headers(&parts.headers);
    let body_bytes = match to_bytes(body, max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => {
            let mut response = text_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("request body too large: content-length>{max_body_bytes}"),
            );
            apply_cors_headers(&mut response);
            return response;
        }
    };

    let mut builder = state.client.request(parts.method, target_url);
    builder = builder.headers(outbound_headers);
    builder = builder.body(body_bytes);

    let upstream = match builder.send().await {
        Ok(response) => response,
        Err(err) => {
            let mut response =
                text_response(StatusCode::BAD_GATEWAY, format!("backend proxy error: {err}"));
            apply_cors_headers(&mut response);
            return response;
        }
    };

    let response_builder = merge_upstream_headers(
        Response::builder().status(upstream.status()),
        upstream.headers(),
    );

    match response_builder.body(Body::from_stream(upstream.bytes_stream())) {
        Ok(mut response) => {
            apply_cors_headers(&mut response);
            response
        }
        Err(err) => text_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("build response failed: {err}"),
        ),
    }
}

pub(crate) fn run_front_proxy(addr: &str, backend_addr: &str) -> io::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

    runtime.block_on(async move {
        let client = Client::builder()
            .build()
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let state = ProxyState {
            backend_base_url: build_backend_base_url(backend_addr),
            client,
        };
        let app = Router::new().fallback(any(proxy_handler)).with_state(state);
        run_proxy_server(addr, app).await
    })
}
