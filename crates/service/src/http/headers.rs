use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode};

fn is_hop_by_hop_header(name: &str) -> bool {
    name.eq_ignore_ascii_case("connection")
        || name.eq_ignore_ascii_case("keep-alive")
        || name.eq_ignore_ascii_case("proxy-authenticate")
        || name.eq_ignore_ascii_case("proxy-authorization")
        || name.eq_ignore_ascii_case("te")
        || name.eq_ignore_ascii_case("trailer")
        || name.eq_ignore_ascii_case("transfer-encoding")
        || name.eq_ignore_ascii_case("upgrade")
}

fn should_skip_request_header(name: &HeaderName, value: &HeaderValue) -> bool {
    let lower = name.as_str();
    if is_hop_by_hop_header(lower)
        || lower.eq_ignore_ascii_case("host")
        || lower.eq_ignore_ascii_case("content-length")
    {
        return true;
    }
    // tiny_http only accepts ASCII header values; drop offenders at the edge.
    value.to_str().is_err()
}

pub(crate) fn should_skip_response_header(name: &HeaderName) -> bool {
    let lower = name.as_str();
    is_hop_by_hop_header(lower) || lower.eq_ignore_ascii_case("content-length")
}

pub(crate) fn filter_request_headers(headers: &HeaderMap) -> HeaderMap {
    let mut outbound = HeaderMap::new();
    for (name, value) in headers.iter() {
        if should_skip_request_header(name, value) {
            continue;
        }
        let _ = outbound.insert(name.clone(), value.clone());
    }
    outbound
}

pub(crate) fn text_response(status: StatusCode, body: impl Into<String>) -> Response<Body> {
    let mut response = Response::new(Body::from(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}

pub(crate) fn merge_upstream_headers(
    mut builder: axum::http::response::Builder,
    headers: &reqwest::header::HeaderMap,
) -> axum::http::response::Builder {
    for (name, value) in headers.iter() {
        if should_skip_response_header(name) {
            continue;
        }
        builder = builder.header(name, value);
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::{filter_request_headers, merge_upstream_headers, text_response};
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

    #[test]
    fn request_filter_drops_host_connection_and_non_ascii() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("content-type"),
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            HeaderName::from_static("authorization"),
            HeaderValue::from_static("Bearer abc"),
        );
        headers.insert(
            HeaderName::from_static("host"),
            HeaderValue::from_static("localhost:48770"),
        );
        headers.insert(
            HeaderName::from_static("connection"),
            HeaderValue::from_static("keep-alive"),
        );
        headers.insert(
            HeaderName::from_static("x-custom"),
            HeaderValue::from_bytes(&[0xE4, 0xB8, 0xAD]).expect("non-ascii bytes"),
        );

        let filtered = filter_request_headers(&headers);
        assert!(filtered.contains_key("content-type"));
        assert!(filtered.contains_key("authorization"));
        assert!(!filtered.contains_key("host"));
        assert!(!filtered.contains_key("connection"));
        assert!(!filtered.contains_key("x-custom"));
    }

    #[test]
    fn text_response_sets_status_and_plain_text_header() {
        let response = text_response(StatusCode::BAD_GATEWAY, "proxy failed");
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some("text/plain; charset=utf-8")
        );
    }

    #[test]
    fn upstream_merge_filters_content_length_and_connection() {
        let mut upstream = reqwest::header::HeaderMap::new();
        upstream.insert(
            "content-type",
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        upstream.insert("content-length", reqwest::header::HeaderValue::from_static("64"));
        upstream.insert("connection", reqwest::header::HeaderValue::from_static("close"));

        let response = merge_upstream_headers(
            axum::http::Response::builder().status(StatusCode::OK),
            &upstream,
        )
        .body(Body::empty())
        .expect("response should build");

        assert!(response.headers().contains_key("content-type"));
        assert!(!response.headers().contains_key("content-length"));
        assert!(!response.headers().contains_key("connection"));
    }
}
