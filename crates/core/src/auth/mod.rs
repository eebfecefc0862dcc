use base64::Engine;
use serde::Deserialize;

/// Claims the API layer cares about. The token signature is checked by the
/// identity provider upstream; here only the payload is decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct BearerClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub fn extract_bearer_token(header_value: &str) -> Option<&str> {
    let header_value = header_value.trim();
    if header_value.len() < 7 || !header_value[..7].eq_ignore_ascii_case("bearer ") {
        return None;
    }
    let token = header_value[7..].trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

pub fn parse_bearer_claims(token: &str) -> Result<BearerClaims, String> {
    let mut parts = token.split('.');
    let _header = parts.next();
    let payload = parts.next().ok_or_else(|| "invalid token".to_string())?;
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| e.to_string())?;
    let json = std::str::from_utf8(&decoded).map_err(|e| e.to_string())?;
    let claims: BearerClaims = serde_json::from_str(json).map_err(|e| e.to_string())?;
    if claims.sub.trim().is_empty() {
        return Err("token has no subject".to_string());
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::{extract_bearer_token, parse_bearer_claims};
    use base64::Engine;

    fn fake_jwt(payload: &str) -> String {
        let encode = |part: &str| {
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(part.as_bytes())
        };
        format!("{}.{}.{}", encode(r#"{"alg":"none"}"#), encode(payload), encode("sig"))
    }

    #[test]
    fn extracts_token_from_bearer_header() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer   "), None);
        assert_eq!(extract_bearer_token(""), None);
    }

    #[test]
    fn parses_subject_and_email_from_payload() {
        let token = fake_jwt(r#"{"sub":"user-1","email":"ops@example.com"}"#);
        let claims = parse_bearer_claims(&token).expect("parse claims");
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email.as_deref(), Some("ops@example.com"));
    }

    #[test]
    fn rejects_tokens_without_subject() {
        let token = fake_jwt(r#"{"sub":"  "}"#);
        assert!(parse_bearer_claims(&token).is_err());
        assert!(parse_bearer_claims("not-a-jwt").is_err());
    }
}
