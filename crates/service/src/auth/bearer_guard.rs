use cotizador_core::auth::{extract_bearer_token, parse_bearer_claims};

use crate::api_error::ApiError;

pub(crate) const ENV_AUTH_MODE: &str = "COTIZADOR_AUTH_MODE";
const LOCAL_DEV_USER: &str = "local-dev";

/// Caller identity resolved for one request. Every quotation row is scoped
/// to `user_id`.
#[derive(Debug, Clone)]
pub(crate) struct Identity {
    pub(crate) user_id: String,
    pub(crate) email: Option<String>,
}

fn local_mode_enabled() -> bool {
    std::env::var(ENV_AUTH_MODE)
        .map(|value| value.trim().eq_ignore_ascii_case("local"))
        .unwrap_or(false)
}

/// Resolves the caller from the Authorization header. With
/// `COTIZADOR_AUTH_MODE=local` every request runs as a fixed development
/// identity and the header is ignored.
pub(crate) fn authenticate(authorization: Option<&str>) -> Result<Identity, ApiError> {
    if local_mode_enabled() {
        return Ok(Identity {
            user_id: LOCAL_DEV_USER.to_string(),
            email: None,
        });
    }

    let header = authorization
        .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
    let token = extract_bearer_token(header)
        .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
    let claims = parse_bearer_claims(token).map_err(|err| {
        log::warn!("event=auth_rejected error={err}");
        ApiError::unauthorized("invalid bearer token")
    })?;
    Ok(Identity {
        user_id: claims.sub,
        email: claims.email,
    })
}
