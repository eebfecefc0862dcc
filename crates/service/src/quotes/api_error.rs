use crate::sicetac::SicetacError;

/// HTTP-facing failure: a status code plus the `detail` string serialized in
/// the error body.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: u16,
    pub(crate) detail: String,
}

impl ApiError {
    pub(crate) fn new(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub(crate) fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(400, detail)
    }

    pub(crate) fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(401, detail)
    }

    pub(crate) fn not_found(detail: impl Into<String>) -> Self {
        Self::new(404, detail)
    }

    pub(crate) fn internal(detail: impl Into<String>) -> Self {
        Self::new(500, detail)
    }

    pub(crate) fn storage_unavailable() -> Self {
        Self::internal("storage unavailable")
    }
}

impl From<SicetacError> for ApiError {
    fn from(err: SicetacError) -> Self {
        let status = match &err {
            SicetacError::Validation(_) => 422,
            SicetacError::Configuration(_) => 500,
            SicetacError::Transport { .. } => 502,
            SicetacError::RemoteService(_) => 404,
            SicetacError::EmptyResult => 404,
            SicetacError::InvalidResponse(_) => 502,
        };
        Self::new(status, err.to_string())
    }
}
