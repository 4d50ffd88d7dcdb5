use hyper::StatusCode;

/// Failures of a routed backend call. Each one becomes a `{success: false}`
/// envelope; none of them ever escapes as a transport error.
#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("missing id for {0}")]
    MissingId(&'static str),

    #[error("method {method} not allowed for {route}")]
    MethodNotAllowed { method: String, route: String },

    #[error("malformed request body: {0}")]
    MalformedBody(#[source] serde_json::Error),

    #[error("invalid {entity} record: {reason}")]
    InvalidRecord { entity: &'static str, reason: String },
}

impl BackendError {
    pub fn status(&self) -> StatusCode {
        match self {
            BackendError::NotFound { .. } => StatusCode::NOT_FOUND,
            BackendError::MissingId(_) => StatusCode::BAD_REQUEST,
            BackendError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            BackendError::MalformedBody(_) | BackendError::InvalidRecord { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
