use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bookbay_core::MarketError;
use serde_json::json;

/// Handler error carrying a `MarketError` to the HTTP boundary.
#[derive(Debug)]
pub struct ApiError(pub MarketError);

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<MarketError> for ApiError {
    fn from(e: MarketError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            MarketError::NotFound => StatusCode::NOT_FOUND,
            MarketError::Conflict(_) | MarketError::Busy(_) => StatusCode::CONFLICT,
            MarketError::Invalid(_) => StatusCode::BAD_REQUEST,
            MarketError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            MarketError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_and_conflict_share_a_status() {
        assert_eq!(
            ApiError(MarketError::Busy("checkout".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError(MarketError::Conflict("email".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError(MarketError::NotFound).status(), StatusCode::NOT_FOUND);
    }
}
