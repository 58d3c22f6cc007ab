use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use portfolio_core::PortfolioError;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] PortfolioError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError::Core(err) = &self;
        let status = if err.is_client_error() {
            warn!(%err, "rejecting request");
            StatusCode::BAD_REQUEST
        } else {
            error!(%err, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, self.to_string()).into_response()
    }
}
