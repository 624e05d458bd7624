//! HTTP surface: `POST /predict`

mod handlers;
mod router_builder;
mod types;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

pub use router_builder::RouterBuilder;
pub use types::{ErrorResponse, PredictRequest, PredictResponse};

use crate::error::Error;

pub(crate) fn error_response(err: Error) -> Response {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    let chain = err.format_chain();
    if err.is_client_error() {
        tracing::warn!(error = %chain, "request rejected");
    } else {
        tracing::error!(error = %chain, "request failed");
    }
    (status, Json(ErrorResponse::from_error(&err))).into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        error_response(self)
    }
}
