use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::context::InferenceContext;
use crate::error::{Error, Result};
use crate::server::error_response;
use crate::server::types::PredictResponse;

/// Validate the body and return the trimmed input text
fn parse_text(body: &[u8]) -> Result<String> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| Error::bad_request(format!("Invalid JSON body: {e}")))?;

    let text = match value.get("text") {
        None => return Err(Error::MissingText),
        Some(Value::String(text)) => text.trim(),
        Some(_) => return Err(Error::bad_request("'text' must be a string")),
    };
    if text.is_empty() {
        return Err(Error::EmptyText);
    }

    Ok(text.to_string())
}

pub async fn predict(State(context): State<Arc<InferenceContext>>, body: Bytes) -> Response {
    let text = match parse_text(&body) {
        Ok(text) => text,
        Err(e) => return error_response(e),
    };
    tracing::info!(input = %text, "received input");

    // Decoding is CPU bound; keep it off the async workers.
    let result = tokio::task::spawn_blocking(move || context.predict(&text)).await;

    match result {
        Ok(Ok(prediction)) => {
            tracing::info!(
                result = %prediction.text(),
                appended = prediction.appended,
                stop = ?prediction.stop,
                "prediction result"
            );
            (
                StatusCode::OK,
                Json(PredictResponse {
                    next_word: prediction.text(),
                }),
            )
                .into_response()
        }
        Ok(Err(e)) => error_response(e),
        Err(e) => error_response(Error::internal(format!("prediction task failed: {e}"))),
    }
}
