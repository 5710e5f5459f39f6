use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};

use crate::error::AppError;
use crate::services::{IngestPolicy, IngestService};
use crate::AppState;

/// Serve the upload form
/// GET /
pub async fn show_form() -> Html<&'static str> {
    Html(include_str!("../../templates/form.html"))
}

/// Handle a browser form submission. Both files are optional, replies
/// are plain text, and a missing database downgrades to a success note
/// instead of an error.
/// POST /submit
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let result = IngestService::ingest(
        state.db.as_ref(),
        state.storage.as_ref(),
        &IngestPolicy::FORM,
        content_length(&headers),
        multipart,
    )
    .await;

    match result {
        Ok(user) => {
            tracing::info!(id = user.id, "form submission saved");
            (StatusCode::OK, "Data & files saved successfully\n").into_response()
        }
        Err(AppError::StoreUnavailable) => (
            StatusCode::OK,
            "Data & files saved (but the database is not connected, record skipped)\n",
        )
            .into_response(),
        Err(
            e @ (AppError::MalformedRequest(_)
            | AppError::PayloadTooLarge(_)
            | AppError::MissingRequiredFile(_)),
        ) => {
            tracing::warn!("rejected form submission: {}", e);
            (e.status(), format!("{}\n", e)).into_response()
        }
        Err(e) => {
            tracing::error!("form submission failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error\n").into_response()
        }
    }
}

pub(crate) fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(axum::http::header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}
