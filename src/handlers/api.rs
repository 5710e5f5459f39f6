use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;

use crate::error::Result;
use crate::handlers::form::content_length;
use crate::services::{IngestPolicy, IngestService};
use crate::AppState;

#[derive(Serialize)]
pub struct CreateUserResponse {
    status: &'static str,
    message: &'static str,
}

/// Create a user from a multipart submission. Image and pdf parts are
/// required; errors map to JSON bodies via `AppError`.
/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreateUserResponse>)> {
    let user = IngestService::ingest(
        state.db.as_ref(),
        state.storage.as_ref(),
        &IngestPolicy::API,
        content_length(&headers),
        multipart,
    )
    .await?;

    tracing::info!(id = user.id, "user created via API");

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            status: "success",
            message: "User created",
        }),
    ))
}
