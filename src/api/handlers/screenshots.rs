use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;

use super::ApiResponse;
use crate::api::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::DocumentationItem;
use crate::services::documentation;
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateScreenshotRequest {
    pub trade_id: i64,
    /// Reference returned by the external blob store.
    pub image: String,
}

/// POST /api/screenshots — append an image block to a trade's documentation
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateScreenshotRequest>,
) -> Result<Json<ApiResponse<DocumentationItem>>, AppError> {
    let item =
        documentation::add_screenshot(&state.db, user.id, body.trade_id, &body.image).await?;

    Ok(Json(ApiResponse::ok(item)))
}

/// DELETE /api/screenshots/{id} — screenshots are documentation items, so
/// this is the same removal path
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    documentation::delete_item(&state.db, user.id, id).await?;

    Ok(Json(ApiResponse::ok(())))
}
