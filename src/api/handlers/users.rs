use axum::Extension;
use axum::Json;

use super::ApiResponse;
use crate::api::auth::CurrentUser;

/// GET /api/me — identity of the calling user.
pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<ApiResponse<CurrentUser>> {
    Json(ApiResponse::ok(user))
}
