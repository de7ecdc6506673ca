use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::db::user_repo;
use crate::errors::AppError;
use crate::AppState;

/// Identity resolved from the bearer token, injected as a request extension
/// for every protected handler.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

/// Bearer-token authentication middleware.
///
/// Every request must carry `Authorization: Bearer <token>` matching a
/// user's api_token. Token issuance happens outside this service.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    let token = match auth_header {
        Some(value) if value.starts_with("Bearer ") => &value[7..],
        _ => return AppError::Unauthorized.into_response(),
    };

    match user_repo::get_user_by_token(&state.db, token).await {
        Ok(Some(user)) => {
            req.extensions_mut().insert(CurrentUser {
                id: user.id,
                username: user.username,
            });
            next.run(req).await
        }
        Ok(None) => AppError::Unauthorized.into_response(),
        Err(e) => AppError::Internal(e).into_response(),
    }
}
