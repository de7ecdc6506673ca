use axum::extract::{Path, State};
use axum::{Extension, Json};
use metrics::counter;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::ApiResponse;
use crate::api::auth::CurrentUser;
use crate::db::account_repo;
use crate::errors::AppError;
use crate::models::Account;
use crate::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub initial_balance: Decimal,
}

#[derive(Deserialize)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub initial_balance: Option<Decimal>,
    pub current_balance: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/accounts — the caller's accounts
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<Account>>>, AppError> {
    let accounts = account_repo::list_accounts(&state.db, user.id).await?;

    Ok(Json(ApiResponse::ok(accounts)))
}

/// POST /api/accounts — create an account; the running balance starts at
/// the initial balance
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateAccountRequest>,
) -> Result<Json<ApiResponse<Account>>, AppError> {
    if body.initial_balance < Decimal::ZERO {
        return Err(AppError::Validation(
            "initial_balance must not be negative".into(),
        ));
    }

    let account =
        account_repo::create_account(&state.db, user.id, &body.name, body.initial_balance).await?;

    counter!("accounts_created_total").increment(1);
    tracing::info!(account_id = account.id, user_id = user.id, "account created");

    Ok(Json(ApiResponse::ok(account)))
}

/// GET /api/accounts/{id}
pub async fn detail(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Account>>, AppError> {
    let account = account_repo::get_account(&state.db, id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("account not found".into()))?;

    Ok(Json(ApiResponse::ok(account)))
}

/// PUT /api/accounts/{id} — partial update; direct balance edits allowed
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateAccountRequest>,
) -> Result<Json<ApiResponse<Account>>, AppError> {
    if matches!(body.initial_balance, Some(b) if b < Decimal::ZERO) {
        return Err(AppError::Validation(
            "initial_balance must not be negative".into(),
        ));
    }

    let account = account_repo::update_account(
        &state.db,
        id,
        user.id,
        body.name.as_deref(),
        body.initial_balance,
        body.current_balance,
    )
    .await?
    .ok_or_else(|| AppError::NotFound("account not found".into()))?;

    Ok(Json(ApiResponse::ok(account)))
}

/// DELETE /api/accounts/{id} — trades cascade
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let deleted = account_repo::delete_account(&state.db, id, user.id).await?;
    if !deleted {
        return Err(AppError::NotFound("account not found".into()));
    }

    tracing::info!(account_id = id, user_id = user.id, "account deleted");

    Ok(Json(ApiResponse::ok(())))
}
