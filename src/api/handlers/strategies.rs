use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;

use super::ApiResponse;
use crate::access::{ensure_can_read, ensure_can_write, Ownership};
use crate::api::auth::CurrentUser;
use crate::db::strategy_repo;
use crate::errors::AppError;
use crate::models::{EntryType, SetupStrategy};
use crate::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CreateLookupRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateLookupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

fn ownership_of(user_id: Option<i64>) -> Ownership {
    user_id.map_or(Ownership::Public, Ownership::User)
}

/// Names are globally unique; surface the collision as caller error rather
/// than a 500.
fn map_name_conflict(e: sqlx::Error, what: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Validation(format!("a {what} with that name already exists"))
        }
        _ => AppError::Internal(e.into()),
    }
}

// ---------------------------------------------------------------------------
// Setup strategies
// ---------------------------------------------------------------------------

/// GET /api/setup-strategies — own plus public
pub async fn list_strategies(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<SetupStrategy>>>, AppError> {
    let strategies = strategy_repo::list_strategies(&state.db, user.id).await?;

    Ok(Json(ApiResponse::ok(strategies)))
}

/// POST /api/setup-strategies
pub async fn create_strategy(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateLookupRequest>,
) -> Result<Json<ApiResponse<SetupStrategy>>, AppError> {
    let strategy =
        strategy_repo::create_strategy(&state.db, user.id, &body.name, body.description.as_deref())
            .await
            .map_err(|e| map_name_conflict(e, "setup strategy"))?;

    Ok(Json(ApiResponse::ok(strategy)))
}

/// GET /api/setup-strategies/{id} — readable when owned or public
pub async fn strategy_detail(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<SetupStrategy>>, AppError> {
    let strategy = strategy_repo::get_strategy(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("setup strategy not found".into()))?;

    ensure_can_read(ownership_of(strategy.user_id), user.id)?;

    Ok(Json(ApiResponse::ok(strategy)))
}

/// PUT /api/setup-strategies/{id} — owner only; public ones are read-only
pub async fn update_strategy(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateLookupRequest>,
) -> Result<Json<ApiResponse<SetupStrategy>>, AppError> {
    let strategy = strategy_repo::get_strategy(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("setup strategy not found".into()))?;

    ensure_can_write(ownership_of(strategy.user_id), user.id)?;

    let updated =
        strategy_repo::update_strategy(&state.db, id, body.name.as_deref(), body.description.as_deref())
            .await
            .map_err(|e| map_name_conflict(e, "setup strategy"))?
            .ok_or_else(|| AppError::NotFound("setup strategy not found".into()))?;

    Ok(Json(ApiResponse::ok(updated)))
}

/// DELETE /api/setup-strategies/{id} — linked trades keep living, their
/// strategy link clears
pub async fn delete_strategy(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let strategy = strategy_repo::get_strategy(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("setup strategy not found".into()))?;

    ensure_can_write(ownership_of(strategy.user_id), user.id)?;
    strategy_repo::delete_strategy(&state.db, id).await?;

    Ok(Json(ApiResponse::ok(())))
}

// ---------------------------------------------------------------------------
// Entry types
// ---------------------------------------------------------------------------

/// GET /api/entry-types — own plus public
pub async fn list_entry_types(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<EntryType>>>, AppError> {
    let entry_types = strategy_repo::list_entry_types(&state.db, user.id).await?;

    Ok(Json(ApiResponse::ok(entry_types)))
}

/// POST /api/entry-types
pub async fn create_entry_type(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateLookupRequest>,
) -> Result<Json<ApiResponse<EntryType>>, AppError> {
    let entry_type = strategy_repo::create_entry_type(
        &state.db,
        user.id,
        &body.name,
        body.description.as_deref(),
    )
    .await
    .map_err(|e| map_name_conflict(e, "entry type"))?;

    Ok(Json(ApiResponse::ok(entry_type)))
}

/// GET /api/entry-types/{id}
pub async fn entry_type_detail(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<EntryType>>, AppError> {
    let entry_type = strategy_repo::get_entry_type(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("entry type not found".into()))?;

    ensure_can_read(ownership_of(entry_type.user_id), user.id)?;

    Ok(Json(ApiResponse::ok(entry_type)))
}

/// PUT /api/entry-types/{id}
pub async fn update_entry_type(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateLookupRequest>,
) -> Result<Json<ApiResponse<EntryType>>, AppError> {
    let entry_type = strategy_repo::get_entry_type(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("entry type not found".into()))?;

    ensure_can_write(ownership_of(entry_type.user_id), user.id)?;

    let updated = strategy_repo::update_entry_type(
        &state.db,
        id,
        body.name.as_deref(),
        body.description.as_deref(),
    )
    .await
    .map_err(|e| map_name_conflict(e, "entry type"))?
    .ok_or_else(|| AppError::NotFound("entry type not found".into()))?;

    Ok(Json(ApiResponse::ok(updated)))
}

/// DELETE /api/entry-types/{id}
pub async fn delete_entry_type(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let entry_type = strategy_repo::get_entry_type(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("entry type not found".into()))?;

    ensure_can_write(ownership_of(entry_type.user_id), user.id)?;
    strategy_repo::delete_entry_type(&state.db, id).await?;

    Ok(Json(ApiResponse::ok(())))
}
