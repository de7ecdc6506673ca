use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use super::ApiResponse;
use crate::api::auth::CurrentUser;
use crate::db::trade_repo::{self, TradeFilters};
use crate::errors::AppError;
use crate::models::{Side, Trade, TradeStatus};
use crate::services::ledger::{self, CreateTradeRequest, UpdateTradeRequest};
use crate::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct TradeListQuery {
    pub account: Option<i64>,
    pub symbol: Option<String>,
    pub side: Option<String>,
    pub setup_strategy: Option<i64>,
    pub entry_type: Option<i64>,
}

/// A trade with its derived status attached.
#[derive(Serialize)]
pub struct TradeResponse {
    #[serde(flatten)]
    pub trade: Trade,
    pub status: TradeStatus,
}

impl From<Trade> for TradeResponse {
    fn from(trade: Trade) -> Self {
        let status = trade.status();
        TradeResponse { trade, status }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/trades — the caller's trades, newest entry first, optionally
/// filtered by account/symbol/side/strategy/entry-type
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<TradeListQuery>,
) -> Result<Json<ApiResponse<Vec<TradeResponse>>>, AppError> {
    let side = match query.side.as_deref() {
        Some(raw) => Some(
            Side::from_api_str(raw)
                .ok_or_else(|| AppError::BadRequest("side must be BUY or SELL".into()))?
                .to_string(),
        ),
        None => None,
    };

    let filters = TradeFilters {
        account_id: query.account,
        symbol: query.symbol,
        side,
        setup_strategy_id: query.setup_strategy,
        entry_type_id: query.entry_type,
    };

    let trades = trade_repo::list_trades(&state.db, user.id, &filters).await?;

    Ok(Json(ApiResponse::ok(
        trades.into_iter().map(TradeResponse::from).collect(),
    )))
}

/// POST /api/trades — create a trade; the account balance moves with it
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateTradeRequest>,
) -> Result<Json<ApiResponse<TradeResponse>>, AppError> {
    let trade = ledger::create_trade(&state.db, user.id, &body).await?;

    Ok(Json(ApiResponse::ok(trade.into())))
}

/// GET /api/trades/{id}
pub async fn detail(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<TradeResponse>>, AppError> {
    let trade = trade_repo::get_trade(&state.db, id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("trade not found".into()))?;

    Ok(Json(ApiResponse::ok(trade.into())))
}

/// PUT /api/trades/{id} — partial update; the balance moves by the returns
/// delta
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateTradeRequest>,
) -> Result<Json<ApiResponse<TradeResponse>>, AppError> {
    let trade = ledger::update_trade(&state.db, user.id, id, &body).await?;

    Ok(Json(ApiResponse::ok(trade.into())))
}

/// DELETE /api/trades/{id} — backs the trade's P&L out of the balance
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    ledger::delete_trade(&state.db, user.id, id).await?;

    Ok(Json(ApiResponse::ok(())))
}
