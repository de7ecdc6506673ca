use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::auth::CurrentUser;
use crate::db::{account_repo, metrics_repo};
use crate::errors::AppError;
use crate::services::metrics::{self, DashboardStats, EquityPoint, Period, PnlPoint};
use crate::AppState;

const ALL_ACCOUNTS: &str = "All Accounts";

#[derive(Deserialize)]
pub struct DashboardQuery {
    pub account_id: Option<i64>,
    pub period: Option<String>,
}

#[derive(Serialize)]
pub struct DashboardMetricsResponse {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub account_id: Option<i64>,
    pub account_name: String,
}

/// Resolve the optional account filter; unknown or foreign ids read as
/// nonexistent.
async fn resolve_account_name(
    state: &AppState,
    user_id: i64,
    account_id: Option<i64>,
) -> Result<String, AppError> {
    match account_id {
        Some(id) => {
            let account = account_repo::get_account(&state.db, id, user_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound("account not found or access denied".into())
                })?;
            Ok(account.name)
        }
        None => Ok(ALL_ACCOUNTS.into()),
    }
}

/// GET /api/dashboard/metrics — summary statistics over closed trades
pub async fn summary(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardMetricsResponse>, AppError> {
    let account_name = resolve_account_name(&state, user.id, query.account_id).await?;

    let returns = metrics_repo::closed_returns(&state.db, user.id, query.account_id).await?;
    let stats = metrics::compute_dashboard(&returns);

    Ok(Json(DashboardMetricsResponse {
        stats,
        account_id: query.account_id,
        account_name,
    }))
}

/// GET /api/dashboard/equity-curve — balance history for one account.
/// Without an account filter there is no seed balance, so the curve is
/// empty.
pub async fn equity_curve(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Vec<EquityPoint>>, AppError> {
    let Some(account_id) = query.account_id else {
        return Ok(Json(Vec::new()));
    };

    let account = account_repo::get_account(&state.db, account_id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("account not found or access denied".into()))?;

    let snapshots = metrics_repo::equity_rows(&state.db, account_id).await?;
    let points = metrics::build_equity_curve(account.created_at, account.initial_balance, &snapshots);

    Ok(Json(points))
}

/// GET /api/dashboard/pnl-over-time — closed-trade P&L bucketed by period;
/// buckets without trades are omitted
pub async fn pnl_over_time(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Vec<PnlPoint>>, AppError> {
    // Validates scope even though only the id is used in the query below.
    resolve_account_name(&state, user.id, query.account_id).await?;

    let period = Period::from_api_str(query.period.as_deref());
    let buckets =
        metrics_repo::pnl_by_period(&state.db, user.id, query.account_id, period.trunc_unit())
            .await?;

    Ok(Json(metrics::to_pnl_points(&buckets)))
}
