use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::api::auth::CurrentUser;
use crate::db::{account_repo, metrics_repo};
use crate::errors::AppError;
use crate::services::metrics::{self, MonthlyCalendar};
use crate::AppState;

#[derive(Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub account_id: Option<i64>,
}

/// GET /api/calendar/monthly — per-day aggregates plus monthly totals for
/// one month of closed trades
pub async fn monthly(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<MonthlyCalendar>, AppError> {
    let (Some(year), Some(month)) = (query.year, query.month) else {
        return Err(AppError::BadRequest(
            "year and month parameters are required".into(),
        ));
    };

    let (from, to) = metrics::month_bounds(year, month)?;

    let account_name = match query.account_id {
        Some(id) => {
            account_repo::get_account(&state.db, id, user.id)
                .await?
                .ok_or_else(|| AppError::NotFound("account not found or access denied".into()))?
                .name
        }
        None => "All Accounts".into(),
    };

    let rows =
        metrics_repo::calendar_rows(&state.db, user.id, query.account_id, from, to).await?;
    let calendar =
        metrics::build_monthly_calendar(year, month, query.account_id, account_name, &rows);

    Ok(Json(calendar))
}
