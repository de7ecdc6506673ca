//! Read-side aggregation over closed trades.
//!
//! The SQL layer scopes and fetches; everything numeric happens here on
//! plain slices so the arithmetic is testable without a database. Monetary
//! outputs are rounded to two places, half-up.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::db::metrics_repo::CalendarTradeRow;
use crate::errors::AppError;

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Dashboard metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_pnl: Decimal,
    pub total_trades: i64,
    pub winning_trades: i64,
    pub losing_trades: i64,
    pub breakeven_trades: i64,
    /// Percentage, e.g. 60.0 for 60%.
    pub win_rate: f64,
    pub average_pnl_per_trade: Decimal,
    pub average_winning_trade: Option<Decimal>,
    pub average_losing_trade: Option<Decimal>,
    /// Gross profit / gross loss; None when there are no losing trades.
    pub profit_factor: Option<Decimal>,
    pub largest_winning_trade: Option<Decimal>,
    pub largest_losing_trade: Option<Decimal>,
}

impl DashboardStats {
    pub fn empty() -> Self {
        DashboardStats {
            total_pnl: Decimal::new(0, 2),
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            breakeven_trades: 0,
            win_rate: 0.0,
            average_pnl_per_trade: Decimal::new(0, 2),
            average_winning_trade: None,
            average_losing_trade: None,
            profit_factor: None,
            largest_winning_trade: None,
            largest_losing_trade: None,
        }
    }
}

/// Aggregate a set of realized P&L values. An empty set yields the explicit
/// all-zero/null shape rather than an error.
pub fn compute_dashboard(returns: &[Decimal]) -> DashboardStats {
    if returns.is_empty() {
        return DashboardStats::empty();
    }

    let total_trades = returns.len() as i64;
    let total_pnl: Decimal = returns.iter().copied().sum();

    let wins: Vec<Decimal> = returns.iter().copied().filter(|r| *r > Decimal::ZERO).collect();
    let losses: Vec<Decimal> = returns.iter().copied().filter(|r| *r < Decimal::ZERO).collect();
    let winning_trades = wins.len() as i64;
    let losing_trades = losses.len() as i64;
    let breakeven_trades = total_trades - winning_trades - losing_trades;

    let win_rate = (winning_trades as f64 / total_trades as f64) * 100.0;
    let win_rate = (win_rate * 100.0).round() / 100.0;

    let average_pnl_per_trade = round2(total_pnl / Decimal::from(total_trades));

    let average_winning_trade = (!wins.is_empty()).then(|| {
        round2(wins.iter().copied().sum::<Decimal>() / Decimal::from(wins.len() as i64))
    });
    let average_losing_trade = (!losses.is_empty()).then(|| {
        round2(losses.iter().copied().sum::<Decimal>() / Decimal::from(losses.len() as i64))
    });

    let gross_profit: Decimal = wins.iter().copied().sum();
    let gross_loss: Decimal = losses.iter().copied().sum::<Decimal>().abs();
    let profit_factor = (gross_loss > Decimal::ZERO).then(|| round2(gross_profit / gross_loss));

    let largest_winning_trade = returns.iter().copied().max();
    let largest_losing_trade = returns.iter().copied().min();

    DashboardStats {
        total_pnl,
        total_trades,
        winning_trades,
        losing_trades,
        breakeven_trades,
        win_rate,
        average_pnl_per_trade,
        average_winning_trade,
        average_losing_trade,
        profit_factor,
        largest_winning_trade,
        largest_losing_trade,
    }
}

// ---------------------------------------------------------------------------
// Equity curve
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct EquityPoint {
    pub date: DateTime<Utc>,
    pub balance: Decimal,
}

/// Seed the curve at account creation with the initial balance, then one
/// point per trade snapshot. With no trades the curve is exactly the seed.
pub fn build_equity_curve(
    created_at: DateTime<Utc>,
    initial_balance: Decimal,
    snapshots: &[(DateTime<Utc>, Decimal)],
) -> Vec<EquityPoint> {
    let mut points = Vec::with_capacity(snapshots.len() + 1);
    points.push(EquityPoint {
        date: created_at,
        balance: initial_balance,
    });
    points.extend(snapshots.iter().map(|(date, balance)| EquityPoint {
        date: *date,
        balance: *balance,
    }));

    points
}

// ---------------------------------------------------------------------------
// P&L over time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Period {
    /// Unknown strings fall back to monthly rather than failing.
    pub fn from_api_str(s: Option<&str>) -> Self {
        match s.map(|s| s.to_lowercase()).as_deref() {
            Some("daily") => Period::Daily,
            Some("weekly") => Period::Weekly,
            Some("yearly") => Period::Yearly,
            _ => Period::Monthly,
        }
    }

    /// The matching Postgres `date_trunc` field.
    pub fn trunc_unit(&self) -> &'static str {
        match self {
            Period::Daily => "day",
            Period::Weekly => "week",
            Period::Monthly => "month",
            Period::Yearly => "year",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PnlPoint {
    pub period: NaiveDate,
    pub pnl: Decimal,
}

pub fn to_pnl_points(buckets: &[(DateTime<Utc>, Decimal)]) -> Vec<PnlPoint> {
    buckets
        .iter()
        .map(|(period, pnl)| PnlPoint {
            period: period.date_naive(),
            pnl: *pnl,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Monthly calendar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayStatus {
    WinningDay,
    LosingDay,
    BreakevenDay,
}

impl DayStatus {
    pub fn from_pnl(pnl: Decimal) -> Self {
        if pnl > Decimal::ZERO {
            DayStatus::WinningDay
        } else if pnl < Decimal::ZERO {
            DayStatus::LosingDay
        } else {
            DayStatus::BreakevenDay
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyCalendarEntry {
    pub date: NaiveDate,
    pub total_pnl: Decimal,
    pub trade_count: i64,
    pub strategies_used: Vec<String>,
    pub day_status: DayStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyCalendar {
    pub year: i32,
    pub month: u32,
    pub account_id: Option<i64>,
    pub account_name: String,
    pub total_monthly_pnl: Decimal,
    pub total_monthly_trades: i64,
    pub winning_days: i64,
    pub losing_days: i64,
    pub breakeven_days: i64,
    pub days_with_trades: Vec<DailyCalendarEntry>,
}

/// UTC bounds of one calendar month, or `BadRequest` for an impossible
/// year/month pair.
pub fn month_bounds(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::BadRequest("year and month must form a valid date".into()))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| AppError::BadRequest("year and month must form a valid date".into()))?;

    let from = Utc.from_utc_datetime(&first.and_hms_opt(0, 0, 0).unwrap());
    let to = Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0).unwrap());

    Ok((from, to))
}

/// Fold one month of closed trades into per-day aggregates and monthly
/// totals. Days without trades are omitted everywhere: they appear in no
/// per-day entry and count toward none of the day tallies.
pub fn build_monthly_calendar(
    year: i32,
    month: u32,
    account_id: Option<i64>,
    account_name: String,
    rows: &[CalendarTradeRow],
) -> MonthlyCalendar {
    struct DayAgg {
        total_pnl: Decimal,
        trade_count: i64,
        strategies: Vec<String>,
    }

    let mut days: BTreeMap<NaiveDate, DayAgg> = BTreeMap::new();
    for row in rows {
        let day = row.entry_date.date_naive();
        let agg = days.entry(day).or_insert_with(|| DayAgg {
            total_pnl: Decimal::ZERO,
            trade_count: 0,
            strategies: Vec::new(),
        });
        agg.total_pnl += row.returns;
        agg.trade_count += 1;
        if let Some(name) = &row.strategy_name {
            if !agg.strategies.contains(name) {
                agg.strategies.push(name.clone());
            }
        }
    }

    let mut total_monthly_pnl = Decimal::ZERO;
    let mut total_monthly_trades = 0;
    let mut winning_days = 0;
    let mut losing_days = 0;
    let mut breakeven_days = 0;

    let days_with_trades: Vec<DailyCalendarEntry> = days
        .into_iter()
        .map(|(date, agg)| {
            let day_status = DayStatus::from_pnl(agg.total_pnl);
            total_monthly_pnl += agg.total_pnl;
            total_monthly_trades += agg.trade_count;
            match day_status {
                DayStatus::WinningDay => winning_days += 1,
                DayStatus::LosingDay => losing_days += 1,
                DayStatus::BreakevenDay => breakeven_days += 1,
            }
            DailyCalendarEntry {
                date,
                total_pnl: agg.total_pnl,
                trade_count: agg.trade_count,
                strategies_used: agg.strategies,
                day_status,
            }
        })
        .collect();

    MonthlyCalendar {
        year,
        month,
        account_id,
        account_name,
        total_monthly_pnl,
        total_monthly_trades,
        winning_days,
        losing_days,
        breakeven_days,
        days_with_trades,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    fn day(y: i32, m: u32, dnum: u32) -> DateTime<Utc> {
        Utc.from_utc_datetime(
            &NaiveDate::from_ymd_opt(y, m, dnum)
                .unwrap()
                .and_hms_opt(14, 30, 0)
                .unwrap(),
        )
    }

    fn row(date: DateTime<Utc>, pnl: i64, strategy: Option<&str>) -> CalendarTradeRow {
        CalendarTradeRow {
            entry_date: date,
            returns: d(pnl),
            strategy_name: strategy.map(String::from),
        }
    }

    #[test]
    fn test_dashboard_empty_set() {
        let stats = compute_dashboard(&[]);
        assert_eq!(stats.total_trades, 0);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.total_pnl, Decimal::ZERO);
        assert_eq!(stats.average_pnl_per_trade, Decimal::ZERO);
        assert!(stats.average_winning_trade.is_none());
        assert!(stats.average_losing_trade.is_none());
        assert!(stats.profit_factor.is_none());
        assert!(stats.largest_winning_trade.is_none());
        assert!(stats.largest_losing_trade.is_none());
    }

    #[test]
    fn test_dashboard_mixed_returns() {
        let returns = [d(100), d(-50), d(150), d(0), d(200)];
        let stats = compute_dashboard(&returns);

        assert_eq!(stats.total_pnl, d(400));
        assert_eq!(stats.total_trades, 5);
        assert_eq!(stats.winning_trades, 3);
        assert_eq!(stats.losing_trades, 1);
        assert_eq!(stats.breakeven_trades, 1);
        assert_eq!(stats.win_rate, 60.0);
        assert_eq!(stats.average_pnl_per_trade, d(80));
        assert_eq!(stats.average_winning_trade, Some(d(150)));
        assert_eq!(stats.average_losing_trade, Some(d(-50)));
        // 450 gross profit / 50 gross loss
        assert_eq!(stats.profit_factor, Some(d(9)));
        assert_eq!(stats.largest_winning_trade, Some(d(200)));
        assert_eq!(stats.largest_losing_trade, Some(d(-50)));
    }

    #[test]
    fn test_dashboard_no_losers_has_null_profit_factor() {
        let stats = compute_dashboard(&[d(10), d(20)]);
        assert!(stats.profit_factor.is_none());
        assert_eq!(stats.win_rate, 100.0);
        assert!(stats.average_losing_trade.is_none());
    }

    #[test]
    fn test_dashboard_rounding_half_up() {
        // 10 / 3 = 3.333… → 3.33; sign-aware half-up on the negative mean
        let stats = compute_dashboard(&[d(5), d(5), d(0)]);
        assert_eq!(stats.average_pnl_per_trade, Decimal::new(333, 2));

        let stats = compute_dashboard(&[Decimal::new(5, 2), Decimal::new(10, 2)]);
        // mean of 0.05 and 0.10 = 0.075 → 0.08
        assert_eq!(stats.average_pnl_per_trade, Decimal::new(8, 2));
    }

    #[test]
    fn test_equity_curve_no_trades_is_seed_only() {
        let created = day(2024, 1, 1);
        let points = build_equity_curve(created, d(1000), &[]);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].date, created);
        assert_eq!(points[0].balance, d(1000));
    }

    #[test]
    fn test_equity_curve_appends_snapshots() {
        let created = day(2024, 1, 1);
        let snapshots = vec![(day(2024, 1, 2), d(1100)), (day(2024, 1, 5), d(1050))];
        let points = build_equity_curve(created, d(1000), &snapshots);
        assert_eq!(points.len(), 3);
        assert_eq!(points[1].balance, d(1100));
        assert_eq!(points[2].balance, d(1050));
    }

    #[test]
    fn test_period_parsing_defaults_to_monthly() {
        assert_eq!(Period::from_api_str(Some("daily")), Period::Daily);
        assert_eq!(Period::from_api_str(Some("WEEKLY")), Period::Weekly);
        assert_eq!(Period::from_api_str(Some("quarterly")), Period::Monthly);
        assert_eq!(Period::from_api_str(None), Period::Monthly);
    }

    #[test]
    fn test_month_bounds_validation() {
        assert!(month_bounds(2024, 2).is_ok());
        assert!(month_bounds(2024, 13).is_err());
        assert!(month_bounds(2024, 0).is_err());

        let (from, to) = month_bounds(2024, 12).unwrap();
        assert_eq!(from.date_naive(), NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(to.date_naive(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn test_calendar_rollup() {
        // Day 1: +100, day 2: -50, day 4: +20 / -20 nets to breakeven.
        let rows = vec![
            row(day(2024, 3, 1), 100, Some("Breakout")),
            row(day(2024, 3, 2), -50, None),
            row(day(2024, 3, 4), 20, Some("Breakout")),
            row(day(2024, 3, 4), -20, Some("Reversal")),
        ];

        let calendar = build_monthly_calendar(2024, 3, None, "All Accounts".into(), &rows);

        assert_eq!(calendar.total_monthly_pnl, d(50));
        assert_eq!(calendar.total_monthly_trades, 4);
        assert_eq!(calendar.winning_days, 1);
        assert_eq!(calendar.losing_days, 1);
        assert_eq!(calendar.breakeven_days, 1);
        assert_eq!(calendar.days_with_trades.len(), 3);

        let day4 = &calendar.days_with_trades[2];
        assert_eq!(day4.date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(day4.trade_count, 2);
        assert_eq!(day4.day_status, DayStatus::BreakevenDay);
        assert_eq!(day4.strategies_used, vec!["Breakout", "Reversal"]);
    }

    #[test]
    fn test_calendar_empty_month() {
        let calendar = build_monthly_calendar(2024, 6, Some(1), "Main".into(), &[]);
        assert_eq!(calendar.total_monthly_pnl, Decimal::ZERO);
        assert_eq!(calendar.total_monthly_trades, 0);
        assert_eq!(calendar.winning_days, 0);
        assert!(calendar.days_with_trades.is_empty());
    }

    #[test]
    fn test_day_status_classification() {
        assert_eq!(DayStatus::from_pnl(d(1)), DayStatus::WinningDay);
        assert_eq!(DayStatus::from_pnl(d(-1)), DayStatus::LosingDay);
        assert_eq!(DayStatus::from_pnl(Decimal::ZERO), DayStatus::BreakevenDay);
    }
}
