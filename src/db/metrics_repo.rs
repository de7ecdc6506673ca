use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

/// Realized P&L values of closed trades for a user, optionally narrowed to
/// one account. Open trades never reach the metrics engine.
pub async fn closed_returns(
    pool: &PgPool,
    user_id: i64,
    account_id: Option<i64>,
) -> anyhow::Result<Vec<Decimal>> {
    let rows: Vec<(Decimal,)> = sqlx::query_as(
        r#"
        SELECT t.returns FROM trades t
        JOIN accounts a ON a.id = t.account_id
        WHERE a.user_id = $1
          AND t.returns IS NOT NULL
          AND ($2::bigint IS NULL OR t.account_id = $2)
        "#,
    )
    .bind(user_id)
    .bind(account_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(r,)| r).collect())
}

/// Balance snapshots for the equity curve: one (entry_date, balance) pair
/// per trade carrying a snapshot, oldest first.
pub async fn equity_rows(
    pool: &PgPool,
    account_id: i64,
) -> anyhow::Result<Vec<(DateTime<Utc>, Decimal)>> {
    let rows: Vec<(DateTime<Utc>, Decimal)> = sqlx::query_as(
        r#"
        SELECT entry_date, current_balance_after_trade FROM trades
        WHERE account_id = $1 AND current_balance_after_trade IS NOT NULL
        ORDER BY entry_date
        "#,
    )
    .bind(account_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Closed-trade P&L summed per bucket, where `unit` is a Postgres
/// `date_trunc` field (day/week/month/year). Buckets with no trades do not
/// appear.
pub async fn pnl_by_period(
    pool: &PgPool,
    user_id: i64,
    account_id: Option<i64>,
    unit: &str,
) -> anyhow::Result<Vec<(DateTime<Utc>, Decimal)>> {
    let rows: Vec<(DateTime<Utc>, Option<Decimal>)> = sqlx::query_as(
        r#"
        SELECT date_trunc($3, t.entry_date) AS period, SUM(t.returns) AS pnl
        FROM trades t
        JOIN accounts a ON a.id = t.account_id
        WHERE a.user_id = $1
          AND t.returns IS NOT NULL
          AND ($2::bigint IS NULL OR t.account_id = $2)
        GROUP BY period
        ORDER BY period
        "#,
    )
    .bind(user_id)
    .bind(account_id)
    .bind(unit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(period, pnl)| (period, pnl.unwrap_or(Decimal::ZERO)))
        .collect())
}

/// One row per closed trade in the given window, with the linked strategy
/// name when present. The calendar rollup folds these in memory.
#[derive(Debug, Clone, FromRow)]
pub struct CalendarTradeRow {
    pub entry_date: DateTime<Utc>,
    pub returns: Decimal,
    pub strategy_name: Option<String>,
}

pub async fn calendar_rows(
    pool: &PgPool,
    user_id: i64,
    account_id: Option<i64>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> anyhow::Result<Vec<CalendarTradeRow>> {
    let rows = sqlx::query_as::<_, CalendarTradeRow>(
        r#"
        SELECT t.entry_date, t.returns, s.name AS strategy_name
        FROM trades t
        JOIN accounts a ON a.id = t.account_id
        LEFT JOIN setup_strategies s ON s.id = t.setup_strategy_id
        WHERE a.user_id = $1
          AND t.returns IS NOT NULL
          AND t.entry_date >= $3 AND t.entry_date < $4
          AND ($2::bigint IS NULL OR t.account_id = $2)
        ORDER BY t.entry_date
        "#,
    )
    .bind(user_id)
    .bind(account_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
