use sqlx::PgPool;

use crate::models::Trade;

/// Optional list filters; every field narrows the user-scoped query.
#[derive(Debug, Default, Clone)]
pub struct TradeFilters {
    pub account_id: Option<i64>,
    pub symbol: Option<String>,
    pub side: Option<String>,
    pub setup_strategy_id: Option<i64>,
    pub entry_type_id: Option<i64>,
}

/// List trades across all of the user's accounts, newest entry first.
pub async fn list_trades(
    pool: &PgPool,
    user_id: i64,
    filters: &TradeFilters,
) -> anyhow::Result<Vec<Trade>> {
    let trades = sqlx::query_as::<_, Trade>(
        r#"
        SELECT t.* FROM trades t
        JOIN accounts a ON a.id = t.account_id
        WHERE a.user_id = $1
          AND ($2::bigint IS NULL OR t.account_id = $2)
          AND ($3::text IS NULL OR t.symbol = $3)
          AND ($4::text IS NULL OR t.side = $4)
          AND ($5::bigint IS NULL OR t.setup_strategy_id = $5)
          AND ($6::bigint IS NULL OR t.entry_type_id = $6)
        ORDER BY t.entry_date DESC
        "#,
    )
    .bind(user_id)
    .bind(filters.account_id)
    .bind(filters.symbol.as_deref())
    .bind(filters.side.as_deref())
    .bind(filters.setup_strategy_id)
    .bind(filters.entry_type_id)
    .fetch_all(pool)
    .await?;

    Ok(trades)
}

/// Fetch one trade scoped to the calling user via its account.
pub async fn get_trade(pool: &PgPool, id: i64, user_id: i64) -> anyhow::Result<Option<Trade>> {
    let trade = sqlx::query_as::<_, Trade>(
        r#"
        SELECT t.* FROM trades t
        JOIN accounts a ON a.id = t.account_id
        WHERE t.id = $1 AND a.user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(trade)
}
