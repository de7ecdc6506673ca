//! Trade mutations and the account balance invariant.
//!
//! Every create/update/delete of a trade runs in a single transaction that
//! also applies the balance delta to the owning account, with the account
//! row locked first so concurrent writes against the same account serialize.
//! The invariant `current_balance == initial_balance + sum(returns)` is not
//! self-healing, so the pairing is never split across transactions.

use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use sqlx::PgPool;

use crate::access::{self, OwnerRef};
use crate::errors::AppError;
use crate::models::{Account, Side, Trade};

// ---------------------------------------------------------------------------
// Input shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTradeRequest {
    pub account_id: i64,
    pub symbol: String,
    pub entry_date: chrono::DateTime<chrono::Utc>,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub size: Decimal,
    pub side: Side,
    pub duration: Option<String>,
    pub returns: Option<Decimal>,
    pub notes: Option<String>,
    pub setup_strategy_id: Option<i64>,
    pub entry_type_id: Option<i64>,
}

/// Partial update. An absent field keeps the stored value; for nullable
/// columns an explicit JSON null clears it, which is why those fields are
/// double-wrapped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTradeRequest {
    pub symbol: Option<String>,
    pub entry_date: Option<chrono::DateTime<chrono::Utc>>,
    pub entry_price: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub exit_price: Option<Option<Decimal>>,
    pub size: Option<Decimal>,
    pub side: Option<Side>,
    #[serde(default, deserialize_with = "double_option")]
    pub duration: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub returns: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub setup_strategy_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub entry_type_id: Option<Option<i64>>,
}

fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Insert a trade and apply its realized P&L to the owning account.
pub async fn create_trade(
    pool: &PgPool,
    user_id: i64,
    req: &CreateTradeRequest,
) -> Result<Trade, AppError> {
    if let Some(id) = req.setup_strategy_id {
        ensure_link_readable(pool, OwnerRef::SetupStrategy(id), user_id, "setup_strategy").await?;
    }
    if let Some(id) = req.entry_type_id {
        ensure_link_readable(pool, OwnerRef::EntryType(id), user_id, "entry_type").await?;
    }

    let mut tx = pool.begin().await?;

    let account = lock_account(&mut tx, req.account_id, user_id).await?;

    let delta = req.returns.unwrap_or(Decimal::ZERO);
    let new_balance = account.current_balance + delta;

    if !delta.is_zero() {
        apply_balance(&mut tx, account.id, new_balance).await?;
    }

    let trade = sqlx::query_as::<_, Trade>(
        r#"
        INSERT INTO trades (
            account_id, symbol, entry_date, entry_price, exit_price, size, side,
            duration, returns, current_balance_after_trade, notes,
            setup_strategy_id, entry_type_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING *
        "#,
    )
    .bind(account.id)
    .bind(&req.symbol)
    .bind(req.entry_date)
    .bind(req.entry_price)
    .bind(req.exit_price)
    .bind(req.size)
    .bind(req.side.to_string())
    .bind(req.duration.as_deref())
    .bind(req.returns)
    .bind(new_balance)
    .bind(req.notes.as_deref())
    .bind(req.setup_strategy_id)
    .bind(req.entry_type_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    counter!("trades_created_total").increment(1);
    tracing::info!(
        trade_id = trade.id,
        account_id = account.id,
        delta = %delta,
        "trade created"
    );

    Ok(trade)
}

/// Apply a partial update; the balance moves by `new_returns - old_returns`.
pub async fn update_trade(
    pool: &PgPool,
    user_id: i64,
    trade_id: i64,
    req: &UpdateTradeRequest,
) -> Result<Trade, AppError> {
    if let Some(Some(id)) = req.setup_strategy_id {
        ensure_link_readable(pool, OwnerRef::SetupStrategy(id), user_id, "setup_strategy").await?;
    }
    if let Some(Some(id)) = req.entry_type_id {
        ensure_link_readable(pool, OwnerRef::EntryType(id), user_id, "entry_type").await?;
    }

    let mut tx = pool.begin().await?;

    // Scope check first; the lookup doubles as the account-id resolution.
    let scoped = fetch_scoped_trade(&mut tx, trade_id, user_id).await?;
    let account = lock_account(&mut tx, scoped.account_id, user_id).await?;

    // Re-read under the account lock. Every writer takes that lock before
    // touching trades, so this read is authoritative.
    let existing = sqlx::query_as::<_, Trade>("SELECT * FROM trades WHERE id = $1")
        .bind(trade_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("trade not found".into()))?;

    let old_returns = existing.returns.unwrap_or(Decimal::ZERO);

    let symbol = req.symbol.clone().unwrap_or(existing.symbol);
    let entry_date = req.entry_date.unwrap_or(existing.entry_date);
    let entry_price = req.entry_price.unwrap_or(existing.entry_price);
    let exit_price = req.exit_price.unwrap_or(existing.exit_price);
    let size = req.size.unwrap_or(existing.size);
    let side = req
        .side
        .map(|s| s.to_string())
        .unwrap_or(existing.side);
    let duration = req.duration.clone().unwrap_or(existing.duration);
    let returns = req.returns.unwrap_or(existing.returns);
    let notes = req.notes.clone().unwrap_or(existing.notes);
    let setup_strategy_id = req.setup_strategy_id.unwrap_or(existing.setup_strategy_id);
    let entry_type_id = req.entry_type_id.unwrap_or(existing.entry_type_id);

    let delta = returns.unwrap_or(Decimal::ZERO) - old_returns;
    let new_balance = account.current_balance + delta;

    let snapshot = if delta.is_zero() {
        existing.current_balance_after_trade
    } else {
        apply_balance(&mut tx, account.id, new_balance).await?;
        Some(new_balance)
    };

    let trade = sqlx::query_as::<_, Trade>(
        r#"
        UPDATE trades
        SET symbol = $2, entry_date = $3, entry_price = $4, exit_price = $5,
            size = $6, side = $7, duration = $8, returns = $9,
            current_balance_after_trade = $10, notes = $11,
            setup_strategy_id = $12, entry_type_id = $13, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(trade_id)
    .bind(&symbol)
    .bind(entry_date)
    .bind(entry_price)
    .bind(exit_price)
    .bind(size)
    .bind(&side)
    .bind(duration.as_deref())
    .bind(returns)
    .bind(snapshot)
    .bind(notes.as_deref())
    .bind(setup_strategy_id)
    .bind(entry_type_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    counter!("trades_updated_total").increment(1);
    tracing::info!(
        trade_id = trade.id,
        account_id = account.id,
        delta = %delta,
        "trade updated"
    );

    Ok(trade)
}

/// Delete a trade and back its realized P&L out of the account balance.
pub async fn delete_trade(pool: &PgPool, user_id: i64, trade_id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let scoped = fetch_scoped_trade(&mut tx, trade_id, user_id).await?;
    let account = lock_account(&mut tx, scoped.account_id, user_id).await?;

    let existing = sqlx::query_as::<_, Trade>("SELECT * FROM trades WHERE id = $1")
        .bind(trade_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("trade not found".into()))?;

    sqlx::query("DELETE FROM trades WHERE id = $1")
        .bind(trade_id)
        .execute(&mut *tx)
        .await?;

    let delta = -existing.returns.unwrap_or(Decimal::ZERO);
    if !delta.is_zero() {
        apply_balance(&mut tx, account.id, account.current_balance + delta).await?;
    }

    tx.commit().await?;

    counter!("trades_deleted_total").increment(1);
    tracing::info!(trade_id, account_id = account.id, delta = %delta, "trade deleted");

    Ok(())
}

// ---------------------------------------------------------------------------
// Transaction helpers
// ---------------------------------------------------------------------------

/// Lock the account row for the rest of the transaction. Accounts outside
/// the caller's scope read as nonexistent.
async fn lock_account(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    account_id: i64,
    user_id: i64,
) -> Result<Account, AppError> {
    sqlx::query_as::<_, Account>(
        "SELECT * FROM accounts WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(account_id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("account not found".into()))
}

async fn fetch_scoped_trade(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    trade_id: i64,
    user_id: i64,
) -> Result<Trade, AppError> {
    sqlx::query_as::<_, Trade>(
        r#"
        SELECT t.* FROM trades t
        JOIN accounts a ON a.id = t.account_id
        WHERE t.id = $1 AND a.user_id = $2
        "#,
    )
    .bind(trade_id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("trade not found".into()))
}

async fn apply_balance(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    account_id: i64,
    new_balance: Decimal,
) -> Result<(), AppError> {
    sqlx::query("UPDATE accounts SET current_balance = $2, updated_at = now() WHERE id = $1")
        .bind(account_id)
        .bind(new_balance)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

/// A strategy/entry-type link must resolve to something the caller can read
/// (their own, or public). Anything else is a malformed request, not an
/// access failure.
async fn ensure_link_readable(
    pool: &PgPool,
    owner: OwnerRef,
    user_id: i64,
    what: &str,
) -> Result<(), AppError> {
    match access::resolve_owner(pool, owner).await {
        Ok(ownership) if ownership.can_read(user_id) => Ok(()),
        _ => Err(AppError::BadRequest(format!("unknown {what}"))),
    }
}
