use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database row for the accounts table.
///
/// Invariant: `current_balance == initial_balance + sum(returns)` over all
/// trades belonging to the account. The ledger service maintains this inside
/// the same transaction as every trade mutation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub initial_balance: Decimal,
    pub current_balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
