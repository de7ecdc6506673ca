use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database row for the trades table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trade {
    pub id: i64,
    pub account_id: i64,
    pub symbol: String,
    pub entry_date: DateTime<Utc>,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub size: Decimal,
    pub side: String,
    /// Manually-entered holding duration, kept as opaque text.
    pub duration: Option<String>,
    /// Realized P&L; None means the position is still open.
    pub returns: Option<Decimal>,
    /// Account balance snapshot taken right after this trade's mutation.
    pub current_balance_after_trade: Option<Decimal>,
    pub notes: Option<String>,
    pub setup_strategy_id: Option<i64>,
    pub entry_type_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trade {
    pub fn status(&self) -> TradeStatus {
        TradeStatus::from_returns(self.returns)
    }
}

// ---------------------------------------------------------------------------
// TradeStatus — derived, never stored
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    Open,
    Win,
    Loss,
    Breakeven,
}

impl TradeStatus {
    pub fn from_returns(returns: Option<Decimal>) -> Self {
        match returns {
            None => TradeStatus::Open,
            Some(r) if r > Decimal::ZERO => TradeStatus::Win,
            Some(r) if r < Decimal::ZERO => TradeStatus::Loss,
            Some(_) => TradeStatus::Breakeven,
        }
    }
}
