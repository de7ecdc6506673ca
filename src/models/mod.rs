pub mod account;
pub mod documentation;
pub mod strategy;
pub mod trade;
pub mod user;

pub use account::Account;
pub use documentation::{DocumentationItem, DocumentationWidget, ItemType};
pub use strategy::{EntryType, SetupStrategy};
pub use trade::{Trade, TradeStatus};
pub use user::User;

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "BUY" => Some(Side::Buy),
            "SELL" => Some(Side::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_parsing() {
        assert_eq!(Side::from_api_str("buy"), Some(Side::Buy));
        assert_eq!(Side::from_api_str("SELL"), Some(Side::Sell));
        assert_eq!(Side::from_api_str("HOLD"), None);
    }

    #[test]
    fn test_side_display_round_trip() {
        assert_eq!(Side::from_api_str(&Side::Buy.to_string()), Some(Side::Buy));
    }
}
