use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database row for the setup_strategies table.
///
/// A strategy with no owning user is public: every user can read it and link
/// trades to it, nobody can modify or delete it through the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SetupStrategy {
    pub id: i64,
    pub user_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
}

/// Database row for the entry_types table. Same ownership semantics as
/// `SetupStrategy`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EntryType {
    pub id: i64,
    pub user_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
}
