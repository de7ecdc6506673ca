use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database row for the users table. Token issuance happens outside this
/// service; the row only exists so bearer tokens can be resolved to an
/// identity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub api_token: String,
    pub created_at: DateTime<Utc>,
}
