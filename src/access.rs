//! Polymorphic ownership resolution.
//!
//! Every entity that can own documentation or be touched by an object-level
//! API call resolves to either a single owning user or the public state
//! (strategies and entry types only). Resolution is a match over a tagged
//! reference rather than a dynamic type lookup.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::errors::AppError;

// ---------------------------------------------------------------------------
// OwnerRef
// ---------------------------------------------------------------------------

/// Tagged reference to an entity that documentation can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerRef {
    Account(i64),
    Trade(i64),
    SetupStrategy(i64),
    EntryType(i64),
}

impl OwnerRef {
    /// Parse the wire form used by the documentation API
    /// (`parent_type` + `parent_id`).
    pub fn parse(kind: &str, id: i64) -> Option<Self> {
        match kind.to_lowercase().as_str() {
            "account" => Some(OwnerRef::Account(id)),
            "trade" => Some(OwnerRef::Trade(id)),
            "setupstrategy" => Some(OwnerRef::SetupStrategy(id)),
            "entrytype" => Some(OwnerRef::EntryType(id)),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OwnerRef::Account(_) => "account",
            OwnerRef::Trade(_) => "trade",
            OwnerRef::SetupStrategy(_) => "setupstrategy",
            OwnerRef::EntryType(_) => "entrytype",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            OwnerRef::Account(id)
            | OwnerRef::Trade(id)
            | OwnerRef::SetupStrategy(id)
            | OwnerRef::EntryType(id) => *id,
        }
    }
}

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

/// Resolved ownership of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ownership {
    User(i64),
    /// Readable by everyone, writable by no one.
    Public,
}

impl Ownership {
    pub fn can_read(&self, user_id: i64) -> bool {
        match self {
            Ownership::User(owner) => *owner == user_id,
            Ownership::Public => true,
        }
    }

    pub fn can_write(&self, user_id: i64) -> bool {
        match self {
            Ownership::User(owner) => *owner == user_id,
            Ownership::Public => false,
        }
    }
}

/// Resolve an owner reference to its ownership, or `NotFound` if the entity
/// does not exist.
pub async fn resolve_owner(pool: &PgPool, owner: OwnerRef) -> Result<Ownership, AppError> {
    let ownership = match owner {
        OwnerRef::Account(id) => {
            let row: Option<(i64,)> =
                sqlx::query_as("SELECT user_id FROM accounts WHERE id = $1")
                    .bind(id)
                    .fetch_optional(pool)
                    .await?;
            row.map(|(uid,)| Ownership::User(uid))
        }
        OwnerRef::Trade(id) => {
            let row: Option<(i64,)> = sqlx::query_as(
                r#"
                SELECT a.user_id FROM trades t
                JOIN accounts a ON a.id = t.account_id
                WHERE t.id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(pool)
            .await?;
            row.map(|(uid,)| Ownership::User(uid))
        }
        OwnerRef::SetupStrategy(id) => {
            let row: Option<(Option<i64>,)> =
                sqlx::query_as("SELECT user_id FROM setup_strategies WHERE id = $1")
                    .bind(id)
                    .fetch_optional(pool)
                    .await?;
            row.map(|(uid,)| uid.map_or(Ownership::Public, Ownership::User))
        }
        OwnerRef::EntryType(id) => {
            let row: Option<(Option<i64>,)> =
                sqlx::query_as("SELECT user_id FROM entry_types WHERE id = $1")
                    .bind(id)
                    .fetch_optional(pool)
                    .await?;
            row.map(|(uid,)| uid.map_or(Ownership::Public, Ownership::User))
        }
    };

    ownership.ok_or_else(|| AppError::NotFound(format!("{} not found", owner.kind())))
}

/// Object-level read check: owner or public. Denial is `Forbidden`, not
/// `NotFound` — the entity exists, the caller just cannot see it.
pub fn ensure_can_read(ownership: Ownership, user_id: i64) -> Result<(), AppError> {
    if ownership.can_read(user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "you do not have access to this object".into(),
        ))
    }
}

/// Object-level write check: owner only. Public entities are never writable.
pub fn ensure_can_write(ownership: Ownership, user_id: i64) -> Result<(), AppError> {
    if ownership.can_write(user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "you do not have permission to modify this object".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_ref_parse() {
        assert_eq!(OwnerRef::parse("trade", 3), Some(OwnerRef::Trade(3)));
        assert_eq!(
            OwnerRef::parse("SetupStrategy", 9),
            Some(OwnerRef::SetupStrategy(9))
        );
        assert_eq!(OwnerRef::parse("widget", 1), None);
    }

    #[test]
    fn test_owner_ref_round_trip() {
        let owner = OwnerRef::EntryType(42);
        assert_eq!(OwnerRef::parse(owner.kind(), owner.id()), Some(owner));
    }

    #[test]
    fn test_owned_entity_access() {
        let ownership = Ownership::User(7);
        assert!(ownership.can_read(7));
        assert!(ownership.can_write(7));
        assert!(!ownership.can_read(8));
        assert!(!ownership.can_write(8));
    }

    #[test]
    fn test_public_entity_is_read_only() {
        let ownership = Ownership::Public;
        assert!(ownership.can_read(1));
        assert!(!ownership.can_write(1));
    }

    #[test]
    fn test_denial_is_forbidden() {
        let err = ensure_can_write(Ownership::Public, 1).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
