use sqlx::PgPool;

use crate::models::{EntryType, SetupStrategy};

// ---------------------------------------------------------------------------
// Setup strategies
// ---------------------------------------------------------------------------

/// List the user's own strategies plus public ones, ordered by name.
pub async fn list_strategies(pool: &PgPool, user_id: i64) -> anyhow::Result<Vec<SetupStrategy>> {
    let strategies = sqlx::query_as::<_, SetupStrategy>(
        "SELECT * FROM setup_strategies WHERE user_id = $1 OR user_id IS NULL ORDER BY name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(strategies)
}

/// Unscoped fetch — object-level access decisions happen in the access
/// layer, so a strategy owned by someone else must still be resolvable.
pub async fn get_strategy(pool: &PgPool, id: i64) -> anyhow::Result<Option<SetupStrategy>> {
    let strategy =
        sqlx::query_as::<_, SetupStrategy>("SELECT * FROM setup_strategies WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(strategy)
}

pub async fn create_strategy(
    pool: &PgPool,
    user_id: i64,
    name: &str,
    description: Option<&str>,
) -> Result<SetupStrategy, sqlx::Error> {
    sqlx::query_as::<_, SetupStrategy>(
        r#"
        INSERT INTO setup_strategies (user_id, name, description)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await
}

pub async fn update_strategy(
    pool: &PgPool,
    id: i64,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<Option<SetupStrategy>, sqlx::Error> {
    sqlx::query_as::<_, SetupStrategy>(
        r#"
        UPDATE setup_strategies
        SET name = COALESCE($2, name),
            description = COALESCE($3, description)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .fetch_optional(pool)
    .await
}

pub async fn delete_strategy(pool: &PgPool, id: i64) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM setup_strategies WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// Entry types
// ---------------------------------------------------------------------------

/// List the user's own entry types plus public ones, ordered by name.
pub async fn list_entry_types(pool: &PgPool, user_id: i64) -> anyhow::Result<Vec<EntryType>> {
    let entry_types = sqlx::query_as::<_, EntryType>(
        "SELECT * FROM entry_types WHERE user_id = $1 OR user_id IS NULL ORDER BY name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(entry_types)
}

pub async fn get_entry_type(pool: &PgPool, id: i64) -> anyhow::Result<Option<EntryType>> {
    let entry_type = sqlx::query_as::<_, EntryType>("SELECT * FROM entry_types WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(entry_type)
}

pub async fn create_entry_type(
    pool: &PgPool,
    user_id: i64,
    name: &str,
    description: Option<&str>,
) -> Result<EntryType, sqlx::Error> {
    sqlx::query_as::<_, EntryType>(
        r#"
        INSERT INTO entry_types (user_id, name, description)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await
}

pub async fn update_entry_type(
    pool: &PgPool,
    id: i64,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<Option<EntryType>, sqlx::Error> {
    sqlx::query_as::<_, EntryType>(
        r#"
        UPDATE entry_types
        SET name = COALESCE($2, name),
            description = COALESCE($3, description)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .fetch_optional(pool)
    .await
}

pub async fn delete_entry_type(pool: &PgPool, id: i64) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM entry_types WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
