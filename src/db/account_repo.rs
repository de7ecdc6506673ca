use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::Account;

/// List a user's accounts, ordered by name.
pub async fn list_accounts(pool: &PgPool, user_id: i64) -> anyhow::Result<Vec<Account>> {
    let accounts = sqlx::query_as::<_, Account>(
        "SELECT * FROM accounts WHERE user_id = $1 ORDER BY name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(accounts)
}

/// Fetch one account scoped to its owner. Accounts outside the caller's
/// scope are indistinguishable from nonexistent ones.
pub async fn get_account(pool: &PgPool, id: i64, user_id: i64) -> anyhow::Result<Option<Account>> {
    let account = sqlx::query_as::<_, Account>(
        "SELECT * FROM accounts WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

/// Create an account. The running balance starts at the initial balance.
pub async fn create_account(
    pool: &PgPool,
    user_id: i64,
    name: &str,
    initial_balance: Decimal,
) -> anyhow::Result<Account> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (user_id, name, initial_balance, current_balance)
        VALUES ($1, $2, $3, $3)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(initial_balance)
    .fetch_one(pool)
    .await?;

    Ok(account)
}

/// Partial update; absent fields keep their stored values. Editing
/// `current_balance` directly is allowed.
pub async fn update_account(
    pool: &PgPool,
    id: i64,
    user_id: i64,
    name: Option<&str>,
    initial_balance: Option<Decimal>,
    current_balance: Option<Decimal>,
) -> anyhow::Result<Option<Account>> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        UPDATE accounts
        SET name = COALESCE($3, name),
            initial_balance = COALESCE($4, initial_balance),
            current_balance = COALESCE($5, current_balance),
            updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(name)
    .bind(initial_balance)
    .bind(current_balance)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

/// Delete an account; trades cascade in the database.
pub async fn delete_account(pool: &PgPool, id: i64, user_id: i64) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM accounts WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
