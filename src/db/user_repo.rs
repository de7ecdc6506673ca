use sqlx::PgPool;

use crate::models::User;

/// Resolve an opaque bearer token to a user, if one matches.
pub async fn get_user_by_token(pool: &PgPool, token: &str) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE api_token = $1")
        .bind(token)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}
