use super::{discord_id, sql_id};
use crate::cache::UserCacheData;
use sqlx::PgPool;
use std::collections::HashMap;

pub const MAX_NICKNAME_LEN: usize = 25;

/// Cut a display name down to what the `users` table accepts.
pub fn truncate_nickname(name: &str) -> String {
    name.chars().take(MAX_NICKNAME_LEN).collect()
}

pub async fn fetch_all(pool: &PgPool) -> Result<HashMap<u64, UserCacheData>, sqlx::Error> {
    let rows: Vec<(i64, String, bool)> =
        sqlx::query_as("SELECT user_id, nickname, alertable FROM users")
            .fetch_all(pool)
            .await?;
    Ok(rows
        .into_iter()
        .map(|(id, nickname, alertable)| (discord_id(id), UserCacheData { nickname, alertable }))
        .collect())
}

/// Register a user the first time they are seen. Existing rows are untouched.
pub async fn insert_if_missing(pool: &PgPool, user_id: u64, nickname: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO users (user_id, nickname, alertable) VALUES ($1, $2, TRUE)
         ON CONFLICT (user_id) DO NOTHING",
    )
    .bind(sql_id(user_id))
    .bind(truncate_nickname(nickname))
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_nickname(pool: &PgPool, user_id: u64, nickname: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET nickname = $2 WHERE user_id = $1")
        .bind(sql_id(user_id))
        .bind(truncate_nickname(nickname))
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_alertable(pool: &PgPool, user_id: u64, alertable: bool) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET alertable = $2 WHERE user_id = $1")
        .bind(sql_id(user_id))
        .bind(alertable)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn increment_verification_count(pool: &PgPool, moderator_id: u64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO verification_counts (user_id, amount) VALUES ($1, 1)
         ON CONFLICT (user_id) DO UPDATE SET amount = verification_counts.amount + 1",
    )
    .bind(sql_id(moderator_id))
    .execute(pool)
    .await?;
    Ok(())
}

/// Verification counts, highest first. Restricted to one moderator when given.
pub async fn verification_counts(
    pool: &PgPool,
    moderator_id: Option<u64>,
) -> Result<Vec<(u64, String, i32)>, sqlx::Error> {
    let rows: Vec<(i64, Option<String>, i32)> = sqlx::query_as(
        "SELECT vc.user_id, u.nickname, vc.amount
         FROM verification_counts vc
         LEFT JOIN users u ON u.user_id = vc.user_id
         WHERE $1::bigint IS NULL OR vc.user_id = $1
         ORDER BY vc.amount DESC
         LIMIT 25",
    )
    .bind(moderator_id.map(sql_id))
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(id, nick, amount)| (discord_id(id), nick.unwrap_or_else(|| "Unknown".into()), amount))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nicknames_are_truncated_by_characters() {
        assert_eq!(truncate_nickname("short"), "short");
        let long = "ä".repeat(40);
        assert_eq!(truncate_nickname(&long).chars().count(), MAX_NICKNAME_LEN);
    }
}
