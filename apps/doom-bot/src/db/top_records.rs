use super::{discord_id, sql_id};
use sqlx::PgPool;

/// Record an upvote. Returns false if this user already voted on the message.
pub async fn add_vote(
    pool: &PgPool,
    user_id: u64,
    message_id: u64,
    channel_id: u64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO top_records (user_id, original_message_id, channel_id)
         VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
    )
    .bind(sql_id(user_id))
    .bind(sql_id(message_id))
    .bind(sql_id(channel_id))
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn vote_count(pool: &PgPool, message_id: u64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM top_records WHERE original_message_id = $1")
        .bind(sql_id(message_id))
        .fetch_one(pool)
        .await
}

/// Claim the right to post the hall-of-records copy. Only one caller per
/// message ever gets `true`.
pub async fn claim_promotion(pool: &PgPool, message_id: u64) -> Result<bool, sqlx::Error> {
    let claimed: Option<i64> = sqlx::query_scalar(
        "INSERT INTO top_record_posts (original_message_id) VALUES ($1)
         ON CONFLICT DO NOTHING RETURNING original_message_id",
    )
    .bind(sql_id(message_id))
    .fetch_optional(pool)
    .await?;
    Ok(claimed.is_some())
}

/// Give a claim back after the copy could not be posted.
pub async fn release_promotion(pool: &PgPool, message_id: u64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM top_record_posts WHERE original_message_id = $1 AND top_record_id IS NULL")
        .bind(sql_id(message_id))
        .execute(pool)
        .await?;
    Ok(())
}

/// The hall-of-records message, once it has been posted.
pub async fn top_record_id(pool: &PgPool, message_id: u64) -> Result<Option<u64>, sqlx::Error> {
    let id: Option<Option<i64>> = sqlx::query_scalar(
        "SELECT top_record_id FROM top_record_posts WHERE original_message_id = $1",
    )
    .bind(sql_id(message_id))
    .fetch_optional(pool)
    .await?;
    Ok(id.flatten().map(discord_id))
}

pub async fn set_top_record_id(pool: &PgPool, message_id: u64, top_record_id: u64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE top_record_posts SET top_record_id = $2 WHERE original_message_id = $1")
        .bind(sql_id(message_id))
        .bind(sql_id(top_record_id))
        .execute(pool)
        .await?;
    Ok(())
}
