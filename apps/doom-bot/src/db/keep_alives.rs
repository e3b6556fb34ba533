use super::{discord_id, sql_id};
use sqlx::PgPool;
use std::collections::HashSet;

pub async fn fetch_all(pool: &PgPool) -> Result<HashSet<u64>, sqlx::Error> {
    let ids: Vec<i64> = sqlx::query_scalar("SELECT thread_id FROM keep_alives")
        .fetch_all(pool)
        .await?;
    Ok(ids.into_iter().map(discord_id).collect())
}

pub async fn insert(pool: &PgPool, thread_id: u64) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO keep_alives (thread_id) VALUES ($1) ON CONFLICT DO NOTHING")
        .bind(sql_id(thread_id))
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, thread_id: u64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM keep_alives WHERE thread_id = $1")
        .bind(sql_id(thread_id))
        .execute(pool)
        .await?;
    Ok(())
}
