use super::{discord_id, sql_id};
use sqlx::PgPool;

pub struct NewRecord<'a> {
    pub map_code: &'a str,
    pub level_name: &'a str,
    pub user_id: u64,
    pub record: f64,
    pub screenshot: &'a str,
    pub video: Option<&'a str>,
    pub message_id: u64,
    pub channel_id: u64,
    pub hidden_id: u64,
}

/// A submission waiting in (or just leaving) the verification queue.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingRecord {
    pub user_id: i64,
    pub map_code: String,
    pub level_name: String,
    pub record: f64,
    pub video: Option<String>,
    pub message_id: i64,
    pub channel_id: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeaderboardRow {
    pub user_id: i64,
    pub nickname: String,
    pub level_name: String,
    pub record: f64,
    pub screenshot: String,
    pub video: Option<String>,
    pub rank_num: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PersonalRecordRow {
    pub map_code: String,
    pub map_name: String,
    pub creators: String,
    pub level_name: String,
    pub record: f64,
    pub screenshot: String,
    pub video: Option<String>,
    pub rank_num: i64,
}

/// The user's most recent submission for a level and its queue message, if still pending.
pub async fn latest_submission(
    pool: &PgPool,
    map_code: &str,
    level_name: &str,
    user_id: u64,
) -> Result<Option<(f64, Option<u64>)>, sqlx::Error> {
    let row: Option<(f64, Option<i64>)> = sqlx::query_as(
        "SELECT record, hidden_id FROM records
         WHERE map_code = $1 AND level_name = $2 AND user_id = $3
         ORDER BY inserted_at DESC
         LIMIT 1",
    )
    .bind(map_code)
    .bind(level_name)
    .bind(sql_id(user_id))
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(record, hidden)| (record, hidden.map(discord_id))))
}

pub async fn insert(pool: &PgPool, record: &NewRecord<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO records
             (map_code, level_name, user_id, record, screenshot, video, message_id, channel_id, hidden_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(record.map_code)
    .bind(record.level_name)
    .bind(sql_id(record.user_id))
    .bind(record.record)
    .bind(record.screenshot)
    .bind(record.video)
    .bind(sql_id(record.message_id))
    .bind(sql_id(record.channel_id))
    .bind(sql_id(record.hidden_id))
    .execute(pool)
    .await?;
    Ok(())
}

/// Whether a message in a record channel is a record submission.
pub async fn is_record_message(pool: &PgPool, message_id: u64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM records WHERE message_id = $1)")
        .bind(sql_id(message_id))
        .fetch_one(pool)
        .await
}

pub async fn find_pending(pool: &PgPool, hidden_id: u64) -> Result<Option<PendingRecord>, sqlx::Error> {
    sqlx::query_as(
        "SELECT user_id, map_code, level_name, record, video, message_id, channel_id
         FROM records WHERE hidden_id = $1",
    )
    .bind(sql_id(hidden_id))
    .fetch_optional(pool)
    .await
}

pub async fn mark_verified(pool: &PgPool, hidden_id: u64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE records SET verified = TRUE, hidden_id = NULL WHERE hidden_id = $1")
        .bind(sql_id(hidden_id))
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete every submission of a user on one level. Returns the number removed.
pub async fn delete_for_level(
    pool: &PgPool,
    user_id: u64,
    map_code: &str,
    level_name: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM records WHERE user_id = $1 AND map_code = $2 AND level_name = $3")
        .bind(sql_id(user_id))
        .bind(map_code)
        .bind(level_name)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Latest verified time per user and level, merged with tournament runs
/// on the same map, ranked per level.
pub async fn leaderboard(
    pool: &PgPool,
    map_code: &str,
    level_name: Option<&str>,
    video_only: bool,
) -> Result<Vec<LeaderboardRow>, sqlx::Error> {
    sqlx::query_as(
        r#"WITH tournament_runs AS (
               SELECT DISTINCT ON (tr.user_id, tm.level)
                      tr.user_id, tm.level AS level_name, tr.record, tr.screenshot,
                      NULL::text AS video, TRUE AS verified, tr.inserted_at
               FROM tournament_records tr
               JOIN tournament_maps tm ON tm.id = tr.tournament_id AND tm.category = tr.category
               WHERE tm.code = $1
               ORDER BY tr.user_id, tm.level, tr.inserted_at DESC
           ),
           combined AS (
               SELECT user_id, level_name, record, screenshot, video, verified, inserted_at
               FROM records WHERE map_code = $1
               UNION ALL
               SELECT user_id, level_name, record, screenshot, video, verified, inserted_at
               FROM tournament_runs
           ),
           latest AS (
               SELECT DISTINCT ON (user_id, level_name) *
               FROM combined
               ORDER BY user_id, level_name, inserted_at DESC
           )
           SELECT l.user_id,
                  COALESCE(u.nickname, 'Unknown') AS nickname,
                  l.level_name,
                  l.record,
                  l.screenshot,
                  l.video,
                  RANK() OVER (PARTITION BY l.level_name ORDER BY l.record) AS rank_num
           FROM latest l
           LEFT JOIN users u ON u.user_id = l.user_id
           WHERE l.verified
             AND ($2::text IS NULL OR l.level_name = $2)
             AND (NOT $3 OR l.video IS NOT NULL)
           ORDER BY substr(l.level_name, 1, 5) <> 'Level', l.level_name, l.record"#,
    )
    .bind(map_code)
    .bind(level_name)
    .bind(video_only)
    .fetch_all(pool)
    .await
}

/// A user's latest verified time on every level they have run.
pub async fn personal_records(
    pool: &PgPool,
    user_id: u64,
    world_records_only: bool,
) -> Result<Vec<PersonalRecordRow>, sqlx::Error> {
    sqlx::query_as(
        r#"WITH latest AS (
               SELECT DISTINCT ON (user_id, map_code, level_name)
                      user_id, map_code, level_name, record, screenshot, video, verified
               FROM records
               ORDER BY user_id, map_code, level_name, inserted_at DESC
           ),
           ranked AS (
               SELECT *, RANK() OVER (PARTITION BY map_code, level_name ORDER BY record) AS rank_num
               FROM latest
               WHERE verified
           )
           SELECT r.map_code,
                  m.map_name,
                  COALESCE(c.creators, '') AS creators,
                  r.level_name,
                  r.record,
                  r.screenshot,
                  r.video,
                  r.rank_num
           FROM ranked r
           JOIN maps m ON m.map_code = r.map_code
           LEFT JOIN LATERAL (
               SELECT string_agg(DISTINCT u.nickname, ', ') AS creators
               FROM map_creators mc JOIN users u ON u.user_id = mc.user_id
               WHERE mc.map_code = r.map_code
           ) c ON TRUE
           WHERE r.user_id = $1 AND (NOT $2 OR r.rank_num = 1)
           ORDER BY r.map_code, substr(r.level_name, 1, 5) <> 'Level', r.level_name"#,
    )
    .bind(sql_id(user_id))
    .bind(world_records_only)
    .fetch_all(pool)
    .await
}
