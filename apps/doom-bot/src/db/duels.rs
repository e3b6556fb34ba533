use super::{discord_id, sql_id};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct NewDuel<'a> {
    pub map_code: &'a str,
    pub level: &'a str,
    pub wager: i32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Challenger first. The challenger starts out ready.
    pub players: [u64; 2],
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DuelRow {
    pub id: i32,
    pub thread_id: Option<i64>,
    pub map_code: String,
    pub level: String,
    pub wager: i32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DuelPlayer {
    pub user_id: i64,
    pub num: i16,
    pub ready: bool,
    pub record: Option<f64>,
    pub screenshot: Option<String>,
}

/// Whether either user still has a duel that has not been resolved.
pub async fn in_unresolved_duel(pool: &PgPool, a: u64, b: u64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(
             SELECT 1 FROM user_duels ud JOIN duels d ON d.id = ud.duel_id
             WHERE ud.user_id IN ($1, $2) AND NOT d.resolved
         )",
    )
    .bind(sql_id(a))
    .bind(sql_id(b))
    .fetch_one(pool)
    .await
}

/// Whether both users hold at least `wager` XP in the season.
pub async fn both_cover_wager(
    pool: &PgPool,
    season: i32,
    a: u64,
    b: u64,
    wager: i32,
) -> Result<bool, sqlx::Error> {
    let covered: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM user_xp WHERE season = $1 AND user_id IN ($2, $3) AND xp >= $4",
    )
    .bind(season)
    .bind(sql_id(a))
    .bind(sql_id(b))
    .bind(i64::from(wager))
    .fetch_one(pool)
    .await?;
    Ok(covered == 2)
}

/// A random map that has at least one level, with one of its levels.
pub async fn random_map_level(pool: &PgPool) -> Result<Option<(String, String)>, sqlx::Error> {
    sqlx::query_as("SELECT map_code, level FROM map_levels ORDER BY random() LIMIT 1")
        .fetch_optional(pool)
        .await
}

pub async fn insert(pool: &PgPool, duel: &NewDuel<'_>) -> Result<i32, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let id: i32 = sqlx::query_scalar(
        r#"INSERT INTO duels (map_code, level, wager, start, "end") VALUES ($1, $2, $3, $4, $5) RETURNING id"#,
    )
    .bind(duel.map_code)
    .bind(duel.level)
    .bind(duel.wager)
    .bind(duel.start)
    .bind(duel.end)
    .fetch_one(&mut *tx)
    .await?;

    for (i, user_id) in duel.players.iter().enumerate() {
        sqlx::query("INSERT INTO user_duels (user_id, duel_id, num, ready) VALUES ($1, $2, $3, $4)")
            .bind(sql_id(*user_id))
            .bind(id)
            .bind(i as i16 + 1)
            .bind(i == 0)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(id)
}

pub async fn set_thread(pool: &PgPool, duel_id: i32, thread_id: u64, message_id: u64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE duels SET thread_id = $2, thread_msg = $3 WHERE id = $1")
        .bind(duel_id)
        .bind(sql_id(thread_id))
        .bind(sql_id(message_id))
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, duel_id: i32) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM duels WHERE id = $1")
        .bind(duel_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Flip a player's ready state while the duel has not started.
/// Returns the new state, or `None` if the user is not in that pending duel.
pub async fn toggle_ready(pool: &PgPool, duel_id: i32, user_id: u64) -> Result<Option<bool>, sqlx::Error> {
    sqlx::query_scalar(
        "UPDATE user_duels ud SET ready = NOT ud.ready
         FROM duels d
         WHERE d.id = ud.duel_id AND ud.duel_id = $1 AND ud.user_id = $2
           AND NOT d.resolved AND d.start > NOW()
         RETURNING ud.ready",
    )
    .bind(duel_id)
    .bind(sql_id(user_id))
    .fetch_optional(pool)
    .await
}

pub async fn players(pool: &PgPool, duel_id: i32) -> Result<Vec<DuelPlayer>, sqlx::Error> {
    sqlx::query_as(
        "SELECT user_id, num, ready, record, screenshot FROM user_duels WHERE duel_id = $1 ORDER BY num",
    )
    .bind(duel_id)
    .fetch_all(pool)
    .await
}

/// The duel a user can submit to right now, with their current time.
pub async fn running_for(pool: &PgPool, user_id: u64) -> Result<Option<(DuelRow, Option<f64>)>, sqlx::Error> {
    let row: Option<(i32, Option<f64>)> = sqlx::query_as(
        r#"SELECT d.id, ud.record
           FROM duels d JOIN user_duels ud ON ud.duel_id = d.id
           WHERE ud.user_id = $1 AND NOT d.resolved
             AND d.start <= NOW() AND d."end" > NOW()
           LIMIT 1"#,
    )
    .bind(sql_id(user_id))
    .fetch_optional(pool)
    .await?;
    let Some((duel_id, record)) = row else {
        return Ok(None);
    };
    Ok(get(pool, duel_id).await?.map(|duel| (duel, record)))
}

pub async fn get(pool: &PgPool, duel_id: i32) -> Result<Option<DuelRow>, sqlx::Error> {
    sqlx::query_as(
        r#"SELECT id, thread_id, map_code, level, wager, start, "end" FROM duels WHERE id = $1"#,
    )
    .bind(duel_id)
    .fetch_optional(pool)
    .await
}

pub async fn submit(
    pool: &PgPool,
    duel_id: i32,
    user_id: u64,
    record: f64,
    screenshot: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE user_duels SET record = $3, screenshot = $4 WHERE duel_id = $1 AND user_id = $2")
        .bind(duel_id)
        .bind(sql_id(user_id))
        .bind(record)
        .bind(screenshot)
        .execute(pool)
        .await?;
    Ok(())
}

/// Duels that reached their start without both players ready.
pub async fn unready_at_start(pool: &PgPool) -> Result<Vec<DuelRow>, sqlx::Error> {
    sqlx::query_as(
        r#"SELECT d.id, d.thread_id, d.map_code, d.level, d.wager, d.start, d."end"
           FROM duels d
           WHERE NOT d.resolved AND d.start <= NOW()
             AND EXISTS(SELECT 1 FROM user_duels ud WHERE ud.duel_id = d.id AND NOT ud.ready)"#,
    )
    .fetch_all(pool)
    .await
}

pub async fn due_for_result(pool: &PgPool) -> Result<Vec<DuelRow>, sqlx::Error> {
    sqlx::query_as(
        r#"SELECT id, thread_id, map_code, level, wager, start, "end"
           FROM duels WHERE NOT resolved AND "end" <= NOW()"#,
    )
    .fetch_all(pool)
    .await
}

/// Store each player's result, move the wager between them and close the duel.
pub async fn finish(
    pool: &PgPool,
    duel_id: i32,
    results: &[(u64, i16)],
    season: Option<i32>,
    wager: i32,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for (user_id, result) in results {
        sqlx::query("UPDATE user_duels SET result = $3 WHERE duel_id = $1 AND user_id = $2")
            .bind(duel_id)
            .bind(sql_id(*user_id))
            .bind(*result)
            .execute(&mut *tx)
            .await?;

        if let (Some(season), true) = (season, *result != 0) {
            sqlx::query(
                "INSERT INTO user_xp (user_id, season, xp) VALUES ($1, $2, $3)
                 ON CONFLICT (user_id, season) DO UPDATE SET xp = GREATEST(user_xp.xp + EXCLUDED.xp, 0)",
            )
            .bind(sql_id(*user_id))
            .bind(season)
            .bind(i64::from(wager) * i64::from(*result))
            .execute(&mut *tx)
            .await?;
        }
    }
    sqlx::query("UPDATE duels SET resolved = TRUE WHERE id = $1")
        .bind(duel_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

/// Lifetime `(wins, losses)`.
pub async fn win_loss(pool: &PgPool, user_id: u64) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as(
        "SELECT COUNT(*) FILTER (WHERE result > 0), COUNT(*) FILTER (WHERE result < 0)
         FROM user_duels WHERE user_id = $1",
    )
    .bind(sql_id(user_id))
    .fetch_one(pool)
    .await
}

impl DuelPlayer {
    pub fn id(&self) -> u64 {
        discord_id(self.user_id)
    }
}
