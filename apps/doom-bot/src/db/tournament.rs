use super::{discord_id, sql_id};
use crate::tournament::xp::{Mission, Run, XpTable};
use crate::tournament::{
    Category, CategoryMap, MissionCategory, MissionDifficulty, MissionType, Rank, TournamentData,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::warn;

// ─── Seasons ─────────────────────────────────────────────────────────

pub async fn current_season(pool: &PgPool) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar("SELECT number FROM tournament_seasons WHERE active")
        .fetch_optional(pool)
        .await
}

pub async fn seasons(pool: &PgPool) -> Result<Vec<(i32, String, bool)>, sqlx::Error> {
    sqlx::query_as("SELECT number, name, active FROM tournament_seasons ORDER BY number")
        .fetch_all(pool)
        .await
}

pub async fn add_season(pool: &PgPool, name: &str) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar("INSERT INTO tournament_seasons (name) VALUES ($1) RETURNING number")
        .bind(name)
        .fetch_one(pool)
        .await
}

/// Make `number` the only active season. Returns its name, or `None` if no
/// such season exists (nothing is changed then).
pub async fn activate_season(pool: &PgPool, number: i32) -> Result<Option<String>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let name: Option<String> =
        sqlx::query_scalar("SELECT name FROM tournament_seasons WHERE number = $1")
            .bind(number)
            .fetch_optional(&mut *tx)
            .await?;
    if name.is_none() {
        return Ok(None);
    }
    sqlx::query("UPDATE tournament_seasons SET active = FALSE WHERE active")
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE tournament_seasons SET active = TRUE WHERE number = $1")
        .bind(number)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(name)
}

// ─── Rounds ──────────────────────────────────────────────────────────

/// Whether a round is scheduled or still running.
pub async fn upcoming_or_running(pool: &PgPool) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM tournament WHERE NOT ended AND (start > NOW() OR "end" > NOW()))"#)
        .fetch_one(pool)
        .await
}

pub async fn insert(
    pool: &PgPool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    bracket: bool,
    maps: &BTreeMap<Category, CategoryMap>,
) -> Result<i32, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let id: i32 = sqlx::query_scalar(
        r#"INSERT INTO tournament (start, "end", active, bracket) VALUES ($1, $2, FALSE, $3) RETURNING id"#,
    )
    .bind(start)
    .bind(end)
    .bind(bracket)
    .fetch_one(&mut *tx)
    .await?;

    for (category, map) in maps {
        sqlx::query(
            "INSERT INTO tournament_maps (id, category, code, level, creator) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(category.as_str())
        .bind(&map.code)
        .bind(&map.level)
        .bind(&map.creator)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(id)
}

/// Latest round that has not been wrapped up yet, with its maps.
pub async fn unfinished(pool: &PgPool) -> Result<Option<(TournamentData, bool)>, sqlx::Error> {
    let row: Option<(i32, DateTime<Utc>, DateTime<Utc>, bool, bool)> = sqlx::query_as(
        r#"SELECT id, start, "end", bracket, active FROM tournament
           WHERE NOT ended ORDER BY id DESC LIMIT 1"#,
    )
    .fetch_optional(pool)
    .await?;
    let Some((id, start, end, bracket, active)) = row else {
        return Ok(None);
    };

    let maps = maps(pool, id).await?;
    Ok(Some((
        TournamentData {
            id,
            start,
            end,
            bracket,
            maps,
        },
        active,
    )))
}

pub async fn maps(pool: &PgPool, id: i32) -> Result<BTreeMap<Category, CategoryMap>, sqlx::Error> {
    let rows: Vec<(String, String, String, String)> =
        sqlx::query_as("SELECT category, code, level, creator FROM tournament_maps WHERE id = $1")
            .bind(id)
            .fetch_all(pool)
            .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(category, code, level, creator)| {
            let category = parse_or_warn::<Category>(&category)?;
            Some((category, CategoryMap { code, level, creator }))
        })
        .collect())
}

pub async fn set_active(pool: &PgPool, id: i32, active: bool) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE tournament SET active = $2 WHERE id = $1")
        .bind(id)
        .bind(active)
        .execute(pool)
        .await?;
    Ok(())
}

/// Most recently created round, finished or not.
pub async fn latest_id(pool: &PgPool) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar("SELECT MAX(id) FROM tournament")
        .fetch_one(pool)
        .await
}

/// Id and end of the round accepting submissions right now.
pub async fn running(pool: &PgPool) -> Result<Option<(i32, DateTime<Utc>)>, sqlx::Error> {
    sqlx::query_as(
        r#"SELECT id, "end" FROM tournament
           WHERE active AND NOT ended AND start <= NOW() AND "end" > NOW()
           ORDER BY id DESC LIMIT 1"#,
    )
    .fetch_optional(pool)
    .await
}

// ─── Records ─────────────────────────────────────────────────────────

pub async fn insert_record(
    pool: &PgPool,
    tournament_id: i32,
    user_id: u64,
    category: Category,
    record: f64,
    screenshot: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO tournament_records (user_id, tournament_id, category, record, screenshot)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(sql_id(user_id))
    .bind(tournament_id)
    .bind(category.as_str())
    .bind(record)
    .bind(screenshot)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn latest_record(
    pool: &PgPool,
    tournament_id: i32,
    user_id: u64,
    category: Category,
) -> Result<Option<f64>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT record FROM tournament_records
         WHERE user_id = $1 AND category = $2 AND tournament_id = $3
         ORDER BY inserted_at DESC LIMIT 1",
    )
    .bind(sql_id(user_id))
    .bind(category.as_str())
    .bind(tournament_id)
    .fetch_optional(pool)
    .await
}

/// Delete the user's most recent submission in a category. Returns whether one existed.
pub async fn delete_latest_record(
    pool: &PgPool,
    tournament_id: i32,
    user_id: u64,
    category: Category,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM tournament_records WHERE id = (
             SELECT id FROM tournament_records
             WHERE user_id = $1 AND category = $2 AND tournament_id = $3
             ORDER BY inserted_at DESC LIMIT 1
         )",
    )
    .bind(sql_id(user_id))
    .bind(category.as_str())
    .bind(tournament_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Each player's latest run per category, with their tier in that category.
#[derive(Debug, Clone)]
pub struct RoundRecord {
    pub user_id: u64,
    pub nickname: String,
    pub category: Category,
    pub rank: Rank,
    pub record: f64,
    pub screenshot: String,
}

impl RoundRecord {
    pub fn to_run(&self) -> Run {
        Run {
            user_id: self.user_id,
            nickname: self.nickname.clone(),
            category: self.category,
            rank: self.rank,
            record: self.record,
        }
    }
}

/// Latest record per (user, category) of a round, fastest first.
pub async fn latest_records(pool: &PgPool, tournament_id: i32) -> Result<Vec<RoundRecord>, sqlx::Error> {
    let rows: Vec<(i64, String, String, String, f64, String)> = sqlx::query_as(
        r#"WITH latest AS (
               SELECT DISTINCT ON (user_id, category) user_id, category, record, screenshot
               FROM tournament_records
               WHERE tournament_id = $1
               ORDER BY user_id, category, inserted_at DESC
           )
           SELECT l.user_id,
                  COALESCE(u.nickname, 'Unknown'),
                  l.category,
                  COALESCE(ur.value, 'Unranked'),
                  l.record,
                  l.screenshot
           FROM latest l
           LEFT JOIN users u ON u.user_id = l.user_id
           LEFT JOIN user_ranks ur ON ur.user_id = l.user_id AND ur.category = l.category
           ORDER BY l.record"#,
    )
    .bind(tournament_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(user_id, nickname, category, rank, record, screenshot)| {
            Some(RoundRecord {
                user_id: discord_id(user_id),
                nickname,
                category: parse_or_warn(&category)?,
                rank: parse_or_warn(&rank)?,
                record,
                screenshot,
            })
        })
        .collect())
}

// ─── Missions ────────────────────────────────────────────────────────

pub async fn missions(pool: &PgPool, tournament_id: i32) -> Result<Vec<Mission>, sqlx::Error> {
    let rows: Vec<(String, String, String, f64, Option<String>)> = sqlx::query_as(
        "SELECT category, difficulty, type, target, extra_target
         FROM tournament_missions WHERE id = $1",
    )
    .bind(tournament_id)
    .fetch_all(pool)
    .await?;

    let mut missions: Vec<Mission> = rows
        .into_iter()
        .filter_map(|(category, difficulty, kind, target, extra)| {
            Some(Mission {
                category: parse_or_warn(&category)?,
                difficulty: parse_or_warn(&difficulty)?,
                mission_type: parse_or_warn(&kind)?,
                target,
                extra_target: extra.as_deref().and_then(|e| MissionDifficulty::from_str(e).ok()),
            })
        })
        .collect();
    missions.sort_by_key(|m| (m.category, m.difficulty));
    Ok(missions)
}

pub async fn mission(
    pool: &PgPool,
    tournament_id: i32,
    category: MissionCategory,
    difficulty: MissionDifficulty,
) -> Result<Option<(MissionType, f64)>, sqlx::Error> {
    let row: Option<(String, f64)> = sqlx::query_as(
        "SELECT type, target FROM tournament_missions WHERE id = $1 AND category = $2 AND difficulty = $3",
    )
    .bind(tournament_id)
    .bind(category.as_str())
    .bind(difficulty.as_str())
    .fetch_optional(pool)
    .await?;
    Ok(row.and_then(|(kind, target)| Some((parse_or_warn(&kind)?, target))))
}

pub async fn upsert_mission(pool: &PgPool, tournament_id: i32, mission: &Mission) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO tournament_missions (id, category, difficulty, type, target, extra_target)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (id, category, difficulty)
         DO UPDATE SET type = EXCLUDED.type, target = EXCLUDED.target, extra_target = EXCLUDED.extra_target",
    )
    .bind(tournament_id)
    .bind(mission.category.as_str())
    .bind(mission.difficulty.as_str())
    .bind(mission.mission_type.as_str())
    .bind(mission.target)
    .bind(mission.extra_target.map(|d| d.as_str()))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_mission(
    pool: &PgPool,
    tournament_id: i32,
    category: MissionCategory,
    difficulty: MissionDifficulty,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM tournament_missions WHERE id = $1 AND category = $2 AND difficulty = $3")
        .bind(tournament_id)
        .bind(category.as_str())
        .bind(difficulty.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

// ─── Ranks & XP ──────────────────────────────────────────────────────

pub async fn set_rank(pool: &PgPool, user_id: u64, category: Category, rank: Rank) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO user_ranks (user_id, category, value) VALUES ($1, $2, $3)
         ON CONFLICT (user_id, category) DO UPDATE SET value = EXCLUDED.value",
    )
    .bind(sql_id(user_id))
    .bind(category.as_str())
    .bind(rank.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

/// A user's tier in every category, `Unranked` where unset.
pub async fn ranks(pool: &PgPool, user_id: u64) -> Result<BTreeMap<Category, Rank>, sqlx::Error> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT category, value FROM user_ranks WHERE user_id = $1")
            .bind(sql_id(user_id))
            .fetch_all(pool)
            .await?;
    let mut ranks: BTreeMap<Category, Rank> =
        Category::ALL.into_iter().map(|c| (c, Rank::Unranked)).collect();
    for (category, rank) in rows {
        if let (Some(category), Some(rank)) = (parse_or_warn(&category), parse_or_warn(&rank)) {
            ranks.insert(category, rank);
        }
    }
    Ok(ranks)
}

/// Add (or remove, when negative) XP in a season. Returns the new total.
pub async fn add_xp(pool: &PgPool, user_id: u64, season: i32, amount: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO user_xp (user_id, season, xp) VALUES ($1, $2, $3)
         ON CONFLICT (user_id, season) DO UPDATE SET xp = user_xp.xp + EXCLUDED.xp
         RETURNING xp",
    )
    .bind(sql_id(user_id))
    .bind(season)
    .bind(amount)
    .fetch_one(pool)
    .await
}

/// Credit a round's XP to the season and mark the round ended, atomically.
pub async fn finish_round(
    pool: &PgPool,
    tournament_id: i32,
    season: Option<i32>,
    xp: &XpTable,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    if let Some(season) = season {
        for (user_id, earned) in xp {
            sqlx::query(
                "INSERT INTO user_xp (user_id, season, xp) VALUES ($1, $2, $3)
                 ON CONFLICT (user_id, season) DO UPDATE SET xp = user_xp.xp + EXCLUDED.xp",
            )
            .bind(sql_id(*user_id))
            .bind(season)
            .bind(earned.total)
            .execute(&mut *tx)
            .await?;
        }
    }
    sqlx::query("UPDATE tournament SET active = FALSE, ended = TRUE WHERE id = $1")
        .bind(tournament_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

pub async fn xp(pool: &PgPool, user_id: u64, season: i32) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT xp FROM user_xp WHERE user_id = $1 AND season = $2")
        .bind(sql_id(user_id))
        .bind(season)
        .fetch_optional(pool)
        .await
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct XpStanding {
    pub user_id: i64,
    pub nickname: String,
    pub xp: i64,
    pub position: i64,
}

pub async fn xp_leaderboard(pool: &PgPool, season: i32) -> Result<Vec<XpStanding>, sqlx::Error> {
    sqlx::query_as(
        "SELECT x.user_id,
                COALESCE(u.nickname, 'Unknown') AS nickname,
                x.xp,
                RANK() OVER (ORDER BY x.xp DESC) AS position
         FROM user_xp x
         LEFT JOIN users u ON u.user_id = x.user_id
         WHERE x.season = $1 AND x.xp > 0
         ORDER BY x.xp DESC",
    )
    .bind(season)
    .fetch_all(pool)
    .await
}

pub async fn xp_standing(pool: &PgPool, user_id: u64, season: i32) -> Result<Option<XpStanding>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM (
             SELECT x.user_id,
                    COALESCE(u.nickname, 'Unknown') AS nickname,
                    x.xp,
                    RANK() OVER (ORDER BY x.xp DESC) AS position
             FROM user_xp x
             LEFT JOIN users u ON u.user_id = x.user_id
             WHERE x.season = $2
         ) standings WHERE user_id = $1",
    )
    .bind(sql_id(user_id))
    .bind(season)
    .fetch_optional(pool)
    .await
}

// ─── Map contest ─────────────────────────────────────────────────────

/// Store or replace a user's contest entry for the round.
pub async fn upsert_contest_entry(
    pool: &PgPool,
    tournament_id: i32,
    user_id: u64,
    map_code: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO map_contest (user_id, tournament_id, map_code) VALUES ($1, $2, $3)
         ON CONFLICT (user_id, tournament_id) DO UPDATE SET map_code = EXCLUDED.map_code",
    )
    .bind(sql_id(user_id))
    .bind(tournament_id)
    .bind(map_code)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn contest_entry(pool: &PgPool, tournament_id: i32, user_id: u64) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT map_code FROM map_contest WHERE user_id = $1 AND tournament_id = $2")
        .bind(sql_id(user_id))
        .bind(tournament_id)
        .fetch_optional(pool)
        .await
}

pub async fn contest_entries(pool: &PgPool, tournament_id: i32) -> Result<Vec<(String, u64)>, sqlx::Error> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT map_code, user_id FROM map_contest WHERE tournament_id = $1 ORDER BY map_code")
            .bind(tournament_id)
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|(code, id)| (code, discord_id(id))).collect())
}

pub async fn delete_contest_entry(pool: &PgPool, tournament_id: i32, map_code: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM map_contest WHERE tournament_id = $1 AND map_code = $2")
        .bind(tournament_id)
        .bind(map_code)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

fn parse_or_warn<T: FromStr>(value: &str) -> Option<T> {
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(value, "Skipping row with an unknown tournament value");
            None
        }
    }
}
