use super::{discord_id, sql_id};
use crate::cache::MapCacheData;
use sqlx::PgPool;
use std::collections::BTreeMap;

pub struct NewMap<'a> {
    pub map_code: &'a str,
    pub map_name: &'a str,
    pub map_types: &'a [String],
    pub description: Option<&'a str>,
    pub creator_id: u64,
    pub levels: &'a [String],
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MapSearchRow {
    pub map_code: String,
    pub map_name: String,
    pub map_type: String,
    pub desc: Option<String>,
    pub official: bool,
    pub creators: String,
    pub rating: Option<f64>,
}

#[derive(Debug, Default)]
pub struct MapFilters<'a> {
    pub map_type: Option<&'a str>,
    pub map_name: Option<&'a str>,
    pub creator: Option<&'a str>,
    pub map_code: Option<&'a str>,
}

impl MapFilters<'_> {
    pub fn is_empty(&self) -> bool {
        self.map_type.is_none()
            && self.map_name.is_none()
            && self.creator.is_none()
            && self.map_code.is_none()
    }
}

pub async fn fetch_map_cache(pool: &PgPool) -> Result<BTreeMap<String, MapCacheData>, sqlx::Error> {
    let rows: Vec<(String, Vec<String>, Vec<i64>)> = sqlx::query_as(
        "SELECT m.map_code,
                COALESCE((SELECT array_agg(l.level ORDER BY l.level)
                          FROM map_levels l WHERE l.map_code = m.map_code), '{}') AS levels,
                COALESCE((SELECT array_agg(c.user_id)
                          FROM map_creators c WHERE c.map_code = m.map_code), '{}') AS creators
         FROM maps m",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(code, levels, creators)| {
            let creator_ids = creators.into_iter().map(discord_id).collect();
            (code, MapCacheData { levels, creator_ids })
        })
        .collect())
}

pub async fn fetch_map_names(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT name FROM all_map_names ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn fetch_map_types(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT name FROM all_map_types ORDER BY name")
        .fetch_all(pool)
        .await
}

/// Insert the map, its first creator and its levels atomically.
pub async fn insert_map(pool: &PgPool, map: &NewMap<'_>) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"INSERT INTO maps (map_code, map_name, map_type, "desc") VALUES ($1, $2, $3, $4)"#,
    )
    .bind(map.map_code)
    .bind(map.map_name)
    .bind(map.map_types)
    .bind(map.description)
    .execute(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO map_creators (map_code, user_id) VALUES ($1, $2)")
        .bind(map.map_code)
        .bind(sql_id(map.creator_id))
        .execute(&mut *tx)
        .await?;

    for level in map.levels {
        sqlx::query("INSERT INTO map_levels (map_code, level) VALUES ($1, $2)")
            .bind(map.map_code)
            .bind(level)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await
}

pub async fn set_image(pool: &PgPool, map_code: &str, url: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE maps SET image = $2 WHERE map_code = $1")
        .bind(map_code)
        .bind(url)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn search(pool: &PgPool, filters: &MapFilters<'_>) -> Result<Vec<MapSearchRow>, sqlx::Error> {
    sqlx::query_as(
        r#"SELECT m.map_code,
                  m.map_name,
                  array_to_string(m.map_type, ', ') AS map_type,
                  m."desc",
                  m.official,
                  COALESCE(c.creators, '') AS creators,
                  r.rating
           FROM maps m
           LEFT JOIN LATERAL (
               SELECT string_agg(DISTINCT u.nickname, ', ') AS creators
               FROM map_creators mc JOIN users u ON u.user_id = mc.user_id
               WHERE mc.map_code = m.map_code
           ) c ON TRUE
           LEFT JOIN LATERAL (
               SELECT AVG(rating)::float8 AS rating
               FROM map_level_ratings mlr WHERE mlr.map_code = m.map_code
           ) r ON TRUE
           WHERE ($1::text IS NULL OR $1 = ANY(m.map_type))
             AND ($2::text IS NULL OR m.map_name = $2)
             AND ($3::text IS NULL OR c.creators ILIKE '%' || $3 || '%')
             AND ($4::text IS NULL OR m.map_code = $4)
           ORDER BY m.map_code"#,
    )
    .bind(filters.map_type)
    .bind(filters.map_name)
    .bind(filters.creator)
    .bind(filters.map_code)
    .fetch_all(pool)
    .await
}

pub async fn map_name(pool: &PgPool, map_code: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT map_name FROM maps WHERE map_code = $1")
        .bind(map_code)
        .fetch_optional(pool)
        .await
}

pub async fn add_level(pool: &PgPool, map_code: &str, level: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO map_levels (map_code, level) VALUES ($1, $2)")
        .bind(map_code)
        .bind(level)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_level(pool: &PgPool, map_code: &str, level: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM map_levels WHERE map_code = $1 AND level = $2")
        .bind(map_code)
        .bind(level)
        .execute(pool)
        .await?;
    Ok(())
}

/// Renames cascade to records and ratings through the foreign keys.
pub async fn rename_level(pool: &PgPool, map_code: &str, old: &str, new: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE map_levels SET level = $3 WHERE map_code = $1 AND level = $2")
        .bind(map_code)
        .bind(old)
        .bind(new)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn add_creator(pool: &PgPool, map_code: &str, user_id: u64) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO map_creators (map_code, user_id) VALUES ($1, $2)")
        .bind(map_code)
        .bind(sql_id(user_id))
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn remove_creator(pool: &PgPool, map_code: &str, user_id: u64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM map_creators WHERE map_code = $1 AND user_id = $2")
        .bind(map_code)
        .bind(sql_id(user_id))
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn guides(pool: &PgPool, map_code: &str) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT url FROM guides WHERE map_code = $1 ORDER BY url")
        .bind(map_code)
        .fetch_all(pool)
        .await
}

pub async fn insert_guide(pool: &PgPool, map_code: &str, url: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO guides (map_code, url) VALUES ($1, $2)")
        .bind(map_code)
        .bind(url)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn upsert_rating(
    pool: &PgPool,
    map_code: &str,
    level: &str,
    user_id: u64,
    rating: i16,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO map_level_ratings (map_code, level, user_id, rating) VALUES ($1, $2, $3, $4)
         ON CONFLICT (map_code, level, user_id) DO UPDATE SET rating = EXCLUDED.rating",
    )
    .bind(map_code)
    .bind(level)
    .bind(sql_id(user_id))
    .bind(rating)
    .execute(pool)
    .await?;
    Ok(())
}
