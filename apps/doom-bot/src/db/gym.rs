use super::{discord_id, sql_id};
use crate::gym::ExerciseCategory;
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExerciseRow {
    pub name: String,
    pub location: String,
    pub target: String,
    pub equipment: String,
    pub url: String,
}

pub async fn fetch_exercise_categories(
    pool: &PgPool,
) -> Result<BTreeMap<String, ExerciseCategory>, sqlx::Error> {
    let rows: Vec<(String, String)> = sqlx::query_as("SELECT name, type FROM all_exercises")
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(name, kind)| match ExerciseCategory::from_str(&kind) {
            Ok(category) => Some((name, category)),
            Err(()) => {
                warn!(exercise = %name, kind = %kind, "Skipping exercise with unknown category");
                None
            }
        })
        .collect())
}

pub async fn insert_exercise(
    pool: &PgPool,
    name: &str,
    category: ExerciseCategory,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("INSERT INTO all_exercises (name, type) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(name)
        .bind(category.as_str())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn upsert_pr(pool: &PgPool, user_id: u64, exercise: &str, value: f64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO gym_records (user_id, exercise, value) VALUES ($1, $2, $3)
         ON CONFLICT (user_id, exercise) DO UPDATE SET value = EXCLUDED.value",
    )
    .bind(sql_id(user_id))
    .bind(exercise)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

/// PRs for one exercise, highest value first.
pub async fn leaderboard(pool: &PgPool, exercise: &str) -> Result<Vec<(u64, f64)>, sqlx::Error> {
    let rows: Vec<(i64, f64)> = sqlx::query_as(
        "SELECT user_id, value FROM gym_records WHERE exercise = $1 ORDER BY value DESC",
    )
    .bind(exercise)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id, v)| (discord_id(id), v)).collect())
}

pub async fn search_exercises(
    pool: &PgPool,
    location: Option<&str>,
    equipment: Option<&str>,
    name: Option<&str>,
) -> Result<Vec<ExerciseRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT name, location, target, equipment, url FROM exercises
         WHERE ($1::text IS NULL OR location = $1)
           AND ($2::text IS NULL OR equipment = $2)
           AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%')
         ORDER BY name",
    )
    .bind(location)
    .bind(equipment)
    .bind(name)
    .fetch_all(pool)
    .await
}

pub async fn catalogue_names(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT name FROM exercises ORDER BY name")
        .fetch_all(pool)
        .await
}
