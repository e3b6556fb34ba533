use sqlx::PgPool;

pub async fn fetch_names(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT name FROM tags ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn get(pool: &PgPool, name: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT value FROM tags WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await
}

/// Returns false when a tag with that name already exists.
pub async fn insert(pool: &PgPool, name: &str, value: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("INSERT INTO tags (name, value) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(name)
        .bind(value)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
