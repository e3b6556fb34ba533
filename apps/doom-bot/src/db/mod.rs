pub mod duels;
pub mod gym;
pub mod keep_alives;
pub mod maps;
pub mod records;
pub mod tags;
pub mod top_records;
pub mod tournament;
pub mod users;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Initialize the PostgreSQL connection pool and run migrations.
pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("Database initialized and migrations applied");

    Ok(pool)
}

/// Discord snowflakes fit in 63 bits; Postgres stores them as BIGINT.
pub fn sql_id(id: u64) -> i64 {
    id as i64
}

pub fn discord_id(id: i64) -> u64 {
    id as u64
}
