pub mod cache;
pub mod commands;
pub mod config;
pub mod db;
pub mod duels;
pub mod error;
pub mod events;
pub mod gym;
pub mod tasks;
pub mod tournament;
pub mod utils;
pub mod verification;

use serenity::all::ChannelId;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Shared data accessible across all Poise commands, event handlers and
/// background tasks.
#[derive(Clone)]
pub struct Data {
    pub db: PgPool,
    pub config: config::Config,
    pub cache: Arc<cache::Cache>,
    pub http: reqwest::Client,
    pub start_time: Instant,
    /// Last time a venture redirect was posted, per channel.
    pub venture_cooldowns: Arc<Mutex<HashMap<ChannelId, Instant>>>,
}

/// Poise context alias used throughout the bot.
pub type Context<'a> = poise::Context<'a, Data, error::Error>;

/// Context for commands that open modals.
pub type ApplicationContext<'a> = poise::ApplicationContext<'a, Data, error::Error>;
