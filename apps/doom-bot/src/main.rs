use doom_bot::cache::Cache;
use doom_bot::config::Config;
use doom_bot::error::Error;
use doom_bot::utils::embeds;
use doom_bot::{commands, events, tasks, Data};
use poise::serenity_prelude as serenity;
use poise::{CreateReply, FrameworkError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doom_bot=info".into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };
    if config.channels.error_log.is_none() {
        warn!("No ERROR_LOG_ID configured, unexpected errors are only logged locally");
    }

    let db = match doom_bot::db::init_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            std::process::exit(1);
        }
    };

    let cache = Arc::new(Cache::default());
    if let Err(e) = cache.refresh(&db).await {
        error!(error = %e, "Failed to load caches");
        std::process::exit(1);
    }
    Arc::clone(&cache).spawn_refresh_loop(db.clone());

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::GUILD_MESSAGE_REACTIONS
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let token = config.discord_token.clone();
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            event_handler: |ctx, event, _framework, data| {
                Box::pin(events::handle_event(ctx, event, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!(bot = %ready.user.name, guilds = ready.guilds.len(), "Bot is ready!");

                if let Some(guild_id) = config.guild_id {
                    poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id).await?;
                    info!(guild_id = %guild_id, "Slash commands registered to guild");
                } else {
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                    info!("Slash commands registered globally");
                }

                ctx.set_activity(Some(serenity::ActivityData::playing("Doomfist Parkour")));

                let data = Data {
                    db,
                    config,
                    cache,
                    http: reqwest::Client::new(),
                    start_time: std::time::Instant::now(),
                    venture_cooldowns: Arc::new(Mutex::new(HashMap::new())),
                };
                tasks::spawn_all(ctx.http.clone(), data.clone());
                Ok(data)
            })
        })
        .build();

    let mut client = match serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
    {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to create Discord client");
            std::process::exit(1);
        }
    };

    // Graceful shutdown on SIGINT/SIGTERM
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, stopping bot...");
        shard_manager.shutdown_all().await;
    });

    info!("Starting bot...");
    if let Err(why) = client.start().await {
        error!(error = %why, "Client error");
    }
    info!("Bot has shut down cleanly");
}

async fn on_error(error: FrameworkError<'_, Data, Error>) {
    match error {
        FrameworkError::Command { error, ctx, .. } => report_command_error(ctx, &error).await,
        FrameworkError::CommandCheckFailed {
            error: Some(error),
            ctx,
            ..
        } => report_command_error(ctx, &error).await,
        FrameworkError::CooldownHit {
            remaining_cooldown,
            ctx,
            ..
        } => {
            let embed = embeds::warning_embed()
                .title("Slow down!")
                .description(format!(
                    "Try again in {} seconds.",
                    remaining_cooldown.as_secs().max(1)
                ));
            let _ = ctx
                .send(CreateReply::default().embed(embed).ephemeral(true))
                .await;
        }
        FrameworkError::EventHandler {
            error,
            ctx,
            event,
            framework,
            ..
        } => {
            error!(event = event.snake_case_name(), error = %error, "Event handler error");
            if let Some(channel) = framework.user_data.config.channels.error_log {
                let report = error.log_report(event.snake_case_name(), "Gateway event");
                if let Err(e) = channel.say(ctx, report).await {
                    error!(error = %e, "Failed to report error");
                }
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!(error = %e, "Error handling error");
            }
        }
    }
}

/// User errors get a warning only they can see. Everything else also goes
/// to the error log channel.
async fn report_command_error(ctx: doom_bot::Context<'_>, error: &Error) {
    let command = ctx.command().qualified_name.clone();
    if error.is_user_error() {
        let embed = embeds::warning_embed()
            .title("What happened?")
            .description(error.user_message());
        let _ = ctx
            .send(CreateReply::default().embed(embed).ephemeral(true))
            .await;
        return;
    }

    error!(command = %command, user = %ctx.author().name, error = %error, "Command error");
    let embed = embeds::error_embed()
        .title("Uh oh! Something went wrong.")
        .description(error.user_message());
    let _ = ctx
        .send(CreateReply::default().embed(embed).ephemeral(true))
        .await;

    if let Some(channel) = ctx.data().config.channels.error_log {
        let origin = format!(
            "User: `{}`\nChannel: <#{}>\nInvocation: `{}`",
            ctx.author().name,
            ctx.channel_id(),
            ctx.invocation_string()
        );
        let report = error.log_report(&command, &origin);
        if let Err(e) = channel.say(ctx, report).await {
            error!(error = %e, "Failed to report error");
        }
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
