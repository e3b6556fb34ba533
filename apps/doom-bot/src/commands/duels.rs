use super::autocomplete;
use crate::db;
use crate::db::duels::NewDuel;
use crate::duels::{details, ready_buttons, standby_notice};
use crate::error::Error;
use crate::utils::time::pretty_record;
use crate::utils::{confirm::confirm, validate};
use crate::Context;
use chrono::{Duration, Utc};
use poise::CreateReply;
use rand::seq::SliceRandom;
use serenity::all::{
    Attachment, ChannelId, CreateAttachment, CreateForumPost, CreateMessage, Mentionable, User,
    UserId,
};
use tracing::{info, warn};

/// Time players get to ready up before a duel starts.
const READY_WINDOW_HOURS: i64 = 24;

/// Head-to-head duels.
#[poise::command(slash_command, subcommands("request", "submit"), subcommand_required)]
pub async fn duel(_: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Challenge another player to a duel.
#[poise::command(slash_command)]
pub async fn request(
    ctx: Context<'_>,
    #[description = "Opponent"] user: User,
    #[description = "Length in days"]
    #[min = 1]
    #[max = 7]
    length: i64,
    #[description = "XP each player puts up"]
    #[min = 0]
    wager: i32,
    #[description = "Workshop code, random if empty"]
    #[autocomplete = "autocomplete::map_codes"]
    map_code: Option<String>,
    #[description = "Level, random if empty"]
    #[autocomplete = "autocomplete::map_levels"]
    level: Option<String>,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let data = ctx.data();
    let challenger = ctx.author();
    if user.id == challenger.id || user.bot {
        return Err(Error::UserNotFound);
    }

    if db::duels::in_unresolved_duel(&data.db, challenger.id.get(), user.id.get()).await? {
        return Err(Error::PlayerAlreadyInMatch);
    }
    if wager > 0 {
        let season = data
            .cache
            .current_season
            .read()
            .await
            .ok_or(Error::NotEnoughXp)?;
        if !db::duels::both_cover_wager(&data.db, season, challenger.id.get(), user.id.get(), wager)
            .await?
        {
            return Err(Error::NotEnoughXp);
        }
    }

    let (map_code, level) = pick_map(ctx, map_code, level).await?;
    let start = Utc::now() + Duration::hours(READY_WINDOW_HOURS);
    let end = start + Duration::days(length);

    let forum = data
        .config
        .channels
        .duels_forum
        .ok_or_else(|| Error::Config("DUELS_FORUM_ID is not set".into()))?;

    let duel_id = db::duels::insert(
        &data.db,
        &NewDuel {
            map_code: &map_code,
            level: &level,
            wager,
            start,
            end,
            players: [challenger.id.get(), user.id.get()],
        },
    )
    .await?;

    let post = CreateForumPost::new(
        format!("{} VS. {}", challenger.name, user.name),
        CreateMessage::new().content(details(&map_code, &level, wager, start, end)),
    );
    let thread = match forum.create_forum_post(ctx, post).await {
        Ok(thread) => thread,
        Err(e) => {
            db::duels::delete(&data.db, duel_id).await?;
            return Err(e.into());
        }
    };
    let standby = async {
        let standby = thread
            .id
            .send_message(
                ctx,
                CreateMessage::new()
                    .content(standby_notice(start, user.id))
                    .components(vec![ready_buttons(duel_id, &[(1, true), (2, false)])]),
            )
            .await?;
        db::duels::set_thread(&data.db, duel_id, thread.id.get(), standby.id.get()).await?;
        Ok::<_, Error>(())
    }
    .await;
    if let Err(e) = standby {
        db::duels::delete(&data.db, duel_id).await?;
        if let Err(delete_err) = thread.id.delete(ctx).await {
            warn!(duel = duel_id, error = %delete_err, "Failed to delete duel thread");
        }
        return Err(e);
    }

    ctx.send(
        CreateReply::default()
            .content(format!("Duel requested! {}", thread.mention()))
            .ephemeral(true),
    )
    .await?;
    info!(
        duel = duel_id,
        challenger = %challenger.name,
        opponent = %user.name,
        map_code = %map_code,
        level = %level,
        wager,
        "Duel requested"
    );
    Ok(())
}

/// Use the given map and level, or pick random ones.
async fn pick_map(
    ctx: Context<'_>,
    map_code: Option<String>,
    level: Option<String>,
) -> Result<(String, String), Error> {
    let data = ctx.data();
    match map_code {
        None => db::duels::random_map_level(&data.db)
            .await?
            .ok_or(Error::NoMapsFound),
        Some(raw) => {
            let code = validate::existing_map_code(&data.cache, &raw).await?;
            let level = match level {
                Some(raw) => validate::map_level(&data.cache, &code, &raw).await?,
                None => data
                    .cache
                    .map(&code)
                    .await
                    .and_then(|map| map.levels.choose(&mut rand::thread_rng()).cloned())
                    .ok_or(Error::InvalidMapLevel)?,
            };
            Ok((code, level))
        }
    }
}

/// Submit your time to the duel you are playing.
#[poise::command(slash_command)]
pub async fn submit(
    ctx: Context<'_>,
    #[description = "Screenshot of your time"] screenshot: Attachment,
    #[description = "Your time as HH:MM:SS.ss"] record: String,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let data = ctx.data();
    let user_id = ctx.author().id.get();
    let (duel, previous) = db::duels::running_for(&data.db, user_id)
        .await?
        .ok_or(Error::NoActiveDuel)?;
    let record = validate::record(&record)?;
    if previous.is_some_and(|old| old < record) {
        return Err(Error::RecordNotFaster);
    }

    let image = screenshot.download().await?;
    let summary = format!(
        "**{}'s Duel Submission**\n`Code` {}\n`Level` {}\n`Record` {}",
        ctx.author().mention(),
        duel.map_code,
        duel.level,
        pretty_record(record)
    );
    let reply = CreateReply::default()
        .ephemeral(true)
        .content(format!("Is this correct?\n\n{summary}"))
        .attachment(CreateAttachment::bytes(image.clone(), screenshot.filename.clone()));
    let (confirmed, _) = confirm(ctx, reply, &summary).await?;
    if !confirmed {
        return Ok(());
    }

    // Ephemeral attachment links expire; keep the thread copy instead.
    let mut screenshot_url = screenshot.url.clone();
    if let Some(thread_id) = duel.thread_id {
        let thread = ChannelId::new(db::discord_id(thread_id));
        let posted = thread
            .send_message(
                ctx,
                CreateMessage::new()
                    .content(submission_notice(ctx.author().id, record))
                    .add_file(CreateAttachment::bytes(image, screenshot.filename.clone())),
            )
            .await?;
        if let Some(attachment) = posted.attachments.first() {
            screenshot_url = attachment.url.clone();
        }
    }
    db::duels::submit(&data.db, duel.id, user_id, record, &screenshot_url).await?;
    info!(duel = duel.id, user = %ctx.author().name, record, "Duel time submitted");
    Ok(())
}

/// Posted in the duel thread together with the screenshot.
fn submission_notice(user: UserId, record: f64) -> String {
    format!("{} submitted a new time: {}", user.mention(), pretty_record(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_notice_mentions_the_player() {
        assert_eq!(
            submission_notice(UserId::new(42), 130.25),
            "<@42> submitted a new time: 2:10.25"
        );
    }
}
