use super::autocomplete;
use crate::db;
use crate::error::Error;
use crate::utils::permissions::staff_only;
use crate::utils::time::pretty_record;
use crate::utils::{confirm::confirm, embeds, validate};
use crate::Context;
use poise::CreateReply;
use serenity::all::{CreateEmbed, GuildChannel, Mentionable};
use tracing::info;

/// Staff tools.
#[poise::command(
    slash_command,
    rename = "mod",
    subcommands("keep_alive", "remove_record", "change_name"),
    subcommand_required,
    check = "staff_only"
)]
pub async fn moderation(_: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Keep threads from auto-archiving.
#[poise::command(
    slash_command,
    rename = "keep-alive",
    subcommands("keep_alive_add", "keep_alive_remove"),
    subcommand_required,
    check = "staff_only"
)]
pub async fn keep_alive(_: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Unarchive this thread whenever it archives.
#[poise::command(slash_command, rename = "add", check = "staff_only")]
pub async fn keep_alive_add(
    ctx: Context<'_>,
    #[description = "Thread"]
    #[channel_types("PublicThread", "PrivateThread", "NewsThread")]
    thread: GuildChannel,
) -> Result<(), Error> {
    let data = ctx.data();
    let thread_id = thread.id.get();
    let content = if data.cache.keep_alives.read().await.contains(&thread_id) {
        format!("{} already in keep alive list.", thread.mention())
    } else {
        db::keep_alives::insert(&data.db, thread_id).await?;
        data.cache.keep_alives.write().await.insert(thread_id);
        info!(thread = %thread.name, moderator = %ctx.author().name, "Keep alive added");
        format!("Added {} to keep alive list.", thread.mention())
    };
    ctx.send(CreateReply::default().content(content).ephemeral(true))
        .await?;
    Ok(())
}

/// Stop keeping this thread alive.
#[poise::command(slash_command, rename = "remove", check = "staff_only")]
pub async fn keep_alive_remove(
    ctx: Context<'_>,
    #[description = "Thread"]
    #[channel_types("PublicThread", "PrivateThread", "NewsThread")]
    thread: GuildChannel,
) -> Result<(), Error> {
    let data = ctx.data();
    let thread_id = thread.id.get();
    let content = if data.cache.keep_alives.read().await.contains(&thread_id) {
        db::keep_alives::delete(&data.db, thread_id).await?;
        data.cache.keep_alives.write().await.remove(&thread_id);
        info!(thread = %thread.name, moderator = %ctx.author().name, "Keep alive removed");
        format!("Removed {} from keep alive list.", thread.mention())
    } else {
        format!("{} is not currently in the keep alive list.", thread.mention())
    };
    ctx.send(CreateReply::default().content(content).ephemeral(true))
        .await?;
    Ok(())
}

/// Delete a user's record on a level.
#[poise::command(slash_command, rename = "remove-record", check = "staff_only")]
pub async fn remove_record(
    ctx: Context<'_>,
    #[description = "Record holder"]
    #[autocomplete = "autocomplete::users"]
    user: String,
    #[description = "Workshop code"]
    #[autocomplete = "autocomplete::map_codes"]
    map_code: String,
    #[description = "Level name"]
    #[autocomplete = "autocomplete::map_levels"]
    level_name: String,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let data = ctx.data();
    let user_id = validate::known_user(&data.cache, &user).await?;
    let map_code = validate::existing_map_code(&data.cache, &map_code).await?;
    let level_name = validate::map_level(&data.cache, &map_code, &level_name).await?;

    let (record, _) = db::records::latest_submission(&data.db, &map_code, &level_name, user_id)
        .await?
        .ok_or(Error::NoRecordsFound)?;
    let nickname = data.cache.nickname(user_id).await;
    let embed = removal_embed(&nickname, &map_code, &level_name, record);

    let reply = CreateReply::default()
        .content("Do you want to delete this record?")
        .embed(embed)
        .ephemeral(true);
    let (confirmed, _) = confirm(ctx, reply, "Record deleted.").await?;
    if !confirmed {
        return Ok(());
    }
    let removed = db::records::delete_for_level(&data.db, user_id, &map_code, &level_name).await?;
    info!(
        moderator = %ctx.author().name,
        user = %nickname,
        map_code = %map_code,
        level = %level_name,
        removed,
        "Record removed"
    );
    Ok(())
}

fn removal_embed(nickname: &str, map_code: &str, level_name: &str, record: f64) -> CreateEmbed {
    embeds::doom_embed().title("Delete Record").description(format!(
        "`Name` {nickname}\n`Code` {map_code}\n`Level` {level_name}\n`Record` {}",
        pretty_record(record)
    ))
}

/// Change a user's nickname.
#[poise::command(slash_command, rename = "change-name", check = "staff_only")]
pub async fn change_name(
    ctx: Context<'_>,
    #[description = "User"]
    #[autocomplete = "autocomplete::users"]
    user: String,
    #[description = "New nickname"]
    #[min_length = 1]
    #[max_length = 25]
    nickname: String,
) -> Result<(), Error> {
    let data = ctx.data();
    let user_id = validate::known_user(&data.cache, &user).await?;
    let Some(existing) = data.cache.user(user_id).await else {
        return Err(Error::UserNotFound);
    };
    let nickname = db::users::truncate_nickname(nickname.trim());

    ctx.send(
        CreateReply::default()
            .content(format!(
                "Changing {} ({user_id}) nickname to {nickname}",
                existing.nickname
            ))
            .ephemeral(true),
    )
    .await?;
    db::users::set_nickname(&data.db, user_id, &nickname).await?;
    data.cache
        .upsert_user(user_id, nickname.clone(), existing.alertable)
        .await;
    info!(moderator = %ctx.author().name, user = user_id, old = %existing.nickname, new = %nickname, "Nickname changed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removal_embed_lists_the_record() {
        let json = serde_json::to_value(removal_embed("pixel", "ABC12", "Level 1", 75.5)).unwrap();
        assert_eq!(json["title"], "Delete Record");
        let description = json["description"].as_str().unwrap();
        assert!(description.contains("`Name` pixel"));
        assert!(description.contains("`Code` ABC12"));
        assert!(description.contains("`Level` Level 1"));
    }
}
