use super::autocomplete;
use crate::db;
use crate::db::maps::{MapFilters, MapSearchRow, NewMap};
use crate::error::Error;
use crate::utils::format::{create_stars, is_page_boundary};
use crate::utils::{confirm::confirm, embeds, paginator::paginate, validate};
use crate::{ApplicationContext, Context};
use poise::{CreateReply, Modal};
use serenity::all::{
    Attachment, ComponentInteractionCollector, ComponentInteractionDataKind, CreateActionRow,
    CreateAttachment, CreateEmbed, CreateInteractionResponse, CreateMessage, CreateSelectMenu,
    CreateSelectMenuKind, CreateSelectMenuOption, CreateThread,
};
use std::time::Duration;
use tracing::{info, warn};

const PER_PAGE: usize = 10;
const SELECT_TIMEOUT: Duration = Duration::from_secs(300);
/// Discord caps select menus at 25 options.
const MAX_SELECT_OPTIONS: usize = 25;

const OFFICIAL_BADGE: &str = "┃<:_:998055526468423700><:_:998055528355860511><:_:998055530440437840>\
<:_:998055532030079078><:_:998055534068510750><:_:998055536346021898>\n\
┃<:_:998055527412142100><:_:998055529219887154><:_:998055531346415656>\
<:_:998055533225455716><:_:998055534999654480><:_:998055537432338532>\n";

const MAP_MAKER_REMINDER: &str = "**Friendly Reminder**\n\n\
You have access to a few commands to edit the map once it has been submitted.\n\n\
Do you have multiple creators on this map? Add them or remove them with these commands:\n\
`/map-maker creator add`\n`/map-maker creator remove`\n\n\
Do you want to edit a level name in the bot? Use one of these:\n\
`/map-maker level add`\n`/map-maker level remove`\n`/map-maker level edit`\n";

#[derive(Debug, Modal)]
#[name = "Map Submission"]
struct MapSubmitModal {
    #[name = "Description"]
    #[paragraph]
    description: Option<String>,
    #[name = "Level Names"]
    #[paragraph]
    #[placeholder = "Add all level names, each on a new line.\nLevel 1\nLevel 2\nTrial of Agony"]
    levels: String,
}

/// Trimmed, non-empty, de-duplicated level names in input order.
pub fn parse_levels(raw: &str) -> Vec<String> {
    let mut levels: Vec<String> = Vec::new();
    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if !levels.iter().any(|l| l == line) {
            levels.push(line.to_string());
        }
    }
    levels
}

fn submission_embed(map_code: &str, map_name: &str, map_types: &[String], description: Option<&str>) -> CreateEmbed {
    let mut body = format!(
        ">>> ` Code ` {map_code}\n`  Map ` {map_name}\n` Type ` {}\n",
        map_types.join(", ")
    );
    if let Some(desc) = description.filter(|d| !d.trim().is_empty()) {
        body.push_str(&format!("` Desc ` {desc}\n"));
    }
    embeds::doom_embed().description(body)
}

/// Submit your map to the database.
#[poise::command(slash_command, rename = "submit-map")]
pub async fn submit_map(
    ctx: ApplicationContext<'_>,
    #[description = "Overwatch share code"] map_code: String,
    #[description = "Overwatch map"]
    #[autocomplete = "autocomplete::map_names"]
    map_name: String,
    #[description = "Banner image for the announcement"] image: Option<Attachment>,
) -> Result<(), Error> {
    let data = ctx.data;
    let map_code = validate::normalize_map_code(&map_code)?;
    let map_name = validate::map_name(&data.cache, &map_name).await?;

    let Some(modal) = MapSubmitModal::execute(ctx).await? else {
        return Ok(());
    };
    let levels = parse_levels(&modal.levels);
    let ctx = Context::Application(ctx);

    let Some(map_types) = pick_map_types(ctx).await? else {
        return Ok(());
    };

    let preview = submission_embed(&map_code, &map_name, &map_types, modal.description.as_deref());
    let reply = CreateReply::default()
        .content("Is this correct?")
        .embed(
            preview
                .clone()
                .title("Map Submission - Confirmation")
                .field("Level Names", levels.join("\n"), false),
        )
        .ephemeral(true);
    let (confirmed, _) = confirm(ctx, reply, "Map submitted!").await?;
    if !confirmed {
        return Ok(());
    }

    let creator_id = ctx.author().id.get();
    db::maps::insert_map(
        &data.db,
        &NewMap {
            map_code: &map_code,
            map_name: &map_name,
            map_types: &map_types,
            description: modal.description.as_deref(),
            creator_id,
            levels: &levels,
        },
    )
    .await?;
    data.cache.add_map(map_code.clone(), levels, creator_id).await;

    if let Some(channel) = data.config.channels.new_maps {
        let mut announcement = preview.title(format!("New Map by {}", ctx.author().name));
        let mut message = CreateMessage::new();
        if let Some(image) = &image {
            announcement = announcement.image("attachment://image.png");
            message = message.add_file(CreateAttachment::bytes(image.download().await?, "image.png"));
        }
        let post = channel.send_message(ctx, message.embed(announcement)).await?;
        if let Some(attachment) = post.attachments.first() {
            db::maps::set_image(&data.db, &map_code, &attachment.url).await?;
        }
        channel
            .create_thread_from_message(ctx, post.id, CreateThread::new(format!("Discuss {map_code} here.")))
            .await?;
    }

    if let (Some(role), Some(member)) = (data.config.roles.map_maker, ctx.author_member().await) {
        if !member.roles.contains(&role) {
            if let Err(e) = member.add_role(ctx, role).await {
                warn!(user = %ctx.author().name, error = %e, "Failed to grant map maker role");
            }
        }
    }
    if let Err(e) = ctx
        .author()
        .direct_message(ctx, CreateMessage::new().content(MAP_MAKER_REMINDER))
        .await
    {
        info!(user = %ctx.author().name, error = %e, "Could not DM map maker reminder");
    }

    info!(user = %ctx.author().name, map_code = %map_code, "Map submitted");
    Ok(())
}

/// Multi-select of the cached map types. `None` when the user walks away.
async fn pick_map_types(ctx: Context<'_>) -> Result<Option<Vec<String>>, Error> {
    let types = ctx.data().cache.map_types.read().await.clone();
    let options: Vec<CreateSelectMenuOption> = types
        .iter()
        .take(MAX_SELECT_OPTIONS)
        .map(|t| CreateSelectMenuOption::new(t, t))
        .collect();
    let max = options.len().max(1) as u8;
    let select_id = format!("{}-map-types", ctx.id());
    let menu = CreateSelectMenu::new(&select_id, CreateSelectMenuKind::String { options })
        .placeholder("Map type(s)")
        .min_values(1)
        .max_values(max);

    let handle = ctx
        .send(
            CreateReply::default()
                .content("Choose the map type(s).")
                .components(vec![CreateActionRow::SelectMenu(menu)])
                .ephemeral(true),
        )
        .await?;
    let message_id = handle.message().await?.id;

    let picked = ComponentInteractionCollector::new(ctx)
        .author_id(ctx.author().id)
        .message_id(message_id)
        .custom_ids(vec![select_id])
        .timeout(SELECT_TIMEOUT)
        .await;
    let Some(mci) = picked else {
        handle
            .edit(ctx, CreateReply::default().content("Timed out. Nothing was changed.").components(Vec::new()))
            .await?;
        return Ok(None);
    };
    mci.create_response(ctx, CreateInteractionResponse::Acknowledge)
        .await?;
    handle.delete(ctx).await?;

    match &mci.data.kind {
        ComponentInteractionDataKind::StringSelect { values } => Ok(Some(values.clone())),
        _ => Ok(None),
    }
}

/// Search for maps based on various filters.
#[poise::command(slash_command, rename = "map-search")]
pub async fn map_search(
    ctx: Context<'_>,
    #[description = "Type of parkour map"]
    #[autocomplete = "autocomplete::map_types"]
    map_type: Option<String>,
    #[description = "Overwatch map"]
    #[autocomplete = "autocomplete::map_names"]
    map_name: Option<String>,
    #[description = "Creator name"] creator: Option<String>,
    #[description = "Specific map code"] map_code: Option<String>,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let cache = &ctx.data().cache;
    let map_type = match map_type {
        Some(raw) => Some(validate::map_type(cache, &raw).await?),
        None => None,
    };
    let map_name = match map_name {
        Some(raw) => Some(validate::map_name(cache, &raw).await?),
        None => None,
    };
    let map_code = map_code.as_deref().map(validate::normalize_map_code).transpose()?;

    let filters = MapFilters {
        map_type: map_type.as_deref(),
        map_name: map_name.as_deref(),
        creator: creator.as_deref().map(str::trim).filter(|c| !c.is_empty()),
        map_code: map_code.as_deref(),
    };
    if filters.is_empty() {
        return Err(Error::InvalidFilters);
    }
    let maps = db::maps::search(&ctx.data().db, &filters).await?;
    if maps.is_empty() {
        return Err(Error::NoMapsFound);
    }
    paginate(ctx, search_pages(&maps), true).await
}

pub fn search_pages(maps: &[MapSearchRow]) -> Vec<CreateEmbed> {
    let mut pages = Vec::new();
    let mut embed = embeds::doom_embed().title("Map Search");
    for (i, map) in maps.iter().enumerate() {
        let badge = if map.official { OFFICIAL_BADGE } else { "" };
        let value = format!(
            "{badge}┣ `Rating` {}\n┣ `Creator` {}\n┣ `Map` {}\n┣ `Type` {}\n┗ `Description` {}",
            create_stars(map.rating),
            serenity::utils::MessageBuilder::new().push_safe(map.creators.as_str()).build(),
            map.map_name,
            map.map_type,
            map.desc.as_deref().unwrap_or(""),
        );
        embed = embed.field(&map.map_code, value, false);
        if is_page_boundary(i, PER_PAGE, maps.len()) {
            pages.push(embed);
            embed = embeds::doom_embed().title("Map Search");
        }
    }
    pages
}

/// Manage maps you created.
#[poise::command(slash_command, rename = "map-maker", subcommands("level", "creator"))]
pub async fn map_maker(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

#[poise::command(slash_command, subcommands("level_add", "level_remove", "level_edit"))]
pub async fn level(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

#[poise::command(slash_command, subcommands("creator_add", "creator_remove"))]
pub async fn creator(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Validate the code and require the author to be one of its creators.
async fn own_map(ctx: Context<'_>, raw_code: &str) -> Result<(String, Vec<String>, Vec<u64>), Error> {
    let code = validate::existing_map_code(&ctx.data().cache, raw_code).await?;
    let map = ctx.data().cache.map(&code).await.ok_or(Error::InvalidMapCode)?;
    if !map.creator_ids.contains(&ctx.author().id.get()) {
        return Err(Error::NoPermissions);
    }
    Ok((code, map.levels, map.creator_ids))
}

/// Add a level name to your map.
#[poise::command(slash_command, rename = "add")]
pub async fn level_add(
    ctx: Context<'_>,
    #[description = "Overwatch share code"]
    #[autocomplete = "autocomplete::map_codes"]
    map_code: String,
    #[description = "Name of the new level"] new_level_name: String,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let (code, levels, _) = own_map(ctx, &map_code).await?;
    let new_level = new_level_name.trim().to_string();
    if levels.contains(&new_level) {
        return Err(Error::LevelExists);
    }
    let reply = CreateReply::default()
        .content(format!("Is this correct?\nAdding level name: {new_level}\n"))
        .ephemeral(true);
    if !confirm(ctx, reply, "Level added.").await?.0 {
        return Ok(());
    }
    db::maps::add_level(&ctx.data().db, &code, &new_level).await?;
    ctx.data()
        .cache
        .edit_map(&code, |m| m.levels.push(new_level.clone()))
        .await;
    info!(map_code = %code, level = %new_level, "Level added");
    Ok(())
}

/// Delete a level from your map.
#[poise::command(slash_command, rename = "remove")]
pub async fn level_remove(
    ctx: Context<'_>,
    #[description = "Overwatch share code"]
    #[autocomplete = "autocomplete::map_codes"]
    map_code: String,
    #[description = "Name of the level"]
    #[autocomplete = "autocomplete::map_levels"]
    map_level: String,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let (code, _, _) = own_map(ctx, &map_code).await?;
    let level = validate::map_level(&ctx.data().cache, &code, &map_level).await?;
    let reply = CreateReply::default()
        .content(format!("Is this correct?\nDeleting level name: {level}\n"))
        .ephemeral(true);
    if !confirm(ctx, reply, "Level deleted.").await?.0 {
        return Ok(());
    }
    db::maps::delete_level(&ctx.data().db, &code, &level).await?;
    ctx.data()
        .cache
        .edit_map(&code, |m| m.levels.retain(|l| *l != level))
        .await;
    info!(map_code = %code, level = %level, "Level deleted");
    Ok(())
}

/// Rename a level in your map.
#[poise::command(slash_command, rename = "edit")]
pub async fn level_edit(
    ctx: Context<'_>,
    #[description = "Overwatch share code"]
    #[autocomplete = "autocomplete::map_codes"]
    map_code: String,
    #[description = "Name of the level"]
    #[autocomplete = "autocomplete::map_levels"]
    map_level: String,
    #[description = "New name of the level"] new_level_name: String,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let (code, levels, _) = own_map(ctx, &map_code).await?;
    let level = validate::map_level(&ctx.data().cache, &code, &map_level).await?;
    let new_level = new_level_name.trim().to_string();
    if levels.contains(&new_level) {
        return Err(Error::LevelExists);
    }
    let reply = CreateReply::default()
        .content(format!(
            "Is this correct?\nOriginal level name: {level}\nUpdated level name: {new_level}\n"
        ))
        .ephemeral(true);
    if !confirm(ctx, reply, "Level renamed.").await?.0 {
        return Ok(());
    }
    db::maps::rename_level(&ctx.data().db, &code, &level, &new_level).await?;
    ctx.data()
        .cache
        .edit_map(&code, |m| {
            for l in m.levels.iter_mut().filter(|l| **l == level) {
                *l = new_level.clone();
            }
        })
        .await;
    info!(map_code = %code, from = %level, to = %new_level, "Level renamed");
    Ok(())
}

/// Add a creator to your map.
#[poise::command(slash_command, rename = "add")]
pub async fn creator_add(
    ctx: Context<'_>,
    #[description = "Overwatch share code"]
    #[autocomplete = "autocomplete::map_codes"]
    map_code: String,
    #[description = "Creator to add"]
    #[autocomplete = "autocomplete::users"]
    user: String,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let (code, _, creators) = own_map(ctx, &map_code).await?;
    let user_id = validate::known_user(&ctx.data().cache, &user).await?;
    if creators.contains(&user_id) {
        return Err(Error::CreatorAlreadyExists);
    }
    let nickname = ctx.data().cache.nickname(user_id).await;
    let reply = CreateReply::default()
        .content(format!("Is this correct?\nAdding **{nickname}** to creators of {code}.\n"))
        .ephemeral(true);
    if !confirm(ctx, reply, "Creator added.").await?.0 {
        return Ok(());
    }
    db::maps::add_creator(&ctx.data().db, &code, user_id).await?;
    ctx.data()
        .cache
        .edit_map(&code, |m| m.creator_ids.push(user_id))
        .await;
    info!(map_code = %code, creator = user_id, "Creator added");
    Ok(())
}

/// Remove a creator from your map.
#[poise::command(slash_command, rename = "remove")]
pub async fn creator_remove(
    ctx: Context<'_>,
    #[description = "Overwatch share code"]
    #[autocomplete = "autocomplete::map_codes"]
    map_code: String,
    #[description = "Creator to remove"]
    #[autocomplete = "autocomplete::users"]
    user: String,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let (code, _, creators) = own_map(ctx, &map_code).await?;
    let user_id = validate::known_user(&ctx.data().cache, &user).await?;
    if !creators.contains(&user_id) {
        return Err(Error::CreatorDoesntExist);
    }
    let nickname = ctx.data().cache.nickname(user_id).await;
    let reply = CreateReply::default()
        .content(format!("Is this correct?\nRemoving **{nickname}** from creators of {code}.\n"))
        .ephemeral(true);
    if !confirm(ctx, reply, "Creator removed.").await?.0 {
        return Ok(());
    }
    db::maps::remove_creator(&ctx.data().db, &code, user_id).await?;
    ctx.data()
        .cache
        .edit_map(&code, |m| m.creator_ids.retain(|id| *id != user_id))
        .await;
    info!(map_code = %code, creator = user_id, "Creator removed");
    Ok(())
}

/// View guides for a map.
#[poise::command(slash_command)]
pub async fn guide(
    ctx: Context<'_>,
    #[description = "Overwatch share code"]
    #[autocomplete = "autocomplete::map_codes"]
    map_code: String,
) -> Result<(), Error> {
    ctx.defer().await?;
    let code = validate::existing_map_code(&ctx.data().cache, &map_code).await?;
    let guides = db::maps::guides(&ctx.data().db, &code).await?;
    if guides.is_empty() {
        return Err(Error::NoGuidesExist);
    }
    let list: String = guides
        .iter()
        .enumerate()
        .map(|(i, url)| format!("{}. {url}\n", i + 1))
        .collect();
    ctx.say(format!("**Guides for {code}**\n{list}")).await?;
    Ok(())
}

/// Add a guide to a map.
#[poise::command(slash_command, rename = "add-guide")]
pub async fn add_guide(
    ctx: Context<'_>,
    #[description = "Overwatch share code"]
    #[autocomplete = "autocomplete::map_codes"]
    map_code: String,
    #[description = "Link to the guide"] url: String,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let data = ctx.data();
    let code = validate::existing_map_code(&data.cache, &map_code).await?;
    let url = validate::reachable_url(&data.http, &url).await?;
    if db::maps::guides(&data.db, &code).await?.contains(&url) {
        return Err(Error::GuideExists);
    }
    let reply = CreateReply::default()
        .content(format!("Is this correct?\nMap code: {code}\nURL: {url}"))
        .ephemeral(true);
    if !confirm(ctx, reply, "Guide added.").await?.0 {
        return Ok(());
    }
    db::maps::insert_guide(&data.db, &code, &url).await?;
    info!(map_code = %code, url = %url, "Guide added");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_trimmed_and_deduplicated() {
        let raw = "Level 1\n  Level 2 \n\nLevel 1\nTrial of Agony\n";
        assert_eq!(parse_levels(raw), vec!["Level 1", "Level 2", "Trial of Agony"]);
        assert!(parse_levels("\n \n").is_empty());
    }

    #[test]
    fn search_pages_show_the_official_badge() {
        let row = MapSearchRow {
            map_code: "ABCDE".into(),
            map_name: "Hanamura".into(),
            map_type: "Single, Pioneer".into(),
            desc: None,
            official: true,
            creators: "nebula".into(),
            rating: Some(4.2),
        };
        let pages = search_pages(&[row]);
        assert_eq!(pages.len(), 1);
        let json = serde_json::to_value(&pages[0]).unwrap();
        let value = json["fields"][0]["value"].as_str().unwrap();
        assert!(value.starts_with("┃<:_:998055526468423700>"));
        assert!(value.contains("★★★★★☆"));
    }
}
