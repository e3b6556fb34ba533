use super::autocomplete;
use crate::db;
use crate::db::tournament::RoundRecord;
use crate::error::Error;
use crate::tournament::xp::Mission;
use crate::tournament::{
    announcement_embed, format_mission, leaderboard_embed, missions_embed, Category, CategoryMap,
    MissionCategory, MissionDifficulty, MissionType, Rank, TournamentData,
};
use crate::utils::format::{is_page_boundary, make_ordinal};
use crate::utils::permissions::{is_organizer, organizer_only};
use crate::utils::time::{parse_when, pretty_record, time_convert};
use crate::utils::{confirm::confirm, paginator::paginate, validate};
use crate::Context;
use chrono::Utc;
use poise::CreateReply;
use serenity::all::{
    Attachment, ButtonStyle, ComponentInteractionCollector, CreateActionRow, CreateAttachment,
    CreateButton, CreateEmbed, CreateInteractionResponse, CreateMessage, CreateScheduledEvent,
    Mentionable, ScheduledEventType, Timestamp, User,
};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

const PER_PAGE: usize = 10;
const WIZARD_TIMEOUT: Duration = Duration::from_secs(600);
const EVENT_DESCRIPTION: &str = "Submit your best times in the tournament for XP!";

// ─── Submissions ─────────────────────────────────────────────────────

/// Tournament submissions and setup.
#[poise::command(
    slash_command,
    subcommands("submit", "delete", "start"),
    subcommand_required
)]
pub async fn tournament(_: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Submit a time to the running round.
#[poise::command(slash_command)]
pub async fn submit(
    ctx: Context<'_>,
    #[description = "Category to submit to"] category: Category,
    #[description = "Screenshot of your time"] screenshot: Attachment,
    #[description = "Your time as HH:MM:SS.ss"] record: String,
) -> Result<(), Error> {
    submit_to(ctx, category, screenshot, record).await
}

/// Submit a Time Attack time.
#[poise::command(slash_command)]
pub async fn ta(
    ctx: Context<'_>,
    #[description = "Screenshot of your time"] screenshot: Attachment,
    #[description = "Your time as HH:MM:SS.ss"] record: String,
) -> Result<(), Error> {
    submit_to(ctx, Category::TimeAttack, screenshot, record).await
}

/// Submit a Mildcore time.
#[poise::command(slash_command)]
pub async fn mc(
    ctx: Context<'_>,
    #[description = "Screenshot of your time"] screenshot: Attachment,
    #[description = "Your time as HH:MM:SS.ss"] record: String,
) -> Result<(), Error> {
    submit_to(ctx, Category::Mildcore, screenshot, record).await
}

/// Submit a Hardcore time.
#[poise::command(slash_command)]
pub async fn hc(
    ctx: Context<'_>,
    #[description = "Screenshot of your time"] screenshot: Attachment,
    #[description = "Your time as HH:MM:SS.ss"] record: String,
) -> Result<(), Error> {
    submit_to(ctx, Category::Hardcore, screenshot, record).await
}

/// Submit a Bonus time.
#[poise::command(slash_command)]
pub async fn bo(
    ctx: Context<'_>,
    #[description = "Screenshot of your time"] screenshot: Attachment,
    #[description = "Your time as HH:MM:SS.ss"] record: String,
) -> Result<(), Error> {
    submit_to(ctx, Category::Bonus, screenshot, record).await
}

async fn submit_to(
    ctx: Context<'_>,
    category: Category,
    screenshot: Attachment,
    record: String,
) -> Result<(), Error> {
    ctx.defer().await?;
    let data = ctx.data();
    let (tournament_id, _) = db::tournament::running(&data.db)
        .await?
        .ok_or(Error::TournamentNotActive)?;
    let record = validate::record(&record)?;

    let user_id = ctx.author().id.get();
    let previous = db::tournament::latest_record(&data.db, tournament_id, user_id, category).await?;
    if previous.is_some_and(|old| old < record) {
        return Err(Error::RecordNotFaster);
    }

    let image = screenshot.download().await?;
    let mention = ctx.author().mention();
    let reply = CreateReply::default()
        .content(format!(
            "{mention}, is this correct?\n\n{}",
            submission_text(&mention.to_string(), category, record)
        ))
        .attachment(CreateAttachment::bytes(image, screenshot.filename.clone()));
    let confirmed_text = submission_text(&mention.to_string(), category, record);
    let (confirmed, handle) = confirm(ctx, reply, &confirmed_text).await?;
    if !confirmed {
        return Ok(());
    }

    let message = handle.message().await?;
    let screenshot_url = message
        .attachments
        .first()
        .map(|a| a.url.clone())
        .unwrap_or_else(|| message.link());
    db::tournament::insert_record(&data.db, tournament_id, user_id, category, record, &screenshot_url)
        .await?;

    info!(
        user = %ctx.author().name,
        tournament = tournament_id,
        category = %category,
        record,
        "Tournament record submitted"
    );
    Ok(())
}

fn submission_text(mention: &str, category: Category, record: f64) -> String {
    format!(
        "**{mention}'s {category} Submission**\n**Record:** {}",
        pretty_record(record)
    )
}

/// Delete the latest submission in a category.
#[poise::command(slash_command)]
pub async fn delete(
    ctx: Context<'_>,
    #[description = "Category of the submission"] category: Category,
    #[description = "Whose submission (organizers only)"] user: Option<User>,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let target = match user {
        Some(user) if user.id != ctx.author().id => {
            if !is_organizer(ctx).await? {
                return Err(Error::NoPermissions);
            }
            user
        }
        _ => ctx.author().clone(),
    };

    let data = ctx.data();
    let (tournament_id, _) = db::tournament::running(&data.db)
        .await?
        .ok_or(Error::TournamentNotActive)?;

    let reply = CreateReply::default().ephemeral(true).content(format!(
        "Do you want to delete {}'s latest {category} submission?",
        target.mention()
    ));
    let (confirmed, _) = confirm(ctx, reply, "Submission deleted.").await?;
    if !confirmed {
        return Ok(());
    }

    if !db::tournament::delete_latest_record(&data.db, tournament_id, target.id.get(), category)
        .await?
    {
        return Err(Error::NoRecordsFound);
    }
    info!(
        user = %target.name,
        moderator = %ctx.author().name,
        category = %category,
        "Tournament record deleted"
    );
    Ok(())
}

// ─── Round setup ─────────────────────────────────────────────────────

#[derive(Debug, poise::Modal)]
#[name = "Tournament Map"]
struct CategoryMapModal {
    #[name = "Map Code"]
    #[min_length = 4]
    #[max_length = 6]
    code: String,
    #[name = "Level Name"]
    level: String,
    #[name = "Map Creator"]
    creator: String,
}

impl From<CategoryMapModal> for CategoryMap {
    fn from(modal: CategoryMapModal) -> Self {
        CategoryMap {
            code: modal.code.trim().to_uppercase(),
            level: capitalize(modal.level.trim()),
            creator: modal.creator.trim().to_string(),
        }
    }
}

impl From<&CategoryMap> for CategoryMapModal {
    fn from(map: &CategoryMap) -> Self {
        CategoryMapModal {
            code: map.code.clone(),
            level: map.level.clone(),
            creator: map.creator.clone(),
        }
    }
}

/// Schedule a new round.
#[poise::command(slash_command, check = "organizer_only")]
pub async fn start(
    ctx: Context<'_>,
    #[description = "When the round starts, e.g. `2026-10-31 18:00` or `in 2 days`"] start: String,
    #[description = "When it ends, absolute or relative to the start, e.g. `7 days`"] end: String,
) -> Result<(), Error> {
    let data = ctx.data();
    if db::tournament::upcoming_or_running(&data.db).await? {
        return Err(Error::TournamentAlreadyExists);
    }
    let start = parse_when(&start, Utc::now())?;
    let end = parse_when(&end, start)?;
    if end <= start {
        return Err(Error::InvalidDate);
    }

    let Some((maps, bracket)) = pick_maps(ctx).await? else {
        return Ok(());
    };

    let preview = TournamentData {
        id: 0,
        start,
        end,
        bracket,
        maps,
    };
    let roles = &data.config.roles;
    let reply = CreateReply::default()
        .content(format!("**Is this correct?**\n\n{}", preview.mentions(roles)))
        .embed(preview.start_embed(roles))
        .ephemeral(true);
    let (confirmed, _) = confirm(ctx, reply, "Round scheduled.").await?;
    if !confirmed {
        return Ok(());
    }

    let id = db::tournament::insert(&data.db, start, end, bracket, &preview.maps).await?;
    info!(tournament = id, start = %start, end = %end, bracket, "Tournament scheduled");

    if let Some(guild_id) = ctx.guild_id().or(data.config.guild_id) {
        let channels = &data.config.channels;
        let location = [channels.announcements, channels.tournament_chat]
            .into_iter()
            .flatten()
            .map(|c| c.mention().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let event = guild_id
            .create_scheduled_event(
                ctx,
                CreateScheduledEvent::new(
                    ScheduledEventType::External,
                    crate::tournament::TOURNAMENT_TITLE,
                    Timestamp::from(start),
                )
                .end_time(Timestamp::from(end))
                .location(if location.is_empty() { "Discord".to_string() } else { location })
                .description(EVENT_DESCRIPTION),
            )
            .await?;
        if let Some(channel) = channels.announcements {
            channel
                .send_message(
                    ctx,
                    CreateMessage::new()
                        .content(format!("https://discord.com/events/{guild_id}/{}", event.id)),
                )
                .await?;
        }
    }
    Ok(())
}

/// Button wizard collecting one map per category plus the bracket flag.
/// Returns `None` when cancelled or timed out.
async fn pick_maps(ctx: Context<'_>) -> Result<Option<(BTreeMap<Category, CategoryMap>, bool)>, Error> {
    let prefix = ctx.id().to_string();
    let mut maps: BTreeMap<Category, CategoryMap> = BTreeMap::new();
    let mut bracket = false;

    let handle = ctx
        .send(
            CreateReply::default()
                .content(wizard_text(&maps, bracket))
                .components(wizard_buttons(&prefix, &maps, bracket))
                .ephemeral(true),
        )
        .await?;
    let message_id = handle.message().await?.id;

    let finished = loop {
        let Some(mci) = ComponentInteractionCollector::new(ctx)
            .author_id(ctx.author().id)
            .message_id(message_id)
            .timeout(WIZARD_TIMEOUT)
            .await
        else {
            break false;
        };
        let Some(action) = mci.data.custom_id.strip_prefix(&format!("{prefix}:")) else {
            continue;
        };

        if let Some(category) = category_for_button(action) {
            let defaults = maps.get(&category).map(CategoryMapModal::from);
            let modal = poise::execute_modal_on_component_interaction::<CategoryMapModal>(
                ctx,
                mci.clone(),
                defaults,
                Some(WIZARD_TIMEOUT),
            )
            .await?;
            if let Some(modal) = modal {
                maps.insert(category, modal.into());
            }
        } else {
            mci.create_response(ctx, CreateInteractionResponse::Acknowledge)
                .await?;
            match action {
                "bracket" => bracket = !bracket,
                "continue" if !maps.is_empty() => break true,
                "cancel" => break false,
                _ => {}
            }
        }

        handle
            .edit(
                ctx,
                CreateReply::default()
                    .content(wizard_text(&maps, bracket))
                    .components(wizard_buttons(&prefix, &maps, bracket)),
            )
            .await?;
    };

    let closing = if finished { "Maps set." } else { "Setup cancelled." };
    handle
        .edit(ctx, CreateReply::default().content(closing).components(Vec::new()))
        .await?;
    Ok(finished.then_some((maps, bracket)))
}

fn category_for_button(action: &str) -> Option<Category> {
    match action {
        "ta" => Some(Category::TimeAttack),
        "mc" => Some(Category::Mildcore),
        "hc" => Some(Category::Hardcore),
        "bo" => Some(Category::Bonus),
        _ => None,
    }
}

fn button_key(category: Category) -> &'static str {
    match category {
        Category::TimeAttack => "ta",
        Category::Mildcore => "mc",
        Category::Hardcore => "hc",
        Category::Bonus => "bo",
    }
}

fn wizard_text(maps: &BTreeMap<Category, CategoryMap>, bracket: bool) -> String {
    let mut out = format!(
        "Set a map for each category you want to run, then press **Continue**.\n\n**Bracket:** {}\n",
        if bracket { "Yes" } else { "No" }
    );
    for category in Category::ALL {
        match maps.get(&category) {
            Some(map) => out.push_str(&format!(
                "**{category}:** `{}` - {} by {}\n",
                map.code, map.level, map.creator
            )),
            None => out.push_str(&format!("**{category}:** not set\n")),
        }
    }
    out
}

fn wizard_buttons(
    prefix: &str,
    maps: &BTreeMap<Category, CategoryMap>,
    bracket: bool,
) -> Vec<CreateActionRow> {
    let categories = Category::ALL
        .into_iter()
        .map(|category| {
            let style = if maps.contains_key(&category) {
                ButtonStyle::Success
            } else {
                ButtonStyle::Secondary
            };
            CreateButton::new(format!("{prefix}:{}", button_key(category)))
                .label(category.as_str())
                .style(style)
        })
        .collect();
    let controls = vec![
        CreateButton::new(format!("{prefix}:bracket"))
            .label(if bracket { "Bracket: On" } else { "Bracket: Off" })
            .style(ButtonStyle::Primary),
        CreateButton::new(format!("{prefix}:continue"))
            .label("Continue")
            .style(ButtonStyle::Success)
            .disabled(maps.is_empty()),
        CreateButton::new(format!("{prefix}:cancel"))
            .label("Cancel")
            .style(ButtonStyle::Danger),
    ];
    vec![
        CreateActionRow::Buttons(categories),
        CreateActionRow::Buttons(controls),
    ]
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

// ─── Leaderboard ─────────────────────────────────────────────────────

/// View the leaderboard of the latest round.
#[poise::command(slash_command, rename = "tournament-leaderboard")]
pub async fn tournament_leaderboard(
    ctx: Context<'_>,
    #[description = "Category"] category: Category,
    #[description = "Only players of this rank"] rank: Option<Rank>,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let pool = &ctx.data().db;
    let Some(tournament_id) = db::tournament::latest_id(pool).await? else {
        return Err(Error::NoRecordsFound);
    };
    let records: Vec<RoundRecord> = db::tournament::latest_records(pool, tournament_id)
        .await?
        .into_iter()
        .filter(|r| r.category == category && rank.map_or(true, |rank| r.rank == rank))
        .collect();
    if records.is_empty() {
        return Err(Error::NoRecordsFound);
    }
    paginate(ctx, round_pages(&records, category, rank), true).await
}

fn round_pages(records: &[RoundRecord], category: Category, rank: Option<Rank>) -> Vec<CreateEmbed> {
    let mut pages = Vec::new();
    let mut embed = leaderboard_embed("", category, rank);
    for (i, record) in records.iter().enumerate() {
        embed = embed.field(
            format!(
                "{} - {} {}",
                make_ordinal(i as u64 + 1),
                record.nickname,
                record.rank.emoji()
            )
            .trim_end(),
            format!(
                "> *Record:* {}\n> [Screenshot]({})\n\n",
                pretty_record(record.record),
                record.screenshot
            ),
            false,
        );
        if is_page_boundary(i, PER_PAGE, records.len()) {
            pages.push(embed);
            embed = leaderboard_embed("", category, rank);
        }
    }
    pages
}

// ─── Missions ────────────────────────────────────────────────────────

/// Manage the missions of the latest round.
#[poise::command(
    slash_command,
    subcommands("missions_add", "missions_remove", "missions_publish"),
    subcommand_required,
    check = "organizer_only"
)]
pub async fn missions(_: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Add or overwrite a mission.
#[poise::command(slash_command, rename = "add")]
pub async fn missions_add(
    ctx: Context<'_>,
    #[description = "Mission category"] category: MissionCategory,
    #[description = "Mission difficulty"] difficulty: MissionDifficulty,
    #[description = "Mission type"] mission_type: MissionType,
    #[description = "Target: a number, or a time for Sub Time"] target: String,
    #[description = "Difficulty counted by a Mission Threshold"] extra_target: Option<MissionDifficulty>,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let mission = build_mission(category, difficulty, mission_type, &target, extra_target)?;
    let pool = &ctx.data().db;
    let tournament_id = db::tournament::latest_id(pool)
        .await?
        .ok_or(Error::TournamentNotActive)?;

    let existing = db::tournament::mission(pool, tournament_id, category, difficulty).await?;
    let heading = if existing.is_some() {
        "There's already a mission in this category and difficulty.\nAre you sure you want to overwrite it?"
    } else {
        "Is this correct?"
    };
    let reply = CreateReply::default()
        .ephemeral(true)
        .content(format!("{heading}\n\n{}", mission_summary(&mission)));
    let (confirmed, _) = confirm(ctx, reply, "Mission saved.").await?;
    if !confirmed {
        return Ok(());
    }

    db::tournament::upsert_mission(pool, tournament_id, &mission).await?;
    info!(
        tournament = tournament_id,
        category = %category,
        difficulty = %difficulty,
        mission_type = %mission_type,
        "Mission saved"
    );
    Ok(())
}

/// Delete a mission.
#[poise::command(slash_command, rename = "remove")]
pub async fn missions_remove(
    ctx: Context<'_>,
    #[description = "Mission category"] category: MissionCategory,
    #[description = "Mission difficulty"] difficulty: MissionDifficulty,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let pool = &ctx.data().db;
    let tournament_id = db::tournament::latest_id(pool)
        .await?
        .ok_or(Error::TournamentNotActive)?;
    let (mission_type, target) = db::tournament::mission(pool, tournament_id, category, difficulty)
        .await?
        .ok_or(Error::NoMissionExists)?;

    let reply = CreateReply::default().ephemeral(true).content(format!(
        "Are you sure you want to delete this mission?\n\n{}",
        format_mission(difficulty, mission_type, target)
    ));
    let (confirmed, _) = confirm(ctx, reply, "Mission deleted.").await?;
    if !confirmed {
        return Ok(());
    }
    db::tournament::delete_mission(pool, tournament_id, category, difficulty).await?;
    Ok(())
}

/// Post the missions of the latest round to the announcements channel.
#[poise::command(slash_command, rename = "publish")]
pub async fn missions_publish(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let data = ctx.data();
    let tournament_id = db::tournament::latest_id(&data.db)
        .await?
        .ok_or(Error::TournamentNotActive)?;
    let missions = db::tournament::missions(&data.db, tournament_id).await?;
    if missions.is_empty() {
        return Err(Error::NoMissionExists);
    }
    let embed = missions_embed(missions_text(&missions));

    let reply = CreateReply::default()
        .ephemeral(true)
        .content("Publish these missions?")
        .embed(embed.clone());
    let (confirmed, _) = confirm(ctx, reply, "Missions published.").await?;
    if !confirmed {
        return Ok(());
    }
    let channel = data
        .config
        .channels
        .announcements
        .ok_or_else(|| Error::Config("ANNOUNCEMENTS_ID is not set".into()))?;
    channel
        .send_message(ctx, CreateMessage::new().embed(embed))
        .await?;
    info!(tournament = tournament_id, missions = missions.len(), "Missions published");
    Ok(())
}

/// Check a mission's category, difficulty and type fit together and parse its target.
pub fn build_mission(
    category: MissionCategory,
    difficulty: MissionDifficulty,
    mission_type: MissionType,
    target: &str,
    extra_target: Option<MissionDifficulty>,
) -> Result<Mission, Error> {
    let general_category = category == MissionCategory::General;
    if general_category != (difficulty == MissionDifficulty::General) {
        return Err(Error::InvalidMissionType);
    }
    if general_category != mission_type.is_general() {
        return Err(Error::MismatchedMissionCategoryType);
    }

    let target = match mission_type {
        MissionType::XpThreshold | MissionType::MissionThreshold | MissionType::TopPlacement => {
            target
                .trim()
                .parse::<u32>()
                .map(f64::from)
                .map_err(|_| Error::TargetNotInteger)?
        }
        MissionType::SubTime => time_convert(target)?,
        MissionType::Completion => 0.0,
    };

    Ok(Mission {
        category,
        difficulty,
        mission_type,
        target,
        extra_target: extra_target.filter(|_| mission_type == MissionType::MissionThreshold),
    })
}

fn mission_summary(mission: &Mission) -> String {
    let mut out = format!(
        "**Category:** {}\n**Difficulty:** {}\n**Type:** {}\n**Goal:** {}",
        mission.category,
        mission.difficulty,
        mission.mission_type,
        format_mission(mission.difficulty, mission.mission_type, mission.target)
            .trim_start_matches("- "),
    );
    if let Some(extra) = mission.extra_target {
        out.push_str(&format!("\n**Counts:** {extra} missions"));
    }
    out
}

/// Published mission list, grouped by category with `General` first.
pub fn missions_text(missions: &[Mission]) -> String {
    let mut out = String::from("__**Missions**__\n");
    for category in MissionCategory::ALL {
        let mut lines: Vec<&Mission> = missions.iter().filter(|m| m.category == category).collect();
        if lines.is_empty() {
            continue;
        }
        lines.sort_by_key(|m| m.difficulty);
        out.push_str(&format!("\n**{category}:**\n"));
        for mission in lines {
            out.push_str(&format_mission(mission.difficulty, mission.mission_type, mission.target));
            out.push('\n');
        }
    }
    out
}

// ─── Ranks, XP and seasons ───────────────────────────────────────────

/// Change a player's rank in a category.
#[poise::command(slash_command, rename = "change-rank", check = "organizer_only")]
pub async fn change_rank(
    ctx: Context<'_>,
    #[description = "Player"] member: User,
    #[description = "Category"] category: Category,
    #[description = "New rank"] rank: Rank,
) -> Result<(), Error> {
    db::tournament::set_rank(&ctx.data().db, member.id.get(), category, rank).await?;
    ctx.send(
        CreateReply::default()
            .content(format!(
                "{}'s {category} rank was changed to {rank}",
                member.mention()
            ))
            .ephemeral(true),
    )
    .await?;
    info!(user = %member.name, category = %category, rank = %rank, "Rank changed");
    Ok(())
}

/// Give (or take, with a negative amount) XP in the current season.
#[poise::command(slash_command, check = "organizer_only")]
pub async fn xp(
    ctx: Context<'_>,
    #[description = "Player"] member: User,
    #[description = "XP to add"] amount: i64,
) -> Result<(), Error> {
    let data = ctx.data();
    let season = data
        .cache
        .current_season
        .read()
        .await
        .ok_or_else(|| Error::Config("No tournament season is active.".into()))?;

    let previous = db::tournament::xp(&data.db, member.id.get(), season)
        .await?
        .unwrap_or(0);
    let total = db::tournament::add_xp(&data.db, member.id.get(), season, amount).await?;
    ctx.send(CreateReply::default().content(format!(
        "{} was given {amount} XP. \nNew total: {total}\n Previous total: {previous}.",
        member.mention()
    )))
    .await?;
    info!(user = %member.name, season, amount, total, "XP given");
    Ok(())
}

/// Manage tournament seasons.
#[poise::command(
    slash_command,
    subcommands("season_add", "season_set", "season_list"),
    subcommand_required,
    check = "organizer_only"
)]
pub async fn season(_: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Create a new (inactive) season.
#[poise::command(slash_command, rename = "add")]
pub async fn season_add(
    ctx: Context<'_>,
    #[description = "Season name"] name: String,
) -> Result<(), Error> {
    let number = db::tournament::add_season(&ctx.data().db, name.trim()).await?;
    ctx.send(
        CreateReply::default()
            .content(format!("Added season {number}: **{}**", name.trim()))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Make a season the current one. XP starts fresh in it.
#[poise::command(slash_command, rename = "set")]
pub async fn season_set(
    ctx: Context<'_>,
    #[description = "Season number"] number: i32,
) -> Result<(), Error> {
    let data = ctx.data();
    let reply = CreateReply::default()
        .ephemeral(true)
        .content(format!("Are you sure you want to change the current season to season {number}?"));
    let (confirmed, _) = confirm(ctx, reply, "Season changed.").await?;
    if !confirmed {
        return Ok(());
    }

    let Some(name) = db::tournament::activate_season(&data.db, number).await? else {
        return Err(Error::OutOfRange);
    };
    *data.cache.current_season.write().await = Some(number);

    if let Some(channel) = data.config.channels.announcements {
        channel
            .send_message(
                ctx,
                CreateMessage::new().embed(announcement_embed(format!(
                    "# {name}\n## Welcome to the new tournament season!\n\
                     All XP has been reset. Don't worry, the old XP amounts and leaderboard are still saved!"
                ))),
            )
            .await?;
    }
    info!(season = number, name = %name, "Season activated");
    Ok(())
}

/// List all seasons.
#[poise::command(slash_command, rename = "list")]
pub async fn season_list(ctx: Context<'_>) -> Result<(), Error> {
    let seasons = db::tournament::seasons(&ctx.data().db).await?;
    let content = if seasons.is_empty() {
        "No seasons yet.".to_string()
    } else {
        seasons
            .iter()
            .map(|(number, name, active)| {
                format!("`{number}` {name}{}", if *active { " ✅" } else { "" })
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    ctx.send(CreateReply::default().content(content).ephemeral(true))
        .await?;
    Ok(())
}

// ─── Map contest ─────────────────────────────────────────────────────

/// Submit an unreleased map to the running round's map contest.
#[poise::command(slash_command, rename = "map-contest")]
pub async fn map_contest(
    ctx: Context<'_>,
    #[description = "Workshop code"] map_code: String,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let data = ctx.data();
    let (tournament_id, _) = db::tournament::running(&data.db)
        .await?
        .ok_or(Error::TournamentNotActive)?;
    let map_code = validate::normalize_map_code(&map_code)?;
    if data.cache.map(&map_code).await.is_some() {
        return Err(Error::MapAlreadyReleased);
    }

    let user_id = ctx.author().id.get();
    let content = match db::tournament::contest_entry(&data.db, tournament_id, user_id).await? {
        Some(previous) => format!(
            "You can only submit once per contest.\n\n\
             Do you want to overwrite your previous submission `{previous}` with `{map_code}`?"
        ),
        None => format!("Submitting map code: `{map_code}`\n\nAre you sure you want to submit this map?"),
    };
    let (confirmed, _) = confirm(
        ctx,
        CreateReply::default().ephemeral(true).content(content),
        "Map submitted to the contest.",
    )
    .await?;
    if !confirmed {
        return Ok(());
    }
    db::tournament::upsert_contest_entry(&data.db, tournament_id, user_id, &map_code).await?;
    info!(user = %ctx.author().name, tournament = tournament_id, map_code = %map_code, "Contest entry saved");
    Ok(())
}

/// List the map codes in the current or latest map contest.
#[poise::command(slash_command, rename = "map-contest-list")]
pub async fn map_contest_list(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;
    let entries = contest_entries(ctx).await?;
    let content = entries
        .iter()
        .map(|(code, _)| format!("`{code}`"))
        .collect::<Vec<_>>()
        .join("\n");
    ctx.send(CreateReply::default().content(content)).await?;
    Ok(())
}

/// List contest entries together with who submitted them.
#[poise::command(slash_command, rename = "map-contest-list-users", check = "organizer_only")]
pub async fn map_contest_list_users(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let entries = contest_entries(ctx).await?;
    let mut lines = Vec::with_capacity(entries.len());
    for (code, user_id) in &entries {
        let nickname = ctx.data().cache.nickname(*user_id).await;
        lines.push(format!("`{code}` - {nickname} ({user_id})"));
    }
    ctx.send(CreateReply::default().content(lines.join("\n")).ephemeral(true))
        .await?;
    Ok(())
}

/// Remove a map code from the running map contest.
#[poise::command(slash_command, rename = "map-contest-delete-code", check = "organizer_only")]
pub async fn map_contest_delete_code(
    ctx: Context<'_>,
    #[description = "Workshop code"]
    #[autocomplete = "autocomplete::map_codes"]
    map_code: String,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let data = ctx.data();
    let (tournament_id, _) = db::tournament::running(&data.db)
        .await?
        .ok_or(Error::TournamentNotActive)?;
    let map_code = validate::normalize_map_code(&map_code)?;

    let (confirmed, _) = confirm(
        ctx,
        CreateReply::default()
            .ephemeral(true)
            .content(format!("Are you sure you want to delete map code `{map_code}`?")),
        "Contest entry deleted.",
    )
    .await?;
    if !confirmed {
        return Ok(());
    }
    if db::tournament::delete_contest_entry(&data.db, tournament_id, &map_code).await? == 0 {
        return Err(Error::InvalidMapCode);
    }
    Ok(())
}

/// Entries of the running round, falling back to the latest round.
async fn contest_entries(ctx: Context<'_>) -> Result<Vec<(String, u64)>, Error> {
    let pool = &ctx.data().db;
    let tournament_id = match db::tournament::running(pool).await? {
        Some((id, _)) => Some(id),
        None => db::tournament::latest_id(pool).await?,
    };
    let Some(tournament_id) = tournament_id else {
        return Err(Error::TournamentNotActive);
    };
    let entries = db::tournament::contest_entries(pool, tournament_id).await?;
    if entries.is_empty() {
        return Err(Error::NoMapsFound);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mission(category: MissionCategory, difficulty: MissionDifficulty, kind: MissionType, target: f64) -> Mission {
        Mission {
            category,
            difficulty,
            mission_type: kind,
            target,
            extra_target: None,
        }
    }

    #[test]
    fn general_missions_need_general_types() {
        let err = build_mission(
            MissionCategory::General,
            MissionDifficulty::General,
            MissionType::SubTime,
            "10",
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MismatchedMissionCategoryType));

        let err = build_mission(
            MissionCategory::Hardcore,
            MissionDifficulty::Hard,
            MissionType::TopPlacement,
            "2",
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MismatchedMissionCategoryType));
    }

    #[test]
    fn general_difficulty_only_pairs_with_general_category() {
        let err = build_mission(
            MissionCategory::Bonus,
            MissionDifficulty::General,
            MissionType::Completion,
            "",
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidMissionType));
    }

    #[test]
    fn targets_are_parsed_per_type() {
        let threshold = build_mission(
            MissionCategory::General,
            MissionDifficulty::General,
            MissionType::MissionThreshold,
            " 4 ",
            Some(MissionDifficulty::Hard),
        )
        .unwrap();
        assert_eq!(threshold.target, 4.0);
        assert_eq!(threshold.extra_target, Some(MissionDifficulty::Hard));

        let err = build_mission(
            MissionCategory::General,
            MissionDifficulty::General,
            MissionType::XpThreshold,
            "1.5",
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::TargetNotInteger));

        let sub = build_mission(
            MissionCategory::TimeAttack,
            MissionDifficulty::Expert,
            MissionType::SubTime,
            "1:05.20",
            Some(MissionDifficulty::Easy),
        )
        .unwrap();
        assert!((sub.target - 65.2).abs() < 1e-9);
        assert_eq!(sub.extra_target, None);

        let completion = build_mission(
            MissionCategory::Mildcore,
            MissionDifficulty::Easy,
            MissionType::Completion,
            "anything",
            None,
        )
        .unwrap();
        assert_eq!(completion.target, 0.0);
    }

    #[test]
    fn published_missions_start_with_general() {
        let missions = vec![
            mission(MissionCategory::Hardcore, MissionDifficulty::Hard, MissionType::Completion, 0.0),
            mission(MissionCategory::Hardcore, MissionDifficulty::Easy, MissionType::SubTime, 90.0),
            mission(MissionCategory::General, MissionDifficulty::General, MissionType::XpThreshold, 5000.0),
        ];
        let text = missions_text(&missions);
        assert!(text.starts_with("__**Missions**__\n\n**General:**\n- General: Get 5000 XP"));
        let hardcore = text.find("**Hardcore:**").unwrap();
        let easy = text.find("- Easy: Get sub 1:30.00").unwrap();
        let hard = text.find("- Hard: Complete the level.").unwrap();
        assert!(hardcore < easy && easy < hard);
    }

    #[test]
    fn wizard_lists_every_category() {
        let mut maps = BTreeMap::new();
        maps.insert(
            Category::Bonus,
            CategoryMap {
                code: "ABCDE".into(),
                level: "Level 3".into(),
                creator: "nebula".into(),
            },
        );
        let text = wizard_text(&maps, true);
        assert!(text.contains("**Bracket:** Yes"));
        assert!(text.contains("**Bonus:** `ABCDE` - Level 3 by nebula"));
        assert!(text.contains("**Time Attack:** not set"));

        let rows = wizard_buttons("1", &maps, true);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn modal_values_are_normalized() {
        let map: CategoryMap = CategoryMapModal {
            code: " abcd1 ".into(),
            level: "lEVEL 2".into(),
            creator: " nebula ".into(),
        }
        .into();
        assert_eq!(map.code, "ABCD1");
        assert_eq!(map.level, "Level 2");
        assert_eq!(map.creator, "nebula");
    }

    #[test]
    fn round_pages_split_after_ten() {
        let records: Vec<RoundRecord> = (0..12)
            .map(|i| RoundRecord {
                user_id: i,
                nickname: format!("p{i}"),
                category: Category::Hardcore,
                rank: Rank::Gold,
                record: 60.0 + i as f64,
                screenshot: "https://s".into(),
            })
            .collect();
        let pages = round_pages(&records, Category::Hardcore, None);
        assert_eq!(pages.len(), 2);
        let json = serde_json::to_value(&pages[0]).unwrap();
        assert!(json["fields"][0]["name"].as_str().unwrap().starts_with("1st - p0"));
        assert!(json["fields"][0]["value"].as_str().unwrap().contains("1:00.00"));
    }
}
