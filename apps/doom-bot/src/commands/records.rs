use super::autocomplete;
use crate::db;
use crate::db::records::{LeaderboardRow, NewRecord, PersonalRecordRow};
use crate::error::Error;
use crate::utils::format::{is_page_boundary, make_ordinal, placement_emoji};
use crate::utils::time::pretty_record;
use crate::utils::{confirm::confirm, embeds, paginator::paginate, validate};
use crate::verification::{self, HALF_VERIFIED, VERIFIED};
use crate::Context;
use poise::CreateReply;
use serenity::all::{Attachment, CreateAttachment, CreateEmbed, CreateMessage, Mentionable, User};
use tracing::{info, warn};

const PER_PAGE: usize = 10;

/// Submit a personal record for verification.
#[poise::command(slash_command, rename = "submit-record")]
pub async fn submit_record(
    ctx: Context<'_>,
    #[description = "Workshop code"]
    #[autocomplete = "autocomplete::map_codes"]
    map_code: String,
    #[description = "Level name"]
    #[autocomplete = "autocomplete::map_levels"]
    level_name: String,
    #[description = "Your time as HH:MM:SS.ss"] record: String,
    #[description = "Screenshot of the completion"] screenshot: Attachment,
    #[description = "Link to video proof"] video: Option<String>,
    #[description = "Rate the level from 1 to 6 stars"]
    #[min = 1]
    #[max = 6]
    rating: Option<i16>,
) -> Result<(), Error> {
    ctx.defer().await?;
    let data = ctx.data();
    let map_code = validate::existing_map_code(&data.cache, &map_code).await?;
    let level_name = validate::map_level(&data.cache, &map_code, &level_name).await?;
    let record = validate::record(&record)?;
    let video = match video {
        Some(raw) => Some(validate::reachable_url(&data.http, &raw).await?),
        None => None,
    };

    let user_id = ctx.author().id.get();
    let previous = db::records::latest_submission(&data.db, &map_code, &level_name, user_id).await?;
    if previous.is_some_and(|(old, _)| old < record) {
        return Err(Error::RecordNotFaster);
    }

    let image = screenshot.download().await?;
    let nickname = data.cache.nickname(user_id).await;
    let embed = verification::record_embed(
        &nickname,
        ctx.author().face(),
        &map_code,
        &level_name,
        record,
        video.as_deref(),
    );

    let reply = CreateReply::default()
        .content(format!("{}, is this correct?", ctx.author().mention()))
        .embed(embed.clone())
        .attachment(CreateAttachment::bytes(image.clone(), "image.png"));
    let (confirmed, handle) = confirm(ctx, reply, verification::WAITING_TEXT).await?;
    if !confirmed {
        return Ok(());
    }
    let public = handle.message().await?;

    let queue = data
        .config
        .channels
        .verification_queue
        .ok_or_else(|| Error::Config("VERIFICATION_QUEUE_ID is not set".into()))?;
    let queue_message = queue
        .send_message(
            ctx,
            CreateMessage::new()
                .embed(embed)
                .add_file(CreateAttachment::bytes(image, "image.png"))
                .components(vec![verification::queue_buttons()]),
        )
        .await?;

    if let Some((_, Some(stale))) = previous {
        if let Err(e) = queue.delete_message(ctx, stale).await {
            warn!(message = stale, error = %e, "Previous queue message already gone");
        }
    }

    db::records::insert(
        &data.db,
        &NewRecord {
            map_code: &map_code,
            level_name: &level_name,
            user_id,
            record,
            screenshot: &public.link(),
            video: video.as_deref(),
            message_id: public.id.get(),
            channel_id: public.channel_id.get(),
            hidden_id: queue_message.id.get(),
        },
    )
    .await?;

    if let Some(rating) = rating {
        db::maps::upsert_rating(&data.db, &map_code, &level_name, user_id, rating).await?;
    }

    info!(
        user = %ctx.author().name,
        map_code = %map_code,
        level = %level_name,
        record,
        "Record submitted"
    );
    Ok(())
}

/// View the verified leaderboard of a map.
#[poise::command(slash_command)]
pub async fn leaderboard(
    ctx: Context<'_>,
    #[description = "Workshop code"]
    #[autocomplete = "autocomplete::map_codes"]
    map_code: String,
    #[description = "Only this level"]
    #[autocomplete = "autocomplete::map_levels"]
    level_name: Option<String>,
    #[description = "Only runs with video proof"] verified: Option<bool>,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let cache = &ctx.data().cache;
    let map_code = validate::existing_map_code(cache, &map_code).await?;
    let level_name = match level_name {
        Some(raw) => Some(validate::map_level(cache, &map_code, &raw).await?),
        None => None,
    };

    let mut rows = db::records::leaderboard(
        &ctx.data().db,
        &map_code,
        level_name.as_deref(),
        verified.unwrap_or(false),
    )
    .await?;
    // Without a level only the fastest run of each level is shown.
    if level_name.is_none() {
        rows.retain(|r| r.rank_num == 1);
    }
    if rows.is_empty() {
        return Err(Error::NoRecordsFound);
    }

    let title = match &level_name {
        Some(level) => format!("Leaderboard - {map_code} - {level}"),
        None => format!("Leaderboard - {map_code}"),
    };
    paginate(ctx, leaderboard_pages(&rows, &title, level_name.is_some()), true).await
}

/// View personal records.
#[poise::command(slash_command, rename = "personal-records")]
pub async fn personal_records(
    ctx: Context<'_>,
    #[description = "Whose records to show"] user: Option<User>,
    #[description = "Only world records"] wr_only: Option<bool>,
) -> Result<(), Error> {
    let user = user.unwrap_or_else(|| ctx.author().clone());
    show_personal_records(ctx, &user, wr_only.unwrap_or(false)).await
}

#[poise::command(context_menu_command = "Personal Records")]
pub async fn personal_records_menu(ctx: Context<'_>, user: User) -> Result<(), Error> {
    show_personal_records(ctx, &user, false).await
}

#[poise::command(context_menu_command = "World Records")]
pub async fn world_records_menu(ctx: Context<'_>, user: User) -> Result<(), Error> {
    show_personal_records(ctx, &user, true).await
}

async fn show_personal_records(ctx: Context<'_>, user: &User, wr_only: bool) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let rows = db::records::personal_records(&ctx.data().db, user.id.get(), wr_only).await?;
    if rows.is_empty() {
        return Err(Error::NoRecordsFound);
    }
    let nickname = ctx.data().cache.nickname(user.id.get()).await;
    let title = format!(
        "Personal {}Records | {nickname}",
        if wr_only { "World " } else { "" }
    );
    paginate(ctx, personal_pages(&rows, &title), true).await
}

/// Show how many records moderators have verified.
#[poise::command(slash_command, rename = "verification-stats")]
pub async fn verification_stats(
    ctx: Context<'_>,
    #[description = "Only this moderator"]
    #[autocomplete = "autocomplete::users"]
    user: Option<String>,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let user = match user {
        Some(raw) => Some(validate::known_user(&ctx.data().cache, &raw).await?),
        None => None,
    };
    let counts = db::users::verification_counts(&ctx.data().db, user).await?;

    let content = match (user, counts.first()) {
        (_, None) => return Err(Error::NoRecordsFound),
        (Some(_), Some((_, nickname, amount))) => {
            format!("{nickname} has **{amount}** verifications!")
        }
        (None, Some(_)) => verification_table(&counts),
    };
    ctx.send(CreateReply::default().content(content).ephemeral(true))
        .await?;
    Ok(())
}

fn verification_table(counts: &[(u64, String, i32)]) -> String {
    let mut out = String::new();
    let mut rank = 0;
    for (i, (_, nickname, amount)) in counts.iter().enumerate() {
        if i == 0 || counts[i - 1].2 != *amount {
            rank = i + 1;
        }
        out.push_str(&format!(
            "`{:^6}` `{amount:^6}` `{nickname}`\n",
            make_ordinal(rank as u64)
        ));
    }
    out
}

fn record_link(record: f64, screenshot: &str, video: Option<&str>) -> String {
    let badge = if video.is_some() { VERIFIED } else { HALF_VERIFIED };
    format!("[{}]({screenshot}) {badge}", pretty_record(record))
}

pub fn leaderboard_pages(rows: &[LeaderboardRow], title: &str, single_level: bool) -> Vec<CreateEmbed> {
    let mut pages = Vec::new();
    let mut embed = embeds::doom_embed().title(title);
    for (i, row) in rows.iter().enumerate() {
        let value = match &row.video {
            Some(video) => format!(
                "┣ `Name` {}\n┣ `Record` {}\n┗ `Video` [Link]({video})\n",
                row.nickname,
                record_link(row.record, &row.screenshot, Some(video)),
            ),
            None => format!(
                "┣ `Name` {}\n┗ `Record` {}\n",
                row.nickname,
                record_link(row.record, &row.screenshot, None),
            ),
        };
        let name = if single_level {
            format!("{} {}", placement_emoji(i + 1), make_ordinal(row.rank_num as u64))
        } else {
            row.level_name.clone()
        };
        embed = embed.field(name.trim_start(), value, false);

        if is_page_boundary(i, PER_PAGE, rows.len()) {
            pages.push(embed);
            embed = embeds::doom_embed().title(title);
        }
    }
    pages
}

pub fn personal_pages(rows: &[PersonalRecordRow], title: &str) -> Vec<CreateEmbed> {
    let heading = |r: &PersonalRecordRow| format!("{} by {} ({})", r.map_name, r.creators, r.map_code);

    let mut pages = Vec::new();
    let mut embed = embeds::doom_embed().title(title);
    let mut lines: Vec<String> = Vec::new();
    let mut current = rows.first().map(heading).unwrap_or_default();

    for (i, row) in rows.iter().enumerate() {
        let this = heading(row);
        if this != current {
            embed = embed.field(&current, close_tree(&lines), false);
            lines.clear();
            current = this;
        }
        lines.push(format!("`Level` ***{}***", row.level_name));
        lines.push(format!(
            "`Record` {}",
            record_link(row.record, &row.screenshot, row.video.as_deref())
        ));
        if let Some(video) = &row.video {
            lines.push(format!("`Video` [Link]({video})"));
        }

        if is_page_boundary(i, PER_PAGE, rows.len()) {
            embed = embed.field(&current, close_tree(&lines), false);
            lines.clear();
            pages.push(embed);
            embed = embeds::doom_embed().title(title);
        }
    }
    pages
}

/// Prefix lines with `┣`, the last one with `┗`.
fn close_tree(lines: &[String]) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let branch = if i + 1 == lines.len() { '┗' } else { '┣' };
            format!("{branch} {line}\n")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(level: &str, rank: i64, video: Option<&str>) -> LeaderboardRow {
        LeaderboardRow {
            user_id: 1,
            nickname: "nebula".into(),
            level_name: level.into(),
            record: 12.5,
            screenshot: "https://s".into(),
            video: video.map(str::to_string),
            rank_num: rank,
        }
    }

    #[test]
    fn leaderboard_pages_hold_ten_fields() {
        let rows: Vec<LeaderboardRow> = (1..=25).map(|i| row("Level 1", i, None)).collect();
        let pages = leaderboard_pages(&rows, "Leaderboard - ABCDE", true);
        assert_eq!(pages.len(), 3);
        let first = serde_json::to_value(&pages[0]).unwrap();
        assert_eq!(first["fields"].as_array().unwrap().len(), 10);
        let last = serde_json::to_value(&pages[2]).unwrap();
        assert_eq!(last["fields"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn single_row_makes_one_page() {
        let pages = leaderboard_pages(&[row("Level 1", 1, Some("https://v"))], "t", false);
        assert_eq!(pages.len(), 1);
        let json = serde_json::to_value(&pages[0]).unwrap();
        assert_eq!(json["fields"][0]["name"], "Level 1");
        assert!(json["fields"][0]["value"].as_str().unwrap().contains("[Link](https://v)"));
    }

    #[test]
    fn tree_closes_on_the_last_line() {
        let lines = vec!["a".to_string(), "b".to_string()];
        assert_eq!(close_tree(&lines), "┣ a\n┗ b\n");
    }

    #[test]
    fn verification_table_shares_ranks() {
        let counts = vec![
            (1, "a".to_string(), 9),
            (2, "b".to_string(), 9),
            (3, "c".to_string(), 4),
        ];
        let table = verification_table(&counts);
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].starts_with("` 1st  `"));
        assert!(lines[1].starts_with("` 1st  `"));
        assert!(lines[2].starts_with("` 3rd  `"));
    }
}
