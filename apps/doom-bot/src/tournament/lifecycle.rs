use super::{end_embed, hall_of_fame_embed, leaderboard_embed, spreadsheet, xp, TournamentData};
use crate::db;
use crate::db::tournament::RoundRecord;
use crate::error::Error;
use crate::utils::format::make_ordinal;
use crate::utils::time::pretty_record;
use crate::Data;
use chrono::Utc;
use serenity::all::{
    ChannelId, CreateAttachment, CreateEmbed, CreateMessage, CreateThread, Http,
    PermissionOverwrite, PermissionOverwriteType, Permissions, RoleId,
};
use tracing::{error, info, warn};

/// Leaderboard lines per archive embed.
const LINES_PER_EMBED: usize = 5;
/// Discord accepts at most ten embeds per message.
const EMBEDS_PER_MESSAGE: usize = 10;

/// One scheduler step: start a due round or wrap up a finished one.
pub async fn tick(http: &Http, data: &Data) -> Result<(), Error> {
    let Some((tournament, active)) = db::tournament::unfinished(&data.db).await? else {
        return Ok(());
    };
    let now = Utc::now();
    if now >= tournament.end {
        end(http, data, &tournament).await
    } else if !active && now >= tournament.start {
        start(http, data, &tournament).await
    } else {
        Ok(())
    }
}

pub async fn start(http: &Http, data: &Data, tournament: &TournamentData) -> Result<(), Error> {
    let roles = &data.config.roles;
    if let Some(channel) = data.config.channels.announcements {
        let message = CreateMessage::new()
            .content(tournament.mentions(roles))
            .embed(tournament.start_embed(roles));
        channel.send_message(http, message).await?;
    }
    if let Some(channel) = data.config.channels.tournament_submissions {
        set_channel_open(http, channel, true).await?;
    }
    db::tournament::set_active(&data.db, tournament.id, true).await?;

    info!(tournament = tournament.id, "Tournament started");
    Ok(())
}

pub async fn end(http: &Http, data: &Data, tournament: &TournamentData) -> Result<(), Error> {
    let records = db::tournament::latest_records(&data.db, tournament.id).await?;
    let missions = db::tournament::missions(&data.db, tournament.id).await?;
    let runs: Vec<xp::Run> = records.iter().map(RoundRecord::to_run).collect();
    let table = xp::compute(&runs, &missions);

    let season = *data.cache.current_season.read().await;
    if season.is_none() {
        warn!(tournament = tournament.id, "No active season, round XP will not be credited");
    }
    db::tournament::finish_round(&data.db, tournament.id, season, &table).await?;
    info!(
        tournament = tournament.id,
        players = table.len(),
        "Tournament ended and XP credited"
    );

    if let Some(channel) = data.config.channels.tournament_submissions {
        if let Err(e) = set_channel_open(http, channel, false).await {
            error!(error = %e, "Failed to close tournament submissions");
        }
    }

    if let Some(channel) = data.config.channels.announcements {
        let message = CreateMessage::new()
            .content(tournament.mentions(&data.config.roles))
            .embed(end_embed());
        channel.send_message(http, message).await?;
    }

    let workbook = spreadsheet::build(&runs, &table)?;
    if let Some(channel) = data.config.channels.hall_of_fame {
        let (hof, archive) = hall_of_fame(tournament, &records);
        let hof_message = channel
            .send_message(http, CreateMessage::new().embed(hof))
            .await?;
        let thread = channel
            .create_thread_from_message(http, hof_message.id, CreateThread::new("Records Archive"))
            .await?;

        let file = CreateAttachment::bytes(
            workbook,
            spreadsheet::file_name(Utc::now().date_naive()),
        );
        let mut batches = archive.chunks(EMBEDS_PER_MESSAGE);
        let first = CreateMessage::new()
            .embeds(batches.next().map(<[CreateEmbed]>::to_vec).unwrap_or_default())
            .add_file(file);
        thread.id.send_message(http, first).await?;
        for batch in batches {
            thread
                .id
                .send_message(http, CreateMessage::new().embeds(batch.to_vec()))
                .await?;
        }
    }

    Ok(())
}

/// Allow or deny `@everyone` sending messages in a channel.
pub async fn set_channel_open(http: &Http, channel_id: ChannelId, open: bool) -> Result<(), Error> {
    let Some(guild_channel) = channel_id.to_channel(http).await?.guild() else {
        warn!(channel_id = %channel_id, "Not a guild channel, cannot change permissions");
        return Ok(());
    };
    let everyone_role = RoleId::new(guild_channel.guild_id.get());

    let (allow, deny) = if open {
        (Permissions::SEND_MESSAGES, Permissions::empty())
    } else {
        (Permissions::empty(), Permissions::SEND_MESSAGES)
    };
    let overwrite = PermissionOverwrite {
        allow,
        deny,
        kind: PermissionOverwriteType::Role(everyone_role),
    };
    channel_id.create_permission(http, overwrite).await?;

    info!(channel_id = %channel_id, open, "Channel send permission updated");
    Ok(())
}

fn standing_line(position: usize, record: &RoundRecord) -> String {
    format!(
        "`{}` - {} - [{}]({}) {}\n",
        make_ordinal(position as u64),
        record.nickname,
        pretty_record(record.record),
        record.screenshot,
        record.rank.emoji(),
    )
}

/// Competition ranks (`1, 2, 2, 4`) for records already sorted by time.
pub fn competition_ranks(records: &[f64]) -> Vec<usize> {
    let mut ranks = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let rank = match i {
            0 => 1,
            _ if records[i - 1] == *record => ranks[i - 1],
            _ => i + 1,
        };
        ranks.push(rank);
    }
    ranks
}

/// The top-three summary embed and the full per-category archive embeds.
pub fn hall_of_fame(tournament: &TournamentData, records: &[RoundRecord]) -> (CreateEmbed, Vec<CreateEmbed>) {
    let mut hof = hall_of_fame_embed();
    let mut archive = Vec::new();

    for category in tournament.categories() {
        let mut rows: Vec<&RoundRecord> = records.iter().filter(|r| r.category == category).collect();
        rows.sort_by(|a, b| a.record.total_cmp(&b.record));
        let times: Vec<f64> = rows.iter().map(|r| r.record).collect();
        let ranks = competition_ranks(&times);

        let lines: Vec<String> = rows
            .iter()
            .zip(&ranks)
            .map(|(row, rank)| standing_line(*rank, row))
            .collect();
        let podium: String = lines
            .iter()
            .zip(&ranks)
            .filter(|(_, rank)| **rank <= 3)
            .map(|(line, _)| line.as_str())
            .collect();

        hof = hof.field(category.as_str(), or_placeholder(podium), false);
        for chunk in lines.chunks(LINES_PER_EMBED) {
            archive.push(leaderboard_embed(chunk.concat(), category, None));
        }
    }

    (hof, archive)
}

fn or_placeholder(value: String) -> String {
    if value.is_empty() {
        "No submissions.".to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_share_a_rank() {
        assert_eq!(competition_ranks(&[10.0, 11.0, 11.0, 12.0]), vec![1, 2, 2, 4]);
        assert!(competition_ranks(&[]).is_empty());
    }

    #[test]
    fn standing_lines_link_the_screenshot() {
        let record = RoundRecord {
            user_id: 1,
            nickname: "nebula".into(),
            category: crate::tournament::Category::Bonus,
            rank: crate::tournament::Rank::Unranked,
            record: 61.5,
            screenshot: "https://cdn.example/1.png".into(),
        };
        assert_eq!(
            standing_line(2, &record),
            "`2nd` - nebula - [1:01.50](https://cdn.example/1.png) \n"
        );
    }
}
