//! Head-to-head duels: ready-up buttons, outcome resolution and the sweep
//! that cancels or settles duels once their deadlines pass.

use crate::db;
use crate::db::duels::{DuelPlayer, DuelRow};
use crate::error::Error;
use crate::utils::time::{discord_timestamp, pretty_record};
use crate::Data;
use chrono::{DateTime, Utc};
use serenity::all::{
    ButtonStyle, ChannelId, CreateActionRow, CreateButton, CreateMessage, Http, Mention,
    ReactionType, UserId,
};
use std::time::Duration;
use tracing::{error, info};

pub const READY_PREFIX: &str = "duel-ready";
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub const WON: i16 = 1;
pub const LOST: i16 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner { winner: u64, loser: u64 },
    /// Equal times or nobody submitted. No XP changes hands.
    Draw,
}

impl Outcome {
    /// Per-player result values stored on `user_duels`.
    pub fn results(&self, players: &[u64]) -> Vec<(u64, i16)> {
        players
            .iter()
            .map(|id| match self {
                Outcome::Winner { winner, .. } if winner == id => (*id, WON),
                Outcome::Winner { loser, .. } if loser == id => (*id, LOST),
                _ => (*id, 0),
            })
            .collect()
    }
}

/// Lower time wins. A player without a time loses to one with a time.
pub fn resolve(a: (u64, Option<f64>), b: (u64, Option<f64>)) -> Outcome {
    match (a.1, b.1) {
        (Some(ta), Some(tb)) if ta < tb => Outcome::Winner { winner: a.0, loser: b.0 },
        (Some(ta), Some(tb)) if tb < ta => Outcome::Winner { winner: b.0, loser: a.0 },
        (Some(_), None) => Outcome::Winner { winner: a.0, loser: b.0 },
        (None, Some(_)) => Outcome::Winner { winner: b.0, loser: a.0 },
        _ => Outcome::Draw,
    }
}

pub fn ready_button_id(duel_id: i32, num: i16) -> String {
    format!("{READY_PREFIX}:{duel_id}:{num}")
}

/// Parse `duel-ready:<duel>:<player number>`.
pub fn parse_ready_button_id(custom_id: &str) -> Option<(i32, i16)> {
    let mut parts = custom_id.split(':');
    if parts.next()? != READY_PREFIX {
        return None;
    }
    let duel_id = parts.next()?.parse().ok()?;
    let num = parts.next()?.parse().ok()?;
    parts.next().is_none().then_some((duel_id, num))
}

pub fn ready_buttons(duel_id: i32, players: &[(i16, bool)]) -> CreateActionRow {
    CreateActionRow::Buttons(
        players
            .iter()
            .map(|(num, ready)| {
                let (label, style, emoji) = if *ready {
                    (format!("Player {num} is ready!"), ButtonStyle::Success, '✔')
                } else {
                    (format!("Player {num} is not ready!"), ButtonStyle::Danger, '✖')
                };
                CreateButton::new(ready_button_id(duel_id, *num))
                    .label(label)
                    .style(style)
                    .emoji(ReactionType::Unicode(emoji.to_string()))
            })
            .collect(),
    )
}

pub fn details(map_code: &str, level: &str, wager: i32, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!(
        "**Details:**\n`Code` {map_code}\n`Level` {level}\n`Wager` {wager}\n`Start` {}{}\n`End` {}{}",
        discord_timestamp(start, 'F'),
        discord_timestamp(start, 'R'),
        discord_timestamp(end, 'F'),
        discord_timestamp(end, 'R'),
    )
}

pub fn standby_notice(start: DateTime<Utc>, opponent: UserId) -> String {
    format!(
        "Standing by until {}{}... Duel will be cancelled if both players do not ready up.\n\nWaiting for Ready Up! {}",
        discord_timestamp(start, 'F'),
        discord_timestamp(start, 'R'),
        Mention::from(opponent),
    )
}

fn result_message(outcome: Outcome, players: &[DuelPlayer], wager: i32) -> String {
    let times: String = players
        .iter()
        .map(|p| {
            let time = p.record.map(pretty_record).unwrap_or_else(|| "No time".to_string());
            format!("{}: {time}\n", Mention::from(UserId::new(p.id())))
        })
        .collect();
    match outcome {
        Outcome::Winner { winner, loser } => format!(
            "**Duel finished!**\n{times}\n{} wins {wager} XP from {}.",
            Mention::from(UserId::new(winner)),
            Mention::from(UserId::new(loser)),
        ),
        Outcome::Draw => format!("**Duel finished in a draw!**\n{times}\nNo XP was exchanged."),
    }
}

async fn post(http: &Http, duel: &DuelRow, content: String) {
    let Some(thread_id) = duel.thread_id else {
        return;
    };
    let channel = ChannelId::new(db::discord_id(thread_id));
    if let Err(e) = channel.send_message(http, CreateMessage::new().content(content)).await {
        error!(duel = duel.id, error = %e, "Failed to post duel update");
    }
}

/// Cancel duels nobody readied up for and settle the ones that ended.
pub async fn sweep(http: &Http, data: &Data) -> Result<(), Error> {
    for duel in db::duels::unready_at_start(&data.db).await? {
        let players = db::duels::players(&data.db, duel.id).await?;
        let ids: Vec<u64> = players.iter().map(DuelPlayer::id).collect();
        db::duels::finish(&data.db, duel.id, &Outcome::Draw.results(&ids), None, duel.wager).await?;
        post(http, &duel, "Duel cancelled: both players did not ready up in time.".to_string()).await;
        info!(duel = duel.id, "Duel cancelled");
    }

    let season = *data.cache.current_season.read().await;
    for duel in db::duels::due_for_result(&data.db).await? {
        let players = db::duels::players(&data.db, duel.id).await?;
        let [first, second] = players.as_slice() else {
            error!(duel = duel.id, players = players.len(), "Duel does not have two players");
            continue;
        };
        let outcome = resolve((first.id(), first.record), (second.id(), second.record));
        let ids = [first.id(), second.id()];
        db::duels::finish(&data.db, duel.id, &outcome.results(&ids), season, duel.wager).await?;
        post(http, &duel, result_message(outcome, &players, duel.wager)).await;
        info!(duel = duel.id, ?outcome, "Duel resolved");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faster_time_wins() {
        assert_eq!(
            resolve((1, Some(30.0)), (2, Some(31.5))),
            Outcome::Winner { winner: 1, loser: 2 }
        );
        assert_eq!(
            resolve((1, Some(40.0)), (2, Some(31.5))),
            Outcome::Winner { winner: 2, loser: 1 }
        );
    }

    #[test]
    fn missing_time_loses() {
        assert_eq!(
            resolve((1, None), (2, Some(99.0))),
            Outcome::Winner { winner: 2, loser: 1 }
        );
        assert_eq!(resolve((1, None), (2, None)), Outcome::Draw);
        assert_eq!(resolve((1, Some(5.0)), (2, Some(5.0))), Outcome::Draw);
    }

    #[test]
    fn results_per_player() {
        let outcome = Outcome::Winner { winner: 2, loser: 1 };
        assert_eq!(outcome.results(&[1, 2]), vec![(1, LOST), (2, WON)]);
        assert_eq!(Outcome::Draw.results(&[1, 2]), vec![(1, 0), (2, 0)]);
    }

    #[test]
    fn ready_button_ids() {
        let id = ready_button_id(12, 2);
        assert_eq!(id, "duel-ready:12:2");
        assert_eq!(parse_ready_button_id(&id), Some((12, 2)));
        assert_eq!(parse_ready_button_id("duel-ready:12"), None);
        assert_eq!(parse_ready_button_id("verify:12:2"), None);
    }
}
