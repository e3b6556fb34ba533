use crate::db;
use crate::db::tournament::XpStanding;
use crate::error::Error;
use crate::tournament::{Category, Rank};
use crate::utils::format::{format_xp, make_ordinal};
use crate::utils::{embeds, paginator::paginate};
use crate::Context;
use poise::CreateReply;
use serenity::all::{CreateEmbed, User};
use std::collections::BTreeMap;

const MAX_LEVEL: u32 = 100;
const PER_PAGE: usize = 10;

/// Level reached with `xp`. Each level costs `5l² + 50l + 100` more XP than
/// the last; the cap is 100.
pub fn find_level(xp: i64) -> u32 {
    let mut total: i64 = 0;
    for level in 0..=MAX_LEVEL {
        let l = i64::from(level);
        total += 5 * l * l + 50 * l + 100;
        if total > xp {
            return level;
        }
    }
    MAX_LEVEL
}

/// Portrait tier for a level: five tiers of 20 levels with five steps each.
pub fn portrait(level: u32) -> (&'static str, u32) {
    if level >= MAX_LEVEL {
        return ("Diamond", 5);
    }
    let step = match (level % 20).div_ceil(4) {
        0 => 1,
        n => n,
    };
    let tier = match level {
        0..=20 => "Bronze",
        21..=39 => "Silver",
        40..=59 => "Gold",
        60..=79 => "Platinum",
        _ => "Diamond",
    };
    (tier, step)
}

pub struct RankCard<'a> {
    pub nickname: &'a str,
    pub avatar_url: String,
    pub standing: &'a XpStanding,
    pub ranks: &'a BTreeMap<Category, Rank>,
    pub wins: i64,
    pub losses: i64,
}

pub fn rank_card_embed(card: &RankCard<'_>) -> CreateEmbed {
    let level = find_level(card.standing.xp);
    let (tier, step) = portrait(level);
    let ranks: String = Category::ALL
        .iter()
        .map(|category| {
            let rank = card.ranks.get(category).copied().unwrap_or(Rank::Unranked);
            format!("`{}` {} {}\n", category.as_str(), rank.as_str(), rank.emoji())
        })
        .collect();

    embeds::tournament_embed()
        .title(format!("{}'s Rank Card", card.nickname))
        .thumbnail(&card.avatar_url)
        .field("XP", format_xp(card.standing.xp), true)
        .field("Level", format!("{level} ({tier} {step})"), true)
        .field(
            "Position",
            make_ordinal(card.standing.position.max(0) as u64),
            true,
        )
        .field("Ranks", ranks, false)
        .field("Duels", format!("{}W - {}L", card.wins, card.losses), false)
}

/// Show your (or someone's) tournament rank card.
#[poise::command(slash_command)]
pub async fn rank(
    ctx: Context<'_>,
    #[description = "Player, yourself if empty"] user: Option<User>,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let data = ctx.data();
    let user = user.as_ref().unwrap_or_else(|| ctx.author());
    let season = data
        .cache
        .current_season
        .read()
        .await
        .ok_or(Error::NoDataOnCurrentSeason)?;

    let standing = db::tournament::xp_standing(&data.db, user.id.get(), season)
        .await?
        .ok_or(Error::NoDataOnCurrentSeason)?;
    let ranks = db::tournament::ranks(&data.db, user.id.get()).await?;
    let (wins, losses) = db::duels::win_loss(&data.db, user.id.get()).await?;
    let nickname = data.cache.nickname(user.id.get()).await;

    let embed = rank_card_embed(&RankCard {
        nickname: &nickname,
        avatar_url: user.face(),
        standing: &standing,
        ranks: &ranks,
        wins,
        losses,
    });
    ctx.send(CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

/// Season XP leaderboard.
#[poise::command(slash_command, rename = "xp-leaderboard")]
pub async fn xp_leaderboard(
    ctx: Context<'_>,
    #[description = "Season number, the current one if empty"] season: Option<i32>,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let data = ctx.data();
    let current = *data.cache.current_season.read().await;
    let Some(season) = season.or(current) else {
        return Err(Error::NoDataOnCurrentSeason);
    };
    let name = db::tournament::seasons(&data.db)
        .await?
        .into_iter()
        .find(|(number, _, _)| *number == season)
        .map(|(_, name, _)| name)
        .unwrap_or_else(|| format!("Season {season}"));

    let standings = db::tournament::xp_leaderboard(&data.db, season).await?;
    if standings.is_empty() {
        ctx.send(
            CreateReply::default()
                .content("The XP Leaderboard for this season is currently empty.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }
    paginate(ctx, xp_pages(&name, &standings), true).await
}

fn xp_pages(season_name: &str, standings: &[XpStanding]) -> Vec<CreateEmbed> {
    standings
        .chunks(PER_PAGE)
        .map(|page| {
            page.iter().fold(
                embeds::tournament_embed().title(format!("XP Leaderboard - {season_name}")),
                |embed, standing| {
                    embed.field(
                        format!(
                            "{} - {}",
                            make_ordinal(standing.position.max(0) as u64),
                            standing.nickname
                        ),
                        format!("XP: {}", format_xp(standing.xp)),
                        false,
                    )
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standing(position: i64, xp: i64) -> XpStanding {
        XpStanding {
            user_id: position,
            nickname: format!("player{position}"),
            xp,
            position,
        }
    }

    #[test]
    fn levels_follow_the_curve() {
        assert_eq!(find_level(0), 0);
        assert_eq!(find_level(99), 0);
        assert_eq!(find_level(100), 1);
        // 100 + 155 = 255 to reach level 2
        assert_eq!(find_level(254), 1);
        assert_eq!(find_level(255), 2);
        assert_eq!(find_level(i64::MAX), MAX_LEVEL);
    }

    #[test]
    fn portraits_step_through_tiers() {
        assert_eq!(portrait(0), ("Bronze", 1));
        assert_eq!(portrait(5), ("Bronze", 2));
        assert_eq!(portrait(20), ("Bronze", 1));
        assert_eq!(portrait(39), ("Silver", 5));
        assert_eq!(portrait(40), ("Gold", 1));
        assert_eq!(portrait(100), ("Diamond", 5));
    }

    #[test]
    fn leaderboard_pages_hold_ten_players() {
        let standings: Vec<XpStanding> = (1..=23).map(|i| standing(i, 5000 - i)).collect();
        let pages = xp_pages("Season One", &standings);
        assert_eq!(pages.len(), 3);

        let first = serde_json::to_value(&pages[0]).unwrap();
        assert_eq!(first["title"], "XP Leaderboard - Season One");
        assert_eq!(first["fields"].as_array().unwrap().len(), 10);
        assert_eq!(first["fields"][0]["name"], "1st - player1");
        assert_eq!(first["fields"][0]["value"], "XP: 4.9k");

        let last = serde_json::to_value(&pages[2]).unwrap();
        assert_eq!(last["fields"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn rank_card_lists_every_category() {
        let mut ranks = BTreeMap::new();
        ranks.insert(Category::Hardcore, Rank::Diamond);
        let standing = standing(3, 1500);
        let embed = rank_card_embed(&RankCard {
            nickname: "pixel",
            avatar_url: "https://cdn/avatar.png".into(),
            standing: &standing,
            ranks: &ranks,
            wins: 4,
            losses: 1,
        });
        let json = serde_json::to_value(embed).unwrap();
        assert_eq!(json["title"], "pixel's Rank Card");
        let fields = json["fields"].as_array().unwrap();
        assert_eq!(fields[0]["value"], "1.5k");
        assert_eq!(fields[2]["value"], "3rd");
        let ranks = fields[3]["value"].as_str().unwrap();
        assert!(ranks.contains("`Time Attack` Unranked"));
        assert!(ranks.contains("`Hardcore` Diamond"));
        assert_eq!(fields[4]["value"], "4W - 1L");
    }
}
