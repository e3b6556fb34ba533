//! Tournament domain types, announcement embeds and the end-of-round
//! pipeline (XP, spreadsheet, hall of fame).

pub mod lifecycle;
pub mod spreadsheet;
pub mod xp;

use crate::config::Roles;
use crate::utils::time::discord_timestamp;
use chrono::{DateTime, Utc};
use serenity::all::{CreateEmbed, CreateEmbedFooter, Mentionable, RoleId, Timestamp};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const TOURNAMENT_TITLE: &str = "Doomfist Parkour Tournament";

const ASSETS_URL: &str = "https://bkan0n.com/assets/images";

/// A leaderboard category of a round.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, poise::ChoiceParameter,
)]
pub enum Category {
    #[name = "Time Attack"]
    TimeAttack,
    Mildcore,
    Hardcore,
    Bonus,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::TimeAttack,
        Category::Mildcore,
        Category::Hardcore,
        Category::Bonus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::TimeAttack => "Time Attack",
            Category::Mildcore => "Mildcore",
            Category::Hardcore => "Hardcore",
            Category::Bonus => "Bonus",
        }
    }

    /// Divisor applied to the gap to the top time when scoring leaderboard XP.
    pub fn xp_multiplier(&self) -> f64 {
        match self {
            Category::TimeAttack => 0.14094,
            Category::Mildcore | Category::Bonus => 0.3654,
            Category::Hardcore => 0.8352,
        }
    }

    pub fn color(&self) -> u32 {
        match self {
            Category::TimeAttack => 0xCAFFD0,
            Category::Mildcore => 0xEE6C4D,
            Category::Hardcore => 0xDB2B39,
            Category::Bonus => 0xAD1457,
        }
    }

    pub fn role(&self, roles: &Roles) -> Option<RoleId> {
        match self {
            Category::TimeAttack => roles.time_attack,
            Category::Mildcore => roles.mildcore,
            Category::Hardcore => roles.hardcore,
            Category::Bonus => roles.bonus,
        }
    }
}

/// Skill tier a player is ranked at, per category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, poise::ChoiceParameter,
)]
pub enum Rank {
    Unranked,
    Gold,
    Diamond,
    Grandmaster,
}

impl Rank {
    /// Highest tier first, the order results are published in.
    pub const ALL: [Rank; 4] = [Rank::Grandmaster, Rank::Diamond, Rank::Gold, Rank::Unranked];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Unranked => "Unranked",
            Rank::Gold => "Gold",
            Rank::Diamond => "Diamond",
            Rank::Grandmaster => "Grandmaster",
        }
    }

    /// Custom server emoji shown next to ranked players.
    pub fn emoji(&self) -> &'static str {
        match self {
            Rank::Unranked => "",
            Rank::Gold => "<:gold:931317421862699118>",
            Rank::Diamond => "<:diamond:931317455639445524>",
            Rank::Grandmaster => "<:grandmaster:931317469396729876>",
        }
    }
}

/// Category a mission belongs to. `General` missions span the whole round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, poise::ChoiceParameter)]
pub enum MissionCategory {
    #[name = "Time Attack"]
    TimeAttack,
    Mildcore,
    Hardcore,
    Bonus,
    General,
}

impl MissionCategory {
    pub const ALL: [MissionCategory; 5] = [
        MissionCategory::General,
        MissionCategory::TimeAttack,
        MissionCategory::Mildcore,
        MissionCategory::Hardcore,
        MissionCategory::Bonus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self.category() {
            Some(category) => category.as_str(),
            None => "General",
        }
    }

    pub fn category(&self) -> Option<Category> {
        match self {
            MissionCategory::TimeAttack => Some(Category::TimeAttack),
            MissionCategory::Mildcore => Some(Category::Mildcore),
            MissionCategory::Hardcore => Some(Category::Hardcore),
            MissionCategory::Bonus => Some(Category::Bonus),
            MissionCategory::General => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, poise::ChoiceParameter)]
pub enum MissionDifficulty {
    Easy,
    Medium,
    Hard,
    Expert,
    General,
}

impl MissionDifficulty {
    pub const ALL: [MissionDifficulty; 5] = [
        MissionDifficulty::Easy,
        MissionDifficulty::Medium,
        MissionDifficulty::Hard,
        MissionDifficulty::Expert,
        MissionDifficulty::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MissionDifficulty::Easy => "Easy",
            MissionDifficulty::Medium => "Medium",
            MissionDifficulty::Hard => "Hard",
            MissionDifficulty::Expert => "Expert",
            MissionDifficulty::General => "General",
        }
    }

    pub fn points(&self) -> i64 {
        match self {
            MissionDifficulty::Easy => 500,
            MissionDifficulty::Medium => 1000,
            MissionDifficulty::Hard => 1500,
            MissionDifficulty::Expert | MissionDifficulty::General => 2000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, poise::ChoiceParameter)]
pub enum MissionType {
    #[name = "XP Threshold"]
    XpThreshold,
    #[name = "Mission Threshold"]
    MissionThreshold,
    #[name = "Top Placement"]
    TopPlacement,
    #[name = "Sub Time"]
    SubTime,
    Completion,
}

impl MissionType {
    pub const ALL: [MissionType; 5] = [
        MissionType::XpThreshold,
        MissionType::MissionThreshold,
        MissionType::TopPlacement,
        MissionType::SubTime,
        MissionType::Completion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MissionType::XpThreshold => "XP Threshold",
            MissionType::MissionThreshold => "Mission Threshold",
            MissionType::TopPlacement => "Top Placement",
            MissionType::SubTime => "Sub Time",
            MissionType::Completion => "Completion",
        }
    }

    /// Types that only make sense for the round-wide general mission.
    pub fn is_general(&self) -> bool {
        matches!(
            self,
            MissionType::XpThreshold | MissionType::MissionThreshold | MissionType::TopPlacement
        )
    }
}

macro_rules! text_enum {
    ($($ty:ty),*) => {$(
        impl FromStr for $ty {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL.into_iter().find(|v| v.as_str() == s).ok_or(())
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    )*};
}

text_enum!(Category, Rank, MissionCategory, MissionDifficulty, MissionType);

/// Map played in one category of a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMap {
    pub code: String,
    pub level: String,
    pub creator: String,
}

/// A scheduled, running or finished round.
#[derive(Debug, Clone)]
pub struct TournamentData {
    pub id: i32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub bracket: bool,
    pub maps: BTreeMap<Category, CategoryMap>,
}

impl TournamentData {
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.maps.keys().copied()
    }

    /// Category roles in play plus the trifecta role.
    pub fn mention_roles(&self, roles: &Roles) -> Vec<RoleId> {
        self.categories()
            .filter_map(|c| c.role(roles))
            .chain(roles.trifecta)
            .collect()
    }

    pub fn mentions(&self, roles: &Roles) -> String {
        self.mention_roles(roles)
            .iter()
            .map(|r| r.mention().to_string())
            .collect()
    }

    pub fn dates(&self) -> String {
        format!(
            "**Start:**\n{}\n{}\n**End:**\n{}\n{}",
            discord_timestamp(self.start, 'R'),
            discord_timestamp(self.start, 'F'),
            discord_timestamp(self.end, 'R'),
            discord_timestamp(self.end, 'F'),
        )
    }

    fn map_info(&self, roles: &Roles) -> String {
        let mut out = String::new();
        for (category, map) in &self.maps {
            let heading = category
                .role(roles)
                .map(|r| r.mention().to_string())
                .unwrap_or_else(|| format!("**{category}**"));
            out.push_str(&format!(
                "{heading}\n**Code:** {}\n**Level:** {}\n**Creator:** {}\n",
                map.code, map.level, map.creator
            ));
        }
        out
    }

    pub fn start_embed(&self, roles: &Roles) -> CreateEmbed {
        base_embed(
            format!("{}\n\n{}", self.map_info(roles), self.dates()),
            Banner::Start,
        )
    }
}

/// Which banner image a tournament embed carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner {
    Start,
    End,
    Announcement,
    Leaderboard,
    HallOfFame,
    Missions,
}

impl Banner {
    fn slug(&self) -> &'static str {
        match self {
            Banner::Start => "start",
            Banner::End => "end",
            Banner::Announcement => "announcement",
            Banner::Leaderboard => "leaderboard",
            Banner::HallOfFame => "hall_of_fame",
            Banner::Missions => "missions",
        }
    }
}

pub fn base_embed(description: impl Into<String>, banner: Banner) -> CreateEmbed {
    CreateEmbed::default()
        .title(TOURNAMENT_TITLE)
        .description(description)
        .thumbnail(format!("{ASSETS_URL}/icons/gold_cup.png"))
        .image(format!(
            "{ASSETS_URL}/icons/tournament_{}_banner.png",
            banner.slug()
        ))
        .color(crate::utils::embeds::Colors::GOLD)
        .footer(CreateEmbedFooter::new("Doom Bot \u{2022} Overwatch Parkour"))
        .timestamp(Timestamp::now())
}

pub fn leaderboard_embed(
    description: impl Into<String>,
    category: Category,
    rank: Option<Rank>,
) -> CreateEmbed {
    let mut embed = base_embed(description, Banner::Leaderboard)
        .color(category.color())
        .image(format!(
            "{ASSETS_URL}/tournament/{}.png",
            category.as_str().to_lowercase().replace(' ', "_")
        ));
    if let Some(rank) = rank {
        embed = embed.thumbnail(format!(
            "{ASSETS_URL}/icons/{}.png",
            rank.as_str().to_lowercase()
        ));
    }
    embed
}

pub fn announcement_embed(text: impl Into<String>) -> CreateEmbed {
    base_embed(text, Banner::Announcement)
}

pub fn missions_embed(text: impl Into<String>) -> CreateEmbed {
    base_embed(text, Banner::Missions)
}

pub fn end_embed() -> CreateEmbed {
    base_embed(
        "**The round has ended!**\nStay tuned for the next announcement!\n\n",
        Banner::End,
    )
}

pub fn hall_of_fame_embed() -> CreateEmbed {
    base_embed("", Banner::HallOfFame).title(format!("{TOURNAMENT_TITLE} Hall of Fame - Top 3"))
}

/// One published mission line, e.g. `- Hard: Get sub 1:05.20`.
pub fn format_mission(difficulty: MissionDifficulty, mission_type: MissionType, target: f64) -> String {
    let goal = match mission_type {
        MissionType::XpThreshold => format!("Get {} XP (excluding this mission)", target as i64),
        MissionType::MissionThreshold => format!("Complete {} missions", target as i64),
        MissionType::TopPlacement => format!("Get Top 3 in {} categories.", target as i64),
        MissionType::SubTime => format!("Get sub {}", crate::utils::time::pretty_record(target)),
        MissionType::Completion => "Complete the level.".to_string(),
    };
    format!("- {difficulty}: {goal}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn names_round_trip_through_text() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert_eq!("Top Placement".parse::<MissionType>(), Ok(MissionType::TopPlacement));
        assert_eq!("General".parse::<MissionCategory>(), Ok(MissionCategory::General));
        assert!("Platinum".parse::<Rank>().is_err());
    }

    #[test]
    fn general_mission_types() {
        assert!(MissionType::XpThreshold.is_general());
        assert!(!MissionType::SubTime.is_general());
        assert!(!MissionType::Completion.is_general());
    }

    #[test]
    fn mentions_cover_categories_in_play_and_trifecta() {
        let roles = Roles {
            time_attack: Some(RoleId::new(1)),
            hardcore: Some(RoleId::new(3)),
            bonus: Some(RoleId::new(4)),
            trifecta: Some(RoleId::new(9)),
            ..Roles::default()
        };
        let map = CategoryMap {
            code: "ABCDE".into(),
            level: "Level 1".into(),
            creator: "nebula".into(),
        };
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let tournament = TournamentData {
            id: 1,
            start,
            end: start + chrono::Duration::days(7),
            bracket: false,
            maps: [(Category::Hardcore, map.clone()), (Category::TimeAttack, map)]
                .into_iter()
                .collect(),
        };
        assert_eq!(
            tournament.mention_roles(&roles),
            vec![RoleId::new(1), RoleId::new(3), RoleId::new(9)]
        );
        assert_eq!(tournament.mentions(&roles), "<@&1><@&3><@&9>");
    }

    #[test]
    fn mission_lines() {
        assert_eq!(
            format_mission(MissionDifficulty::Hard, MissionType::SubTime, 65.2),
            "- Hard: Get sub 1:05.20"
        );
        assert_eq!(
            format_mission(MissionDifficulty::General, MissionType::TopPlacement, 2.0),
            "- General: Get Top 3 in 2 categories."
        );
    }
}
