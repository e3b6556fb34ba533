use serenity::all::{CreateEmbed, CreateEmbedFooter, Timestamp};

/// Doom brand colors used across all bot embeds.
pub struct Colors;

impl Colors {
    pub const DOOM: u32 = 0xFF0000;
    pub const WARNING: u32 = 0xFFD700;
    pub const ERROR: u32 = 0xFF4444;
    pub const GOLD: u32 = 0xF1C40F;
    pub const TOURNAMENT: u32 = 0x5865F2;
    pub const GYM: u32 = 0x2ECC71;
}

/// Embed thumbnail shown on record and map posts.
pub const THUMBNAIL_URL: &str = "https://i.imgur.com/qhcwGOY.png";

/// Create a standard Doom-themed embed with default color, footer, and timestamp.
pub fn doom_embed() -> CreateEmbed {
    base_embed(Colors::DOOM)
}

/// Embed for mistakes the user can fix themselves (gold).
pub fn warning_embed() -> CreateEmbed {
    base_embed(Colors::WARNING)
}

/// Create an error-themed embed (red).
pub fn error_embed() -> CreateEmbed {
    base_embed(Colors::ERROR)
}

/// Hall-of-records copies of upvoted runs.
pub fn gold_embed() -> CreateEmbed {
    base_embed(Colors::GOLD)
}

pub fn tournament_embed() -> CreateEmbed {
    base_embed(Colors::TOURNAMENT)
}

pub fn gym_embed() -> CreateEmbed {
    base_embed(Colors::GYM)
}

fn base_embed(color: u32) -> CreateEmbed {
    CreateEmbed::default()
        .color(color)
        .footer(CreateEmbedFooter::new("Doom Bot \u{2022} Overwatch Parkour"))
        .timestamp(Timestamp::now())
}
