use crate::error::Error;
use serenity::all::{ChannelId, EmojiId, ForumTagId, GuildId, RoleId};

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub database_url: String,
    pub guild_id: Option<GuildId>,
    pub bot_version: String,
    pub channels: Channels,
    pub roles: Roles,
    pub playtest: PlaytestTags,
    pub upvote_emoji_id: Option<EmojiId>,
    pub venture: VentureChannels,
}

/// Channels the bot posts into. Features whose channel is unset are skipped.
#[derive(Debug, Clone, Default)]
pub struct Channels {
    pub verification_queue: Option<ChannelId>,
    pub new_maps: Option<ChannelId>,
    pub records: Option<ChannelId>,
    pub spr_records: Option<ChannelId>,
    pub top_records: Option<ChannelId>,
    pub hall_of_fame: Option<ChannelId>,
    pub tournament_submissions: Option<ChannelId>,
    pub announcements: Option<ChannelId>,
    pub tournament_chat: Option<ChannelId>,
    pub error_log: Option<ChannelId>,
    pub duels_forum: Option<ChannelId>,
    pub playtest_forum: Option<ChannelId>,
}

#[derive(Debug, Clone, Default)]
pub struct Roles {
    pub staff: Option<RoleId>,
    pub organizer: Option<RoleId>,
    pub map_maker: Option<RoleId>,
    pub tag_maker: Option<RoleId>,
    pub time_attack: Option<RoleId>,
    pub mildcore: Option<RoleId>,
    pub hardcore: Option<RoleId>,
    pub bonus: Option<RoleId>,
    pub trifecta: Option<RoleId>,
    pub bracket: Option<RoleId>,
}

#[derive(Debug, Clone, Default)]
pub struct PlaytestTags {
    pub open: Option<ForumTagId>,
    pub closed: Option<ForumTagId>,
}

/// Channels watched for "venture" mentions, split by redirect cooldown.
#[derive(Debug, Clone, Default)]
pub struct VentureChannels {
    pub general: Vec<ChannelId>,
    pub help: Vec<ChannelId>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `DISCORD_TOKEN`: bot token from the Discord Developer Portal
    /// - `DATABASE_URL`, or all of `PSQL_USER`, `PSQL_PASSWORD`, `PSQL_HOST`,
    ///   `PSQL_PORT` and `PSQL_DATABASE`
    ///
    /// Everything else is an optional channel, role, emoji or forum tag ID.
    pub fn from_env() -> Result<Self, Error> {
        let discord_token = std::env::var("DISCORD_TOKEN")
            .map_err(|_| Error::Config("DISCORD_TOKEN environment variable is required".into()))?;

        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) if !url.is_empty() => url,
            _ => database_url_from_parts(|var| std::env::var(var).ok())?,
        };

        let channels = Channels {
            verification_queue: parse_optional_id("VERIFICATION_QUEUE_ID")?,
            new_maps: parse_optional_id("NEW_MAPS_ID")?,
            records: parse_optional_id("RECORDS_ID")?,
            spr_records: parse_optional_id("SPR_RECORDS_ID")?,
            top_records: parse_optional_id("TOP_RECORDS_ID")?,
            hall_of_fame: parse_optional_id("HALL_OF_FAME_ID")?,
            tournament_submissions: parse_optional_id("TOURNAMENT_SUBMISSIONS_ID")?,
            announcements: parse_optional_id("ANNOUNCEMENTS_ID")?,
            tournament_chat: parse_optional_id("TOURNAMENT_CHAT_ID")?,
            error_log: parse_optional_id("ERROR_LOG_ID")?,
            duels_forum: parse_optional_id("DUELS_FORUM_ID")?,
            playtest_forum: parse_optional_id("PLAYTEST_FORUM_ID")?,
        };

        let roles = Roles {
            staff: parse_optional_id("STAFF_ROLE_ID")?,
            organizer: parse_optional_id("ORGANIZER_ROLE_ID")?,
            map_maker: parse_optional_id("MAP_MAKER_ROLE_ID")?,
            tag_maker: parse_optional_id("TAG_MAKER_ROLE_ID")?,
            time_attack: parse_optional_id("TA_ROLE_ID")?,
            mildcore: parse_optional_id("MC_ROLE_ID")?,
            hardcore: parse_optional_id("HC_ROLE_ID")?,
            bonus: parse_optional_id("BO_ROLE_ID")?,
            trifecta: parse_optional_id("TRIFECTA_ROLE_ID")?,
            bracket: parse_optional_id("BRACKET_ROLE_ID")?,
        };

        let playtest = PlaytestTags {
            open: parse_optional_id("PLAYTEST_OPEN_TAG_ID")?,
            closed: parse_optional_id("PLAYTEST_CLOSED_TAG_ID")?,
        };

        let venture = VentureChannels {
            general: parse_id_list("VENTURE_GENERAL_IDS")?,
            help: parse_id_list("VENTURE_HELP_IDS")?,
        };

        Ok(Self {
            discord_token,
            database_url,
            guild_id: parse_optional_id("GUILD_ID")?,
            bot_version: env!("CARGO_PKG_VERSION").to_string(),
            channels,
            roles,
            playtest,
            upvote_emoji_id: parse_optional_id("UPVOTE_EMOJI_ID")?,
            venture,
        })
    }
}

/// Build a Postgres URL from the `PSQL_*` variables.
fn database_url_from_parts(lookup: impl Fn(&str) -> Option<String>) -> Result<String, Error> {
    let get = |var: &str| {
        lookup(var)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Config(format!("DATABASE_URL or {var} must be set")))
    };
    let user = get("PSQL_USER")?;
    let password = get("PSQL_PASSWORD")?;
    let host = get("PSQL_HOST")?;
    let port = get("PSQL_PORT")?;
    let database = get("PSQL_DATABASE")?;

    let mut url = url::Url::parse(&format!("postgres://{host}:{port}/{database}"))
        .map_err(|e| Error::Config(format!("Invalid database settings: {e}")))?;
    url.set_username(&user)
        .and_then(|_| url.set_password(Some(&password)))
        .map_err(|_| Error::Config("Invalid database credentials".into()))?;
    Ok(url.to_string())
}

fn parse_id_list<T>(var: &str) -> Result<Vec<T>, Error>
where
    T: From<u64>,
{
    parse_id_list_value(var, std::env::var(var).ok().as_deref())
}

fn parse_optional_id<T>(var: &str) -> Result<Option<T>, Error>
where
    T: From<u64>,
{
    parse_optional_id_value(var, std::env::var(var).ok().as_deref())
}

fn parse_id_list_value<T>(var: &str, value: Option<&str>) -> Result<Vec<T>, Error>
where
    T: From<u64>,
{
    match value {
        Some(val) if !val.is_empty() => val
            .split(',')
            .map(|s| {
                s.trim()
                    .parse::<u64>()
                    .map(T::from)
                    .map_err(|_| Error::Config(format!("Invalid ID in {var}: '{s}'")))
            })
            .collect(),
        _ => Ok(Vec::new()),
    }
}

fn parse_optional_id_value<T>(var: &str, value: Option<&str>) -> Result<Option<T>, Error>
where
    T: From<u64>,
{
    match value {
        Some(val) if !val.is_empty() => {
            let id = val
                .trim()
                .parse::<u64>()
                .map_err(|_| Error::Config(format!("Invalid ID for {var}: '{val}'")))?;
            Ok(Some(T::from(id)))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parses_comma_separated_ids() {
        let ids: Vec<ChannelId> = parse_id_list_value("X", Some("1, 2,3")).unwrap();
        assert_eq!(ids, vec![ChannelId::new(1), ChannelId::new(2), ChannelId::new(3)]);
    }

    #[test]
    fn empty_list_is_empty() {
        let ids: Vec<ChannelId> = parse_id_list_value("X", Some("")).unwrap();
        assert!(ids.is_empty());
        let ids: Vec<ChannelId> = parse_id_list_value("X", None).unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn rejects_garbage_ids() {
        let err = parse_optional_id_value::<RoleId>("STAFF_ROLE_ID", Some("abc")).unwrap_err();
        assert!(err.to_string().contains("STAFF_ROLE_ID"));
    }

    #[test]
    fn optional_id_parses() {
        let id: Option<GuildId> = parse_optional_id_value("GUILD_ID", Some(" 42 ")).unwrap();
        assert_eq!(id, Some(GuildId::new(42)));
    }

    #[test]
    fn database_url_is_built_from_parts() {
        let vars: HashMap<&str, &str> = [
            ("PSQL_USER", "doom"),
            ("PSQL_PASSWORD", "p@ss"),
            ("PSQL_HOST", "db"),
            ("PSQL_PORT", "5432"),
            ("PSQL_DATABASE", "doom"),
        ]
        .into_iter()
        .collect();
        let url = database_url_from_parts(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(url, "postgres://doom:p%40ss@db:5432/doom");
    }

    #[test]
    fn database_url_requires_every_part() {
        let err = database_url_from_parts(|k| (k != "PSQL_HOST").then(|| "x".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("PSQL_HOST"));
    }
}
