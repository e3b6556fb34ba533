use crate::config::Config;
use crate::error::Error;
use crate::Data;
use serenity::all::{ChannelId, Context, Message};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

const GENERAL_COOLDOWN: Duration = Duration::from_secs(10 * 60);
const HELP_COOLDOWN: Duration = Duration::from_secs(6 * 60);

const VENTURE_REDIRECT: &str = "### Hey there!\n\
    We'd love for you to stay and enjoy **Doomfist Parkour** with us but \
    if you'd like to chat about **Venture Parkour**, \
    you may want to visit the **Venture Parkour** server!\n\n\
    https://discord.gg/qe4wyUfYBU";

/// Point "venture" chatter at the Venture Parkour server, at most once per
/// cooldown per channel.
pub async fn on_message(ctx: &Context, message: &Message, data: &Data) -> Result<(), Error> {
    if message.author.bot || !message.content.to_lowercase().contains("venture") {
        return Ok(());
    }
    let Some(cooldown) = cooldown_for(&data.config, message.channel_id) else {
        return Ok(());
    };
    let allowed = {
        let mut last_sent = data.venture_cooldowns.lock().await;
        take_slot(&mut last_sent, message.channel_id, Instant::now(), cooldown)
    };
    if allowed {
        message.channel_id.say(ctx, VENTURE_REDIRECT).await?;
        debug!(channel = %message.channel_id, "Venture redirect sent");
    }
    Ok(())
}

/// Help and record channels cool down faster than general chat.
fn cooldown_for(config: &Config, channel: ChannelId) -> Option<Duration> {
    let records = [config.channels.records, config.channels.spr_records];
    if config.venture.general.contains(&channel) {
        Some(GENERAL_COOLDOWN)
    } else if config.venture.help.contains(&channel) || records.contains(&Some(channel)) {
        Some(HELP_COOLDOWN)
    } else {
        None
    }
}

/// Claim the channel's slot if its cooldown has passed.
fn take_slot(
    last_sent: &mut HashMap<ChannelId, Instant>,
    channel: ChannelId,
    now: Instant,
    cooldown: Duration,
) -> bool {
    match last_sent.get(&channel) {
        Some(previous) if now.duration_since(*previous) < cooldown => false,
        _ => {
            last_sent.insert(channel, now);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Channels, PlaytestTags, Roles, VentureChannels};

    fn config() -> Config {
        Config {
            discord_token: String::new(),
            database_url: String::new(),
            guild_id: None,
            bot_version: "test".into(),
            channels: Channels {
                records: Some(ChannelId::new(30)),
                ..Default::default()
            },
            roles: Roles::default(),
            playtest: PlaytestTags::default(),
            upvote_emoji_id: None,
            venture: VentureChannels {
                general: vec![ChannelId::new(10)],
                help: vec![ChannelId::new(20)],
            },
        }
    }

    #[test]
    fn cooldowns_depend_on_the_channel() {
        let config = config();
        assert_eq!(cooldown_for(&config, ChannelId::new(10)), Some(GENERAL_COOLDOWN));
        assert_eq!(cooldown_for(&config, ChannelId::new(20)), Some(HELP_COOLDOWN));
        assert_eq!(cooldown_for(&config, ChannelId::new(30)), Some(HELP_COOLDOWN));
        assert_eq!(cooldown_for(&config, ChannelId::new(40)), None);
    }

    #[test]
    fn one_redirect_per_cooldown() {
        let mut last_sent = HashMap::new();
        let channel = ChannelId::new(10);
        let start = Instant::now();
        assert!(take_slot(&mut last_sent, channel, start, HELP_COOLDOWN));
        assert!(!take_slot(&mut last_sent, channel, start + Duration::from_secs(60), HELP_COOLDOWN));
        assert!(take_slot(&mut last_sent, ChannelId::new(11), start, HELP_COOLDOWN));
        assert!(take_slot(&mut last_sent, channel, start + HELP_COOLDOWN, HELP_COOLDOWN));
    }
}
