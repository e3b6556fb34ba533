//! Record verification queue: the persistent Verify/Reject buttons, the
//! rejection reason modal and what happens to the submission afterwards.

use crate::db;
use crate::db::records::PendingRecord;
use crate::error::Error;
use crate::utils::embeds;
use crate::utils::time::pretty_record;
use crate::Data;
use serenity::all::{
    ButtonStyle, ChannelId, CreateActionRow, CreateButton, CreateEmbed, CreateEmbedAuthor,
    CreateInputText, CreateMessage, CreateModal, EditMessage, Http, InputTextStyle, Mention,
    MessageId, UserId,
};
use tracing::{info, warn};

pub const VERIFIED: &str = "<:_:1042541867469910056>";
pub const HALF_VERIFIED: &str = "<:_:1042541868723998871>";
pub const UNVERIFIED: &str = "<:_:1042541865821556746>";
pub const PENDING: &str = "⌛";

pub const ACCEPT_ID: &str = "verify:accept";
pub const REJECT_ID: &str = "verify:reject";
const REASON_PREFIX: &str = "verify:reason:";
pub const REASON_INPUT_ID: &str = "reason";

pub const WAITING_TEXT: &str = "⌛ Waiting for verification...";

const ALERT: &str = "Don't like these alerts? Turn it off by using the command `/alerts false`.\n\
                     You can change your display name for records in the bot with the command `/name`!";
const DM_RULE: &str = "`- - - - - - - - - - - - - -`";

/// Submission embed shared by the public post and its queue copy.
/// The screenshot is attached as `image.png`.
pub fn record_embed(
    author: &str,
    avatar_url: String,
    map_code: &str,
    level: &str,
    record: f64,
    video: Option<&str>,
) -> CreateEmbed {
    let mut description = format!(
        "┣ `   Code ` {map_code}\n┣ `  Level ` {level}\n",
    );
    match video {
        Some(video) => description.push_str(&format!(
            "┣ ` Record ` {}\n┗ `  Video ` [Link]({video})\n",
            pretty_record(record)
        )),
        None => description.push_str(&format!("┗ ` Record ` {}\n", pretty_record(record))),
    }
    embeds::doom_embed()
        .title("New Personal Record!")
        .description(description)
        .author(CreateEmbedAuthor::new(author).icon_url(avatar_url))
        .image("attachment://image.png")
}

pub fn queue_buttons() -> CreateActionRow {
    CreateActionRow::Buttons(vec![
        CreateButton::new(ACCEPT_ID)
            .label("Verify")
            .style(ButtonStyle::Success),
        CreateButton::new(REJECT_ID)
            .label("Reject")
            .style(ButtonStyle::Danger),
    ])
}

/// Modal asking for a rejection reason. The queue message id rides along
/// in the custom id so the submit can be matched back to the record.
pub fn reason_modal(queue_message: MessageId) -> CreateModal {
    CreateModal::new(format!("{REASON_PREFIX}{queue_message}"), "Rejection Reason").components(
        vec![CreateActionRow::InputText(CreateInputText::new(
            InputTextStyle::Paragraph,
            "Reason",
            REASON_INPUT_ID,
        ))],
    )
}

pub fn parse_reason_modal_id(custom_id: &str) -> Option<MessageId> {
    custom_id
        .strip_prefix(REASON_PREFIX)?
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(MessageId::new)
}

/// Replacement text for the public submission once a moderator decides.
pub fn verdict_text(verdict: Verdict<'_>, moderator: UserId, has_video: bool) -> String {
    let moderator = Mention::from(moderator);
    match verdict {
        Verdict::Accepted if has_video => format!("{VERIFIED} Complete verification by {moderator}!"),
        Verdict::Accepted => {
            format!("{HALF_VERIFIED} Partial verification by {moderator}! No video proof supplied.")
        }
        Verdict::Rejected { .. } => format!("{UNVERIFIED} Rejected by {moderator}!"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict<'a> {
    Accepted,
    Rejected { reason: &'a str },
}

/// Direct message sent to an alertable submitter.
pub fn alert_text(record: &PendingRecord, verdict: Verdict<'_>, moderator: UserId, jump_url: &str) -> String {
    let moderator = Mention::from(moderator);
    let body = match verdict {
        Verdict::Accepted => {
            let badge = if record.video.is_some() { VERIFIED } else { HALF_VERIFIED };
            format!(
                "**Map Code:** {}\n**Level:** {}\n**Record:** {} {badge}\nVerified by {moderator}!\n{jump_url}\n\n{ALERT}",
                record.map_code,
                record.level_name,
                pretty_record(record.record),
            )
        }
        Verdict::Rejected { reason } => format!(
            "**Map Code:** {}\n**Record:** {}\nYour record got {UNVERIFIED} rejected by {moderator}!\n\n**Reason:** {reason}\n\n{ALERT}",
            record.map_code,
            pretty_record(record.record),
        ),
    };
    format!("{DM_RULE}\n{body}\n{DM_RULE}")
}

/// Apply a moderator's decision to the submission behind a queue message.
pub async fn decide(
    http: &Http,
    data: &Data,
    queue_channel: ChannelId,
    queue_message: MessageId,
    moderator: UserId,
    verdict: Verdict<'_>,
) -> Result<(), Error> {
    let Some(record) = db::records::find_pending(&data.db, queue_message.get()).await? else {
        warn!(queue_message = %queue_message, "No pending record behind queue message");
        return Ok(());
    };

    match verdict {
        Verdict::Accepted => {
            db::records::mark_verified(&data.db, queue_message.get()).await?;
            db::users::increment_verification_count(&data.db, moderator.get()).await?;
        }
        Verdict::Rejected { .. } => {
            db::records::delete_for_level(
                &data.db,
                record.submitter(),
                &record.map_code,
                &record.level_name,
            )
            .await?;
        }
    }

    let public_channel = ChannelId::new(db::discord_id(record.channel_id));
    let public_message = MessageId::new(db::discord_id(record.message_id));
    let edit = EditMessage::new().content(verdict_text(verdict, moderator, record.video.is_some()));
    if let Err(e) = public_channel.edit_message(http, public_message, edit).await {
        warn!(message = %public_message, error = %e, "Public submission is gone, skipping edit");
    }

    let alertable = data
        .cache
        .user(record.submitter())
        .await
        .map_or(true, |u| u.alertable);
    if alertable {
        let jump_url = public_message.link(public_channel, data.config.guild_id);
        let dm = CreateMessage::new().content(alert_text(&record, verdict, moderator, &jump_url));
        if let Err(e) = UserId::new(record.submitter()).direct_message(http, dm).await {
            info!(user = record.user_id, error = %e, "Could not DM verification result");
        }
    }

    queue_channel.delete_message(http, queue_message).await?;

    info!(
        user = record.user_id,
        map_code = %record.map_code,
        level = %record.level_name,
        moderator = %moderator,
        accepted = matches!(verdict, Verdict::Accepted),
        "Record verification decided"
    );
    Ok(())
}

impl PendingRecord {
    pub fn submitter(&self) -> u64 {
        db::discord_id(self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(video: Option<&str>) -> PendingRecord {
        PendingRecord {
            user_id: 10,
            map_code: "ABCDE".into(),
            level_name: "Level 1".into(),
            record: 65.25,
            video: video.map(str::to_string),
            message_id: 20,
            channel_id: 30,
        }
    }

    #[test]
    fn verdict_text_depends_on_video() {
        let moderator = UserId::new(5);
        assert_eq!(
            verdict_text(Verdict::Accepted, moderator, true),
            format!("{VERIFIED} Complete verification by <@5>!")
        );
        assert!(verdict_text(Verdict::Accepted, moderator, false).ends_with("No video proof supplied."));
        assert_eq!(
            verdict_text(Verdict::Rejected { reason: "blurry" }, moderator, true),
            format!("{UNVERIFIED} Rejected by <@5>!")
        );
    }

    #[test]
    fn accepted_alert_links_the_submission() {
        let text = alert_text(&pending(None), Verdict::Accepted, UserId::new(5), "https://discord.com/x");
        assert!(text.starts_with(DM_RULE));
        assert!(text.ends_with(DM_RULE));
        assert!(text.contains("**Record:** 1:05.25"));
        assert!(text.contains(HALF_VERIFIED));
        assert!(text.contains("https://discord.com/x"));
        assert!(text.contains("/alerts false"));
    }

    #[test]
    fn rejected_alert_carries_the_reason() {
        let text = alert_text(
            &pending(Some("https://youtu.be/x")),
            Verdict::Rejected { reason: "cut off timer" },
            UserId::new(5),
            "",
        );
        assert!(text.contains("**Reason:** cut off timer"));
        assert!(!text.contains("**Level:**"));
    }

    #[test]
    fn reason_modal_ids_round_trip() {
        assert_eq!(parse_reason_modal_id("verify:reason:42"), Some(MessageId::new(42)));
        assert_eq!(parse_reason_modal_id("verify:reason:0"), None);
        assert_eq!(parse_reason_modal_id("verify:accept"), None);
    }

    #[test]
    fn record_embed_lists_the_video_when_present() {
        let embed = record_embed("nebula", String::new(), "ABCDE", "Level 1", 5.5, Some("https://v"));
        let json = serde_json::to_value(&embed).unwrap();
        let description = json["description"].as_str().unwrap();
        assert!(description.contains("[Link](https://v)"));
        assert!(description.contains("5.50"));
    }
}
