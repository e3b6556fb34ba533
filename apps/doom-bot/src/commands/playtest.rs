use super::autocomplete;
use crate::error::Error;
use crate::tournament::Category;
use crate::utils::validate;
use crate::{Context, Data};
use poise::CreateReply;
use serenity::all::{
    ButtonStyle, ChannelId, ComponentInteraction, CreateActionRow, CreateButton, CreateForumPost,
    CreateInteractionResponse, CreateInteractionResponseMessage, CreateMessage, EditThread,
    ForumTag, ForumTagId, Http, Mentionable, MessageId,
};
use tracing::{info, warn};

const FINISH_PREFIX: &str = "playtest:finish:";
const OPEN_TAG: &str = "Open";
const CLOSED_TAG: &str = "Closed";

/// Custom id of the persistent finish button, bound to the submitter.
pub fn finish_button_id(user_id: u64) -> String {
    format!("{FINISH_PREFIX}{user_id}")
}

pub fn parse_finish_button_id(custom_id: &str) -> Option<u64> {
    custom_id.strip_prefix(FINISH_PREFIX)?.parse().ok()
}

fn finish_button(user_id: u64) -> CreateActionRow {
    CreateActionRow::Buttons(vec![CreateButton::new(finish_button_id(user_id))
        .label("Finish Playtesting")
        .style(ButtonStyle::Danger)
        .emoji('👍')])
}

fn tag_named(tags: &[ForumTag], name: &str) -> Option<ForumTagId> {
    tags.iter().find(|tag| tag.name == name).map(|tag| tag.id)
}

async fn forum_tags(http: &Http, forum: ChannelId) -> Result<Vec<ForumTag>, Error> {
    Ok(forum
        .to_channel(http)
        .await?
        .guild()
        .map(|channel| channel.available_tags)
        .unwrap_or_default())
}

pub fn post_title(map_code: &str, level_name: &str, nickname: &str, map_name: &str) -> String {
    format!("{map_code} - {level_name} by {nickname} [{map_name}]")
}

/// Submit a level into playtesting.
#[poise::command(slash_command, rename = "submit-playtest")]
pub async fn submit_playtest(
    ctx: Context<'_>,
    #[description = "Workshop code"] map_code: String,
    #[description = "Map name"]
    #[autocomplete = "autocomplete::map_names"]
    map_name: String,
    #[description = "Category"] category: Category,
    #[description = "Level name"] level_name: String,
) -> Result<(), Error> {
    let data = ctx.data();
    let map_code = validate::normalize_map_code(&map_code)?;
    let map_name = validate::map_name(&data.cache, &map_name).await?;
    let forum = data
        .config
        .channels
        .playtest_forum
        .ok_or_else(|| Error::Config("PLAYTEST_FORUM_ID is not set".into()))?;

    ctx.send(
        CreateReply::default()
            .content("Sending to playtest. Please wait.")
            .ephemeral(true),
    )
    .await?;

    let user_id = ctx.author().id.get();
    let nickname = data.cache.nickname(user_id).await;
    let tags = forum_tags(ctx.http(), forum).await?;
    let applied: Vec<ForumTagId> = [
        tag_named(&tags, category.as_str()),
        data.config.playtest.open.or_else(|| tag_named(&tags, OPEN_TAG)),
    ]
    .into_iter()
    .flatten()
    .collect();

    let post = CreateForumPost::new(
        post_title(&map_code, level_name.trim(), &nickname, &map_name),
        CreateMessage::new()
            .content(format!(
                "{}, please add any additional information here.\n",
                ctx.author().mention()
            ))
            .components(vec![finish_button(user_id)]),
    )
    .set_applied_tags(applied);
    let thread = forum.create_forum_post(ctx, post).await?;

    // The starter message of a forum post shares the thread's id.
    if let Err(e) = thread.id.pin(ctx, MessageId::new(thread.id.get())).await {
        warn!(thread = %thread.name, error = %e, "Failed to pin playtest message");
    }
    info!(user = %nickname, map_code = %map_code, level = %level_name, "Playtest submitted");
    Ok(())
}

/// Close a playtest thread from its finish button.
pub async fn finish(
    http: &Http,
    data: &Data,
    mci: &ComponentInteraction,
    owner: u64,
) -> Result<(), Error> {
    if mci.user.id.get() != owner {
        let response = CreateInteractionResponseMessage::new()
            .content("Only the submitter can finish this playtest.")
            .ephemeral(true);
        mci.create_response(http, CreateInteractionResponse::Message(response))
            .await?;
        return Ok(());
    }

    let response = CreateInteractionResponseMessage::new().content("Closing playtest.");
    mci.create_response(http, CreateInteractionResponse::Message(response))
        .await?;

    let Some(thread) = mci.channel_id.to_channel(http).await?.guild() else {
        return Ok(());
    };
    let forum_tags = match thread.parent_id {
        Some(parent) => forum_tags(http, parent).await?,
        None => Vec::new(),
    };
    let open = data.config.playtest.open.or_else(|| tag_named(&forum_tags, OPEN_TAG));
    let closed = data.config.playtest.closed.or_else(|| tag_named(&forum_tags, CLOSED_TAG));
    let tags = closed_tags(&thread.applied_tags, open, closed);

    mci.channel_id
        .edit_thread(
            http,
            EditThread::new().applied_tags(tags).locked(true).archived(true),
        )
        .await?;
    info!(thread = %thread.name, "Playtest finished");
    Ok(())
}

/// Applied tags with Open swapped for Closed.
fn closed_tags(
    applied: &[ForumTagId],
    open: Option<ForumTagId>,
    closed: Option<ForumTagId>,
) -> Vec<ForumTagId> {
    let mut tags: Vec<ForumTagId> = applied
        .iter()
        .copied()
        .filter(|tag| Some(*tag) != open && Some(*tag) != closed)
        .collect();
    tags.extend(closed);
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_button_id_carries_the_submitter() {
        let id = finish_button_id(1234);
        assert_eq!(id, "playtest:finish:1234");
        assert_eq!(parse_finish_button_id(&id), Some(1234));
        assert_eq!(parse_finish_button_id("duel:ready:1:1"), None);
        assert_eq!(parse_finish_button_id("playtest:finish:abc"), None);
    }

    #[test]
    fn open_is_swapped_for_closed() {
        let category = ForumTagId::new(10);
        let open = ForumTagId::new(20);
        let closed = ForumTagId::new(30);
        assert_eq!(
            closed_tags(&[category, open], Some(open), Some(closed)),
            vec![category, closed]
        );
        assert_eq!(closed_tags(&[category, open], Some(open), None), vec![category]);
    }

    #[test]
    fn post_title_names_map_and_author() {
        assert_eq!(
            post_title("ABC12", "Level 3", "pixel", "Hanamura"),
            "ABC12 - Level 3 by pixel [Hanamura]"
        );
    }
}
