use crate::db;
use crate::error::Error;
use crate::utils::embeds::{self, Colors};
use crate::Data;
use serenity::all::{
    ChannelId, Context, CreateEmbed, CreateMessage, EditMessage, Message, MessageId, Reaction,
    ReactionType,
};
use tracing::info;

/// Upvotes a record needs before it is copied to the top-records channel.
pub const TOP_RECORD_THRESHOLD: i64 = 10;

/// Count record upvotes and mirror popular runs into the top-records channel.
pub async fn on_reaction_add(ctx: &Context, reaction: &Reaction, data: &Data) -> Result<(), Error> {
    let Some(upvote) = data.config.upvote_emoji_id else {
        return Ok(());
    };
    if !matches!(&reaction.emoji, ReactionType::Custom { id, .. } if *id == upvote) {
        return Ok(());
    }
    let record_channels = [data.config.channels.records, data.config.channels.spr_records];
    if !record_channels.contains(&Some(reaction.channel_id)) {
        return Ok(());
    }
    let Some(user_id) = reaction.user_id else {
        return Ok(());
    };
    if user_id == ctx.cache.current_user().id {
        return Ok(());
    }
    let Some(top_channel) = data.config.channels.top_records else {
        return Ok(());
    };

    let message_id = reaction.message_id.get();
    if !db::records::is_record_message(&data.db, message_id).await? {
        return Ok(());
    }
    if !db::top_records::add_vote(&data.db, user_id.get(), message_id, reaction.channel_id.get())
        .await?
    {
        return Ok(());
    }
    let count = db::top_records::vote_count(&data.db, message_id).await?;
    if count < TOP_RECORD_THRESHOLD {
        return Ok(());
    }
    let content = vote_line(count, reaction.channel_id);

    if db::top_records::claim_promotion(&data.db, message_id).await? {
        let posted = async {
            let original = reaction.message(ctx).await?;
            let copy = top_channel
                .send_message(ctx, CreateMessage::new().content(content).embed(gold_copy(&original)))
                .await?;
            db::top_records::set_top_record_id(&data.db, message_id, copy.id.get()).await?;
            Ok::<_, Error>(())
        }
        .await;
        if let Err(e) = posted {
            db::top_records::release_promotion(&data.db, message_id).await?;
            return Err(e);
        }
        info!(message = message_id, votes = count, "Record promoted to top records");
        return Ok(());
    }

    // None while another vote is still posting the copy.
    if let Some(id) = db::top_records::top_record_id(&data.db, message_id).await? {
        top_channel
            .edit_message(ctx, MessageId::new(id), EditMessage::new().content(content))
            .await?;
    }
    Ok(())
}

/// `12 <emoji> #channel`, with the emoji growing with the vote count.
fn vote_line(count: i64, channel: ChannelId) -> String {
    let emoji = match count {
        ..=4 => "<:upper:929871697555914752>",
        5..=9 => "<:ds2:873791529876082758>",
        10..=14 => "<:ds3:873791529926414336>",
        _ => "<:ds4:873791530018701312>",
    };
    format!("{count} {emoji} <#{channel}>")
}

/// Gold copy of the record's embed with a jump link back to it.
fn gold_copy(original: &Message) -> CreateEmbed {
    let embed = match original.embeds.first() {
        Some(embed) => CreateEmbed::from(embed.clone()).color(Colors::GOLD),
        None => embeds::gold_embed().description(original.content.clone()),
    };
    embed.field("Original", format!("[Jump!]({})", original.link()), false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_emoji_grows_with_votes() {
        let channel = ChannelId::new(5);
        assert_eq!(vote_line(10, channel), "10 <:ds3:873791529926414336> <#5>");
        assert_eq!(vote_line(15, channel), "15 <:ds4:873791530018701312> <#5>");
        assert!(vote_line(3, channel).contains("upper"));
    }
}
