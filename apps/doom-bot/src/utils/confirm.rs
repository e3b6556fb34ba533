use crate::error::Error;
use crate::Context;
use poise::{CreateReply, ReplyHandle};
use serenity::all::{
    ButtonStyle, ComponentInteractionCollector, CreateActionRow, CreateButton,
    CreateInteractionResponse, CreateInteractionResponseMessage,
};
use std::time::Duration;

const CONFIRM_TIMEOUT: Duration = Duration::from_secs(120);

/// Send `reply` with Confirm/Reject buttons and wait for the invoking user.
///
/// Returns whether the user confirmed, plus the handle so callers can edit
/// or link the message afterwards. Buttons are removed either way; embeds
/// stay only when confirmed.
pub async fn confirm<'a>(
    ctx: Context<'a>,
    reply: CreateReply,
    confirmed_content: &str,
) -> Result<(bool, ReplyHandle<'a>), Error> {
    let confirm_id = format!("{}-confirm", ctx.id());
    let reject_id = format!("{}-reject", ctx.id());

    let buttons = CreateActionRow::Buttons(vec![
        CreateButton::new(&confirm_id)
            .label("Confirm")
            .style(ButtonStyle::Success),
        CreateButton::new(&reject_id)
            .label("Reject")
            .style(ButtonStyle::Danger),
    ]);
    let embeds = reply.embeds.clone();
    let handle = ctx.send(reply.components(vec![buttons])).await?;
    let message_id = handle.message().await?.id;

    let mut confirmed = None;
    while let Some(mci) = ComponentInteractionCollector::new(ctx)
        .message_id(message_id)
        .timeout(CONFIRM_TIMEOUT)
        .await
    {
        if mci.user.id != ctx.author().id {
            let response = CreateInteractionResponseMessage::new()
                .content("You are not allowed to confirm this.")
                .ephemeral(true);
            mci.create_response(ctx, CreateInteractionResponse::Message(response))
                .await?;
            continue;
        }
        mci.create_response(ctx, CreateInteractionResponse::Acknowledge)
            .await?;
        if mci.data.custom_id == confirm_id {
            confirmed = Some(true);
            break;
        }
        if mci.data.custom_id == reject_id {
            confirmed = Some(false);
            break;
        }
    }

    let content = match confirmed {
        Some(true) => confirmed_content,
        Some(false) => "Not confirmed. Nothing was changed.",
        None => "Timed out. Nothing was changed.",
    };
    let mut edit = CreateReply::default().content(content).components(Vec::new());
    if confirmed == Some(true) {
        edit.embeds = embeds;
    }
    handle.edit(ctx, edit).await?;

    Ok((confirmed == Some(true), handle))
}
