use crate::error::Error;
use crate::Context;
use poise::CreateReply;
use serenity::all::{
    ButtonStyle, ComponentInteractionCollector, CreateActionRow, CreateButton, CreateEmbed,
    CreateInteractionResponse,
};
use std::time::Duration;

const PAGE_TIMEOUT: Duration = Duration::from_secs(300);

/// Send embeds one page at a time with previous/next buttons.
pub async fn paginate(ctx: Context<'_>, pages: Vec<CreateEmbed>, ephemeral: bool) -> Result<(), Error> {
    let Some(first) = pages.first().cloned() else {
        return Ok(());
    };
    if pages.len() == 1 {
        ctx.send(CreateReply::default().embed(first).ephemeral(ephemeral))
            .await?;
        return Ok(());
    }

    let prev_id = format!("{}-prev", ctx.id());
    let next_id = format!("{}-next", ctx.id());
    let buttons = |page: usize| {
        CreateActionRow::Buttons(vec![
            CreateButton::new(&prev_id).emoji('◀').style(ButtonStyle::Secondary),
            CreateButton::new(format!("{}-page", ctx.id()))
                .label(format!("{}/{}", page + 1, pages.len()))
                .style(ButtonStyle::Secondary)
                .disabled(true),
            CreateButton::new(&next_id).emoji('▶').style(ButtonStyle::Secondary),
        ])
    };

    let handle = ctx
        .send(
            CreateReply::default()
                .embed(first)
                .components(vec![buttons(0)])
                .ephemeral(ephemeral),
        )
        .await?;
    let message_id = handle.message().await?.id;

    let mut page = 0;
    while let Some(mci) = ComponentInteractionCollector::new(ctx)
        .author_id(ctx.author().id)
        .message_id(message_id)
        .timeout(PAGE_TIMEOUT)
        .await
    {
        if mci.data.custom_id == next_id {
            page = (page + 1) % pages.len();
        } else if mci.data.custom_id == prev_id {
            page = page.checked_sub(1).unwrap_or(pages.len() - 1);
        } else {
            continue;
        }

        mci.create_response(ctx, CreateInteractionResponse::Acknowledge)
            .await?;
        handle
            .edit(
                ctx,
                CreateReply::default()
                    .embed(pages[page].clone())
                    .components(vec![buttons(page)]),
            )
            .await?;
    }

    handle
        .edit(
            ctx,
            CreateReply::default()
                .embed(pages[page].clone())
                .components(Vec::new()),
        )
        .await?;
    Ok(())
}
