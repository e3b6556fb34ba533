//! Persistent buttons and modals that outlive the command that sent them.

use crate::commands::playtest;
use crate::db;
use crate::duels::{parse_ready_button_id, ready_buttons};
use crate::error::Error;
use crate::utils::permissions::has_role_or_admin;
use crate::verification::{self, Verdict, ACCEPT_ID, REASON_INPUT_ID, REJECT_ID};
use crate::Data;
use serenity::all::{
    ActionRowComponent, ComponentInteraction, Context, CreateInteractionResponse,
    CreateInteractionResponseMessage, Interaction, ModalInteraction,
};
use tracing::info;

pub async fn on_interaction(ctx: &Context, interaction: &Interaction, data: &Data) -> Result<(), Error> {
    match interaction {
        Interaction::Component(mci) => on_component(ctx, mci, data).await,
        Interaction::Modal(modal) => on_modal(ctx, modal, data).await,
        _ => Ok(()),
    }
}

async fn on_component(ctx: &Context, mci: &ComponentInteraction, data: &Data) -> Result<(), Error> {
    let custom_id = mci.data.custom_id.as_str();
    if custom_id == ACCEPT_ID || custom_id == REJECT_ID {
        return on_verify(ctx, mci, data).await;
    }
    if let Some((duel_id, num)) = parse_ready_button_id(custom_id) {
        return on_ready(ctx, mci, data, duel_id, num).await;
    }
    if let Some(owner) = playtest::parse_finish_button_id(custom_id) {
        return playtest::finish(&ctx.http, data, mci, owner).await;
    }
    Ok(())
}

async fn reply_ephemeral(ctx: &Context, mci: &ComponentInteraction, content: &str) -> Result<(), Error> {
    let response = CreateInteractionResponseMessage::new()
        .content(content)
        .ephemeral(true);
    mci.create_response(ctx, CreateInteractionResponse::Message(response))
        .await?;
    Ok(())
}

async fn on_verify(ctx: &Context, mci: &ComponentInteraction, data: &Data) -> Result<(), Error> {
    let is_staff = mci
        .member
        .as_ref()
        .is_some_and(|member| has_role_or_admin(member, data.config.roles.staff));
    if !is_staff {
        return reply_ephemeral(ctx, mci, &Error::NoPermissions.to_string()).await;
    }

    if mci.data.custom_id == REJECT_ID {
        mci.create_response(
            ctx,
            CreateInteractionResponse::Modal(verification::reason_modal(mci.message.id)),
        )
        .await?;
        return Ok(());
    }

    mci.create_response(ctx, CreateInteractionResponse::Acknowledge)
        .await?;
    verification::decide(
        &ctx.http,
        data,
        mci.channel_id,
        mci.message.id,
        mci.user.id,
        Verdict::Accepted,
    )
    .await
}

async fn on_modal(ctx: &Context, modal: &ModalInteraction, data: &Data) -> Result<(), Error> {
    let Some(queue_message) = verification::parse_reason_modal_id(&modal.data.custom_id) else {
        return Ok(());
    };
    let reason = modal
        .data
        .components
        .iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            ActionRowComponent::InputText(input) if input.custom_id == REASON_INPUT_ID => {
                input.value.clone()
            }
            _ => None,
        })
        .unwrap_or_default();

    modal
        .create_response(ctx, CreateInteractionResponse::Acknowledge)
        .await?;
    verification::decide(
        &ctx.http,
        data,
        modal.channel_id,
        queue_message,
        modal.user.id,
        Verdict::Rejected { reason: &reason },
    )
    .await
}

async fn on_ready(
    ctx: &Context,
    mci: &ComponentInteraction,
    data: &Data,
    duel_id: i32,
    num: i16,
) -> Result<(), Error> {
    let user_id = mci.user.id.get();
    let players = db::duels::players(&data.db, duel_id).await?;
    if !players.iter().any(|p| p.id() == user_id && p.num == num) {
        return reply_ephemeral(ctx, mci, "This is not your button.").await;
    }

    let Some(ready) = db::duels::toggle_ready(&data.db, duel_id, user_id).await? else {
        return reply_ephemeral(ctx, mci, "This duel can no longer be readied.").await;
    };
    let states: Vec<(i16, bool)> = players
        .iter()
        .map(|p| (p.num, if p.num == num { ready } else { p.ready }))
        .collect();
    let response = CreateInteractionResponseMessage::new()
        .components(vec![ready_buttons(duel_id, &states)]);
    mci.create_response(ctx, CreateInteractionResponse::UpdateMessage(response))
        .await?;
    info!(duel = duel_id, user = %mci.user.name, ready, "Duel ready toggled");
    Ok(())
}
