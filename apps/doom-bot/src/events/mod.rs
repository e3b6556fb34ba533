//! Gateway event handlers, dispatched from the framework's event hook.

pub mod components;
pub mod member;
pub mod messages;
pub mod reactions;
pub mod threads;

use crate::error::Error;
use crate::Data;
use serenity::all::{Context, FullEvent};

pub async fn handle_event(ctx: &Context, event: &FullEvent, data: &Data) -> Result<(), Error> {
    match event {
        FullEvent::GuildMemberAddition { new_member } => member::on_join(new_member, data).await,
        FullEvent::ReactionAdd { add_reaction } => {
            reactions::on_reaction_add(ctx, add_reaction, data).await
        }
        FullEvent::ThreadUpdate { new, .. } => threads::on_thread_update(ctx, new, data).await,
        FullEvent::Message { new_message } => messages::on_message(ctx, new_message, data).await,
        FullEvent::InteractionCreate { interaction } => {
            components::on_interaction(ctx, interaction, data).await
        }
        _ => Ok(()),
    }
}
