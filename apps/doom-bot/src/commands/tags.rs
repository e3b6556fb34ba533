use super::autocomplete;
use crate::db;
use crate::error::Error;
use crate::utils::format::NUMBER_EMOJI;
use crate::utils::permissions::tag_maker_only;
use crate::utils::{confirm::confirm, embeds, fuzz};
use crate::{ApplicationContext, Context};
use poise::{CreateReply, Modal};
use serenity::all::{
    ComponentInteractionCollector, ComponentInteractionDataKind, CreateActionRow,
    CreateAllowedMentions, CreateEmbed, CreateInteractionResponse, CreateSelectMenu,
    CreateSelectMenuKind, CreateSelectMenuOption, ReactionType,
};
use std::time::Duration;
use tracing::info;

const SUGGESTION_TIMEOUT: Duration = Duration::from_secs(120);

/// Community-written answers to common questions.
#[poise::command(slash_command, subcommands("view", "create"), subcommand_required)]
pub async fn tag(_: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Show a tag.
#[poise::command(slash_command, user_cooldown = 10)]
pub async fn view(
    ctx: Context<'_>,
    #[description = "Tag name"]
    #[autocomplete = "autocomplete::tags"]
    name: String,
) -> Result<(), Error> {
    ctx.defer().await?;
    let data = ctx.data();
    if let Some(value) = db::tags::get(&data.db, &name).await? {
        ctx.send(tag_reply(&name, &value)).await?;
        return Ok(());
    }

    let suggestions = fuzz::fuzz_multiple(&name, data.cache.tags.read().await.iter());
    if suggestions.is_empty() {
        return Err(Error::TagNotFound);
    }

    let select_id = format!("{}-tag", ctx.id());
    let options = suggestions
        .iter()
        .enumerate()
        .map(|(i, tag)| {
            CreateSelectMenuOption::new(tag, tag).emoji(ReactionType::Unicode(NUMBER_EMOJI[i].to_string()))
        })
        .collect();
    let menu = CreateSelectMenu::new(&select_id, CreateSelectMenuKind::String { options })
        .placeholder("Pick a tag");
    let handle = ctx
        .send(
            CreateReply::default()
                .embed(suggestion_embed(&name, &suggestions))
                .components(vec![CreateActionRow::SelectMenu(menu)]),
        )
        .await?;
    let message_id = handle.message().await?.id;

    let picked = ComponentInteractionCollector::new(ctx)
        .author_id(ctx.author().id)
        .message_id(message_id)
        .custom_ids(vec![select_id])
        .timeout(SUGGESTION_TIMEOUT)
        .await;
    let Some(mci) = picked else {
        handle
            .edit(ctx, CreateReply::default().components(Vec::new()))
            .await?;
        return Ok(());
    };
    mci.create_response(ctx, CreateInteractionResponse::Acknowledge)
        .await?;

    let chosen = match &mci.data.kind {
        ComponentInteractionDataKind::StringSelect { values } => values.first().cloned(),
        _ => None,
    };
    let value = match &chosen {
        Some(tag) => db::tags::get(&data.db, tag).await?,
        None => None,
    };
    let (Some(tag), Some(value)) = (chosen, value) else {
        return Err(Error::TagNotFound);
    };
    handle
        .edit(ctx, tag_reply(&tag, &value).components(Vec::new()))
        .await?;
    Ok(())
}

fn tag_reply(name: &str, value: &str) -> CreateReply {
    CreateReply::default()
        .content(format!("**{name}**\n\n{value}"))
        .allowed_mentions(CreateAllowedMentions::new())
}

fn suggestion_embed(name: &str, suggestions: &[String]) -> CreateEmbed {
    let listed: String = suggestions
        .iter()
        .zip(NUMBER_EMOJI)
        .map(|(tag, number)| format!("{number} - {tag}\n"))
        .collect();
    embeds::doom_embed()
        .title("Tags")
        .description(format!("Couldn't find `{name}`. Did you mean:\n{listed}"))
}

#[derive(Debug, Modal)]
#[name = "Create Tag"]
struct TagModal {
    #[name = "Name"]
    #[max_length = 100]
    name: String,
    #[name = "Value"]
    #[paragraph]
    #[max_length = 1900]
    value: String,
}

/// Create a new tag.
#[poise::command(slash_command, check = "tag_maker_only")]
pub async fn create(ctx: ApplicationContext<'_>) -> Result<(), Error> {
    let Some(modal) = TagModal::execute(ctx).await? else {
        return Ok(());
    };
    let data = ctx.data;
    let name = modal.name.trim().to_string();
    if data.cache.tags.read().await.contains(&name) {
        return Err(Error::TagExists);
    }

    let ctx = Context::Application(ctx);
    let preview = tag_reply(&name, &modal.value).ephemeral(true);
    let (confirmed, _) = confirm(ctx, preview, "Tag created.").await?;
    if !confirmed {
        return Ok(());
    }
    if !db::tags::insert(&data.db, &name, &modal.value).await? {
        return Err(Error::TagExists);
    }

    let mut tags = data.cache.tags.write().await;
    tags.push(name.clone());
    tags.sort();
    info!(user = %ctx.author().name, tag = %name, "Tag created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestions_are_numbered() {
        let suggestions = vec!["discord".to_string(), "discovery".to_string()];
        let json = serde_json::to_value(suggestion_embed("disc", &suggestions)).unwrap();
        let description = json["description"].as_str().unwrap();
        assert!(description.starts_with("Couldn't find `disc`. Did you mean:\n"));
        assert!(description.contains("1️⃣ - discord\n"));
        assert!(description.contains("2️⃣ - discovery\n"));
    }
}
