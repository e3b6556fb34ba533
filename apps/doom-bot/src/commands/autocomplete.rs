//! Autocomplete callbacks backed by the in-memory caches.

use crate::cache::{autocomplete, AUTOCOMPLETE_LIMIT};
use crate::utils::fuzz;
use crate::Context;
use serenity::all::{AutocompleteChoice, ResolvedOption, ResolvedValue};

pub async fn map_codes(ctx: Context<'_>, partial: &str) -> impl Iterator<Item = String> {
    let codes = ctx.data().cache.map_codes().await;
    autocomplete(&codes, &partial.to_uppercase()).into_iter()
}

/// Levels of the map code typed into the same command.
pub async fn map_levels(ctx: Context<'_>, partial: &str) -> impl Iterator<Item = String> {
    let levels = match sibling_option(ctx, "map_code") {
        Some(code) => {
            let code = code.trim().to_uppercase().replace('O', "0");
            ctx.data().cache.map(&code).await.map(|m| m.levels).unwrap_or_default()
        }
        None => Vec::new(),
    };
    autocomplete(&levels, partial).into_iter()
}

pub async fn map_names(ctx: Context<'_>, partial: &str) -> impl Iterator<Item = String> {
    let names = ctx.data().cache.map_names.read().await.clone();
    autocomplete(&names, partial).into_iter()
}

pub async fn map_types(ctx: Context<'_>, partial: &str) -> impl Iterator<Item = String> {
    let types = ctx.data().cache.map_types.read().await.clone();
    autocomplete(&types, partial).into_iter()
}

pub async fn tags(ctx: Context<'_>, partial: &str) -> impl Iterator<Item = String> {
    let names = ctx.data().cache.tags.read().await.clone();
    autocomplete(&names, partial).into_iter()
}

pub async fn exercises(ctx: Context<'_>, partial: &str) -> impl Iterator<Item = String> {
    let names: Vec<String> = ctx.data().cache.exercises.read().await.keys().cloned().collect();
    autocomplete(&names, partial).into_iter()
}

/// Nicknames shown as `name (id)`, submitting the id.
pub async fn users(ctx: Context<'_>, partial: &str) -> impl Iterator<Item = AutocompleteChoice> {
    let users = ctx.data().cache.users.read().await;
    let mut entries: Vec<(String, u64)> = users
        .iter()
        .map(|(id, user)| (user.nickname.clone(), *id))
        .collect();
    drop(users);
    entries.sort();

    let names: Vec<String> = entries.iter().map(|(name, _)| name.clone()).collect();
    let picked = if partial.trim().is_empty() {
        names.into_iter().take(AUTOCOMPLETE_LIMIT).collect()
    } else {
        let contained = autocomplete(&names, partial);
        if contained.is_empty() {
            fuzz::fuzz_multiple(partial, &names)
        } else {
            contained
        }
    };

    let mut choices = Vec::with_capacity(picked.len());
    for name in picked {
        for (nick, id) in entries.iter().filter(|(nick, _)| *nick == name) {
            if choices.len() < AUTOCOMPLETE_LIMIT {
                choices.push(AutocompleteChoice::new(format!("{nick} ({id})"), id.to_string()));
            }
        }
    }
    choices.into_iter()
}

/// Raw value of another option on the command being autocompleted.
fn sibling_option(ctx: Context<'_>, name: &str) -> Option<String> {
    let poise::Context::Application(app) = ctx else {
        return None;
    };
    find_option(&app.interaction.data.options(), name)
}

fn find_option(options: &[ResolvedOption<'_>], name: &str) -> Option<String> {
    options.iter().find_map(|option| match &option.value {
        ResolvedValue::String(value) if option.name == name => Some(value.to_string()),
        ResolvedValue::SubCommand(nested) | ResolvedValue::SubCommandGroup(nested) => {
            find_option(nested, name)
        }
        _ => None,
    })
}
