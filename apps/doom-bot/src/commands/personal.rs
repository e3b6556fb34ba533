use crate::db;
use crate::error::Error;
use crate::utils::format::uwuify;
use crate::Context;
use poise::{ChoiceParameter, CreateReply};
use tracing::info;

const MESSAGE_LIMIT: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        self == Toggle::On
    }
}

/// Turn verification DMs on or off.
#[poise::command(slash_command)]
pub async fn alerts(
    ctx: Context<'_>,
    #[description = "Receive DMs when your records are verified"] value: Toggle,
) -> Result<(), Error> {
    let data = ctx.data();
    let user_id = ctx.author().id.get();
    db::users::set_alertable(&data.db, user_id, value.enabled()).await?;
    let nickname = data.cache.nickname(user_id).await;
    data.cache.upsert_user(user_id, nickname, value.enabled()).await;

    ctx.send(
        CreateReply::default()
            .content(format!("Alerts set to {}.", value.name()))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Change the name shown on leaderboards.
#[poise::command(slash_command)]
pub async fn name(
    ctx: Context<'_>,
    #[description = "New nickname"]
    #[min_length = 1]
    #[max_length = 25]
    nickname: String,
) -> Result<(), Error> {
    let data = ctx.data();
    let user_id = ctx.author().id.get();
    let nickname = db::users::truncate_nickname(nickname.trim());
    let (old, alertable) = match data.cache.user(user_id).await {
        Some(user) => (user.nickname, user.alertable),
        None => (ctx.author().name.clone(), true),
    };

    ctx.send(
        CreateReply::default()
            .content(format!("Changing your nick name from {old} to {nickname}"))
            .ephemeral(true),
    )
    .await?;
    db::users::insert_if_missing(&data.db, user_id, &nickname).await?;
    db::users::set_nickname(&data.db, user_id, &nickname).await?;
    data.cache.upsert_user(user_id, nickname.clone(), alertable).await;
    info!(user = user_id, old = %old, new = %nickname, "Nickname changed");
    Ok(())
}

/// Uwuify some text.
#[poise::command(slash_command)]
pub async fn uwufier(
    ctx: Context<'_>,
    #[description = "Text to uwuify"] text: String,
) -> Result<(), Error> {
    ctx.say(uwu_message(&text)).await?;
    Ok(())
}

fn uwu_message(text: &str) -> String {
    uwuify(text).chars().take(MESSAGE_LIMIT).collect()
}

/// BLARG
#[poise::command(slash_command)]
pub async fn blarg(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say("BLARG").await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_maps_to_alertable() {
        assert!(Toggle::On.enabled());
        assert!(!Toggle::Off.enabled());
        assert_eq!(Toggle::Off.name(), "Off");
    }

    #[test]
    fn uwu_message_fits_in_one_message() {
        let long = "r".repeat(2500);
        let message = uwu_message(&long);
        assert_eq!(message.chars().count(), MESSAGE_LIMIT);
        assert!(message.chars().all(|c| c == 'w'));
    }
}
