use crate::db;
use crate::error::Error;
use crate::Data;
use serenity::all::Member;
use tracing::info;

/// Register new members so they show up in user autocomplete right away.
pub async fn on_join(member: &Member, data: &Data) -> Result<(), Error> {
    if member.user.bot {
        return Ok(());
    }
    let user_id = member.user.id.get();
    let nickname = db::users::truncate_nickname(member.display_name());
    if db::users::insert_if_missing(&data.db, user_id, &nickname).await? {
        data.cache.upsert_user(user_id, nickname.clone(), true).await;
        info!(user = %member.user.name, nickname = %nickname, "Registered new member");
    }
    Ok(())
}
