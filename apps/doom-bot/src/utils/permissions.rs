use crate::error::Error;
use crate::Context;
use serenity::all::{Member, Permissions, RoleId};

/// Check if a member has the given role, or administrator permissions.
pub fn has_role_or_admin(member: &Member, role: Option<RoleId>) -> bool {
    is_admin(member) || role.is_some_and(|r| member.roles.contains(&r))
}

/// Check if a member has admin-level permissions.
pub fn is_admin(member: &Member) -> bool {
    let perms = member.permissions.unwrap_or(Permissions::empty());
    perms.administrator()
}

async fn author_has_role(ctx: Context<'_>, role: Option<RoleId>) -> Result<bool, Error> {
    let Some(member) = ctx.author_member().await else {
        return Ok(false);
    };
    Ok(has_role_or_admin(&member, role))
}

/// Poise check: staff moderators only.
pub async fn staff_only(ctx: Context<'_>) -> Result<bool, Error> {
    if author_has_role(ctx, ctx.data().config.roles.staff).await? {
        Ok(true)
    } else {
        Err(Error::NoPermissions)
    }
}

/// Poise check: tournament organizers (staff included).
pub async fn organizer_only(ctx: Context<'_>) -> Result<bool, Error> {
    let roles = &ctx.data().config.roles;
    if author_has_role(ctx, roles.organizer).await? || author_has_role(ctx, roles.staff).await? {
        Ok(true)
    } else {
        Err(Error::NoPermissions)
    }
}

/// Poise check: tag makers (staff included).
pub async fn tag_maker_only(ctx: Context<'_>) -> Result<bool, Error> {
    let roles = &ctx.data().config.roles;
    if author_has_role(ctx, roles.tag_maker).await? || author_has_role(ctx, roles.staff).await? {
        Ok(true)
    } else {
        Err(Error::NoPermissions)
    }
}

/// Whether the invoking member counts as an organizer, without failing.
pub async fn is_organizer(ctx: Context<'_>) -> Result<bool, Error> {
    let roles = &ctx.data().config.roles;
    Ok(author_has_role(ctx, roles.organizer).await? || author_has_role(ctx, roles.staff).await?)
}
