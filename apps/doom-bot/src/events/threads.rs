use crate::error::Error;
use crate::Data;
use serenity::all::{Context, EditThread, GuildChannel};
use tracing::debug;

/// Unarchive keep-alive threads. Locked threads stay archived.
pub async fn on_thread_update(ctx: &Context, thread: &GuildChannel, data: &Data) -> Result<(), Error> {
    if !data.cache.keep_alives.read().await.contains(&thread.id.get()) {
        return Ok(());
    }
    let Some(metadata) = &thread.thread_metadata else {
        return Ok(());
    };
    if should_unarchive(metadata.archived, metadata.locked) {
        thread
            .id
            .edit_thread(ctx, EditThread::new().archived(false))
            .await?;
        debug!(thread = %thread.name, "Auto-unarchived thread");
    }
    Ok(())
}

fn should_unarchive(archived: bool, locked: bool) -> bool {
    archived && !locked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_archived_unlocked_threads_come_back() {
        assert!(should_unarchive(true, false));
        assert!(!should_unarchive(true, true));
        assert!(!should_unarchive(false, false));
    }
}
