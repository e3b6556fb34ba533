use crate::db;
use crate::gym::ExerciseCategory;
use sqlx::PgPool;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Discord caps autocomplete responses at 25 choices.
pub const AUTOCOMPLETE_LIMIT: usize = 25;

const REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapCacheData {
    pub levels: Vec<String>,
    pub creator_ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserCacheData {
    pub nickname: String,
    pub alertable: bool,
}

/// Process-wide lookup tables backing autocomplete and argument validation.
///
/// Local writes update the relevant table immediately; everything is
/// reloaded from the database once a day.
#[derive(Debug, Default)]
pub struct Cache {
    pub maps: RwLock<BTreeMap<String, MapCacheData>>,
    pub map_names: RwLock<Vec<String>>,
    pub map_types: RwLock<Vec<String>>,
    pub users: RwLock<HashMap<u64, UserCacheData>>,
    pub tags: RwLock<Vec<String>>,
    pub exercises: RwLock<BTreeMap<String, ExerciseCategory>>,
    pub keep_alives: RwLock<HashSet<u64>>,
    pub current_season: RwLock<Option<i32>>,
}

impl Cache {
    /// Reload every table from the database.
    pub async fn refresh(&self, pool: &PgPool) -> Result<(), sqlx::Error> {
        let maps = db::maps::fetch_map_cache(pool).await?;
        let map_names = db::maps::fetch_map_names(pool).await?;
        let map_types = db::maps::fetch_map_types(pool).await?;
        let users = db::users::fetch_all(pool).await?;
        let tags = db::tags::fetch_names(pool).await?;
        let exercises = db::gym::fetch_exercise_categories(pool).await?;
        let keep_alives = db::keep_alives::fetch_all(pool).await?;
        let season = db::tournament::current_season(pool).await?;

        info!(
            maps = maps.len(),
            users = users.len(),
            tags = tags.len(),
            exercises = exercises.len(),
            "Caches refreshed"
        );

        *self.maps.write().await = maps;
        *self.map_names.write().await = map_names;
        *self.map_types.write().await = map_types;
        *self.users.write().await = users;
        *self.tags.write().await = tags;
        *self.exercises.write().await = exercises;
        *self.keep_alives.write().await = keep_alives;
        *self.current_season.write().await = season;
        Ok(())
    }

    /// Refresh every 24 hours in the background. The first refresh happens
    /// after one interval; call [`Cache::refresh`] at startup.
    pub fn spawn_refresh_loop(self: Arc<Self>, pool: PgPool) {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(REFRESH_INTERVAL).await;
                if let Err(e) = self.refresh(&pool).await {
                    error!(error = %e, "Failed to refresh caches");
                }
            }
        });
    }

    pub async fn map_codes(&self) -> Vec<String> {
        self.maps.read().await.keys().cloned().collect()
    }

    pub async fn map(&self, code: &str) -> Option<MapCacheData> {
        self.maps.read().await.get(code).cloned()
    }

    pub async fn user(&self, user_id: u64) -> Option<UserCacheData> {
        self.users.read().await.get(&user_id).cloned()
    }

    pub async fn nickname(&self, user_id: u64) -> String {
        self.user(user_id)
            .await
            .map(|u| u.nickname)
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// Insert or update a user after a local write.
    pub async fn upsert_user(&self, user_id: u64, nickname: String, alertable: bool) {
        self.users
            .write()
            .await
            .insert(user_id, UserCacheData { nickname, alertable });
    }

    /// Apply a local edit to one cached map, if it is cached.
    pub async fn edit_map(&self, code: &str, edit: impl FnOnce(&mut MapCacheData)) {
        if let Some(map) = self.maps.write().await.get_mut(code) {
            edit(map);
        }
    }

    pub async fn add_map(&self, code: String, levels: Vec<String>, creator_id: u64) {
        self.maps.write().await.insert(
            code,
            MapCacheData {
                levels,
                creator_ids: vec![creator_id],
            },
        );
    }
}

/// Filter candidates for a Discord autocomplete response.
///
/// An empty query returns the first 25 candidates; otherwise candidates that
/// contain the query (case-insensitive), capped at 25.
pub fn autocomplete<'a, I>(candidates: I, partial: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let needle = partial.trim().to_lowercase();
    candidates
        .into_iter()
        .filter(|c| needle.is_empty() || c.to_lowercase().contains(&needle))
        .take(AUTOCOMPLETE_LIMIT)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_query_returns_first_page() {
        let many: Vec<String> = (0..40).map(|i| format!("MAP{i}")).collect();
        let result = autocomplete(&many, "");
        assert_eq!(result.len(), AUTOCOMPLETE_LIMIT);
        assert_eq!(result[0], "MAP0");
    }

    #[test]
    fn query_filters_case_insensitively() {
        let names = list(&["Hanamura", "Havana", "Busan"]);
        assert_eq!(autocomplete(&names, "HAN"), list(&["Hanamura"]));
        assert_eq!(autocomplete(&names, "a"), names);
        assert!(autocomplete(&names, "zzz").is_empty());
    }

    #[tokio::test]
    async fn local_writes_are_visible() {
        let cache = Cache::default();
        cache.upsert_user(1, "nebula".into(), true).await;
        cache
            .add_map("ABCDE".into(), vec!["Level 1".into()], 1)
            .await;

        assert_eq!(cache.nickname(1).await, "nebula");
        assert_eq!(cache.nickname(2).await, "Unknown");
        assert_eq!(cache.map_codes().await, vec!["ABCDE".to_string()]);
        assert_eq!(cache.map("ABCDE").await.unwrap().creator_ids, vec![1]);
    }

    #[tokio::test]
    async fn edits_touch_only_cached_maps() {
        let cache = Cache::default();
        cache.add_map("ABCDE".into(), vec!["Level 1".into()], 1).await;
        cache
            .edit_map("ABCDE", |m| m.levels.push("Bonus".into()))
            .await;
        cache.edit_map("ZZZZZ", |m| m.levels.clear()).await;

        assert_eq!(cache.map("ABCDE").await.unwrap().levels, vec!["Level 1", "Bonus"]);
        assert!(cache.map("ZZZZZ").await.is_none());
    }
}
