use std::time::Duration;

use moka::future::Cache;

use crate::model::settings::DailyAttendanceSettings;
use crate::repo::{RepoResult, SettingsRepo};

/// Per-admin daily attendance rules, read on every check-in.
#[derive(Clone)]
pub struct SettingsCache {
    cache: Cache<u64, DailyAttendanceSettings>,
}

impl Default for SettingsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsCache {
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(3600))
                .build(),
        }
    }

    /// Saved rules of the admin, or the defaults when none were saved.
    pub async fn daily_settings(
        &self,
        repo: &dyn SettingsRepo,
        admin_id: u64,
    ) -> RepoResult<DailyAttendanceSettings> {
        if let Some(hit) = self.cache.get(&admin_id).await {
            return Ok(hit);
        }

        let settings = repo
            .daily_settings(admin_id)
            .await?
            .unwrap_or_else(|| DailyAttendanceSettings::defaults_for(admin_id));
        self.cache.insert(admin_id, settings.clone()).await;
        Ok(settings)
    }

    pub async fn store(&self, settings: DailyAttendanceSettings) {
        self.cache.insert(settings.admin_id, settings).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::MemoryStore;

    #[actix_web::test]
    async fn falls_back_to_defaults_and_keeps_saved_rules() {
        let store = MemoryStore::new();
        let cache = SettingsCache::new();

        let settings = cache.daily_settings(&store, 4).await.unwrap();
        assert_eq!(settings, DailyAttendanceSettings::defaults_for(4));

        let mut changed = settings.clone();
        changed.working_hours = 6;
        store.save_daily_settings(&changed).await.unwrap();
        cache.store(changed.clone()).await;

        assert_eq!(cache.daily_settings(&store, 4).await.unwrap().working_hours, 6);
    }
}
