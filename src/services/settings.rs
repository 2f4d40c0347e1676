//! 设置服务
//!
//! 所有修改都走 读取 → 修改 → 整体保存，由一把异步锁串行化。

use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{AppError, Result};
use crate::models::settings::{MAX_FETCH_INTERVAL_SECONDS, MissingSetting, Settings};
use crate::storage::settings_store::SettingsStore;

pub struct SettingsManager {
    store: Arc<dyn SettingsStore>,
    write_lock: Mutex<()>,
}

impl SettingsManager {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// 当前设置快照
    pub async fn snapshot(&self) -> Result<Settings> {
        self.store.load().await
    }

    async fn update<F>(&self, apply: F) -> Result<Settings>
    where
        F: FnOnce(&mut Settings) -> Result<()>,
    {
        let _guard = self.write_lock.lock().await;
        let mut settings = self.store.load().await?;
        apply(&mut settings)?;
        self.store.save(&settings).await?;
        Ok(settings)
    }

    /// 写入生日，年龄在同一次保存中重算
    pub async fn set_birthday(&self, birthday: NaiveDate) -> Result<Settings> {
        self.set_birthday_on(birthday, Self::today()).await
    }

    pub async fn set_birthday_on(&self, birthday: NaiveDate, today: NaiveDate) -> Result<Settings> {
        let settings = self
            .update(|settings| settings.set_birthday(birthday, today))
            .await?;
        info!(age = ?settings.age(), "birthday saved, age recalculated");
        Ok(settings)
    }

    /// 保存检查间隔，0 表示关闭定时检查
    pub async fn set_fetch_interval(&self, seconds: u64) -> Result<Settings> {
        if seconds > MAX_FETCH_INTERVAL_SECONDS {
            return Err(AppError::Validation(format!(
                "检查间隔不能超过 {} 秒",
                MAX_FETCH_INTERVAL_SECONDS
            )));
        }
        let settings = self
            .update(|settings| {
                settings.preferences.fetch_interval_seconds = Some(seconds);
                Ok(())
            })
            .await?;
        info!(seconds, "fetch interval saved");
        Ok(settings)
    }

    pub async fn set_notify_on_normal_range(&self, enabled: bool) -> Result<Settings> {
        let settings = self
            .update(|settings| {
                settings.preferences.notify_on_normal_range = enabled;
                Ok(())
            })
            .await?;
        info!(enabled, "normal range notification preference saved");
        Ok(settings)
    }

    /// 跨过生日后重算年龄，有变化时保存
    pub async fn refresh_age(&self) -> Result<Settings> {
        let today = Self::today();
        let _guard = self.write_lock.lock().await;
        let mut settings = self.store.load().await?;
        if settings.refresh_age(today) {
            self.store.save(&settings).await?;
            info!(age = ?settings.age(), "age refreshed");
        }
        Ok(settings)
    }

    pub async fn missing_settings(&self) -> Result<Vec<MissingSetting>> {
        Ok(self.snapshot().await?.missing())
    }
}
