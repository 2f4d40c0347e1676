//! 设置 DTO

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::settings::{MissingSetting, Settings};
use crate::services::scheduler::SchedulerState;

/// 设置生日请求，日期格式 YYYY-MM-DD
#[derive(Debug, Deserialize)]
pub struct SetBirthdayRequest {
    pub birthday: NaiveDate,
}

/// 设置检查间隔请求，0 表示停止定时检查
#[derive(Debug, Deserialize)]
pub struct SetFetchIntervalRequest {
    pub seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct SetNotifyRequest {
    pub enabled: bool,
}

/// 设置响应
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub birthday: Option<NaiveDate>,
    pub age: Option<i32>,
    pub fetch_interval_seconds: u64,
    pub notify_on_normal_range: bool,
    /// 首次使用时需要补全的设置项
    pub missing: Vec<MissingSetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<SchedulerState>,
}

impl From<&Settings> for SettingsResponse {
    fn from(settings: &Settings) -> Self {
        Self {
            birthday: settings.profile.map(|p| p.birthday),
            age: settings.age(),
            fetch_interval_seconds: settings.preferences.fetch_interval(),
            notify_on_normal_range: settings.preferences.notify_on_normal_range,
            missing: settings.missing(),
            scheduler: None,
        }
    }
}

impl SettingsResponse {
    pub fn with_scheduler(mut self, state: SchedulerState) -> Self {
        self.scheduler = Some(state);
        self
    }
}
