//! 用户设置模型
//!
//! 生日、年龄、检查频率和正常范围通知偏好都保存在同一个文档里，
//! 一次写入即可保证年龄与生日同步。

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// 默认检查间隔（秒）
pub const DEFAULT_FETCH_INTERVAL_SECONDS: u64 = 1800;

/// 检查间隔上限（秒），30 天
pub const MAX_FETCH_INTERVAL_SECONDS: u64 = 30 * 24 * 3600;

/// 用户档案
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    /// 生日
    pub birthday: NaiveDate,
    /// 由生日推算的周岁，不能单独设置
    pub age: i32,
}

impl UserProfile {
    /// 根据生日和当前日期构造档案
    pub fn from_birthday(birthday: NaiveDate, today: NaiveDate) -> Result<Self> {
        let age = whole_years_between(birthday, today).ok_or_else(|| {
            AppError::Validation(format!("birthday {} is in the future", birthday))
        })?;
        Ok(Self { birthday, age })
    }
}

/// 满周岁数，生日晚于今天时返回 None
pub fn whole_years_between(birthday: NaiveDate, today: NaiveDate) -> Option<i32> {
    if birthday > today {
        return None;
    }
    let mut years = today.year() - birthday.year();
    if (today.month(), today.day()) < (birthday.month(), birthday.day()) {
        years -= 1;
    }
    Some(years)
}

/// 用户偏好
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Preferences {
    /// 检查间隔（秒）；None 表示用户尚未设置
    pub fetch_interval_seconds: Option<u64>,
    /// 数据正常时是否也生成消息
    pub notify_on_normal_range: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            fetch_interval_seconds: None,
            notify_on_normal_range: true,
        }
    }
}

impl Preferences {
    pub fn fetch_interval(&self) -> u64 {
        self.fetch_interval_seconds
            .unwrap_or(DEFAULT_FETCH_INTERVAL_SECONDS)
    }
}

/// 尚未完成的引导设置项
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MissingSetting {
    Birthday,
    FetchInterval,
}

/// 持久化的设置文档
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// 用户档案
    pub profile: Option<UserProfile>,
    /// 用户偏好
    pub preferences: Preferences,
}

impl Settings {
    pub fn age(&self) -> Option<i32> {
        self.profile.map(|p| p.age)
    }

    /// 写入生日并同时重算年龄
    pub fn set_birthday(&mut self, birthday: NaiveDate, today: NaiveDate) -> Result<()> {
        self.profile = Some(UserProfile::from_birthday(birthday, today)?);
        Ok(())
    }

    /// 按当前日期刷新年龄（跨过生日后调用）
    pub fn refresh_age(&mut self, today: NaiveDate) -> bool {
        let Some(profile) = self.profile else {
            return false;
        };
        match UserProfile::from_birthday(profile.birthday, today) {
            Ok(updated) if updated != profile => {
                self.profile = Some(updated);
                true
            }
            _ => false,
        }
    }

    pub fn missing(&self) -> Vec<MissingSetting> {
        let mut missing = Vec::new();
        if self.profile.is_none() {
            missing.push(MissingSetting::Birthday);
        }
        if self.preferences.fetch_interval_seconds.is_none() {
            missing.push(MissingSetting::FetchInterval);
        }
        missing
    }
}
