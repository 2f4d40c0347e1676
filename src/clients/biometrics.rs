//! 生命体征数据源
//!
//! 读不到数据（没有样本、文件缺失、格式错误）一律视为"暂无样本"，只记录日志。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, warn};

/// 健康数据源 trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BiometricSource: Send + Sync {
    /// 最近一次心率（次/分）
    async fn latest_heart_rate(&self) -> Option<f64>;

    /// 最近一次呼吸频率（次/分）
    async fn latest_respiratory_rate(&self) -> Option<f64>;
}

/// 导出文件中的单个读数
#[derive(Debug, Clone, Deserialize)]
pub struct Reading {
    pub value: f64,
    pub observed_at: DateTime<Utc>,
}

/// 健康数据导出文件格式
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct BiometricExport {
    pub heart_rate: Vec<Reading>,
    pub respiratory_rate: Vec<Reading>,
}

impl BiometricExport {
    fn newest(readings: &[Reading]) -> Option<f64> {
        readings
            .iter()
            .max_by_key(|r| r.observed_at)
            .map(|r| r.value)
    }
}

#[derive(Debug, Clone, Copy)]
enum Metric {
    HeartRate,
    RespiratoryRate,
}

/// 从 JSON 导出文件读取最新样本
///
/// 每次查询都重新读取文件，外部同步工具可以随时覆盖它。
pub struct FileBiometricSource {
    path: PathBuf,
}

impl FileBiometricSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_export(&self) -> Option<BiometricExport> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read biometric export");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(export) => Some(export),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "biometric export is malformed");
                None
            }
        }
    }

    async fn latest(&self, metric: Metric) -> Option<f64> {
        let export = self.read_export().await?;
        let value = match metric {
            Metric::HeartRate => BiometricExport::newest(&export.heart_rate),
            Metric::RespiratoryRate => BiometricExport::newest(&export.respiratory_rate),
        };
        if value.is_none() {
            debug!(?metric, "no samples found");
        }
        value
    }
}

#[async_trait]
impl BiometricSource for FileBiometricSource {
    async fn latest_heart_rate(&self) -> Option<f64> {
        self.latest(Metric::HeartRate).await
    }

    async fn latest_respiratory_rate(&self) -> Option<f64> {
        self.latest(Metric::RespiratoryRate).await
    }
}

/// 固定读数，可在运行时修改
#[derive(Default)]
pub struct StaticBiometricSource {
    readings: RwLock<(Option<f64>, Option<f64>)>,
}

impl StaticBiometricSource {
    pub fn new(heart_rate: Option<f64>, respiratory_rate: Option<f64>) -> Self {
        Self {
            readings: RwLock::new((heart_rate, respiratory_rate)),
        }
    }

    pub fn set(&self, heart_rate: Option<f64>, respiratory_rate: Option<f64>) {
        *self.readings.write() = (heart_rate, respiratory_rate);
    }
}

#[async_trait]
impl BiometricSource for StaticBiometricSource {
    async fn latest_heart_rate(&self) -> Option<f64> {
        self.readings.read().0
    }

    async fn latest_respiratory_rate(&self) -> Option<f64> {
        self.readings.read().1
    }
}
