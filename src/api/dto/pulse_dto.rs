//! 健康检查 DTO

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::biometric::BiometricSample;
use crate::services::pulse::CycleOutcome;
use crate::services::scheduler::SchedulerState;

/// 启动调度器请求
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StartSchedulerRequest {
    /// 检查间隔（秒），为空时使用已保存的设置
    pub interval_seconds: Option<u64>,
}

/// 外部唤醒响应
#[derive(Debug, Serialize)]
pub struct WakeResponse {
    pub outcome: CycleOutcome,
    /// 建议的下一次最早唤醒时间
    pub next_wake_at: DateTime<Utc>,
}

/// 调度器状态响应
#[derive(Debug, Serialize)]
pub struct PulseStatusResponse {
    pub scheduler: SchedulerState,
    pub latest_sample: Option<BiometricSample>,
    pub next_wake_at: DateTime<Utc>,
}
