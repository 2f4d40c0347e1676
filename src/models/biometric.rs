use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 一次完整的生命体征读数
///
/// 心率和呼吸频率总是成对出现，缺任何一项都不会构造出样本。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BiometricSample {
    /// 心率（次/分）
    pub heart_rate: f64,
    /// 呼吸频率（次/分）
    pub respiratory_rate: f64,
    /// 读取时间
    pub observed_at: DateTime<Utc>,
}

impl BiometricSample {
    pub fn new(heart_rate: f64, respiratory_rate: f64) -> Self {
        Self {
            heart_rate,
            respiratory_rate,
            observed_at: Utc::now(),
        }
    }

    /// 由两个可选读数合成样本，任一缺失返回 None
    pub fn from_pair(heart_rate: Option<f64>, respiratory_rate: Option<f64>) -> Option<Self> {
        match (heart_rate, respiratory_rate) {
            (Some(hr), Some(rr)) => Some(Self::new(hr, rr)),
            _ => None,
        }
    }
}
