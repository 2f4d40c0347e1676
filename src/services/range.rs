//! 正常范围判定
//!
//! 按年龄段查表，区间两端都包含。不在任何明确年龄段内的年龄（包括 0 和负数）
//! 落到最后一个默认区间，不视为错误。

use std::ops::RangeInclusive;

/// 一个年龄段及其正常区间
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeBand {
    /// 年龄段下限（含）
    pub min_age: i32,
    /// 年龄段上限（含），None 表示默认段
    pub max_age: Option<i32>,
    /// 正常区间下限（含）
    pub low: f64,
    /// 正常区间上限（含）
    pub high: f64,
}

impl AgeBand {
    const fn band(min_age: i32, max_age: i32, low: f64, high: f64) -> Self {
        Self {
            min_age,
            max_age: Some(max_age),
            low,
            high,
        }
    }

    const fn fallback(min_age: i32, low: f64, high: f64) -> Self {
        Self {
            min_age,
            max_age: None,
            low,
            high,
        }
    }

    fn covers(&self, age: i32) -> bool {
        match self.max_age {
            Some(max_age) => (self.min_age..=max_age).contains(&age),
            None => true,
        }
    }

    pub fn range(&self) -> RangeInclusive<f64> {
        self.low..=self.high
    }
}

/// 心率正常范围（次/分），最后一项为默认段
pub static HEART_RATE_BANDS: [AgeBand; 4] = [
    AgeBand::band(1, 2, 98.0, 140.0),
    AgeBand::band(3, 5, 80.0, 120.0),
    AgeBand::band(6, 7, 75.0, 118.0),
    AgeBand::fallback(8, 60.0, 100.0),
];

/// 呼吸频率正常范围（次/分），最后一项为默认段
pub static RESPIRATORY_RATE_BANDS: [AgeBand; 3] = [
    AgeBand::band(1, 6, 20.0, 40.0),
    AgeBand::band(7, 12, 14.0, 30.0),
    AgeBand::fallback(13, 12.0, 20.0),
];

fn band_for(bands: &[AgeBand], age: i32) -> &AgeBand {
    bands
        .iter()
        .find(|band| band.covers(age))
        .unwrap_or(&bands[bands.len() - 1])
}

pub fn heart_rate_band(age: i32) -> &'static AgeBand {
    band_for(&HEART_RATE_BANDS, age)
}

pub fn respiratory_rate_band(age: i32) -> &'static AgeBand {
    band_for(&RESPIRATORY_RATE_BANDS, age)
}

pub fn is_heart_rate_normal(age: i32, heart_rate: f64) -> bool {
    heart_rate_band(age).range().contains(&heart_rate)
}

pub fn is_respiratory_rate_normal(age: i32, respiratory_rate: f64) -> bool {
    respiratory_rate_band(age).range().contains(&respiratory_rate)
}

/// 两项指标都在正常范围内
pub fn is_within_normal_range(age: i32, heart_rate: f64, respiratory_rate: f64) -> bool {
    is_heart_rate_normal(age, heart_rate) && is_respiratory_rate_normal(age, respiratory_rate)
}
