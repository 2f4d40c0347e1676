//! 健康检查流程
//!
//! 一轮检查：读取读数 → 判定范围 → 按偏好决定是否调用模型 → 写入会话并推送通知。
//! 定时检查和手动检查共用这里的逻辑，区别在于手动检查忽略偏好并总是展示结果。

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clients::biometrics::BiometricSource;
use crate::clients::notification::{NOTIFICATION_TITLE, NotificationSink};
use crate::models::biometric::BiometricSample;
use crate::models::message::ChatMessage;
use crate::models::settings::Settings;
use crate::observability::AppMetrics;
use crate::services::conversation::{ConversationClient, ConversationError};
use crate::services::range::is_within_normal_range;
use crate::services::settings::SettingsManager;
use crate::services::transcript::Transcript;

/// 一轮定时检查的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// 上一轮仍在进行，本次跳过
    Busy,
    /// 心率或呼吸频率缺失
    NoSample,
    /// 尚未设置生日
    NoAge { sample: BiometricSample },
    /// 数据正常且用户关闭了正常范围消息
    Suppressed { sample: BiometricSample },
    /// 已写入会话
    Delivered { message: ChatMessage, notified: bool },
    /// 模型调用失败，结果丢弃
    Failed { error: String },
    /// 调度器在本轮进行中被停止或重启，结果丢弃
    Discarded,
}

/// 定时检查的第一阶段产物，投递前由调度器确认是否仍然有效
#[derive(Debug)]
pub enum ScheduledStep {
    Finished(CycleOutcome),
    Reply(Result<String, ConversationError>),
}

/// 手动检查读不到完整样本时展示的文本
pub const MISSING_SAMPLE_MESSAGE: &str = "Error: Missing health data.";

/// 仅当用户关闭正常范围消息且两项指标都正常时不通知
pub fn should_notify(notify_on_normal_range: bool, in_range: bool) -> bool {
    notify_on_normal_range || !in_range
}

pub struct PulsePipeline {
    source: Arc<dyn BiometricSource>,
    conversation: Arc<ConversationClient>,
    settings: Arc<SettingsManager>,
    transcript: Arc<Transcript>,
    notifier: Arc<dyn NotificationSink>,
    latest: RwLock<Option<BiometricSample>>,
    metrics: Arc<AppMetrics>,
}

impl PulsePipeline {
    pub fn new(
        source: Arc<dyn BiometricSource>,
        conversation: Arc<ConversationClient>,
        settings: Arc<SettingsManager>,
        transcript: Arc<Transcript>,
        notifier: Arc<dyn NotificationSink>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            source,
            conversation,
            settings,
            transcript,
            notifier,
            latest: RwLock::new(None),
            metrics,
        }
    }

    /// 最近一次完整读数
    pub fn latest_sample(&self) -> Option<BiometricSample> {
        *self.latest.read()
    }

    /// 并发读取两项指标，两者都返回后才合成样本
    pub async fn read_sample(&self) -> Option<BiometricSample> {
        let (heart_rate, respiratory_rate) = tokio::join!(
            self.source.latest_heart_rate(),
            self.source.latest_respiratory_rate()
        );
        let sample = BiometricSample::from_pair(heart_rate, respiratory_rate);
        match sample {
            Some(sample) => {
                debug!(
                    heart_rate = sample.heart_rate,
                    respiratory_rate = sample.respiratory_rate,
                    "biometric sample read"
                );
                *self.latest.write() = Some(sample);
            }
            None => debug!(
                has_heart_rate = heart_rate.is_some(),
                has_respiratory_rate = respiratory_rate.is_some(),
                "incomplete biometric sample"
            ),
        }
        sample
    }

    async fn load_settings(&self) -> Settings {
        self.settings.refresh_age().await.unwrap_or_else(|e| {
            warn!(error = %e, "failed to load settings, continuing without profile");
            Settings::default()
        })
    }

    /// 定时检查第一阶段：读数、判定、按需调用模型
    pub async fn prepare_scheduled(&self) -> ScheduledStep {
        self.metrics.record_cycle();
        let settings = self.load_settings().await;

        let Some(sample) = self.read_sample().await else {
            info!("no complete biometric sample, skipping cycle");
            return ScheduledStep::Finished(CycleOutcome::NoSample);
        };
        let Some(age) = settings.age() else {
            info!("birthday not set, skipping cycle");
            return ScheduledStep::Finished(CycleOutcome::NoAge { sample });
        };

        let in_range = is_within_normal_range(age, sample.heart_rate, sample.respiratory_rate);
        if !should_notify(settings.preferences.notify_on_normal_range, in_range) {
            info!(
                age,
                heart_rate = sample.heart_rate,
                respiratory_rate = sample.respiratory_rate,
                "reading within normal range, message suppressed by preference"
            );
            return ScheduledStep::Finished(CycleOutcome::Suppressed { sample });
        }

        info!(
            age,
            in_range,
            heart_rate = sample.heart_rate,
            respiratory_rate = sample.respiratory_rate,
            "requesting assistant check-in"
        );
        let reply = self
            .conversation
            .respond(
                &[],
                Some(age),
                Some(sample.heart_rate),
                Some(sample.respiratory_rate),
            )
            .await;
        ScheduledStep::Reply(reply)
    }

    /// 定时检查第二阶段：成功则写入会话并通知，失败只记录日志
    pub async fn deliver_scheduled(&self, step: ScheduledStep) -> CycleOutcome {
        match step {
            ScheduledStep::Finished(outcome) => outcome,
            ScheduledStep::Reply(Ok(content)) => {
                let message = self.transcript.append(ChatMessage::assistant(content));
                self.metrics.record_message();
                self.notifier
                    .notify(NOTIFICATION_TITLE, &message.content)
                    .await;
                self.metrics.record_notification();
                CycleOutcome::Delivered {
                    message,
                    notified: true,
                }
            }
            ScheduledStep::Reply(Err(e)) => {
                warn!(error = %e, "background check-in failed, dropping");
                CycleOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// 手动检查：不看偏好，回复或错误文本都会写入会话，不推送通知
    pub async fn run_manual(&self) -> ChatMessage {
        self.metrics.record_cycle();
        let settings = self.load_settings().await;
        let sample = self.read_sample().await;

        let content = match sample {
            None => {
                info!("manual check-in without a complete sample");
                MISSING_SAMPLE_MESSAGE.to_string()
            }
            Some(sample) => {
                let reply = self
                    .conversation
                    .respond(
                        &[],
                        settings.age(),
                        Some(sample.heart_rate),
                        Some(sample.respiratory_rate),
                    )
                    .await;
                match reply {
                    Ok(content) => content,
                    Err(e) => {
                        warn!(error = %e, "manual check-in failed");
                        e.user_message().to_string()
                    }
                }
            }
        };

        self.metrics.record_message();
        self.transcript.append(ChatMessage::assistant(content))
    }
}
