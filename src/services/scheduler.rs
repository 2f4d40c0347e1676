//! 定时检查调度
//!
//! 定时器、外部唤醒和手动检查的统一入口。

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::models::message::ChatMessage;
use crate::observability::AppMetrics;
use crate::services::pulse::{CycleOutcome, PulsePipeline};

/// 后台唤醒的最短间隔（秒）
pub const MIN_BACKGROUND_WAKE_SECONDS: u64 = 60;

/// 向宿主后台刷新机制申请的最早唤醒间隔
pub fn next_wake_after(interval_seconds: u64) -> Duration {
    Duration::from_secs(interval_seconds.max(MIN_BACKGROUND_WAKE_SECONDS))
}

/// 下一次唤醒时间；超出可表示范围时取最大时间
pub fn next_wake_at(now: DateTime<Utc>, interval_seconds: u64) -> DateTime<Utc> {
    i64::try_from(interval_seconds.max(MIN_BACKGROUND_WAKE_SECONDS))
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|after| now.checked_add_signed(after))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    Running { interval_seconds: u64 },
}

struct ActiveTimer {
    handle: JoinHandle<()>,
    interval_seconds: u64,
}

struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 定时健康检查调度器
///
/// 定时器每次触发都在独立任务中执行一轮检查；同一时间最多一轮在进行，
/// 重叠的触发直接跳过。`stop`/`start` 递增代数，进行中的检查完成后发现
/// 代数已变就丢弃结果。
#[derive(Clone)]
pub struct PulseScheduler {
    pipeline: Arc<PulsePipeline>,
    timer: Arc<Mutex<Option<ActiveTimer>>>,
    generation: Arc<AtomicU64>,
    in_flight: Arc<AtomicBool>,
    metrics: Arc<AppMetrics>,
}

impl PulseScheduler {
    pub fn new(pipeline: Arc<PulsePipeline>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            pipeline,
            timer: Arc::new(Mutex::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: Arc::new(AtomicBool::new(false)),
            metrics,
        }
    }

    pub fn pipeline(&self) -> &Arc<PulsePipeline> {
        &self.pipeline
    }

    /// 取消已有定时器并按新间隔启动；间隔为 0 时保持停止
    pub fn start(&self, interval_seconds: u64) -> SchedulerState {
        let mut timer = self.timer.lock();
        if let Some(previous) = timer.take() {
            previous.handle.abort();
            debug!(
                interval_seconds = previous.interval_seconds,
                "previous timer cancelled"
            );
        }
        self.generation.fetch_add(1, Ordering::AcqRel);

        if interval_seconds == 0 {
            info!("fetch interval is zero, scheduler stays idle");
            return SchedulerState::Idle;
        }

        let period = Duration::from_secs(interval_seconds);
        let Some(first_tick) = Instant::now().checked_add(period) else {
            warn!(interval_seconds, "fetch interval out of range, scheduler stays idle");
            return SchedulerState::Idle;
        };
        let scheduler = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let scheduler = scheduler.clone();
                tokio::spawn(async move {
                    let outcome = scheduler.run_cycle().await;
                    debug!(?outcome, "scheduled cycle finished");
                });
            }
        });

        *timer = Some(ActiveTimer {
            handle,
            interval_seconds,
        });
        info!(interval_seconds, "scheduler started");
        SchedulerState::Running { interval_seconds }
    }

    /// 停止定时器；可重复调用
    pub fn stop(&self) -> SchedulerState {
        let mut timer = self.timer.lock();
        if let Some(active) = timer.take() {
            active.handle.abort();
            self.generation.fetch_add(1, Ordering::AcqRel);
            info!("scheduler stopped");
        }
        SchedulerState::Idle
    }

    pub fn state(&self) -> SchedulerState {
        match self.timer.lock().as_ref() {
            Some(active) => SchedulerState::Running {
                interval_seconds: active.interval_seconds,
            },
            None => SchedulerState::Idle,
        }
    }

    /// 执行一轮定时检查；定时器和外部唤醒共用此入口
    pub async fn run_cycle(&self) -> CycleOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("previous cycle still running, skipping tick");
            self.metrics.record_cycle_skipped();
            return CycleOutcome::Busy;
        }
        let _in_flight = InFlight(self.in_flight.clone());

        let generation = self.generation.load(Ordering::Acquire);
        let step = self.pipeline.prepare_scheduled().await;
        if self.generation.load(Ordering::Acquire) != generation {
            info!("scheduler stopped or restarted during cycle, discarding result");
            return CycleOutcome::Discarded;
        }
        self.pipeline.deliver_scheduled(step).await
    }

    /// 手动检查，不受偏好限制，也不占用定时检查的并发名额
    pub async fn fetch_now(&self) -> ChatMessage {
        self.pipeline.run_manual().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::biometrics::BiometricSource;
    use crate::clients::notification::LogNotificationSink;
    use crate::services::conversation::ConversationClient;
    use crate::services::conversation::test_support::{RecordingDelay, ScriptedTransport};
    use crate::services::settings::SettingsManager;
    use crate::services::transcript::Transcript;
    use crate::storage::settings_store::MemorySettingsStore;
    use async_trait::async_trait;
    use chrono::{Local, Months};
    use std::sync::atomic::AtomicUsize;

    /// 统计读取次数，可选地在读取时等待
    struct CountingSource {
        reads: AtomicUsize,
        hold: Duration,
    }

    impl CountingSource {
        fn new(hold: Duration) -> Self {
            Self {
                reads: AtomicUsize::new(0),
                hold,
            }
        }

        fn cycles(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BiometricSource for CountingSource {
        async fn latest_heart_rate(&self) -> Option<f64> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if !self.hold.is_zero() {
                tokio::time::sleep(self.hold).await;
            }
            Some(130.0)
        }

        async fn latest_respiratory_rate(&self) -> Option<f64> {
            Some(25.0)
        }
    }

    async fn scheduler(
        source: Arc<CountingSource>,
        replies: usize,
    ) -> (PulseScheduler, Arc<Transcript>) {
        let settings = Arc::new(SettingsManager::new(Arc::new(MemorySettingsStore::default())));
        let today = Local::now().date_naive();
        settings
            .set_birthday_on(today - Months::new(5 * 12), today)
            .await
            .unwrap();

        let metrics = Arc::new(AppMetrics::default());
        let transport = ScriptedTransport::new(
            (0..replies)
                .map(|i| ScriptedTransport::reply(&format!("reply {}", i)))
                .collect(),
        );
        let conversation = Arc::new(
            ConversationClient::new(Arc::new(transport), "gpt-4o", 2000, metrics.clone())
                .with_delay(Arc::new(RecordingDelay::default())),
        );
        let transcript = Arc::new(Transcript::new());
        let pipeline = Arc::new(PulsePipeline::new(
            source,
            conversation,
            settings,
            transcript.clone(),
            Arc::new(LogNotificationSink),
            metrics.clone(),
        ));
        (PulseScheduler::new(pipeline, metrics), transcript)
    }

    #[test]
    fn test_background_wake_has_floor() {
        assert_eq!(next_wake_after(0), Duration::from_secs(60));
        assert_eq!(next_wake_after(30), Duration::from_secs(60));
        assert_eq!(next_wake_after(1800), Duration::from_secs(1800));

        let now = Utc::now();
        assert_eq!(next_wake_at(now, 10), now + TimeDelta::seconds(60));
    }

    #[test]
    fn test_next_wake_saturates_for_huge_intervals() {
        let now = Utc::now();
        assert_eq!(next_wake_at(now, u64::MAX), DateTime::<Utc>::MAX_UTC);
        assert_eq!(
            next_wake_at(now, 10_000_000_000_000_000),
            DateTime::<Utc>::MAX_UTC
        );
        assert!(next_wake_at(now, u64::MAX) > now);
    }

    #[tokio::test]
    async fn test_unrepresentable_interval_stays_idle() {
        let source = Arc::new(CountingSource::new(Duration::ZERO));
        let (scheduler, _) = scheduler(source.clone(), 1).await;

        scheduler.start(60);
        assert_eq!(scheduler.start(u64::MAX), SchedulerState::Idle);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_interval() {
        let source = Arc::new(CountingSource::new(Duration::ZERO));
        let (scheduler, transcript) = scheduler(source.clone(), 10).await;

        scheduler.start(60);
        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(source.cycles(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(source.cycles(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.cycles(), 2);
        assert_eq!(transcript.len(), 2);
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_cancels_previous_timer() {
        let source = Arc::new(CountingSource::new(Duration::ZERO));
        let (scheduler, _) = scheduler(source.clone(), 10).await;

        scheduler.start(10);
        let state = scheduler.start(30);
        assert_eq!(state, SchedulerState::Running { interval_seconds: 30 });

        tokio::time::sleep(Duration::from_secs(35)).await;
        // the 10s timer would have fired three times by now
        assert_eq!(source.cycles(), 1);
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent_and_halts_ticks() {
        let source = Arc::new(CountingSource::new(Duration::ZERO));
        let (scheduler, _) = scheduler(source.clone(), 10).await;

        scheduler.start(10);
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(source.cycles(), 1);

        assert_eq!(scheduler.stop(), SchedulerState::Idle);
        assert_eq!(scheduler.stop(), SchedulerState::Idle);
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.cycles(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_stays_idle() {
        let source = Arc::new(CountingSource::new(Duration::ZERO));
        let (scheduler, _) = scheduler(source.clone(), 10).await;

        scheduler.start(10);
        assert_eq!(scheduler.start(0), SchedulerState::Idle);
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.cycles(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_ticks_are_skipped() {
        // each read takes 25s, ticks every 10s
        let source = Arc::new(CountingSource::new(Duration::from_secs(25)));
        let (scheduler, transcript) = scheduler(source.clone(), 10).await;

        scheduler.start(10);
        tokio::time::sleep(Duration::from_secs(36)).await;

        // tick at 10s runs until 35s; ticks at 20s and 30s are skipped
        assert_eq!(source.cycles(), 1);
        assert_eq!(transcript.len(), 1);
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_cycle_discards_result() {
        let source = Arc::new(CountingSource::new(Duration::from_secs(5)));
        let (scheduler, transcript) = scheduler(source.clone(), 10).await;

        let running = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.run_cycle().await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        scheduler.start(600);
        scheduler.stop();

        let outcome = running.await.unwrap();
        assert_eq!(outcome, CycleOutcome::Discarded);
        assert!(transcript.is_empty());
    }

    #[tokio::test]
    async fn test_external_wake_runs_cycle_when_idle() {
        let source = Arc::new(CountingSource::new(Duration::ZERO));
        let (scheduler, transcript) = scheduler(source.clone(), 1).await;

        let outcome = scheduler.run_cycle().await;
        assert!(matches!(outcome, CycleOutcome::Delivered { notified: true, .. }));
        assert_eq!(transcript.last().unwrap().content, "reply 0");
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }
}
