//! 服务模块

pub mod chat;
pub mod conversation;
pub mod prompt;
pub mod pulse;
pub mod range;
pub mod scheduler;
pub mod settings;
pub mod transcript;

pub use chat::ChatService;
pub use conversation::{ConversationClient, ConversationError, Delay, RetryPolicy, TokioDelay};
pub use prompt::build_system_prompt;
pub use pulse::{CycleOutcome, MISSING_SAMPLE_MESSAGE, PulsePipeline, ScheduledStep, should_notify};
pub use range::{AgeBand, is_heart_rate_normal, is_respiratory_rate_normal, is_within_normal_range};
pub use scheduler::{PulseScheduler, SchedulerState, next_wake_after, next_wake_at};
pub use settings::SettingsManager;
pub use transcript::Transcript;
