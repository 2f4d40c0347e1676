use std::sync::Arc;

use crate::clients::biometrics::BiometricSource;
use crate::clients::chat_transport::ChatTransport;
use crate::clients::notification::NotificationSink;
use crate::config::config::ChatConfig;
use crate::observability::AppMetrics;
use crate::services::chat::ChatService;
use crate::services::conversation::ConversationClient;
use crate::services::pulse::PulsePipeline;
use crate::services::scheduler::PulseScheduler;
use crate::services::settings::SettingsManager;
use crate::services::transcript::Transcript;
use crate::storage::settings_store::SettingsStore;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Persisted birthday and preferences
    pub settings: Arc<SettingsManager>,
    /// User chat on top of the shared transcript
    pub chat: Arc<ChatService>,
    /// Periodic check-in scheduler, also serves manual fetches and wakes
    pub scheduler: PulseScheduler,
    pub metrics: Arc<AppMetrics>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("settings", &"Arc<SettingsManager>")
            .field("chat", &"Arc<ChatService>")
            .field("scheduler", &self.scheduler.state())
            .finish()
    }
}

impl AppState {
    pub fn new(
        settings: Arc<SettingsManager>,
        chat: Arc<ChatService>,
        scheduler: PulseScheduler,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            settings,
            chat,
            scheduler,
            metrics,
        }
    }

    /// Wire every service around one transcript and one settings store
    pub fn assemble(
        store: Arc<dyn SettingsStore>,
        transport: Arc<dyn ChatTransport>,
        source: Arc<dyn BiometricSource>,
        notifier: Arc<dyn NotificationSink>,
        chat_config: &ChatConfig,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self::assemble_with_client(
            store,
            ConversationClient::from_config(transport, chat_config, metrics.clone()),
            source,
            notifier,
            metrics,
        )
    }

    pub fn assemble_with_client(
        store: Arc<dyn SettingsStore>,
        conversation: ConversationClient,
        source: Arc<dyn BiometricSource>,
        notifier: Arc<dyn NotificationSink>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        let settings = Arc::new(SettingsManager::new(store));
        let conversation = Arc::new(conversation);
        let transcript = Arc::new(Transcript::new());

        let pipeline = Arc::new(PulsePipeline::new(
            source,
            conversation.clone(),
            settings.clone(),
            transcript.clone(),
            notifier,
            metrics.clone(),
        ));
        let chat = Arc::new(ChatService::new(
            conversation,
            transcript,
            settings.clone(),
            pipeline.clone(),
        ));
        let scheduler = PulseScheduler::new(pipeline, metrics.clone());

        Self::new(settings, chat, scheduler, metrics)
    }
}
