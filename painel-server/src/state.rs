use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use painel_core::store::DocumentStore;
use painel_core::{
    CalendarBackend, GoogleCalendarClient, GoogleCalendarConfig, HttpLanguageModel, LanguageModel,
    LlmClientConfig, PainelConfig,
};

use crate::subsystems::chat::{ChatRouter, ChatSessions};
use crate::subsystems::intent::{IntentClassifier, KeywordClassifier};

/// Everything a request handler needs: storage, the chat router and the
/// open chat sessions.
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub chat: ChatRouter,
    pub sessions: ChatSessions,
    pub default_company_id: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        chat: ChatRouter,
        default_company_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            chat,
            sessions: ChatSessions::new(),
            default_company_id: default_company_id.into(),
        }
    }

    /// Wire the production collaborators from config. Tokens are read from
    /// `AI_API_TOKEN` and `GOOGLE_CALENDAR_TOKEN`.
    pub fn from_config(config: &PainelConfig, store: Arc<dyn DocumentStore>) -> Result<Self> {
        let classifier: Arc<dyn IntentClassifier> =
            Arc::new(KeywordClassifier::new().context("invalid scheduling keyword pattern")?);

        let calendar: Arc<dyn CalendarBackend> = Arc::new(
            GoogleCalendarClient::new(GoogleCalendarConfig::new(
                None,
                config.calendar.base_url.clone(),
                config.calendar.calendar_id.clone(),
            ))
            .context("failed to create calendar client")?,
        );

        let llm: Arc<dyn LanguageModel> = Arc::new(
            HttpLanguageModel::new(LlmClientConfig::new(None, config.llm.endpoint.clone()))
                .context("failed to create language model client")?,
        );

        tracing::info!(
            storage = store.name(),
            calendar = calendar.name(),
            llm = llm.name(),
            "Collaborators ready"
        );

        let idle_timeout = Duration::from_secs(config.chat.idle_timeout_secs);
        Ok(Self {
            sessions: ChatSessions::with_idle_timeout(idle_timeout),
            ..Self::new(
                store,
                ChatRouter::new(classifier, calendar, llm),
                config.import.default_company_id.clone(),
            )
        })
    }
}
