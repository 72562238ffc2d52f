//! Executive assistant chat
//!
//! Each message goes through `Idle → Awaiting Reply → Idle`:
//! 1. the user entry is appended to the transcript immediately
//! 2. the classifier picks scheduling or general query
//! 3. the calendar or the language model is called once
//! 4. the reply (or a fixed failure text) is appended as an assistant entry
//!
//! The transcript lock is never held across a collaborator call, so two
//! overlapping sends on one session may complete in either order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use painel_core::models::Message;
use painel_core::{CalendarBackend, CalendarEventRequest, LanguageModel, LlmError};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::subsystems::intent::{Intent, IntentClassifier};

pub const CALENDAR_FAILURE_REPLY: &str = "Erro ao agendar o evento no Google Agenda.";
pub const LLM_FAILURE_REPLY: &str = "Desculpe, ocorreu um erro ao processar sua mensagem.";
pub const RATE_LIMIT_PREFIX: &str = "Limite de requisições atingido:";

// ============================================================================
// Transcript
// ============================================================================

/// Append-only message log for one chat session.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Mutex<Vec<Message>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, message: Message) {
        self.messages.lock().await.push(message);
    }

    pub async fn snapshot(&self) -> Vec<Message> {
        self.messages.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.messages.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

// ============================================================================
// ChatRouter
// ============================================================================

/// Result of one send: the user entry and the assistant reply, both already
/// in the transcript.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub user: Message,
    pub reply: Message,
}

#[derive(Clone)]
pub struct ChatRouter {
    classifier: Arc<dyn IntentClassifier>,
    calendar: Arc<dyn CalendarBackend>,
    llm: Arc<dyn LanguageModel>,
}

impl ChatRouter {
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        calendar: Arc<dyn CalendarBackend>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            classifier,
            calendar,
            llm,
        }
    }

    pub async fn send(&self, transcript: &Transcript, text: &str) -> Exchange {
        let user = Message::user(text);
        transcript.append(user.clone()).await;

        let intent = self.classifier.classify(text);
        let reply = Message::assistant(self.dispatch(intent).await);
        transcript.append(reply.clone()).await;

        Exchange { user, reply }
    }

    async fn dispatch(&self, intent: Intent) -> String {
        match intent {
            Intent::Schedule { summary } => {
                let event = CalendarEventRequest::starting_at(summary, Utc::now());
                tracing::info!(
                    summary = %event.summary,
                    backend = self.calendar.name(),
                    "Scheduling calendar event"
                );
                match self.calendar.schedule(&event).await {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to schedule calendar event");
                        CALENDAR_FAILURE_REPLY.to_string()
                    }
                }
            }
            Intent::Query { prompt } => {
                tracing::debug!(
                    prompt_len = prompt.len(),
                    backend = self.llm.name(),
                    "Forwarding query to language model"
                );
                match self.llm.complete(&prompt).await {
                    Ok(reply) => reply,
                    Err(LlmError::RateLimited { message }) => {
                        tracing::warn!(message = %message, "Language model rate limited");
                        format!("{} {}", RATE_LIMIT_PREFIX, message)
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to fetch language model reply");
                        LLM_FAILURE_REPLY.to_string()
                    }
                }
            }
        }
    }
}

// ============================================================================
// ChatSessions
// ============================================================================

/// Sessions untouched for this long are dropped.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

struct SessionEntry {
    transcript: Arc<Transcript>,
    last_used: Instant,
}

/// Process-local registry of open chat sessions.
///
/// A session ends on `end` or after `idle_timeout` without a `get`. Expired
/// sessions are swept whenever a new one is opened.
pub struct ChatSessions {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    idle_timeout: Duration,
}

impl Default for ChatSessions {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl ChatSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub async fn open(&self) -> (Uuid, Arc<Transcript>) {
        let id = Uuid::new_v4();
        let transcript = Arc::new(Transcript::new());

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_used.elapsed() < self.idle_timeout);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Idle chat sessions evicted");
        }

        sessions.insert(
            id,
            SessionEntry {
                transcript: transcript.clone(),
                last_used: Instant::now(),
            },
        );
        tracing::debug!(session_id = %id, open = sessions.len(), "Chat session opened");
        (id, transcript)
    }

    /// Look up a live session and mark it used. Expired sessions are removed
    /// and reported as unknown.
    pub async fn get(&self, id: &Uuid) -> Option<Arc<Transcript>> {
        let mut sessions = self.sessions.write().await;
        let expired = sessions.get(id)?.last_used.elapsed() >= self.idle_timeout;
        if expired {
            sessions.remove(id);
            tracing::debug!(session_id = %id, "Chat session expired");
            return None;
        }

        let entry = sessions.get_mut(id)?;
        entry.last_used = Instant::now();
        Some(entry.transcript.clone())
    }

    /// Drop the session and its transcript. Returns false if unknown.
    pub async fn end(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::debug!(session_id = %id, "Chat session ended");
        }
        removed
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use painel_core::models::Sender;
    use painel_core::CalendarError;
    use tokio::sync::Notify;

    use crate::subsystems::intent::KeywordClassifier;

    #[derive(Default)]
    struct RecordingCalendar {
        events: Mutex<Vec<CalendarEventRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl CalendarBackend for RecordingCalendar {
        async fn schedule(&self, event: &CalendarEventRequest) -> Result<String, CalendarError> {
            self.events.lock().await.push(event.clone());
            if self.fail {
                Err(CalendarError::Api {
                    code: 500,
                    message: "boom".to_string(),
                })
            } else {
                Ok("Evento agendado com sucesso!".to_string())
            }
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    enum LlmMode {
        Reply,
        RateLimited,
        Fail,
    }

    struct RecordingLlm {
        prompts: Mutex<Vec<String>>,
        mode: LlmMode,
        gate: Notify,
    }

    impl RecordingLlm {
        fn new(mode: LlmMode) -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                mode,
                gate: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for RecordingLlm {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().await.push(prompt.to_string());
            // "slow" waits until another call releases it.
            if prompt == "slow" {
                self.gate.notified().await;
            } else {
                self.gate.notify_one();
            }
            match self.mode {
                LlmMode::Reply => Ok(format!("reply to {}", prompt)),
                LlmMode::RateLimited => Err(LlmError::RateLimited {
                    message: "quota exceeded".to_string(),
                }),
                LlmMode::Fail => Err(LlmError::Api {
                    code: 500,
                    message: "down".to_string(),
                }),
            }
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn router(calendar: Arc<RecordingCalendar>, llm: Arc<RecordingLlm>) -> ChatRouter {
        ChatRouter::new(Arc::new(KeywordClassifier::new().unwrap()), calendar, llm)
    }

    #[tokio::test]
    async fn test_scheduling_message_calls_calendar_once() {
        let calendar = Arc::new(RecordingCalendar::default());
        let llm = Arc::new(RecordingLlm::new(LlmMode::Reply));
        let transcript = Transcript::new();

        let exchange = router(calendar.clone(), llm.clone())
            .send(&transcript, "preciso agendar uma reunião")
            .await;

        let events = calendar.events.lock().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary, "uma reunião");
        assert_eq!(
            (events[0].end.date_time - events[0].start.date_time).num_seconds(),
            3600
        );
        assert!(llm.prompts.lock().await.is_empty());
        assert_eq!(exchange.reply.content, "Evento agendado com sucesso!");
    }

    #[tokio::test]
    async fn test_query_message_calls_language_model_once() {
        let calendar = Arc::new(RecordingCalendar::default());
        let llm = Arc::new(RecordingLlm::new(LlmMode::Reply));
        let transcript = Transcript::new();
        let text = "qual é o status do projeto X?";

        router(calendar.clone(), llm.clone()).send(&transcript, text).await;

        assert_eq!(llm.prompts.lock().await.as_slice(), [text.to_string()]);
        assert!(calendar.events.lock().await.is_empty());

        let messages = transcript.snapshot().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].content, text);
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert_eq!(messages[1].content, format!("reply to {}", text));
    }

    #[tokio::test]
    async fn test_each_send_adds_two_entries() {
        let router = router(
            Arc::new(RecordingCalendar::default()),
            Arc::new(RecordingLlm::new(LlmMode::Reply)),
        );
        let transcript = Transcript::new();

        router.send(&transcript, "primeira pergunta").await;
        router.send(&transcript, "segunda pergunta").await;

        assert_eq!(transcript.len().await, 4);
    }

    #[tokio::test]
    async fn test_rate_limit_is_distinct_from_generic_failure() {
        let transcript = Transcript::new();
        let exchange = router(
            Arc::new(RecordingCalendar::default()),
            Arc::new(RecordingLlm::new(LlmMode::RateLimited)),
        )
        .send(&transcript, "olá")
        .await;

        assert!(exchange.reply.content.starts_with(RATE_LIMIT_PREFIX));
        assert!(exchange.reply.content.contains("quota exceeded"));
        assert_ne!(exchange.reply.content, LLM_FAILURE_REPLY);
    }

    #[tokio::test]
    async fn test_language_model_failure_uses_fallback_text() {
        let transcript = Transcript::new();
        let exchange = router(
            Arc::new(RecordingCalendar::default()),
            Arc::new(RecordingLlm::new(LlmMode::Fail)),
        )
        .send(&transcript, "olá")
        .await;

        assert_eq!(exchange.reply.content, LLM_FAILURE_REPLY);
        assert_eq!(transcript.len().await, 2);
    }

    #[tokio::test]
    async fn test_calendar_failure_uses_fallback_text() {
        let calendar = Arc::new(RecordingCalendar {
            fail: true,
            ..Default::default()
        });
        let transcript = Transcript::new();
        let exchange = router(calendar.clone(), Arc::new(RecordingLlm::new(LlmMode::Reply)))
            .send(&transcript, "agendar revisão")
            .await;

        assert_eq!(exchange.reply.content, CALENDAR_FAILURE_REPLY);
        assert_eq!(calendar.events.lock().await.len(), 1, "no retry");
    }

    #[tokio::test]
    async fn test_overlapping_sends_complete_out_of_order() {
        let router = router(
            Arc::new(RecordingCalendar::default()),
            Arc::new(RecordingLlm::new(LlmMode::Reply)),
        );
        let transcript = Transcript::new();

        tokio::join!(
            router.send(&transcript, "slow"),
            router.send(&transcript, "fast"),
        );

        let contents: Vec<String> = transcript
            .snapshot()
            .await
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(
            contents,
            vec!["slow", "fast", "reply to fast", "reply to slow"]
        );
    }

    #[tokio::test]
    async fn test_sessions_open_and_end() {
        let sessions = ChatSessions::new();
        let (id, transcript) = sessions.open().await;
        transcript.append(Message::user("oi")).await;

        assert_eq!(sessions.get(&id).await.unwrap().len().await, 1);
        assert!(sessions.end(&id).await);
        assert!(sessions.get(&id).await.is_none());
        assert!(!sessions.end(&id).await);
        assert_eq!(sessions.count().await, 0);
    }

    #[tokio::test]
    async fn test_idle_sessions_are_discarded() {
        let sessions = ChatSessions::with_idle_timeout(Duration::from_millis(50));
        let (stale, _) = sessions.open().await;
        let (also_stale, _) = sessions.open().await;

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(sessions.get(&stale).await.is_none());
        let (fresh, _) = sessions.open().await;
        assert_eq!(sessions.count().await, 1);
        assert!(sessions.get(&also_stale).await.is_none());
        assert!(sessions.get(&fresh).await.is_some());
    }

    #[tokio::test]
    async fn test_get_keeps_session_alive() {
        let sessions = ChatSessions::with_idle_timeout(Duration::from_millis(200));
        let (id, _) = sessions.open().await;

        for _ in 0..3 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            assert!(sessions.get(&id).await.is_some());
        }
    }
}
