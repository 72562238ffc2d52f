//! Calendar collaborator
//!
//! `CalendarBackend` accepts an event (summary, start, end) and reports
//! success or failure. `GoogleCalendarClient` inserts the event through the
//! Google Calendar v3 REST API. No retry and no idempotency key: a transient
//! failure leaves the event unscheduled.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed length of a scheduled event.
pub const EVENT_DURATION_SECS: i64 = 3600;

/// Reply text shown after a successful insert.
pub const SCHEDULED_REPLY: &str = "Evento agendado com sucesso!";

#[async_trait]
pub trait CalendarBackend: Send + Sync {
    /// Insert the event and return a confirmation text.
    async fn schedule(&self, event: &CalendarEventRequest) -> Result<String, CalendarError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Calendar API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Missing access token")]
    MissingToken,
}

// ============================================================================
// Event request
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub date_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEventRequest {
    pub summary: String,
    pub start: EventTime,
    pub end: EventTime,
}

impl CalendarEventRequest {
    /// Event starting at `start` and lasting one hour.
    pub fn starting_at(summary: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            summary: summary.into(),
            start: EventTime { date_time: start },
            end: EventTime {
                date_time: start + Duration::seconds(EVENT_DURATION_SECS),
            },
        }
    }
}

// ============================================================================
// GoogleCalendarClient
// ============================================================================

#[derive(Debug, Clone)]
pub struct GoogleCalendarConfig {
    pub access_token: String,
    pub base_url: String,
    pub calendar_id: String,
}

impl GoogleCalendarConfig {
    /// Falls back to `GOOGLE_CALENDAR_TOKEN` when no token is given.
    pub fn new(access_token: Option<String>, base_url: String, calendar_id: String) -> Self {
        let access_token = access_token
            .or_else(|| std::env::var("GOOGLE_CALENDAR_TOKEN").ok())
            .unwrap_or_default();

        Self {
            access_token,
            base_url,
            calendar_id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InsertedEvent {
    id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    client: Client,
    config: GoogleCalendarConfig,
}

impl GoogleCalendarClient {
    pub fn new(config: GoogleCalendarConfig) -> Result<Self, CalendarError> {
        if config.access_token.is_empty() {
            return Err(CalendarError::MissingToken);
        }

        let client = Client::builder().build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl CalendarBackend for GoogleCalendarClient {
    async fn schedule(&self, event: &CalendarEventRequest) -> Result<String, CalendarError> {
        let url = format!(
            "{}/calendars/{}/events",
            self.config.base_url.trim_end_matches('/'),
            self.config.calendar_id
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.access_token)
            .json(event)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(code = status.as_u16(), message = %message, "Calendar API error");
            return Err(CalendarError::Api {
                code: status.as_u16(),
                message,
            });
        }

        // Any 2xx means the event exists; the id is only logged.
        let event_id = match response.text().await {
            Ok(body) => serde_json::from_str::<InsertedEvent>(&body)
                .ok()
                .and_then(|inserted| inserted.id),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read calendar insert response");
                None
            }
        };
        tracing::info!(event_id = ?event_id, summary = %event.summary, "Calendar event inserted");

        Ok(SCHEDULED_REPLY.to_string())
    }

    fn name(&self) -> &str {
        "google-calendar"
    }
}

// ============================================================================
// TESTS
// ============================================================================
