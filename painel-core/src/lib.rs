pub mod api;
pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod models;
pub mod session;
pub mod store;

pub use calendar::{
    CalendarBackend, CalendarError, CalendarEventRequest, GoogleCalendarClient,
    GoogleCalendarConfig,
};
pub use config::PainelConfig;
pub use error::PainelError;
pub use llm::{HttpLanguageModel, LanguageModel, LlmClientConfig, LlmError};
pub use session::{Actor, SessionContext};
pub use store::{
    CollectionPath, Document, DocumentStore, DocumentWrite, MemoryDocumentStore, Query, StoreError,
};
