//! Intent classification for assistant messages
//!
//! A message is either a scheduling request or a general query. The
//! `KeywordClassifier` decides by case-insensitive keyword match:
//! - "agendar", "marcar" or "compromisso" → schedule
//! - anything else → query
//!
//! The event summary is the text between the first lower-case "agendar" and
//! the next one (or the end of the message), or a default label.

use regex::Regex;

/// Label used when a scheduling message has no text after "agendar".
pub const DEFAULT_EVENT_SUMMARY: &str = "Compromisso do CEO";

const SCHEDULING_KEYWORDS: &str = r"(?i)agendar|marcar|compromisso";
const SUMMARY_ANCHOR: &str = "agendar";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Schedule { summary: String },
    Query { prompt: String },
}

/// Maps message text to an `Intent`. Dispatch only sees the result.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Intent;
}

#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Regex,
}

impl KeywordClassifier {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            keywords: Regex::new(SCHEDULING_KEYWORDS)?,
        })
    }

    /// Case-sensitive: "Agendar reunião" gets the default label.
    fn extract_summary(&self, text: &str) -> String {
        text.split(SUMMARY_ANCHOR)
            .nth(1)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_EVENT_SUMMARY)
            .to_string()
    }
}

impl IntentClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Intent {
        if self.keywords.is_match(text) {
            Intent::Schedule {
                summary: self.extract_summary(text),
            }
        } else {
            Intent::Query {
                prompt: text.to_string(),
            }
        }
    }
}
