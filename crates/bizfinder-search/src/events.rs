//! Structured progress trail of one search.
//!
//! Every event is appended to an [`EventLog`] (for polling after the fact),
//! fanned out to live subscribers, and mirrored to `tracing` at the matching
//! level so ordinary log output carries the same story.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl EventLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventLevel::Debug => "DEBUG",
            EventLevel::Info => "INFO",
            EventLevel::Warning => "WARNING",
            EventLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventCategory {
    /// Request accepted, partial-result warnings, and other whole-search notes.
    Search,
    GridGeneration,
    SubSearchProgress,
    DedupStats,
    Performance,
}

impl EventCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventCategory::Search => "search",
            EventCategory::GridGeneration => "grid-generation",
            EventCategory::SubSearchProgress => "sub-search-progress",
            EventCategory::DedupStats => "dedup-stats",
            EventCategory::Performance => "performance",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchLogEvent {
    pub timestamp: DateTime<Utc>,
    pub level: EventLevel,
    pub category: EventCategory,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

#[derive(Default)]
struct Inner {
    events: Vec<SearchLogEvent>,
    subscribers: Vec<mpsc::UnboundedSender<SearchLogEvent>>,
}

/// Append-only, shareable event sink for one search.
///
/// Cloning is cheap and every clone writes to the same log. Recording never
/// blocks on subscribers and never fails.
#[derive(Clone, Default)]
pub struct EventLog {
    inner: Arc<Mutex<Inner>>,
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("EventLog")
            .field("events", &inner.events.len())
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every event recorded from now on.
    ///
    /// The stream ends once [`EventLog::close`] is called, which the
    /// orchestrator does when a search finishes.
    #[must_use]
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SearchLogEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);
        rx
    }

    /// Drop all subscribers so their receivers see end-of-stream.
    pub fn close(&self) {
        self.lock().subscribers.clear();
    }

    /// All events recorded so far, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SearchLogEvent> {
        self.lock().events.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn record(
        &self,
        level: EventLevel,
        category: EventCategory,
        message: impl Into<String>,
        payload: Option<serde_json::Value>,
    ) {
        let event = SearchLogEvent {
            timestamp: Utc::now(),
            level,
            category,
            message: message.into(),
            payload,
        };
        mirror_to_tracing(&event);

        let mut inner = self.lock();
        inner
            .subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
        inner.events.push(event);
    }

    pub fn info(&self, category: EventCategory, message: impl Into<String>) {
        self.record(EventLevel::Info, category, message, None);
    }

    pub fn error(&self, category: EventCategory, message: impl Into<String>) {
        self.record(EventLevel::Error, category, message, None);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // The log holds plain data; a panic elsewhere cannot leave it torn.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn mirror_to_tracing(event: &SearchLogEvent) {
    let category = event.category.as_str();
    let message = event.message.as_str();
    match event.level {
        EventLevel::Debug => tracing::debug!(category, payload = ?event.payload, "{message}"),
        EventLevel::Info => tracing::info!(category, "{message}"),
        EventLevel::Warning => tracing::warn!(category, "{message}"),
        EventLevel::Error => tracing::error!(category, "{message}"),
    }
}
