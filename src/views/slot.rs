use crate::api::error::{GenAiError, Transient};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

pub const RATE_LIMIT_MESSAGE: &str = "AI rate limit reached. The system is temporarily \
overwhelmed by requests. Please wait 60 seconds and try again.";

/// Explicit user action vs. a timer-driven background refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    Foreground,
    Silent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Retries ran out on a rate limit / unavailable response
    RateLimited,
    Failed,
}

/// A failure as the view presents it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ViewError {
    /// Classify `error`, using `fallback` as the text for non-transient failures
    pub fn from_service(error: &GenAiError, fallback: &str) -> Self {
        if error.is_transient() {
            Self {
                kind: ErrorKind::RateLimited,
                message: RATE_LIMIT_MESSAGE.to_string(),
            }
        } else {
            Self {
                kind: ErrorKind::Failed,
                message: fallback.to_string(),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Idle,
    Loading,
    Success,
    Error,
}

/// Identifies one request issued against a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
    mode: RefreshMode,
}

/// State of one query operation: idle → loading → success | error.
///
/// Every request takes a ticket; only the most recently issued ticket may
/// write a result, so a slow response can never overwrite a newer one.
#[derive(Debug, Clone)]
pub struct QuerySlot<T> {
    data: Option<T>,
    loading: bool,
    error: Option<ViewError>,
    updated_at: Option<DateTime<Utc>>,
    issued: u64,
}

impl<T> Default for QuerySlot<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            updated_at: None,
            issued: 0,
        }
    }
}

impl<T> QuerySlot<T> {
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&ViewError> {
        self.error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Error
        } else if self.data.is_some() {
            Phase::Success
        } else {
            Phase::Idle
        }
    }

    /// Start a request. A silent refresh over existing data keeps showing
    /// that data with no loading indicator.
    pub fn begin(&mut self, mode: RefreshMode) -> Ticket {
        self.issued += 1;
        if mode == RefreshMode::Foreground {
            self.error = None;
        }
        if mode == RefreshMode::Foreground || self.data.is_none() {
            self.loading = true;
        }
        Ticket {
            seq: self.issued,
            mode,
        }
    }

    /// Like [`begin`](Self::begin) but drops the previous result first
    pub fn begin_fresh(&mut self) -> Ticket {
        self.data = None;
        self.updated_at = None;
        self.begin(RefreshMode::Foreground)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.seq == self.issued
    }

    /// Record the outcome of `ticket`. Returns false when a newer request
    /// has been issued since and the outcome was discarded.
    pub fn resolve(&mut self, ticket: Ticket, outcome: Result<T, ViewError>) -> bool {
        if !self.is_current(ticket) {
            debug!(
                "Discarding stale response (ticket {} of {})",
                ticket.seq, self.issued
            );
            return false;
        }

        self.loading = false;
        match outcome {
            Ok(value) => {
                self.data = Some(value);
                self.error = None;
                self.updated_at = Some(Utc::now());
            }
            // Background failures never replace good data on screen
            Err(_) if ticket.mode == RefreshMode::Silent && self.data.is_some() => {}
            Err(e) => self.error = Some(e),
        }
        true
    }

    /// Finish `ticket` without touching the current data or error
    pub fn settle(&mut self, ticket: Ticket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.loading = false;
        true
    }

    /// Back to idle; anything in flight will be discarded
    pub fn reset(&mut self) {
        self.issued += 1;
        self.data = None;
        self.loading = false;
        self.error = None;
        self.updated_at = None;
    }
}

/// Serializable view of a slot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSnapshot<T> {
    pub phase: Phase,
    pub loading: bool,
    pub data: Option<T>,
    pub error: Option<ViewError>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T: Clone> QuerySlot<T> {
    pub fn snapshot(&self) -> SlotSnapshot<T> {
        SlotSnapshot {
            phase: self.phase(),
            loading: self.loading,
            data: self.data.clone(),
            error: self.error.clone(),
            updated_at: self.updated_at,
        }
    }
}
