use std::{collections::VecDeque, sync::Mutex};

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

use super::AppState;

pub(crate) const ACTIVITY_CAPACITY: usize = 100;

/// Attached to webhook responses so the activity middleware can tell what a
/// call produced without parsing the body.
#[derive(Debug, Clone)]
pub(crate) enum ActivityNote {
    Created(String),
    Skipped(String),
    Error(String),
}

#[derive(Serialize, Debug, Clone)]
pub(crate) struct ActivityEntry {
    pub endpoint: String,
    pub status: u16,
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActivityEntry {
    pub fn succeeded(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ActivitySummary {
    pub total: usize,
    pub succeeded: usize,
    pub client_errors: usize,
    pub server_errors: usize,
}

/// The most recent webhook calls, oldest dropped first.
#[derive(Debug)]
pub(crate) struct ActivityLog {
    entries: Mutex<VecDeque<ActivityEntry>>,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(ACTIVITY_CAPACITY)
    }
}

impl ActivityLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn record(&self, entry: ActivityEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Newest first.
    pub fn snapshot(&self) -> Vec<ActivityEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.iter().rev().cloned().collect()
    }

    pub fn summary(&self) -> ActivitySummary {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .fold(ActivitySummary::default(), |mut acc, entry| {
                acc.total += 1;
                match entry.status {
                    200..=299 => acc.succeeded += 1,
                    400..=499 => acc.client_errors += 1,
                    500..=599 => acc.server_errors += 1,
                    _ => {}
                }
                acc
            })
    }
}

pub(crate) async fn record_activity(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::GET {
        return next.run(request).await;
    }
    let endpoint = request.uri().path().to_string();
    let mut response = next.run(request).await;
    let status = response.status();

    let note = response.extensions_mut().remove::<ActivityNote>();
    let (created, error) = match note {
        Some(ActivityNote::Created(slug)) => (Some(slug), None),
        Some(ActivityNote::Skipped(reason)) => (None, Some(reason)),
        Some(ActivityNote::Error(message)) => (None, Some(message)),
        None if !status.is_success() => (None, status.canonical_reason().map(String::from)),
        None => (None, None),
    };

    if status.is_success() {
        info!("{endpoint} -> {status} {}", created.as_deref().unwrap_or("-"));
    } else {
        warn!("{endpoint} -> {status} {}", error.as_deref().unwrap_or("-"));
    }

    state.activity.record(ActivityEntry {
        endpoint,
        status: status.as_u16(),
        at: Utc::now(),
        created,
        error,
    });
    response
}
