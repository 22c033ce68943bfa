//! Bounded interaction event log
//!
//! Backends append one event per interaction; a background sampler in
//! the CLI reads counts without draining. The log is a fixed-capacity
//! ring: when full, the oldest event is dropped. Nothing in the
//! pipeline ever branches on this log.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Default ring capacity; enough for a full multi-task run.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Navigate,
    Click,
    Type,
    Capture,
}

/// One recorded interaction against the shared session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub kind: InteractionKind,
    /// Target description (url, element handle, artifact label).
    pub target: String,
    pub at: DateTime<Utc>,
}

impl InteractionEvent {
    pub fn now(kind: InteractionKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            at: Utc::now(),
        }
    }
}

/// Fixed-capacity append-only event ring.
#[derive(Debug)]
pub struct EventLog {
    capacity: usize,
    events: Mutex<VecDeque<InteractionEvent>>,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            events: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
        }
    }

    pub fn record(&self, event: InteractionEvent) {
        let mut events = self.events.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<InteractionEvent> {
        self.events.lock().iter().cloned().collect()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
