//! Event-type → integer code table, captured once and reused verbatim.

use crate::events::{Event, EventType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTypeEncoding {
    /// Index is the code
    order: Vec<EventType>,
}

impl EventTypeEncoding {
    /// Codes by first-seen order of distinct types in `events`.
    pub fn from_events(events: &[Event]) -> Self {
        let mut order = Vec::new();
        for e in events {
            if !order.contains(&e.event_type) {
                order.push(e.event_type);
            }
        }
        Self { order }
    }

    /// Codes in declaration order of [`EventType`].
    pub fn canonical() -> Self {
        Self {
            order: EventType::ALL.to_vec(),
        }
    }

    /// Unknown types share the code one past the last known one.
    pub fn encode(&self, event_type: EventType) -> usize {
        self.order
            .iter()
            .position(|t| *t == event_type)
            .unwrap_or(self.order.len())
    }

    pub fn contains(&self, event_type: EventType) -> bool {
        self.order.contains(&event_type)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn types(&self) -> &[EventType] {
        &self.order
    }
}
