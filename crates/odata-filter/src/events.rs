//! Application-wide notifications.
//!
//! The [`EventBus`] is owned by the application context and handed to the
//! components that publish or listen. Publishing with no subscribers is not
//! an error.

use tokio::sync::broadcast;
use uuid::Uuid;

/// Default channel capacity. Slow subscribers past this lag lose events.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Cross-cutting signals between list surfaces and their hosts.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A list finished loading rows.
    DataBound {
        entity_set: String,
        count: Option<i64>,
        rows: usize,
    },
    /// A list's filter collection changed.
    FiltersChanged { entity_set: String, filter_ids: Vec<Uuid> },
    /// A modal surface was closed.
    ModalClosed { name: String },
}

/// Publish/subscribe channel for [`AppEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event; returns the number of subscribers reached.
    pub fn publish(&self, event: AppEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!(?event, "no subscribers for event");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
