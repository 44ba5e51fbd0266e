//! In-process publish/subscribe.
//!
//! Topics are a closed set, one broadcast channel each. Publishing with no
//! subscribers is not an error; a subscriber that falls behind loses the
//! oldest events and logs how many.

use std::fmt;

use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

const CHANNEL_CAPACITY: usize = 64;

/// A named event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Topic {
    /// The location hash changed.
    #[serde(rename = "hash-change")]
    HashChange,
    /// Something asked the list view to focus its search input.
    #[serde(rename = "focus-search")]
    FocusSearch,
    /// The command palette opened or closed.
    #[serde(rename = "palette-toggled")]
    PaletteToggled,
}

impl Topic {
    pub const ALL: [Self; 3] = [Self::HashChange, Self::FocusSearch, Self::PaletteToggled];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HashChange => "hash-change",
            Self::FocusSearch => "focus-search",
            Self::PaletteToggled => "palette-toggled",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::HashChange => 0,
            Self::FocusSearch => 1,
            Self::PaletteToggled => 2,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A published event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub topic: Topic,
    pub detail: serde_json::Value,
}

/// Cheap to clone; clones publish to and subscribe from the same channels.
#[derive(Debug, Clone)]
pub struct EventBus {
    senders: [broadcast::Sender<Event>; 3],
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            senders: std::array::from_fn(|_| broadcast::channel(CHANNEL_CAPACITY).0),
        }
    }

    /// Deliver `detail` to every current subscriber of `topic`.
    ///
    /// Returns how many subscribers received it.
    pub fn publish(&self, topic: Topic, detail: serde_json::Value) -> usize {
        let event = Event { topic, detail };
        match self.senders[topic.index()].send(event) {
            Ok(n) => {
                debug!(%topic, receivers = n, "event published");
                n
            }
            Err(_) => 0,
        }
    }

    /// Start receiving events published to `topic` from now on.
    pub fn subscribe(&self, topic: Topic) -> Subscription {
        Subscription {
            topic,
            rx: self.senders[topic.index()].subscribe(),
        }
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.senders[topic.index()].receiver_count()
    }
}

/// A live subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    topic: Topic,
    rx: broadcast::Receiver<Event>,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// The next pending event, without waiting.
    pub fn try_next(&mut self) -> Option<Event> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(topic = %self.topic, skipped, "subscriber lagged, events dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<Event> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Wait for the next event. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(topic = %self.topic, skipped, "subscriber lagged, events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
