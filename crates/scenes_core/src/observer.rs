//! Explicit publish/subscribe between a collection and the views bound to it.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use shared::events::{EventFilter, SceneEvent};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// One click publishes destroy, remove, add and sync before the next dispatch.
pub const MIN_EVENT_CAPACITY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Cloneable handle to a broadcast hub; every clone publishes to the same subscribers.
#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<SceneEvent>,
    next_id: Arc<AtomicU64>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(subscription = %id, ?filter, "subscribed");
        Subscription {
            id,
            filter,
            rx: self.tx.subscribe(),
            lagged: false,
        }
    }

    /// Publishes to every live subscription and returns how many there were.
    pub fn notify(&self, event: SceneEvent) -> usize {
        let kind = event.kind();
        match self.tx.send(event) {
            Ok(receivers) => {
                debug!(?kind, receivers, "published scene event");
                receivers
            }
            Err(_) => {
                debug!(?kind, "scene event dropped, nobody is subscribed");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// One observer's registration. Dropping it unsubscribes.
pub struct Subscription {
    id: SubscriptionId,
    filter: EventFilter,
    rx: broadcast::Receiver<SceneEvent>,
    lagged: bool,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Takes every pending event that passes the filter, oldest first.
    pub fn drain(&mut self) -> Vec<SceneEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        events.push(event);
                    }
                }
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(subscription = %self.id, missed, "observer lagged behind, events lost");
                    self.lagged = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        events
    }

    /// Whether events were lost since the last call; resets the flag.
    pub fn take_lagged(&mut self) -> bool {
        std::mem::take(&mut self.lagged)
    }

    pub fn unsubscribe(self) {
        debug!(subscription = %self.id, "unsubscribed");
    }
}

/// Something that reacts to scene events delivered through its subscription.
pub trait Observer {
    fn subscription_mut(&mut self) -> Option<&mut Subscription>;

    fn on_event(&mut self, event: &SceneEvent);

    /// Delivers all pending events and returns how many were handled.
    fn pump(&mut self) -> usize {
        let events = match self.subscription_mut() {
            Some(subscription) => subscription.drain(),
            None => return 0,
        };
        for event in &events {
            self.on_event(event);
        }
        events.len()
    }
}
