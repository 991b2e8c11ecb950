//! Progress event fan-out.
//!
//! Publishing never blocks and never fails: with no subscribers the event
//! is discarded, and a subscriber that falls behind loses its oldest
//! events rather than stalling the capture.
//!
//! Hooks are the synchronous path. They run inside `publish`, which the
//! sink calls before it can accept a terminal outcome, so a transport that
//! forwards from a hook has delivered every event before the result.

use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use udentify_core::{Modality, ProgressEvent};

use crate::lock;

/// Synchronous observer of every published event. Must not block.
pub type EventHook = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Shared outbound channel, cloned into every modality module.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ProgressEvent>,
    hooks: Arc<Mutex<Vec<EventHook>>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.tx.receiver_count())
            .field("hooks", &lock(&self.hooks).len())
            .finish()
    }
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            hooks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fire-and-forget publish. Hooks run first, on the caller's thread.
    pub fn publish(&self, event: ProgressEvent) {
        let hooks = lock(&self.hooks).clone();
        for hook in &hooks {
            hook(&event);
        }
        // An error only means there are no subscribers right now.
        let _ = self.tx.send(event);
    }

    /// Install a hook that sees every event from now on.
    pub fn add_hook(&self, hook: EventHook) {
        lock(&self.hooks).push(hook);
    }

    /// Subscribe to every modality, or to one.
    #[must_use]
    pub fn subscribe(&self, modality: Option<Modality>) -> EventSubscription {
        EventSubscription {
            rx: self.tx.subscribe(),
            filter: modality,
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A consumer's view of the bus. Dropping it unsubscribes.
#[derive(Debug)]
pub struct EventSubscription {
    rx: broadcast::Receiver<ProgressEvent>,
    filter: Option<Modality>,
}

impl EventSubscription {
    /// Next matching event, or `None` once the bus is gone.
    ///
    /// Events lost to lag are skipped with a warning.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching event already buffered, without waiting.
    pub fn try_recv(&mut self) -> Option<ProgressEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.matches(&event) => return Some(event),
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(_) => return None,
            }
        }
    }

    fn matches(&self, event: &ProgressEvent) -> bool {
        self.filter.is_none_or(|m| m == event.modality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use udentify_core::mrz::MrzEvent;
    use udentify_core::nfc::NfcEvent;

    #[tokio::test]
    async fn publish_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.publish(ProgressEvent::new(1, NfcEvent::SessionBegan));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn filter_by_modality() {
        let bus = EventBus::new(8);
        let mut nfc_only = bus.subscribe(Some(Modality::Nfc));
        bus.publish(ProgressEvent::new(1, MrzEvent::Progress { percent: 10.0 }));
        bus.publish(ProgressEvent::new(2, NfcEvent::SessionBegan));
        let event = nfc_only.recv().await.unwrap();
        assert_eq!(event.session_id, 2);
        assert!(nfc_only.try_recv().is_none());
    }

    #[test]
    fn hooks_run_synchronously_in_publish_order() {
        let bus = EventBus::new(1);
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            bus.add_hook(Arc::new(move |event: &ProgressEvent| {
                seen.lock().unwrap().push(event.session_id);
            }));
        }
        bus.publish(ProgressEvent::new(3, NfcEvent::SessionBegan));
        assert_eq!(*seen.lock().unwrap(), [3]);
        bus.publish(ProgressEvent::new(4, NfcEvent::SessionEnded { message: None }));
        assert_eq!(*seen.lock().unwrap(), [3, 4]);
    }

    #[tokio::test]
    async fn lagging_subscriber_does_not_block_publisher() {
        let bus = EventBus::new(2);
        let mut slow = bus.subscribe(None);
        for percent in 0..10u8 {
            bus.publish(ProgressEvent::new(1, NfcEvent::Progress { percent }));
        }
        let first = slow.recv().await.unwrap();
        assert_eq!(
            first.payload,
            NfcEvent::Progress { percent: 8 }.into()
        );
    }
}
