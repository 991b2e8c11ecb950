//! The completion latch handed to a vendor SDK.
//!
//! A [`CaptureSink`] is the only way a vendor reports back. It wraps a
//! one-shot channel behind a mutex: the first terminal call takes the
//! sender and every later call finds it gone. Progress is published under
//! the same mutex, so no event can slip out after the terminal outcome.
//!
//! The sink is owned by the vendor. The orchestrator keeps only a weak
//! [`SinkController`], so if the vendor drops every sink without reporting
//! the receiver observes a closed channel and the session is finalized as
//! abandoned.

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::oneshot;
use udentify_core::{EventPayload, Modality, ProgressEvent, SessionId, Terminal, VendorError};

use crate::bus::EventBus;
use crate::lock;

/// Callback invoked with every accepted progress event, before it is
/// published. Used by modules that track live state (call status).
pub type EventObserver = Arc<dyn Fn(SessionId, &EventPayload) + Send + Sync>;

struct Latch<P> {
    session_id: SessionId,
    modality: Modality,
    bus: EventBus,
    observer: Option<EventObserver>,
    tx: Mutex<Option<oneshot::Sender<Terminal<P>>>>,
}

impl<P> Latch<P> {
    fn emit(&self, payload: EventPayload) -> bool {
        let guard = lock(&self.tx);
        if guard.is_none() {
            tracing::debug!(
                modality = %self.modality,
                session_id = self.session_id,
                "dropping progress event after terminal outcome"
            );
            return false;
        }
        if let Some(observer) = &self.observer {
            observer(self.session_id, &payload);
        }
        self.bus.publish(ProgressEvent {
            modality: self.modality,
            session_id: self.session_id,
            payload,
        });
        drop(guard);
        true
    }

    fn fire(&self, terminal: Terminal<P>) -> bool {
        let Some(tx) = lock(&self.tx).take() else {
            return false;
        };
        // The receiver is gone only if the awaiting operation was dropped.
        let _ = tx.send(terminal);
        true
    }
}

/// Vendor-facing callback sink for one session.
///
/// Every method returns `true` if the call was accepted and `false` if the
/// session had already reached its terminal outcome.
pub struct CaptureSink<P, E> {
    latch: Arc<Latch<P>>,
    _event: PhantomData<fn(E)>,
}

impl<P, E> Clone for CaptureSink<P, E> {
    fn clone(&self) -> Self {
        Self {
            latch: Arc::clone(&self.latch),
            _event: PhantomData,
        }
    }
}

impl<P, E> fmt::Debug for CaptureSink<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSink")
            .field("modality", &self.latch.modality)
            .field("session_id", &self.latch.session_id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<P, E: Into<EventPayload>> CaptureSink<P, E> {
    /// Forward a progress notification.
    pub fn progress(&self, event: E) -> bool {
        self.latch.emit(event.into())
    }

    /// Report the successful terminal outcome.
    pub fn succeed(&self, payload: P) -> bool {
        self.terminal(Terminal::Completed(payload), "success")
    }

    /// Report a vendor failure.
    pub fn fail(&self, error: VendorError) -> bool {
        self.terminal(Terminal::Failed(error), "failure")
    }

    /// Report that the user dismissed the vendor UI.
    pub fn cancelled_by_user(&self) -> bool {
        self.terminal(Terminal::Cancelled, "user cancellation")
    }

    fn terminal(&self, terminal: Terminal<P>, what: &str) -> bool {
        let accepted = self.latch.fire(terminal);
        if !accepted {
            tracing::warn!(
                modality = %self.latch.modality,
                session_id = self.latch.session_id,
                "discarding duplicate vendor {what} callback"
            );
        }
        accepted
    }
}

impl<P, E> CaptureSink<P, E> {
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.latch.session_id
    }

    /// Whether the terminal outcome has been delivered.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        lock(&self.latch.tx).is_none()
    }
}

/// Orchestrator-side handle that can close the latch without keeping the
/// vendor's sink alive.
pub(crate) struct SinkController<P> {
    latch: Weak<Latch<P>>,
}

impl<P> Clone for SinkController<P> {
    fn clone(&self) -> Self {
        Self {
            latch: Weak::clone(&self.latch),
        }
    }
}

impl<P> SinkController<P> {
    /// Deliver `terminal` unless the vendor already did. Returns whether it
    /// was delivered.
    pub(crate) fn close(&self, terminal: Terminal<P>) -> bool {
        self.latch
            .upgrade()
            .is_some_and(|latch| latch.fire(terminal))
    }
}

/// Create the sink, its controller and the receiving end of the latch.
pub(crate) fn channel<P, E>(
    session_id: SessionId,
    modality: Modality,
    bus: EventBus,
    observer: Option<EventObserver>,
) -> (
    CaptureSink<P, E>,
    SinkController<P>,
    oneshot::Receiver<Terminal<P>>,
) {
    let (tx, rx) = oneshot::channel();
    let latch = Arc::new(Latch {
        session_id,
        modality,
        bus,
        observer,
        tx: Mutex::new(Some(tx)),
    });
    let controller = SinkController {
        latch: Arc::downgrade(&latch),
    };
    (
        CaptureSink {
            latch,
            _event: PhantomData,
        },
        controller,
        rx,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use udentify_core::nfc::NfcEvent;

    type NfcSink = CaptureSink<u32, NfcEvent>;

    fn open(bus: &EventBus) -> (NfcSink, SinkController<u32>, oneshot::Receiver<Terminal<u32>>) {
        channel(1, Modality::Nfc, bus.clone(), None)
    }

    #[tokio::test]
    async fn first_terminal_wins() {
        let bus = EventBus::new(8);
        let (sink, _controller, rx) = open(&bus);
        assert!(sink.succeed(7));
        assert!(!sink.fail(VendorError::new("late")));
        assert!(!sink.cancelled_by_user());
        assert_eq!(rx.await.unwrap(), Terminal::Completed(7));
    }

    #[tokio::test]
    async fn progress_after_terminal_is_dropped() {
        let bus = EventBus::new(8);
        let mut sub = bus.subscribe(None);
        let (sink, _controller, rx) = open(&bus);
        assert!(sink.progress(NfcEvent::SessionBegan));
        assert!(sink.succeed(1));
        assert!(!sink.progress(NfcEvent::Progress { percent: 99 }));
        assert!(sink.is_closed());

        assert_eq!(rx.await.unwrap(), Terminal::Completed(1));
        assert_eq!(sub.try_recv().unwrap().payload, NfcEvent::SessionBegan.into());
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn dropped_sink_closes_channel() {
        let bus = EventBus::new(8);
        let (sink, controller, rx) = open(&bus);
        drop(sink);
        assert!(rx.await.is_err());
        assert!(!controller.close(Terminal::Cancelled));
    }

    #[tokio::test]
    async fn controller_preempts_vendor() {
        let bus = EventBus::new(8);
        let (sink, controller, rx) = open(&bus);
        assert!(controller.close(Terminal::Cancelled));
        assert!(!sink.succeed(3));
        assert_eq!(rx.await.unwrap(), Terminal::Cancelled);
    }

    #[tokio::test]
    async fn observer_sees_accepted_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let observer: EventObserver = {
            let seen = Arc::clone(&seen);
            Arc::new(move |id: SessionId, payload: &EventPayload| {
                seen.lock().unwrap().push((id, payload.clone()));
            })
        };
        let bus = EventBus::new(8);
        let (sink, _controller, _rx): (NfcSink, _, _) =
            channel(42, Modality::Nfc, bus, Some(observer));
        sink.progress(NfcEvent::SessionBegan);
        sink.succeed(0);
        sink.progress(NfcEvent::SessionEnded { message: None });
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(seen.lock().unwrap()[0].0, 42);
    }
}
