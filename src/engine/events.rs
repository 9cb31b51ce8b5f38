use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::trace;

use crate::{
    error::PulseError,
    proto::{EventRecord, SubscriptionMask},
};

pub(crate) type ListenerItem = Result<EventRecord, PulseError>;
pub(crate) type ListenerSender = mpsc::UnboundedSender<ListenerItem>;

/// Fans decoded event frames out to every active listener.
///
/// Delivery is gated by the effective subscription mask, so a listener
/// never observes an event for a facility outside the mask the server
/// last confirmed. Buffers are per-listener and unbounded: a slow
/// consumer lags, it never loses events.
pub(crate) struct EventFanout {
    mask: SubscriptionMask,
    listeners: Vec<ListenerSender>,
}

impl EventFanout {
    pub(crate) fn new() -> Self {
        Self {
            mask: SubscriptionMask::empty(),
            listeners: Vec::new(),
        }
    }

    /// Replace the effective mask; existing listeners continue under the
    /// new one.
    pub(crate) fn set_mask(&mut self, mask: SubscriptionMask) {
        trace!(?mask, "subscription mask replaced");
        self.mask = mask;
    }

    pub(crate) fn register(&mut self, listener: ListenerSender) {
        self.listeners.push(listener);
    }

    /// Deliver one event to every active listener, in arrival order.
    /// Cancelled cursors are pruned on their first missed delivery.
    pub(crate) fn dispatch(&mut self, event: EventRecord) {
        if !self.mask.contains(event.facility.mask_bit()) {
            trace!(?event, "event outside subscription mask, dropped");
            return;
        }
        self.listeners
            .retain(|listener| listener.send(Ok(event)).is_ok());
    }

    /// End every listener's sequence without an error.
    pub(crate) fn finish_graceful(&mut self) {
        self.listeners.clear();
    }

    /// Deliver a terminal failure to every listener, then end them.
    pub(crate) fn finish_fatal(&mut self) {
        for listener in self.listeners.drain(..) {
            let _ = listener.send(Err(PulseError::ConnectionClosed));
        }
    }
}

/// A live, cancellable cursor over the connection's event stream.
///
/// Yields every event matching the current subscription mask, in arrival
/// order, independently of other listeners. The sequence ends when the
/// connection closes gracefully; a fatal connection error yields one
/// terminal `Err` first. Dropping the listener cancels only this cursor.
pub struct EventListener {
    inner: UnboundedReceiverStream<ListenerItem>,
}

impl EventListener {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<ListenerItem>) -> Self {
        Self {
            inner: UnboundedReceiverStream::new(rx),
        }
    }
}

impl Stream for EventListener {
    type Item = Result<EventRecord, PulseError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{EventKind, Facility};

    fn event(facility: Facility, index: u32) -> EventRecord {
        EventRecord {
            facility,
            kind: EventKind::Changed,
            index,
        }
    }

    #[test]
    fn dispatch_honors_mask_and_order() {
        let mut fanout = EventFanout::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        fanout.register(tx);
        fanout.set_mask(SubscriptionMask::SINK);

        fanout.dispatch(event(Facility::Card, 9));
        fanout.dispatch(event(Facility::Sink, 1));
        fanout.dispatch(event(Facility::Sink, 2));

        assert_eq!(rx.try_recv().unwrap().unwrap().index, 1);
        assert_eq!(rx.try_recv().unwrap().unwrap().index, 2);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_listener_is_pruned_without_affecting_others() {
        let mut fanout = EventFanout::new();
        fanout.set_mask(SubscriptionMask::ALL);
        let (kept_tx, mut kept_rx) = mpsc::unbounded_channel();
        let (dropped_tx, dropped_rx) = mpsc::unbounded_channel();
        fanout.register(dropped_tx);
        fanout.register(kept_tx);
        drop(dropped_rx);

        fanout.dispatch(event(Facility::Source, 4));

        assert_eq!(kept_rx.try_recv().unwrap().unwrap().index, 4);
        fanout.dispatch(event(Facility::Source, 5));
        assert_eq!(kept_rx.try_recv().unwrap().unwrap().index, 5);
    }
}
