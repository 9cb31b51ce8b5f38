use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
};

use tokio::sync::oneshot;
use tracing::trace;

use crate::{
    error::PulseError,
    proto::{Reply, ReplyKind, SubscriptionMask, Tag},
};

/// Hands out correlation tags, unique for the lifetime of a connection.
///
/// Shared between the connection handle (which tags submissions so a
/// dropped call can name the slot to cancel) and the handshake path.
#[derive(Clone, Debug)]
pub(crate) struct TagAllocator {
    next: Arc<AtomicU32>,
}

impl TagAllocator {
    pub(crate) fn new() -> Self {
        Self {
            next: Arc::new(AtomicU32::new(0)),
        }
    }

    pub(crate) fn next(&self) -> Tag {
        Tag(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// One in-flight request: the reply shape it expects and the waiter's
/// single-resolution completion slot.
pub(crate) struct PendingRequest {
    pub(crate) expect: ReplyKind,
    pub(crate) reply: oneshot::Sender<Result<Reply, PulseError>>,
    /// Mask to install on success, when the request is a subscribe.
    pub(crate) subscribe: Option<SubscriptionMask>,
}

/// Outcome of matching an inbound reply tag against the pending set.
pub(crate) enum Claimed {
    /// A waiter is suspended on this tag
    Pending(PendingRequest),
    /// The waiter was cancelled; the reply is discarded silently
    Cancelled,
    /// No request ever carried this tag
    Unknown,
}

/// Tracks in-flight requests and matches inbound replies to waiters.
#[derive(Default)]
pub(crate) struct Dispatcher {
    pending: HashMap<u32, PendingRequest>,
    cancelled: HashSet<u32>,
}

impl Dispatcher {
    pub(crate) fn register(&mut self, tag: Tag, request: PendingRequest) {
        let previous = self.pending.insert(tag.0, request);
        debug_assert!(previous.is_none(), "correlation tag {tag} reused in flight");
    }

    /// Release a pending slot whose waiter went away. The tag is
    /// remembered so the server's late reply can be consumed silently.
    pub(crate) fn cancel(&mut self, tag: Tag) {
        if self.pending.remove(&tag.0).is_some() {
            self.cancelled.insert(tag.0);
            trace!(%tag, "pending request cancelled");
        }
    }

    /// Remove and return whatever is registered under `tag`. Each tag
    /// resolves at most once: a second reply for the same tag comes back
    /// [`Claimed::Unknown`].
    pub(crate) fn claim(&mut self, tag: Tag) -> Claimed {
        if let Some(request) = self.pending.remove(&tag.0) {
            return Claimed::Pending(request);
        }
        if self.cancelled.remove(&tag.0) {
            return Claimed::Cancelled;
        }
        Claimed::Unknown
    }

    /// Fail every outstanding request with `ConnectionClosed`.
    pub(crate) fn fail_all(&mut self) {
        for (_, request) in self.pending.drain() {
            let _ = request.reply.send(Err(PulseError::ConnectionClosed));
        }
        self.cancelled.clear();
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> (PendingRequest, oneshot::Receiver<Result<Reply, PulseError>>) {
        let (tx, rx) = oneshot::channel();
        (
            PendingRequest {
                expect: ReplyKind::Ack,
                reply: tx,
                subscribe: None,
            },
            rx,
        )
    }

    #[test]
    fn claim_resolves_each_tag_once() {
        let mut dispatcher = Dispatcher::default();
        let (request, _rx) = pending();
        dispatcher.register(Tag(7), request);

        assert!(matches!(dispatcher.claim(Tag(7)), Claimed::Pending(_)));
        assert!(matches!(dispatcher.claim(Tag(7)), Claimed::Unknown));
    }

    #[test]
    fn cancelled_tag_claims_as_discard_exactly_once() {
        let mut dispatcher = Dispatcher::default();
        let (request, _rx) = pending();
        dispatcher.register(Tag(3), request);
        dispatcher.cancel(Tag(3));

        assert_eq!(dispatcher.in_flight(), 0);
        assert!(matches!(dispatcher.claim(Tag(3)), Claimed::Cancelled));
        assert!(matches!(dispatcher.claim(Tag(3)), Claimed::Unknown));
    }

    #[test]
    fn fail_all_resolves_every_waiter() {
        let mut dispatcher = Dispatcher::default();
        let (first, mut first_rx) = pending();
        let (second, mut second_rx) = pending();
        dispatcher.register(Tag(1), first);
        dispatcher.register(Tag(2), second);

        dispatcher.fail_all();

        assert!(matches!(
            first_rx.try_recv(),
            Ok(Err(PulseError::ConnectionClosed))
        ));
        assert!(matches!(
            second_rx.try_recv(),
            Ok(Err(PulseError::ConnectionClosed))
        ));
        assert_eq!(dispatcher.in_flight(), 0);
    }
}
