use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

use ripple_types::events::{BroadcastEvent, DeliveryScope, Frame, post_channel};

/// Publishes mutation events to connected clients.
///
/// Fire-and-forget, at-most-once: a frame is offered to whoever is
/// subscribed at publish time and never retried. Publish failures (no
/// subscribers, lagged receivers) are invisible to the caller — by the time
/// an event exists the underlying write has already committed.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Broadcast channel for frames — every connection receives every frame
    /// and filters locally by its channel subscriptions.
    broadcast_tx: broadcast::Sender<Frame>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(1024);
        Self {
            inner: Arc::new(DispatcherInner { broadcast_tx }),
        }
    }

    /// Subscribe to published frames. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Publish one event on the private channel of the post it concerns.
    ///
    /// `origin` is the gateway connection that triggered the mutation (from
    /// the request's X-Socket-Id header, if the client supplied one). It
    /// becomes the frame's exclusion only for others-only events; events
    /// with all-subscriber scope ignore it.
    ///
    /// Publish order is delivery order for a single caller: a handler that
    /// publishes its domain event and then a toast is guaranteed those two
    /// frames reach each subscriber in that order.
    pub fn publish(&self, post_id: Uuid, event: BroadcastEvent, origin: Option<Uuid>) {
        let exclude = match event.delivery_scope() {
            DeliveryScope::OthersOnly => origin,
            DeliveryScope::All => None,
        };

        let frame = Frame {
            channel: post_channel(post_id),
            event: event.wire_name(),
            payload: event.payload(),
            exclude,
        };

        let _ = self.inner.broadcast_tx.send(frame);
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
