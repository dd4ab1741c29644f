//! Transport seam between the conversation and the realtime endpoint.
//!
//! A connector owns one duplex channel: send a single event, receive a
//! lazy sequence of events in wire arrival order. Two transports implement
//! it, the SDP peer connection used in production and a websocket fallback
//! that speaks the same event protocol.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::ConnectorError;
use crate::types::{ClientEvent, ServerEvent};

pub mod rtc;
pub mod ws;

pub use rtc::RtcConnector;
pub use ws::WsConnector;

/// Inbound side of the duplex channel: decoded events in arrival order,
/// decode failures as `Err` items, closed when the transport ends.
pub type EventStream = mpsc::Receiver<Result<ServerEvent, ConnectorError>>;

/// Hook invoked exactly once when the transport goes away, whether through
/// [`Connector::close`] or a remote close.
pub type DisconnectHook = Box<dyn FnOnce() + Send + 'static>;

#[async_trait]
pub trait Connector: Send + Sync {
    /// Serializes one event and writes it to the data channel. Fails with
    /// [`ConnectorError::ChannelNotOpen`] when the channel is not open;
    /// nothing is buffered for retry.
    async fn send(&self, event: ClientEvent) -> Result<(), ConnectorError>;

    /// Ships captured microphone audio to the remote peer on transports
    /// that carry a media track. Transports without one accept and drop it.
    async fn send_media(&self, _pcm: &[u8]) -> Result<(), ConnectorError> {
        Ok(())
    }

    /// Takes the inbound event sequence. Yields `None` after the first
    /// call; there is exactly one consumer.
    fn take_events(&self) -> Option<EventStream>;

    /// Registers the disconnect hook, replacing any previous one.
    fn on_disconnect(&self, hook: DisconnectHook);

    /// Closes the channel and releases the transport. Safe to call
    /// repeatedly or concurrently; later calls are no-ops.
    async fn close(&self);
}

/// One-shot teardown state shared by the connectors. `shutdown` hands the
/// teardown to exactly one caller; `fire_disconnect` runs the hook at most
/// once no matter how many paths reach it.
pub(crate) struct Lifecycle {
    closed: AtomicBool,
    hook: Mutex<Option<DisconnectHook>>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            closed: AtomicBool::new(false),
            hook: Mutex::new(None),
        }
    }

    pub(crate) fn set_hook(&self, hook: DisconnectHook) {
        let mut slot = self.hook.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(hook);
    }

    /// Marks the connector closed. True for the single caller that gets to
    /// perform the teardown.
    pub(crate) fn shutdown(&self) -> bool {
        !self.closed.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn fire_disconnect(&self) {
        let hook = self
            .hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(hook) = hook {
            hook();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn teardown_goes_to_exactly_one_caller() {
        let lifecycle = Arc::new(Lifecycle::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lifecycle = Arc::clone(&lifecycle);
                std::thread::spawn(move || lifecycle.shutdown() as usize)
            })
            .collect();
        let winners: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(winners, 1);
        assert!(lifecycle.is_closed());
    }

    #[test]
    fn disconnect_hook_runs_at_most_once() {
        let lifecycle = Lifecycle::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        lifecycle.set_hook(Box::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        lifecycle.fire_disconnect();
        lifecycle.fire_disconnect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
