//! Outward notification channel.
//!
//! The controller and its sessions report everything user-visible through a
//! single unbounded channel: state transitions, the connected device name,
//! every raw inbound buffer, and toast-style failure messages. Emission
//! order is delivery order; the receiver never acknowledges.

use bytes::Bytes;
use tokio::sync::mpsc;

/// Connection lifecycle state. Exactly one value at a time, owned by the
/// [`crate::LinkController`] and reported on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Doing nothing.
    None,
    /// Idle, ready for a connect request.
    Listening,
    /// An outgoing connection attempt is in flight.
    Connecting,
    /// A live session exists.
    Connected,
}

/// Event delivered to the external notification channel.
#[derive(Debug, Clone)]
pub enum LinkEvent {
    /// The controller moved to a new state.
    StateChanged(ConnectionState),
    /// Display name of the peer a session was just established with.
    DeviceName(String),
    /// One inbound read's worth of bytes, forwarded regardless of how the
    /// frame classified or whether an ack went out.
    RawPayload {
        /// The bytes read.
        data: Bytes,
        /// Number of bytes the read returned.
        len: usize,
    },
    /// User-visible failure message.
    Toast(String),
}

/// Sender half of the notification channel.
///
/// Unbounded so emission never blocks a state transition.
pub type EventSender = mpsc::UnboundedSender<LinkEvent>;

/// Create a notification channel pair.
pub fn channel() -> (EventSender, mpsc::UnboundedReceiver<LinkEvent>) {
    mpsc::unbounded_channel()
}
