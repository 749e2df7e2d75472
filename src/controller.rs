//! Connection lifecycle state machine.
//!
//! Serializes every transition under one internal lock and owns at most one
//! [`Connector`] and one [`Session`] at a time: starting a new attempt or
//! session always cancels and drops the prior handle first, fire-and-forget.
//! Writes bypass the lock for their duration: they lock-read the current
//! session's writer handle, release, then await the send, so a live write
//! never blocks a concurrent transition.
//!
//! Connection loss deliberately returns the machine to `Listening` without
//! reconnecting; retry policy belongs to the caller.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::connector::Connector;
use crate::error::{LinkError, Result};
use crate::event::{ConnectionState, EventSender, LinkEvent};
use crate::protocol::Command;
use crate::session::Session;
use crate::transport::{Endpoint, LinkStream, Transport};

/// Toast text emitted when a live session's stream fails.
const CONNECTION_LOST_MSG: &str = "Device connection was lost";

struct Inner {
    state: ConnectionState,
    connector: Option<Connector>,
    session: Option<Session>,
    // Bumped per connect() so an outcome from a superseded attempt can be
    // told apart from the live one.
    attempt: u64,
    // Bumped per session, same purpose for loss signals.
    generation: u64,
}

/// Top-level controller for one point-to-point link.
pub struct LinkController {
    transport: Arc<dyn Transport>,
    events: EventSender,
    // Handed to watcher tasks so a dropped controller just orphans them.
    weak: Weak<Self>,
    inner: Mutex<Inner>,
}

impl LinkController {
    /// Create a controller in the [`ConnectionState::None`] state.
    pub fn new(transport: Arc<dyn Transport>, events: EventSender) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            transport,
            events,
            weak: weak.clone(),
            inner: Mutex::new(Inner {
                state: ConnectionState::None,
                connector: None,
                session: None,
                attempt: 0,
                generation: 0,
            }),
        })
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    /// Enter listening mode, cancelling any attempt or session in flight.
    pub fn start(&self) {
        tracing::debug!("start");
        let mut inner = self.lock();
        Self::cancel_all(&mut inner);
        self.set_state(&mut inner, ConnectionState::Listening);
    }

    /// Begin an outgoing connection attempt to `endpoint`.
    ///
    /// Any prior attempt or session is cancelled first; at completion there
    /// is exactly one live connector.
    pub fn connect(&self, endpoint: Endpoint) {
        tracing::debug!(address = %endpoint.address, name = %endpoint.name, "connect");
        let mut inner = self.lock();
        Self::cancel_all(&mut inner);

        inner.attempt += 1;
        let attempt = inner.attempt;

        let (connector, outcome_rx) =
            Connector::spawn(Arc::clone(&self.transport), endpoint.clone());
        inner.connector = Some(connector);
        self.set_state(&mut inner, ConnectionState::Connecting);
        drop(inner);

        let weak = self.weak.clone();
        tokio::spawn(async move {
            // Err means the connector was cancelled before completing; a
            // newer transition already owns the state.
            if let Ok(outcome) = outcome_rx.await {
                if let Some(this) = weak.upgrade() {
                    this.attempt_finished(attempt, outcome, &endpoint);
                }
            }
        });
    }

    /// Install a live stream as the current session.
    ///
    /// Used both by a successful connector and by callers that obtained a
    /// stream some other way.
    pub fn connected(&self, stream: LinkStream, endpoint: &Endpoint) {
        let mut inner = self.lock();
        self.install_session(&mut inner, stream, endpoint);
    }

    fn install_session(&self, inner: &mut Inner, stream: LinkStream, endpoint: &Endpoint) {
        tracing::debug!(name = %endpoint.name, "connected");
        Self::cancel_all(inner);

        inner.generation += 1;
        let generation = inner.generation;

        let (lost_tx, lost_rx) = oneshot::channel();
        inner.session = Some(Session::spawn(stream, self.events.clone(), lost_tx));

        let _ = self
            .events
            .send(LinkEvent::DeviceName(endpoint.name.clone()));
        self.set_state(inner, ConnectionState::Connected);

        let weak = self.weak.clone();
        tokio::spawn(async move {
            if lost_rx.await.is_ok() {
                if let Some(this) = weak.upgrade() {
                    this.connection_lost(generation);
                }
            }
        });
    }

    /// Resolve a connector outcome, discarding it if the attempt was
    /// superseded while the outcome was in flight.
    fn attempt_finished(&self, attempt: u64, outcome: Result<LinkStream>, endpoint: &Endpoint) {
        let mut inner = self.lock();
        if inner.attempt != attempt || inner.state != ConnectionState::Connecting {
            tracing::debug!(attempt, "stale connector outcome ignored");
            return;
        }
        match outcome {
            Ok(stream) => self.install_session(&mut inner, stream, endpoint),
            Err(e) => {
                tracing::warn!("connection failed: {}", e);
                inner.connector = None;
                self.set_state(&mut inner, ConnectionState::Listening);
                let _ = self.events.send(LinkEvent::Toast(e.to_string()));
            }
        }
    }

    /// Tear everything down and return to [`ConnectionState::None`].
    pub fn stop(&self) {
        tracing::debug!("stop");
        let mut inner = self.lock();
        Self::cancel_all(&mut inner);
        self.set_state(&mut inner, ConnectionState::None);
    }

    /// Send raw bytes on the live session.
    ///
    /// The transition lock is held only long enough to grab the session's
    /// writer handle; the write itself happens outside it.
    pub async fn write(&self, bytes: Bytes) -> Result<()> {
        let writer = {
            let inner = self.lock();
            if inner.state != ConnectionState::Connected {
                return Err(LinkError::NotConnected);
            }
            match inner.session.as_ref() {
                Some(session) => session.writer(),
                None => return Err(LinkError::NotConnected),
            }
        };
        writer.send(bytes).await
    }

    /// Send a single application command byte.
    pub async fn send_command(&self, command: Command) -> Result<()> {
        self.write(Bytes::copy_from_slice(&[command.as_byte()])).await
    }

    fn connection_lost(&self, generation: u64) {
        let mut inner = self.lock();
        // Ignore signals from sessions that were already replaced or torn
        // down; the live session reports loss at most once.
        if inner.generation != generation || inner.state != ConnectionState::Connected {
            tracing::debug!(generation, "stale connection-lost signal ignored");
            return;
        }
        tracing::info!("connection lost");
        inner.session = None;
        self.set_state(&mut inner, ConnectionState::Listening);
        let _ = self
            .events
            .send(LinkEvent::Toast(CONNECTION_LOST_MSG.to_string()));
    }

    fn cancel_all(inner: &mut Inner) {
        if let Some(mut connector) = inner.connector.take() {
            connector.cancel();
        }
        if let Some(mut session) = inner.session.take() {
            session.cancel();
        }
    }

    fn set_state(&self, inner: &mut Inner, state: ConnectionState) {
        tracing::debug!("state {:?} -> {:?}", inner.state, state);
        inner.state = state;
        let _ = self.events.send(LinkEvent::StateChanged(state));
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("controller lock poisoned")
    }
}
