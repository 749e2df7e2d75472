//! Outbound connection attempt.
//!
//! One task per attempt. The primary strategy dials the peer's well-known
//! serial service; if that fails the attempt falls back to an insecure
//! fixed channel, which some peripherals accept when they reject
//! service-record connections. Cancellation races the attempt against a
//! oneshot and drops whatever was partially opened; a cancelled attempt
//! delivers no outcome at all.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{LinkError, Result};
use crate::transport::{Endpoint, LinkStream, Transport, FALLBACK_CHANNEL, SERIAL_SERVICE_UUID};

/// Handle to an in-flight connection attempt.
#[derive(Debug)]
pub struct Connector {
    cancel: Option<oneshot::Sender<()>>,
    _task: JoinHandle<()>,
}

impl Connector {
    /// Start an attempt against `endpoint`.
    ///
    /// The returned receiver yields the attempt's outcome, or nothing if
    /// the connector is cancelled first.
    pub fn spawn(
        transport: Arc<dyn Transport>,
        endpoint: Endpoint,
    ) -> (Self, oneshot::Receiver<Result<LinkStream>>) {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let (outcome_tx, outcome_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            tracing::info!(address = %endpoint.address, "connect attempt started");
            tokio::select! {
                _ = cancel_rx => {
                    tracing::debug!("connect attempt cancelled");
                }
                outcome = attempt(&*transport, &endpoint) => {
                    let _ = outcome_tx.send(outcome);
                }
            }
        });

        (
            Self {
                cancel: Some(cancel_tx),
                _task: task,
            },
            outcome_rx,
        )
    }

    /// Abort the attempt. The pending dial unblocks by having its
    /// half-open stream dropped. Idempotent; also runs on drop.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for Connector {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Run both strategies in order against `endpoint`.
async fn attempt(transport: &dyn Transport, endpoint: &Endpoint) -> Result<LinkStream> {
    // Discovery slows or blocks new connections on most stacks.
    transport.cancel_discovery().await;

    let primary = match transport.connect_service(endpoint, SERIAL_SERVICE_UUID).await {
        Ok(stream) => return Ok(stream),
        Err(e) => e,
    };

    tracing::warn!(
        "service connect failed ({}), trying insecure channel {}",
        primary,
        FALLBACK_CHANNEL
    );

    match transport.connect_channel(endpoint, FALLBACK_CHANNEL).await {
        Ok(stream) => Ok(stream),
        Err(fallback) => Err(LinkError::Connect(format!(
            "service: {primary}; channel {FALLBACK_CHANNEL}: {fallback}"
        ))),
    }
}
