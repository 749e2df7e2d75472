//! Transport collaborator interface.
//!
//! The crate does not open radio links itself; it drives an externally
//! supplied [`Transport`] that knows how to reach a peer and hand back a
//! duplex byte stream. Production code plugs in the platform's serial
//! stack; tests plug in [`tokio::io::duplex`] fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use uuid::Uuid;

/// Well-known identifier of the peer's serial port service.
pub const SERIAL_SERVICE_UUID: Uuid = Uuid::from_u128(0x00001101_0000_1000_8000_00805F9B34FB);

/// Fixed channel number used by the insecure fallback strategy.
pub const FALLBACK_CHANNEL: u8 = 1;

/// Marker trait for anything usable as a live duplex stream.
pub trait LinkIo: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> LinkIo for T {}

impl std::fmt::Debug for dyn LinkIo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LinkIo")
    }
}

/// An open duplex byte channel to the connected peer.
pub type LinkStream = Box<dyn LinkIo>;

/// Identity of a remote peer, chosen by the caller. Immutable once a
/// connection attempt has started with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Transport-level address of the peer.
    pub address: String,
    /// Human-readable display name.
    pub name: String,
}

impl Endpoint {
    /// Create an endpoint from its address and display name.
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }
}

/// Backend that opens streams to remote endpoints.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Abort any ongoing discovery scan.
    ///
    /// Discovery competes with connection attempts on most stacks, so the
    /// connector always calls this before dialing.
    async fn cancel_discovery(&self);

    /// Open a secure channel to the endpoint's well-known service.
    async fn connect_service(
        &self,
        endpoint: &Endpoint,
        service: Uuid,
    ) -> std::io::Result<LinkStream>;

    /// Open an insecure channel on a fixed channel number.
    ///
    /// Fallback path for peers that reject service-record connections.
    /// Stacks without this capability keep the default, which reports
    /// `Unsupported` and lets the connector surface the primary failure.
    async fn connect_channel(
        &self,
        _endpoint: &Endpoint,
        _channel: u8,
    ) -> std::io::Result<LinkStream> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "transport has no insecure channel path",
        ))
    }
}
