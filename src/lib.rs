//! # rflink
//!
//! Session manager and framed ack protocol for serial remote peripherals.
//!
//! The crate drives a single point-to-point duplex byte stream: it runs the
//! connection lifecycle (listen, connect with fallback, connected, stop),
//! performs the one-shot configuration handshake, then continuously
//! validates fixed-layout data frames with a table-driven CRC-8 and answers
//! each good one with the matching acknowledgment.
//!
//! ## Architecture
//!
//! - **Controller**: the state machine; at most one connection attempt and
//!   one live session at a time, every transition serialized and reported
//!   on the event channel.
//! - **Connector**: one task per attempt; secure service dial first,
//!   insecure fixed-channel fallback second, cancellable by dropping.
//! - **Session**: owns the connected stream; a receive loop task feeds the
//!   frame codec and a dedicated writer task serializes all outbound bytes.
//!
//! ## Example
//!
//! ```ignore
//! use rflink::{event, Endpoint, LinkController, LinkEvent};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (events, mut events_rx) = event::channel();
//!     let controller = LinkController::new(my_transport, events);
//!
//!     controller.start();
//!     controller.connect(Endpoint::new("00:11:22:33:44:55", "HR Monitor"));
//!
//!     while let Some(event) = events_rx.recv().await {
//!         match event {
//!             LinkEvent::StateChanged(state) => println!("state: {state:?}"),
//!             LinkEvent::RawPayload { len, .. } => println!("{len} bytes in"),
//!             _ => {}
//!         }
//!     }
//! }
//! ```

pub mod crc;
pub mod error;
pub mod event;
pub mod protocol;
pub mod transport;

mod connector;
mod controller;
mod session;
mod writer;

pub use controller::LinkController;
pub use error::{LinkError, Result};
pub use event::{ConnectionState, LinkEvent};
pub use protocol::Command;
pub use transport::{Endpoint, LinkStream, Transport};
