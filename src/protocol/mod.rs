//! Frame protocol engine.
//!
//! Byte-level classification of inbound frames, construction of the
//! matching acknowledgments, and the per-session handshake/sequence state
//! that drives both.

mod codec;
mod frame;

pub use codec::FrameCodec;
pub use frame::{
    build_data_ack, classify, data_checksum_ok, Command, FrameKind, CONFIG_ACK, DATA_ACK_LEN,
    DATA_CRC_OFFSET, DATA_CRC_SPAN, DATA_FRAME_LEN, FRAME_MARKER, READ_BUFFER_SIZE,
    SEQUENCE_OFFSET, TERMINATE, TYPE_CONFIG, TYPE_DATA, TYPE_OFFSET,
};
