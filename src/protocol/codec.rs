//! Per-session frame codec.
//!
//! Owns the handshake flag and the diagnostic sequence counter, and turns
//! each inbound buffer into the acknowledgment that should go back out, if
//! any. The codec never performs I/O; the session's receive loop feeds it
//! buffers and writes whatever it returns.

use bytes::Bytes;

use super::frame::{
    build_data_ack, classify, data_checksum_ok, FrameKind, CONFIG_ACK, DATA_CRC_OFFSET,
};

/// Stateful classifier/ack-builder for one session.
///
/// A fresh codec awaits the configuration handshake; the first config frame
/// flips it into steady-state permanently. The flip is one-way for the
/// codec's lifetime, which matches a session's lifetime.
#[derive(Debug)]
pub struct FrameCodec {
    awaiting_config: bool,
    sequence: u64,
}

impl FrameCodec {
    /// Create a codec in the awaiting-config state.
    pub fn new() -> Self {
        Self {
            awaiting_config: true,
            sequence: 0,
        }
    }

    /// Whether the configuration handshake is still outstanding.
    pub fn awaiting_config(&self) -> bool {
        self.awaiting_config
    }

    /// Number of data frames recognized so far, acked or not.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Process one inbound buffer and return the ack to transmit, if any.
    ///
    /// A data frame that fails its checksum comparison is counted but
    /// silently dropped: no ack, no error. That is the peripheral's
    /// observed contract.
    pub fn on_frame(&mut self, frame: &[u8]) -> Option<Bytes> {
        match classify(frame, self.awaiting_config) {
            FrameKind::Config => {
                tracing::debug!("config frame received, handshake complete");
                self.awaiting_config = false;
                Some(Bytes::from_static(&CONFIG_ACK))
            }
            FrameKind::Data => {
                self.sequence += 1;
                if data_checksum_ok(frame) {
                    Some(Bytes::copy_from_slice(&build_data_ack(frame)))
                } else {
                    tracing::trace!(
                        sequence = self.sequence,
                        comparator = frame.get(DATA_CRC_OFFSET).copied(),
                        "data frame failed checksum, dropping"
                    );
                    None
                }
            }
            FrameKind::Unrecognized => None,
        }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc;
    use crate::protocol::frame::{DATA_CRC_SPAN, DATA_FRAME_LEN, FRAME_MARKER, TYPE_DATA};

    fn valid_data_frame(seq: u8) -> Vec<u8> {
        let mut frame = vec![0u8; DATA_FRAME_LEN];
        frame[0] = FRAME_MARKER;
        frame[1] = TYPE_DATA;
        frame[3] = seq;
        frame[DATA_CRC_OFFSET] = crc::checksum(&frame[..DATA_CRC_SPAN]);
        frame
    }

    #[test]
    fn test_handshake_flips_once() {
        let mut codec = FrameCodec::new();
        assert!(codec.awaiting_config());

        let ack = codec.on_frame(&[0xa5, 0x55, 0x00]).unwrap();
        assert_eq!(&ack[..], &CONFIG_ACK);
        assert!(!codec.awaiting_config());

        // A second config-shaped buffer is no longer a config frame.
        assert!(codec.on_frame(&[0xa5, 0x55, 0x00]).is_none());
        assert!(!codec.awaiting_config());
    }

    #[test]
    fn test_data_before_handshake_is_ignored() {
        let mut codec = FrameCodec::new();
        assert!(codec.on_frame(&valid_data_frame(1)).is_none());
        assert_eq!(codec.sequence(), 0);
    }

    #[test]
    fn test_valid_data_frame_is_acked() {
        let mut codec = FrameCodec::new();
        codec.on_frame(&[0xa5, 0x55]).unwrap();

        let ack = codec.on_frame(&valid_data_frame(0x07)).unwrap();
        assert_eq!(&ack[..5], &[0xa5, 0xaa, 0x02, 0x07, 0x00]);
        assert_eq!(ack[5], crc::checksum(&ack[..5]));
        assert_eq!(codec.sequence(), 1);
    }

    #[test]
    fn test_checksum_mismatch_counts_but_drops() {
        let mut codec = FrameCodec::new();
        codec.on_frame(&[0xa5, 0x55]).unwrap();

        let mut frame = valid_data_frame(0x03);
        frame[DATA_CRC_OFFSET] ^= 0x01;
        assert!(codec.on_frame(&frame).is_none());
        assert_eq!(codec.sequence(), 1);

        // The counter keeps advancing for every recognized data frame.
        assert!(codec.on_frame(&valid_data_frame(0x04)).is_some());
        assert_eq!(codec.sequence(), 2);
    }

    #[test]
    fn test_unrecognized_frames_do_nothing() {
        let mut codec = FrameCodec::new();
        assert!(codec.on_frame(&[0xa5, 0x42, 0x00]).is_none());
        assert!(codec.awaiting_config());
        assert_eq!(codec.sequence(), 0);
    }
}
