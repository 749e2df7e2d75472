//! Wire format constants and frame builders.
//!
//! Inbound frames have a fixed layout:
//! ```text
//! ┌──────────┬──────────┬─────┬──────────┬─────────────────┬────────────┐
//! │ Marker   │ Type     │  ?  │ Sequence │ ...payload...   │ CRC @ 60   │
//! │ 0xA5     │ 55 / AA  │     │ byte 3   │                 │ over 0..59 │
//! └──────────┴──────────┴─────┴──────────┴─────────────────┴────────────┘
//! ```
//! Classification keys solely off the type byte at offset 1; the marker is
//! not checked (matching the peripheral's observed tolerance).
//!
//! Note the checksum asymmetry: the rolling CRC covers the first 59 bytes
//! but the comparator is read at offset 60, one past the covered span. This
//! matches captured traffic and must be preserved for wire compatibility
//! even though it looks off by one.

use crate::crc;

/// Marker byte at offset 0 of every observed frame.
pub const FRAME_MARKER: u8 = 0xa5;
/// Type byte for the one-shot configuration frame.
pub const TYPE_CONFIG: u8 = 0x55;
/// Type byte for steady-state data frames (unsigned 170).
pub const TYPE_DATA: u8 = 0xaa;

/// Offset of the frame type byte.
pub const TYPE_OFFSET: usize = 1;
/// Offset of the sequence byte in a data frame.
pub const SEQUENCE_OFFSET: usize = 3;
/// Number of leading bytes covered by a data frame's rolling checksum.
pub const DATA_CRC_SPAN: usize = 59;
/// Offset of the checksum comparator byte in a data frame.
pub const DATA_CRC_OFFSET: usize = 60;
/// Minimum length of a checkable data frame.
pub const DATA_FRAME_LEN: usize = 61;
/// Receive buffer size; only the first [`DATA_FRAME_LEN`] bytes are
/// protocol-significant.
pub const READ_BUFFER_SIZE: usize = 1024;

/// The fixed 5-byte config acknowledgment. Its trailer is the CRC-8 of its
/// own first four bytes.
pub const CONFIG_ACK: [u8; 5] = [0xa5, 0x55, 0x01, 0x00, 0xa2];
/// Length of a data acknowledgment.
pub const DATA_ACK_LEN: usize = 6;

/// Best-effort terminate sentinel written before tearing a session down.
pub const TERMINATE: u8 = 0xff;

/// Classification of one inbound buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Configuration handshake frame, valid only while awaiting config.
    Config,
    /// Steady-state data frame, valid only after the handshake.
    Data,
    /// Anything else; forwarded upward but never acknowledged.
    Unrecognized,
}

/// Application-level command bytes sent to the peer over a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Raise the peer's volume.
    VolumeUp = 0x01,
    /// Lower the peer's volume.
    VolumeDown = 0x02,
    /// Pointer movement.
    MouseMove = 0x03,
}

impl Command {
    /// Wire encoding of this command.
    #[inline]
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Classify an inbound buffer by its type byte, gated on the session's
/// handshake state.
pub fn classify(buf: &[u8], awaiting_config: bool) -> FrameKind {
    match buf.get(TYPE_OFFSET) {
        Some(&TYPE_CONFIG) if awaiting_config => FrameKind::Config,
        Some(&TYPE_DATA) if !awaiting_config => FrameKind::Data,
        _ => FrameKind::Unrecognized,
    }
}

/// Whether a data frame's comparator byte matches the CRC-8 of its covered
/// span. Buffers too short to carry the comparator never match.
pub fn data_checksum_ok(frame: &[u8]) -> bool {
    if frame.len() < DATA_FRAME_LEN {
        return false;
    }
    crc::checksum(&frame[..DATA_CRC_SPAN]) == frame[DATA_CRC_OFFSET]
}

/// Build the 6-byte acknowledgment for a data frame.
///
/// The sequence byte is copied from inbound offset 3, the type byte is
/// re-copied from inbound offset 1 (redundant but wire-required), and the
/// trailer is the CRC-8 of the ack's first five bytes.
///
/// # Panics
///
/// Panics if `frame` is shorter than 4 bytes; callers gate on
/// [`data_checksum_ok`] first, which requires a full-length frame.
pub fn build_data_ack(frame: &[u8]) -> [u8; DATA_ACK_LEN] {
    let mut ack = [FRAME_MARKER, TYPE_DATA, 0x02, 0x00, 0x00, 0x00];
    ack[3] = frame[SEQUENCE_OFFSET];
    ack[1] = frame[TYPE_OFFSET];
    ack[5] = crc::checksum(&ack[..5]);
    ack
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_config_while_awaiting() {
        assert_eq!(classify(&[0xa5, 0x55], true), FrameKind::Config);
    }

    #[test]
    fn test_classify_config_after_handshake_is_unrecognized() {
        assert_eq!(classify(&[0xa5, 0x55], false), FrameKind::Unrecognized);
    }

    #[test]
    fn test_classify_data_only_after_handshake() {
        assert_eq!(classify(&[0xa5, 0xaa], false), FrameKind::Data);
        assert_eq!(classify(&[0xa5, 0xaa], true), FrameKind::Unrecognized);
    }

    #[test]
    fn test_classify_short_buffer() {
        assert_eq!(classify(&[0xa5], true), FrameKind::Unrecognized);
        assert_eq!(classify(&[], false), FrameKind::Unrecognized);
    }

    #[test]
    fn test_classify_unknown_type() {
        assert_eq!(classify(&[0xa5, 0x42], true), FrameKind::Unrecognized);
        assert_eq!(classify(&[0xa5, 0x42], false), FrameKind::Unrecognized);
    }

    #[test]
    fn test_config_ack_self_checksums() {
        assert_eq!(crc::checksum(&CONFIG_ACK[..4]), CONFIG_ACK[4]);
    }

    #[test]
    fn test_build_data_ack_layout() {
        let mut frame = [0u8; DATA_FRAME_LEN];
        frame[0] = FRAME_MARKER;
        frame[1] = TYPE_DATA;
        frame[3] = 0x07;

        let ack = build_data_ack(&frame);
        assert_eq!(&ack[..5], &[0xa5, 0xaa, 0x02, 0x07, 0x00]);
        // Golden vector for sequence 0x07.
        assert_eq!(ack[5], 0x72);
        assert_eq!(ack[5], crc::checksum(&ack[..5]));
    }

    #[test]
    fn test_data_checksum_gate() {
        let mut frame = vec![0u8; DATA_FRAME_LEN];
        frame[0] = FRAME_MARKER;
        frame[1] = TYPE_DATA;
        frame[3] = 0x07;
        frame[DATA_CRC_OFFSET] = crc::checksum(&frame[..DATA_CRC_SPAN]);
        assert!(data_checksum_ok(&frame));

        frame[DATA_CRC_OFFSET] ^= 0xff;
        assert!(!data_checksum_ok(&frame));
    }

    #[test]
    fn test_data_checksum_rejects_short_frame() {
        assert!(!data_checksum_ok(&[0xa5, 0xaa, 0x00, 0x07]));
        assert!(!data_checksum_ok(&[0u8; DATA_FRAME_LEN - 1]));
    }

    #[test]
    fn test_command_bytes() {
        assert_eq!(Command::VolumeUp.as_byte(), 0x01);
        assert_eq!(Command::VolumeDown.as_byte(), 0x02);
        assert_eq!(Command::MouseMove.as_byte(), 0x03);
    }
}
