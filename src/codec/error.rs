//! Decode errors reported on the side channel
//!
//! None of these are fatal to the stream. Each one costs at most the
//! frame or payload it was raised for.

use std::fmt;

/// A non-fatal framing or payload error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    // === Framing ===
    /// Complete frame whose checksum byte disagrees with its payload
    FrameChecksum {
        expected: u8,
        computed: u8,
        length: u8,
    },
    /// Sync pair followed by a length byte equal to the sync value
    FalseSync,
    /// Sync pair followed by a length above the protocol maximum
    OversizedLength { length: u8 },

    // === Payload ===
    /// Code byte with no known field length
    UnrecognizedCode { code: u8, offset: usize },
    /// Recognized code whose field runs past the end of the payload
    TruncatedField {
        code: u8,
        offset: usize,
        needed: usize,
        available: usize,
    },
}

/// Coarse classification used for counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeErrorKind {
    FrameChecksum,
    FalseSync,
    OversizedLength,
    UnrecognizedCode,
    TruncatedField,
}

impl DecodeError {
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            Self::FrameChecksum { .. } => DecodeErrorKind::FrameChecksum,
            Self::FalseSync => DecodeErrorKind::FalseSync,
            Self::OversizedLength { .. } => DecodeErrorKind::OversizedLength,
            Self::UnrecognizedCode { .. } => DecodeErrorKind::UnrecognizedCode,
            Self::TruncatedField { .. } => DecodeErrorKind::TruncatedField,
        }
    }

    /// True for errors raised by the frame assembler (before payload decoding)
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            Self::FrameChecksum { .. } | Self::FalseSync | Self::OversizedLength { .. }
        )
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameChecksum {
                expected,
                computed,
                length,
            } => write!(
                f,
                "Checksum mismatch: frame says 0x{:02X}, payload ({} B) sums to 0x{:02X}",
                expected, length, computed
            ),
            Self::FalseSync => write!(f, "False sync: length byte equals sync value"),
            Self::OversizedLength { length } => {
                write!(f, "Invalid frame length {} (max {})", length, super::MAX_PAYLOAD_LEN)
            }
            Self::UnrecognizedCode { code, offset } => {
                write!(f, "Unrecognized code 0x{:02X} at payload offset {}", code, offset)
            }
            Self::TruncatedField {
                code,
                offset,
                needed,
                available,
            } => write!(
                f,
                "Truncated field 0x{:02X} at payload offset {}: needs {} B, {} left",
                code, offset, needed, available
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(DecodeError::FalseSync.kind(), DecodeErrorKind::FalseSync);
        assert_eq!(
            DecodeError::UnrecognizedCode { code: 0x99, offset: 3 }.kind(),
            DecodeErrorKind::UnrecognizedCode
        );
    }

    #[test]
    fn test_framing_classification() {
        assert!(DecodeError::OversizedLength { length: 200 }.is_framing());
        assert!(!DecodeError::TruncatedField {
            code: 0x80,
            offset: 0,
            needed: 2,
            available: 1
        }
        .is_framing());
    }

    #[test]
    fn test_display_mentions_offending_byte() {
        let msg = DecodeError::UnrecognizedCode { code: 0x99, offset: 4 }.to_string();
        assert!(msg.contains("0x99"));
        assert!(msg.contains("offset 4"));
    }
}
