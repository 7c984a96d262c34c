//! ThinkGear stream codec
//!
//! Separates the two decoding stages:
//! - **Frame assembly** (`frame`): stateful, sync/length/checksum
//! - **Payload decoding** (`payload`): stateless, data rows to events
//!
//! `ThinkGearCodec` chains both and is what the bridge session drives.

pub mod error;
pub mod event;
pub mod frame;
pub mod payload;

pub use error::{DecodeError, DecodeErrorKind};
pub use event::{Code, DataRow, Event, ExtendedCode, Value};
pub use frame::{encode_frame, EncodeError, FrameAssembler, RawFrame};

use chrono::{DateTime, Local};

/// Frame sync byte (sent twice)
pub const SYNC: u8 = 0xAA;

/// Extended-code continuation byte
pub const EXCODE: u8 = 0x55;

/// Largest valid payload length
pub const MAX_PAYLOAD_LEN: u8 = 169;

/// Sync x2 + length + payload + checksum
pub const MAX_FRAME_LEN: usize = MAX_PAYLOAD_LEN as usize + 4;

/// Output of the codec, in stream order
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Event(Event),
    Error(DecodeError),
}

/// Frame assembler and payload decoder in one
///
/// # Example
///
/// ```ignore
/// let mut codec = ThinkGearCodec::new();
/// codec.decode(&chunk, chrono::Local::now(), |out| match out {
///     Decoded::Event(event) => sink.send(&event),
///     Decoded::Error(err) => warn!("{}", err),
/// });
/// ```
#[derive(Debug, Default)]
pub struct ThinkGearCodec {
    assembler: FrameAssembler,
    frames: u64,
}

impl ThinkGearCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk, calling `on_output` for every event and error
    ///
    /// All events from this chunk share `received_at`.
    pub fn decode(
        &mut self,
        data: &[u8],
        received_at: DateTime<Local>,
        mut on_output: impl FnMut(Decoded),
    ) {
        for frame in self.assembler.ingest(data) {
            match frame {
                Ok(frame) => {
                    self.frames += 1;
                    for item in payload::decode_payload(frame.payload(), received_at) {
                        on_output(match item {
                            Ok(event) => Decoded::Event(event),
                            Err(e) => Decoded::Error(e),
                        });
                    }
                }
                Err(e) => on_output(Decoded::Error(e)),
            }
        }
    }

    /// Valid frames assembled so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Bytes discarded by the assembler (noise, false syncs, corrupt frames)
    pub fn skipped_bytes(&self) -> u64 {
        self.assembler.skipped_bytes()
    }

    /// Drop any partial frame held in the carry-over buffer
    pub fn reset(&mut self) {
        self.assembler.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(codec: &mut ThinkGearCodec, data: &[u8]) -> Vec<Decoded> {
        let mut out = Vec::new();
        codec.decode(data, Local::now(), |d| out.push(d));
        out
    }

    fn events(out: &[Decoded]) -> Vec<(Code, Value)> {
        out.iter()
            .filter_map(|d| match d {
                Decoded::Event(e) => Some((e.code.code, e.value.clone())),
                Decoded::Error(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_end_to_end_attention_and_heart_rate() {
        let mut codec = ThinkGearCodec::new();
        let out = collect(&mut codec, &[0xAA, 0xAA, 0x04, 0x04, 0x37, 0x03, 0x64, 0x5D]);
        assert_eq!(
            events(&out),
            vec![
                (Code::Attention, Value::Byte(55)),
                (Code::HeartRate, Value::Byte(100)),
            ]
        );
        assert_eq!(codec.frames(), 1);
    }

    #[test]
    fn test_wrong_checksum_yields_error_only() {
        let mut codec = ThinkGearCodec::new();
        let out = collect(&mut codec, &[0xAA, 0xAA, 0x04, 0x04, 0x37, 0x03, 0x64, 0xCA]);
        assert_eq!(out.len(), 1);
        assert!(matches!(
            out[0],
            Decoded::Error(DecodeError::FrameChecksum {
                expected: 0xCA,
                computed: 0x5D,
                length: 4
            })
        ));
        assert_eq!(codec.frames(), 0);
    }

    #[test]
    fn test_payload_error_keeps_next_frame() {
        let mut stream = Vec::new();
        encode_frame(&[0x04, 0x10, 0x99, 0x01], &mut stream).unwrap();
        encode_frame(&[0x05, 0x20], &mut stream).unwrap();

        let mut codec = ThinkGearCodec::new();
        let out = collect(&mut codec, &stream);
        assert_eq!(out.len(), 3);
        assert!(matches!(
            out[1],
            Decoded::Error(DecodeError::UnrecognizedCode { code: 0x99, offset: 2 })
        ));
        assert_eq!(
            events(&out),
            vec![
                (Code::Attention, Value::Byte(0x10)),
                (Code::Meditation, Value::Byte(0x20)),
            ]
        );
    }
}
