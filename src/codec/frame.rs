//! ThinkGear frame assembly
//!
//! Wire format:
//!
//! ```text
//! [0xAA] [0xAA] [LEN] [PAYLOAD x LEN] [CHECKSUM]
//! ```
//!
//! `CHECKSUM` is the one's complement of the low byte of the payload sum.
//! Serial reads arrive in arbitrary chunks, so the assembler keeps a
//! carry-over buffer between `ingest` calls and only emits frames that are
//! complete and checksum-valid.

use super::error::DecodeError;
use super::{MAX_FRAME_LEN, MAX_PAYLOAD_LEN, SYNC};
use bytes::Bytes;
use std::fmt;
use std::iter::FusedIterator;

/// A complete, checksum-validated frame payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    payload: Bytes,
}

impl RawFrame {
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Checksum over payload bytes
#[inline]
pub fn checksum(payload: &[u8]) -> u8 {
    !payload.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    PayloadTooLarge(usize),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadTooLarge(size) => write!(
                f,
                "Payload too large: {} bytes (max {})",
                size, MAX_PAYLOAD_LEN
            ),
        }
    }
}

impl std::error::Error for EncodeError {}

/// Append a well-formed frame around `payload` to `output`
///
/// Returns the number of bytes written.
pub fn encode_frame(payload: &[u8], output: &mut Vec<u8>) -> Result<usize, EncodeError> {
    if payload.len() > MAX_PAYLOAD_LEN as usize {
        return Err(EncodeError::PayloadTooLarge(payload.len()));
    }

    output.reserve(payload.len() + 4);
    output.extend_from_slice(&[SYNC, SYNC, payload.len() as u8]);
    output.extend_from_slice(payload);
    output.push(checksum(payload));
    Ok(payload.len() + 4)
}

/// Stateful frame assembler
///
/// Exactly one `ingest` may be in flight at a time; the `&mut self`
/// receiver enforces this.
///
/// # Example
///
/// ```ignore
/// let mut assembler = FrameAssembler::new();
/// for chunk in [&[0xAA, 0xAA, 0x02][..], &[0x04, 0x37, 0xC4]] {
///     for frame in assembler.ingest(chunk) {
///         // Ok(RawFrame) once the checksum byte arrives
///     }
/// }
/// ```
#[derive(Debug)]
pub struct FrameAssembler {
    buffer: Vec<u8>,
    skipped: u64,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MAX_FRAME_LEN * 2),
            skipped: 0,
        }
    }

    /// Feed a chunk and iterate over the frames it completes
    ///
    /// The returned iterator is lazy. Bytes it has not consumed when it is
    /// dropped stay buffered for the next call.
    pub fn ingest(&mut self, chunk: &[u8]) -> Frames<'_> {
        self.buffer.extend_from_slice(chunk);
        Frames {
            assembler: self,
            cursor: 0,
            done: false,
        }
    }

    /// Bytes currently held in the carry-over buffer
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Total bytes discarded without yielding a frame
    ///
    /// Covers sync hunting, rejected sync bytes and corrupt frames.
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped
    }

    /// Discard carry-over (a trailing partial frame is expected on shutdown)
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    fn next_frame(&mut self, cursor: &mut usize) -> Option<Result<RawFrame, DecodeError>> {
        let buf = &self.buffer;
        let start = *cursor;

        let Some(sync_at) = find_sync(&buf[start..]).map(|p| start + p) else {
            // Keep a lone trailing sync byte, its partner may be in the next chunk
            let keep = usize::from(buf.len() > start && buf[buf.len() - 1] == SYNC);
            let end = buf.len() - keep;
            self.skipped += (end - start) as u64;
            *cursor = end;
            return None;
        };
        self.skipped += (sync_at - start) as u64;
        *cursor = sync_at;

        let &length = buf.get(sync_at + 2)?;
        if length == SYNC {
            self.skipped += 1;
            *cursor = sync_at + 1;
            return Some(Err(DecodeError::FalseSync));
        }
        if length > MAX_PAYLOAD_LEN {
            self.skipped += 1;
            *cursor = sync_at + 1;
            return Some(Err(DecodeError::OversizedLength { length }));
        }

        let body = sync_at + 3;
        let end = body + length as usize;
        let &expected = buf.get(end)?;

        let payload = &buf[body..end];
        let computed = checksum(payload);
        *cursor = end + 1;

        if computed != expected {
            self.skipped += (end + 1 - sync_at) as u64;
            return Some(Err(DecodeError::FrameChecksum {
                expected,
                computed,
                length,
            }));
        }

        Some(Ok(RawFrame {
            payload: Bytes::copy_from_slice(payload),
        }))
    }
}

fn find_sync(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| w[0] == SYNC && w[1] == SYNC)
}

/// Lazy iterator over frames completed by one `ingest` call
pub struct Frames<'a> {
    assembler: &'a mut FrameAssembler,
    cursor: usize,
    done: bool,
}

impl Iterator for Frames<'_> {
    type Item = Result<RawFrame, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.assembler.next_frame(&mut self.cursor);
        if item.is_none() {
            self.done = true;
        }
        item
    }
}

impl FusedIterator for Frames<'_> {}

impl Drop for Frames<'_> {
    fn drop(&mut self) {
        self.assembler.buffer.drain(..self.cursor);
    }
}
