//! Pipeline statistics
//!
//! Thread-safe counters shared between the session and whoever reports on
//! it. Uses lock-free atomics for all operations.

use crate::codec::DecodeErrorKind;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one bridge run
#[derive(Debug, Default)]
pub struct Stats {
    /// Bytes received from the byte source
    bytes_in: AtomicU64,
    /// Chunks received from the byte source (including empty ones)
    chunks: AtomicU64,
    /// Events handed to the sink
    events: AtomicU64,
    checksum_errors: AtomicU64,
    false_syncs: AtomicU64,
    oversized_lengths: AtomicU64,
    unrecognized_codes: AtomicU64,
    truncated_fields: AtomicU64,
    /// Sink send/flush failures
    sink_errors: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub bytes_in: u64,
    pub chunks: u64,
    pub events: u64,
    pub checksum_errors: u64,
    pub false_syncs: u64,
    pub oversized_lengths: u64,
    pub unrecognized_codes: u64,
    pub truncated_fields: u64,
    pub sink_errors: u64,
}

impl Snapshot {
    pub fn decode_errors(&self) -> u64 {
        self.checksum_errors
            + self.false_syncs
            + self.oversized_lengths
            + self.unrecognized_codes
            + self.truncated_fields
    }
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add_chunk(&self, bytes: usize) {
        self.chunks.fetch_add(1, Ordering::Relaxed);
        self.bytes_in.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_event(&self) {
        self.events.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_sink_error(&self) {
        self.sink_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_decode_error(&self, kind: DecodeErrorKind) {
        let counter = match kind {
            DecodeErrorKind::FrameChecksum => &self.checksum_errors,
            DecodeErrorKind::FalseSync => &self.false_syncs,
            DecodeErrorKind::OversizedLength => &self.oversized_lengths,
            DecodeErrorKind::UnrecognizedCode => &self.unrecognized_codes,
            DecodeErrorKind::TruncatedField => &self.truncated_fields,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            bytes_in: self.bytes_in.load(Ordering::Relaxed),
            chunks: self.chunks.load(Ordering::Relaxed),
            events: self.events.load(Ordering::Relaxed),
            checksum_errors: self.checksum_errors.load(Ordering::Relaxed),
            false_syncs: self.false_syncs.load(Ordering::Relaxed),
            oversized_lengths: self.oversized_lengths.load(Ordering::Relaxed),
            unrecognized_codes: self.unrecognized_codes.load(Ordering::Relaxed),
            truncated_fields: self.truncated_fields.load(Ordering::Relaxed),
            sink_errors: self.sink_errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = Stats::new();
        stats.add_chunk(10);
        stats.add_chunk(0);
        stats.add_event();
        stats.add_decode_error(DecodeErrorKind::FrameChecksum);
        stats.add_decode_error(DecodeErrorKind::TruncatedField);
        stats.add_sink_error();

        let snap = stats.snapshot();
        assert_eq!(snap.bytes_in, 10);
        assert_eq!(snap.chunks, 2);
        assert_eq!(snap.events, 1);
        assert_eq!(snap.checksum_errors, 1);
        assert_eq!(snap.decode_errors(), 2);
        assert_eq!(snap.sink_errors, 1);
    }
}
