//! Bridge session - byte source to event sink
//!
//! The session handles:
//! - Feeding chunks from the transport into the codec
//! - Forwarding events to the sink in emission order
//! - Reporting decode errors (tracing, counters, optional side channel)
//! - Statistics tracking
//!
//! The session does NOT handle:
//! - Transport lifecycle (that's the caller's responsibility)
//! - Reconnection (a byte-source failure ends the session)

use super::stats::Stats;
use crate::codec::{DecodeError, Decoded, ThinkGearCodec};
use crate::constants::SHUTDOWN_POLL_MS;
use crate::error::{BridgeError, Result};
use crate::sink::EventSink;
use crate::transport::TransportChannels;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// One decoding run over a single transport
///
/// Owns the codec, so exactly one ingest is ever in flight.
///
/// # Example
///
/// ```ignore
/// let session = Session::new(channels, ConsoleSink::stdout(), stats)
///     .with_request(Bytes::from_static(&[0xAA]));
/// session.run(shutdown).await?;
/// ```
pub struct Session<S: EventSink> {
    source: TransportChannels,
    codec: ThinkGearCodec,
    sink: S,
    stats: Arc<Stats>,
    error_tx: Option<mpsc::Sender<DecodeError>>,
    request: Option<Bytes>,
    sink_failing: bool,
}

impl<S: EventSink> Session<S> {
    pub fn new(source: TransportChannels, sink: S, stats: Arc<Stats>) -> Self {
        Self {
            source,
            codec: ThinkGearCodec::new(),
            sink,
            stats,
            error_tx: None,
            request: None,
            sink_failing: false,
        }
    }

    /// Mirror every decode error onto `tx` (dropped if the channel is full)
    pub fn with_error_channel(mut self, tx: mpsc::Sender<DecodeError>) -> Self {
        self.error_tx = Some(tx);
        self
    }

    /// Bytes written to the device before reading starts
    pub fn with_request(mut self, request: Bytes) -> Self {
        self.request = Some(request);
        self
    }

    /// Run until shutdown, end of stream, or byte-source failure
    ///
    /// Returns the sink on clean exit. A byte-source failure is returned as
    /// `BridgeError::ByteSource` after the sink has been closed.
    pub async fn run(mut self, shutdown: Arc<AtomicBool>) -> Result<S> {
        if let Some(request) = self.request.take() {
            debug!("Sending data request ({} B)", request.len());
            if self.source.tx.send(request).await.is_err() {
                warn!("Device writer closed before data request was sent");
            }
        }

        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            tokio::select! {
                biased;

                _ = tokio::time::sleep(Duration::from_millis(SHUTDOWN_POLL_MS)) => {}

                msg = self.source.rx.recv() => {
                    match msg {
                        Some(Ok(chunk)) => self.ingest(&chunk),
                        Some(Err(e)) => {
                            self.finish();
                            return Err(BridgeError::ByteSource { source: e });
                        }
                        // Channel closed = end of stream
                        None => break,
                    }
                }
            }
        }

        self.finish();
        Ok(self.sink)
    }

    /// Decode one chunk and dispatch its output
    fn ingest(&mut self, chunk: &[u8]) {
        self.stats.add_chunk(chunk.len());
        let received_at = chrono::Local::now();

        let Self {
            codec,
            sink,
            stats,
            error_tx,
            sink_failing,
            ..
        } = self;

        codec.decode(chunk, received_at, |out| match out {
            Decoded::Event(event) => {
                stats.add_event();
                match sink.send(&event) {
                    Ok(()) => *sink_failing = false,
                    Err(e) => {
                        stats.add_sink_error();
                        if !*sink_failing {
                            warn!("Sink rejected event: {}", e);
                            *sink_failing = true;
                        }
                    }
                }
            }
            Decoded::Error(e) => {
                stats.add_decode_error(e.kind());
                if e.is_framing() {
                    warn!("Frame rejected: {}", e);
                } else {
                    warn!("Payload error: {}", e);
                }
                if let Some(tx) = error_tx {
                    let _ = tx.try_send(e);
                }
            }
        });
    }

    fn finish(&mut self) {
        self.codec.reset();
        if let Err(e) = close_sink(&mut self.sink) {
            self.stats.add_sink_error();
            warn!("Sink close failed: {}", e);
        }

        let snap = self.stats.snapshot();
        info!(
            "Session ended: {} B in, {} frames, {} events, {} decode errors, {} skipped B, {} dropped",
            snap.bytes_in,
            self.codec.frames(),
            snap.events,
            snap.decode_errors(),
            self.codec.skipped_bytes(),
            self.sink.dropped()
        );
    }
}

/// Close the sink without stalling other tasks on this worker
///
/// Closing can wait for a writer thread to drain its queue.
fn close_sink<S: EventSink>(sink: &mut S) -> Result<()> {
    match Handle::try_current().map(|h| h.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(|| sink.close()),
        _ => sink.close(),
    }
}
