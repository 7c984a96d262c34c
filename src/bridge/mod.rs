//! Bridge runner
//!
//! Wires a serial transport, the ThinkGear codec and the configured sink
//! into one [`Session`] and runs it to completion.

pub mod session;
pub mod stats;

pub use session::Session;
pub use stats::{Snapshot, Stats};

use crate::config::{self, Config, SinkConfig, SinkKind};
use crate::error::Result;
use crate::sink::{ConsoleSink, EventSink, FileSink, FileSinkConfig, RecordFormat};
use crate::transport::{SerialTransport, Transport};
use bytes::Bytes;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build the sink described by `[sink]`
pub fn build_sink(cfg: &SinkConfig) -> Result<Box<dyn EventSink>> {
    let format = match cfg.kind {
        SinkKind::Console => {
            return Ok(Box::new(ConsoleSink::stdout().with_raw(cfg.show_raw)));
        }
        SinkKind::Csv => RecordFormat::Csv,
        SinkKind::Jsonl => RecordFormat::Jsonl,
    };

    let sink = FileSink::spawn(FileSinkConfig {
        path: cfg.path.clone(),
        format,
        max_bytes: cfg.max_bytes,
        max_files: cfg.max_files,
        flush_interval: Duration::from_millis(cfg.flush_interval_ms),
        channel_capacity: cfg.channel_capacity,
    })?;
    info!("Recording to {} ({:?})", cfg.path.display(), cfg.kind);
    Ok(Box::new(sink))
}

/// Data-mode request written after the port opens, if enabled
pub fn request_bytes(cfg: &Config) -> Option<Bytes> {
    cfg.serial
        .send_request
        .then(|| Bytes::copy_from_slice(&[cfg.serial.request_byte]))
}

/// Open the headset and decode until shutdown or disconnect
pub async fn run(cfg: &Config, shutdown: Arc<AtomicBool>, stats: Arc<Stats>) -> Result<()> {
    let port = config::detect_serial(cfg)?;
    let sink = build_sink(&cfg.sink)?;

    let transport = SerialTransport::new(port.clone(), cfg.serial.baud_rate)
        .with_read_timeout(Duration::from_millis(cfg.serial.read_timeout_ms));
    let channels = transport.spawn(shutdown.clone())?;
    info!("Connected: {} @ {} baud", port, cfg.serial.baud_rate);

    let mut session = Session::new(channels, sink, stats);
    if let Some(request) = request_bytes(cfg) {
        session = session.with_request(request);
    }

    let result = session.run(shutdown).await.map(|_| ());
    info!("Disconnected: {}", port);
    result
}
