//! Transport abstraction for byte-level I/O
//!
//! Separates I/O concerns from protocol logic:
//! - **Transport**: How bytes flow (serial link to the headset)
//! - **Codec**: How frames are assembled and decoded (handled separately)
//!
//! # Adding a new transport
//!
//! 1. Create `transport/my_transport.rs`
//! 2. Implement the `Transport` trait
//! 3. Add `pub mod my_transport;` here

pub mod serial;

pub use serial::SerialTransport;

use bytes::Bytes;
use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::Result;

/// Channels for bidirectional communication with a transport
///
/// The transport owns the underlying I/O and communicates via these
/// channels. When it stops it closes `rx`, after sending a final `Err`
/// if the stop was caused by an I/O failure.
pub struct TransportChannels {
    /// Chunks read from the device, in arrival order
    ///
    /// Chunks may be empty, partial, or span several frames.
    pub rx: mpsc::Receiver<io::Result<Bytes>>,

    /// Bytes to write to the device
    pub tx: mpsc::Sender<Bytes>,
}

/// Trait for spawnable transports
///
/// A transport handles opening the link, moving raw bytes, and its own
/// threading model. It does NOT handle framing, statistics, or
/// reconnection.
///
/// # Lifecycle
///
/// 1. Create transport with configuration
/// 2. Call `spawn()` to start I/O in background
/// 3. Use returned channels for communication
/// 4. Transport runs until `shutdown` is set or a fatal error occurs
/// 5. Transport closes channels when stopping
pub trait Transport: Send + 'static {
    /// Spawn the transport in background
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be initialized
    /// (e.g., port not found, permission denied).
    fn spawn(self, shutdown: Arc<AtomicBool>) -> Result<TransportChannels>;
}
