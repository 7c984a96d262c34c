//! Application-wide constants
//!
//! Centralized constants to avoid duplication and ensure consistency.

// =============================================================================
// Serial
// =============================================================================

/// MindWave serial baud rate
pub const DEFAULT_BAUD_RATE: u32 = 57_600;

/// Byte written after opening the port to request data output
pub const DEFAULT_REQUEST_BYTE: u8 = 0xAA;

/// Serial read timeout (milliseconds)
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 50;

/// Serial read buffer size
pub const SERIAL_BUFFER_SIZE: usize = 1024;

/// Consecutive zero-byte reads before assuming port disconnected
pub const SERIAL_DISCONNECT_THRESHOLD: u32 = 100;

/// Silicon Labs CP210x, used by the MindWave RF dongle
pub const DEFAULT_DEVICE_VID: u16 = 0x10C4;
pub const DEFAULT_DEVICE_PIDS: &[u16] = &[0xEA60];

// =============================================================================
// Channels
// =============================================================================

/// Capacity of the transport -> session chunk channel
pub const CHANNEL_CAPACITY: usize = 256;

/// Capacity of the session -> file writer queue
pub const SINK_CHANNEL_CAPACITY: usize = 4096;

// =============================================================================
// Records
// =============================================================================

/// Default record file
pub const DEFAULT_RECORD_PATH: &str = "records/mindwave.csv";

/// Rotate the record file once it reaches this size
pub const DEFAULT_RECORD_MAX_BYTES: u64 = 16 * 1024 * 1024;

/// Rotated record files kept
pub const DEFAULT_RECORD_MAX_FILES: usize = 5;

/// Record writer flush interval (milliseconds)
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 250;

// =============================================================================
// Timing
// =============================================================================

/// Session shutdown flag poll interval (milliseconds)
pub const SHUTDOWN_POLL_MS: u64 = 100;
