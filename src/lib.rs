//! NeuroSky MindWave bridge
//!
//! Decodes the ThinkGear serial protocol into timestamped events and
//! forwards them to a console or record-file sink.

pub mod bridge;
pub mod cli;
pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod sink;
pub mod transport;
