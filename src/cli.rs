//! Command-line interface definition using clap
//!
//! Provides structured argument parsing with automatic help generation.
//! Flags override the matching config file values.

use crate::config::{Config, SinkKind};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

// =============================================================================
// CLI Definition
// =============================================================================

/// ThinkGear decoder for NeuroSky MindWave headsets
#[derive(Parser, Debug, Default)]
#[command(name = "mw-bridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose debug output
    #[arg(short, long)]
    pub verbose: bool,

    /// Config file (default: config.toml next to the executable)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Serial port to use (overrides config and auto-detection)
    #[arg(long, value_name = "PORT")]
    pub port: Option<String>,

    /// Serial baud rate (default: 57600)
    #[arg(long, value_name = "BAUD")]
    pub baud: Option<u32>,

    /// Where decoded events go
    #[arg(long, value_enum, value_name = "KIND")]
    pub sink: Option<SinkArg>,

    /// Record file for csv / jsonl sinks
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Print raw wave samples on the console
    #[arg(long)]
    pub raw: bool,

    /// Don't send the data-mode request byte after opening the port
    #[arg(long)]
    pub no_request: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SinkArg {
    Console,
    Csv,
    Jsonl,
}

impl From<SinkArg> for SinkKind {
    fn from(arg: SinkArg) -> Self {
        match arg {
            SinkArg::Console => SinkKind::Console,
            SinkArg::Csv => SinkKind::Csv,
            SinkArg::Jsonl => SinkKind::Jsonl,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial ports and exit
    ListPorts,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = &self.port {
            config.serial.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if let Some(sink) = self.sink {
            config.sink.kind = sink.into();
        }
        if let Some(output) = &self.output {
            config.sink.path = output.clone();
            // An output file without --sink means "record as CSV"
            if self.sink.is_none() && !config.sink.kind.is_file() {
                config.sink.kind = SinkKind::Csv;
            }
        }
        if self.raw {
            config.sink.show_raw = true;
        }
        if self.no_request {
            config.serial.send_request = false;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
