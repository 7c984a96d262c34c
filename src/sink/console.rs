//! Console presentation
//!
//! ```text
//! [SIGNAL] POOR_SIGNAL: 200 (no contact)
//! [eSense] ATTENTION: 55
//! [EEG] ASIC_EEG_POWER:
//!   Band 1: 1234
//!   ...
//! ```

use super::EventSink;
use crate::codec::{Code, Event, Value};
use crate::error::{BridgeError, Result};
use std::io::{self, Write};

/// Labelled, human-readable lines
///
/// Raw wave samples arrive at 512 Hz and are hidden unless `with_raw(true)`.
pub struct ConsoleSink<W: Write + Send> {
    out: W,
    show_raw: bool,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            show_raw: false,
        }
    }

    pub fn with_raw(mut self, show_raw: bool) -> Self {
        self.show_raw = show_raw;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_event(&mut self, event: &Event) -> io::Result<()> {
        let code = event.code.code;
        let name = code.name();
        let ex = match event.code.level {
            0 => String::new(),
            n => format!(" (excode {})", n),
        };
        let tag = match code {
            Code::SignalQuality => "[SIGNAL]",
            Code::Attention | Code::Meditation => "[eSense]",
            Code::HeartRate => "[HR]",
            Code::EegPower | Code::AsicEegPower => "[EEG]",
            Code::RawWave | Code::Raw8Bit => "[RAW]",
            Code::RrInterval => "[RR]",
            Code::RawMarker => "[MARK]",
            Code::Unrecognized(_) => "[?]",
        };

        match &event.value {
            Value::Byte(v) if event.is_no_contact() => {
                writeln!(self.out, "{} {}{}: {} (no contact)", tag, name, ex, v)
            }
            Value::Byte(v) => writeln!(self.out, "{} {}{}: {}", tag, name, ex, v),
            Value::Signed16(v) => writeln!(self.out, "{} {}{}: {}", tag, name, ex, v),
            Value::Unsigned16(v) if code == Code::RrInterval => {
                writeln!(self.out, "{} {}{}: {} ms", tag, name, ex, v)
            }
            Value::Unsigned16(v) => writeln!(self.out, "{} {}{}: {}", tag, name, ex, v),
            Value::Marker => writeln!(self.out, "{} {}{}", tag, name, ex),
            Value::EegPower(bands) => {
                writeln!(self.out, "{} {}{}:", tag, name, ex)?;
                for (i, band) in bands.iter().enumerate() {
                    writeln!(self.out, "  Band {}: {}", i + 1, band)?;
                }
                Ok(())
            }
            Value::AsicEegPower(bands) => {
                writeln!(self.out, "{} {}{}:", tag, name, ex)?;
                for (i, band) in bands.iter().enumerate() {
                    writeln!(self.out, "  Band {}: {}", i + 1, band)?;
                }
                Ok(())
            }
        }
    }
}

impl<W: Write + Send> EventSink for ConsoleSink<W> {
    fn send(&mut self, event: &Event) -> Result<()> {
        if !self.show_raw && matches!(event.code.code, Code::RawWave | Code::Raw8Bit) {
            return Ok(());
        }
        self.write_event(event)
            .map_err(|e| BridgeError::SinkWrite { source: e })
    }

    fn flush(&mut self) -> Result<()> {
        self.out
            .flush()
            .map_err(|e| BridgeError::SinkWrite { source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{DataRow, ExtendedCode};
    use chrono::Local;

    fn render(sink: ConsoleSink<Vec<u8>>, events: &[(ExtendedCode, Value)]) -> String {
        let mut sink = sink;
        for (code, value) in events {
            let event = DataRow {
                code: *code,
                value: value.clone(),
            }
            .at(Local::now());
            sink.send(&event).unwrap();
        }
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn test_esense_and_signal_lines() {
        let text = render(
            ConsoleSink::new(Vec::new()),
            &[
                (Code::SignalQuality.into(), Value::Byte(200)),
                (Code::Attention.into(), Value::Byte(55)),
                (Code::Meditation.into(), Value::Byte(40)),
                (Code::HeartRate.into(), Value::Byte(72)),
            ],
        );
        assert_eq!(
            text,
            "[SIGNAL] POOR_SIGNAL: 200 (no contact)\n\
             [eSense] ATTENTION: 55\n\
             [eSense] MEDITATION: 40\n\
             [HR] HEART_RATE: 72\n"
        );
    }

    #[test]
    fn test_no_contact_only_for_signal_quality() {
        let text = render(
            ConsoleSink::new(Vec::new()),
            &[
                (Code::SignalQuality.into(), Value::Byte(199)),
                (Code::Attention.into(), Value::Byte(200)),
            ],
        );
        assert_eq!(text, "[SIGNAL] POOR_SIGNAL: 199\n[eSense] ATTENTION: 200\n");
    }

    #[test]
    fn test_band_block() {
        let text = render(
            ConsoleSink::new(Vec::new()),
            &[(
                Code::AsicEegPower.into(),
                Value::AsicEegPower([1, 2, 3, 4, 5, 6, 7, 8]),
            )],
        );
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "[EEG] ASIC_EEG_POWER:");
        assert_eq!(lines[1], "  Band 1: 1");
        assert_eq!(lines[8], "  Band 8: 8");
    }

    #[test]
    fn test_raw_hidden_by_default() {
        let events = [
            (Code::RawWave.into(), Value::Signed16(500)),
            (Code::Attention.into(), Value::Byte(10)),
        ];
        let hidden = render(ConsoleSink::new(Vec::new()), &events);
        assert_eq!(hidden, "[eSense] ATTENTION: 10\n");

        let shown = render(ConsoleSink::new(Vec::new()).with_raw(true), &events);
        assert!(shown.starts_with("[RAW] RAW_WAVE: 500\n"));
    }

    #[test]
    fn test_excode_level_shown() {
        let text = render(
            ConsoleSink::new(Vec::new()),
            &[(ExtendedCode::new(2, Code::Attention), Value::Byte(50))],
        );
        assert_eq!(text, "[eSense] ATTENTION (excode 2): 50\n");
    }

    #[test]
    fn test_rr_interval_and_marker() {
        let text = render(
            ConsoleSink::new(Vec::new()),
            &[
                (Code::RrInterval.into(), Value::Unsigned16(812)),
                (Code::RawMarker.into(), Value::Marker),
            ],
        );
        assert_eq!(text, "[RR] RR_INTERVAL: 812 ms\n[MARK] RAW_MARKER\n");
    }
}
