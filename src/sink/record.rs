//! Persisted record formats
//!
//! CSV: `timestamp,code,name,value`, band arrays joined with `;`.
//! JSON lines: one object per event.

use crate::codec::{Event, Value};
use serde::{Deserialize, Serialize};

pub const CSV_HEADER: &str = "timestamp,code,name,value";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    Csv,
    Jsonl,
}

impl RecordFormat {
    /// First line of a fresh file, if the format has one
    pub fn header(self) -> Option<&'static str> {
        match self {
            Self::Csv => Some(CSV_HEADER),
            Self::Jsonl => None,
        }
    }

    pub fn format(self, event: &Event) -> String {
        match self {
            Self::Csv => csv_line(event),
            Self::Jsonl => json_line(event),
        }
    }
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    timestamp: String,
    code: u16,
    excode: u8,
    name: &'static str,
    value: &'a Value,
}

fn timestamp(event: &Event) -> String {
    event.timestamp.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

/// Render a value without its type tag
pub fn format_value(value: &Value) -> String {
    fn join<T: ToString>(bands: &[T]) -> String {
        bands
            .iter()
            .map(|b| b.to_string())
            .collect::<Vec<_>>()
            .join(";")
    }

    match value {
        Value::Byte(v) => v.to_string(),
        Value::Signed16(v) => v.to_string(),
        Value::Unsigned16(v) => v.to_string(),
        Value::Marker => String::new(),
        Value::EegPower(bands) => join(bands),
        Value::AsicEegPower(bands) => join(bands),
    }
}

pub fn csv_line(event: &Event) -> String {
    format!(
        "{},0x{:02X},{},{}",
        timestamp(event),
        event.code.logical(),
        event.code.code.name(),
        format_value(&event.value)
    )
}

pub fn json_line(event: &Event) -> String {
    let record = JsonRecord {
        timestamp: timestamp(event),
        code: event.code.logical(),
        excode: event.code.level,
        name: event.code.code.name(),
        value: &event.value,
    };
    // Plain struct of strings and numbers; serializing cannot fail
    serde_json::to_string(&record).unwrap_or_default()
}
