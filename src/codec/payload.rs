//! Payload decoding into data rows
//!
//! A payload is read left to right. Each step starts at an explicit cursor
//! and returns the row together with the cursor of the next one:
//!
//! ```text
//! [EXCODE x N] [CODE] [VALUE x field_len(CODE)]
//! ```
//!
//! Decoding holds no state between payloads.

use super::error::DecodeError;
use super::event::{Code, DataRow, Event, ExtendedCode, Value, BAND_COUNT};
use super::EXCODE;
use chrono::{DateTime, Local};
use std::iter::FusedIterator;

/// Decode one row starting at `cursor`
///
/// Returns the row and the offset just past it.
pub fn read_row(payload: &[u8], cursor: usize) -> Result<(DataRow, usize), DecodeError> {
    let mut pos = cursor;
    let mut level = 0u8;
    while payload.get(pos) == Some(&EXCODE) {
        level = level.saturating_add(1);
        pos += 1;
    }

    let Some(&byte) = payload.get(pos) else {
        return Err(DecodeError::TruncatedField {
            code: EXCODE,
            offset: cursor,
            needed: 1,
            available: 0,
        });
    };

    let code = Code::from(byte);
    let unrecognized = DecodeError::UnrecognizedCode {
        code: byte,
        offset: pos,
    };
    let len = code.field_len().ok_or_else(|| unrecognized.clone())?;

    let start = pos + 1;
    let available = payload.len() - start;
    if available < len {
        return Err(DecodeError::TruncatedField {
            code: byte,
            offset: pos,
            needed: len,
            available,
        });
    }

    let value = decode_value(code, &payload[start..start + len]).ok_or(unrecognized)?;
    let row = DataRow {
        code: ExtendedCode::new(level, code),
        value,
    };
    Ok((row, start + len))
}

/// Interpret a field already sized by `Code::field_len`
fn decode_value(code: Code, field: &[u8]) -> Option<Value> {
    let value = match code {
        Code::SignalQuality
        | Code::HeartRate
        | Code::Attention
        | Code::Meditation
        | Code::Raw8Bit => Value::Byte(field[0]),
        Code::RawMarker => Value::Marker,
        Code::RawWave => Value::Signed16(i16::from_be_bytes([field[0], field[1]])),
        Code::RrInterval => Value::Unsigned16(u16::from_be_bytes([field[0], field[1]])),
        Code::EegPower => {
            let mut bands = [0f32; BAND_COUNT];
            for (band, b) in bands.iter_mut().zip(field.chunks_exact(4)) {
                *band = f32::from_be_bytes([b[0], b[1], b[2], b[3]]);
            }
            Value::EegPower(bands)
        }
        Code::AsicEegPower => {
            let mut bands = [0u32; BAND_COUNT];
            for (band, b) in bands.iter_mut().zip(field.chunks_exact(3)) {
                *band = u32::from_be_bytes([0, b[0], b[1], b[2]]);
            }
            Value::AsicEegPower(bands)
        }
        Code::Unrecognized(_) => return None,
    };
    Some(value)
}

/// Iterate over the rows of a payload
///
/// Stops after the first error; rows decoded before it are still yielded.
pub fn rows(payload: &[u8]) -> Rows<'_> {
    Rows {
        payload,
        cursor: 0,
        done: false,
    }
}

/// Decode a payload into events stamped with `received_at`
pub fn decode_payload(
    payload: &[u8],
    received_at: DateTime<Local>,
) -> impl Iterator<Item = Result<Event, DecodeError>> + '_ {
    rows(payload).map(move |row| row.map(|r| r.at(received_at)))
}

pub struct Rows<'a> {
    payload: &'a [u8],
    cursor: usize,
    done: bool,
}

impl Iterator for Rows<'_> {
    type Item = Result<DataRow, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor >= self.payload.len() {
            return None;
        }
        match read_row(self.payload, self.cursor) {
            Ok((row, next)) => {
                self.cursor = next;
                Some(Ok(row))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for Rows<'_> {}
