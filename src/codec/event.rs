//! Typed data rows and events
//!
//! A payload is a sequence of data rows. Each row's value shape is fixed by
//! its code byte, so `Code` carries the field length and `Value` the
//! decoded content.

use chrono::{DateTime, Local};
use serde::Serialize;

/// Signal quality value meaning the sensor has no skin contact
pub const NO_CONTACT: u8 = 200;

/// Number of bands in the power spectrum rows
pub const BAND_COUNT: usize = 8;

/// Data row code (single-byte code space)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Code {
    /// 0x02, 0..=255, 200 means no contact
    SignalQuality,
    /// 0x03
    HeartRate,
    /// 0x04, eSense 0..=100
    Attention,
    /// 0x05, eSense 0..=100
    Meditation,
    /// 0x06
    Raw8Bit,
    /// 0x07, no value bytes
    RawMarker,
    /// 0x80, i16 big-endian
    RawWave,
    /// 0x86, u16 big-endian, milliseconds
    RrInterval,
    /// 0x81, 8 x f32 big-endian
    EegPower,
    /// 0x83, 8 x u24 big-endian
    AsicEegPower,
    /// Byte with no declared field length in this protocol profile
    Unrecognized(u8),
}

impl Code {
    /// Wire value of this code
    pub fn byte(self) -> u8 {
        match self {
            Self::SignalQuality => 0x02,
            Self::HeartRate => 0x03,
            Self::Attention => 0x04,
            Self::Meditation => 0x05,
            Self::Raw8Bit => 0x06,
            Self::RawMarker => 0x07,
            Self::RawWave => 0x80,
            Self::EegPower => 0x81,
            Self::AsicEegPower => 0x83,
            Self::RrInterval => 0x86,
            Self::Unrecognized(b) => b,
        }
    }

    /// Number of value bytes following the code, `None` if unknown
    pub fn field_len(self) -> Option<usize> {
        match self {
            Self::SignalQuality
            | Self::HeartRate
            | Self::Attention
            | Self::Meditation
            | Self::Raw8Bit => Some(1),
            Self::RawMarker => Some(0),
            Self::RawWave | Self::RrInterval => Some(2),
            Self::EegPower => Some(BAND_COUNT * 4),
            Self::AsicEegPower => Some(BAND_COUNT * 3),
            Self::Unrecognized(_) => None,
        }
    }

    /// Upper-case label used in console and record output
    pub fn name(self) -> &'static str {
        match self {
            Self::SignalQuality => "POOR_SIGNAL",
            Self::HeartRate => "HEART_RATE",
            Self::Attention => "ATTENTION",
            Self::Meditation => "MEDITATION",
            Self::Raw8Bit => "RAW_8BIT",
            Self::RawMarker => "RAW_MARKER",
            Self::RawWave => "RAW_WAVE",
            Self::RrInterval => "RR_INTERVAL",
            Self::EegPower => "EEG_POWER",
            Self::AsicEegPower => "ASIC_EEG_POWER",
            Self::Unrecognized(_) => "UNKNOWN",
        }
    }
}

impl From<u8> for Code {
    fn from(byte: u8) -> Self {
        match byte {
            0x02 => Self::SignalQuality,
            0x03 => Self::HeartRate,
            0x04 => Self::Attention,
            0x05 => Self::Meditation,
            0x06 => Self::Raw8Bit,
            0x07 => Self::RawMarker,
            0x80 => Self::RawWave,
            0x81 => Self::EegPower,
            0x83 => Self::AsicEegPower,
            0x86 => Self::RrInterval,
            other => Self::Unrecognized(other),
        }
    }
}

/// Code byte plus the number of EXCODE bytes that preceded it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ExtendedCode {
    pub level: u8,
    pub code: Code,
}

impl ExtendedCode {
    pub fn new(level: u8, code: Code) -> Self {
        Self { level, code }
    }

    /// Logical code: base byte plus one per EXCODE
    pub fn logical(self) -> u16 {
        self.code.byte() as u16 + self.level as u16
    }
}

impl From<Code> for ExtendedCode {
    fn from(code: Code) -> Self {
        Self::new(0, code)
    }
}

/// Decoded row value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Byte(u8),
    Signed16(i16),
    Unsigned16(u16),
    Marker,
    EegPower([f32; BAND_COUNT]),
    AsicEegPower([u32; BAND_COUNT]),
}

/// One code + value unit inside a payload
#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    pub code: ExtendedCode,
    pub value: Value,
}

impl DataRow {
    /// Attach a receipt time, turning the row into an event
    pub fn at(self, timestamp: DateTime<Local>) -> Event {
        Event {
            code: self.code,
            value: self.value,
            timestamp,
        }
    }
}

/// Decoder output unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub code: ExtendedCode,
    pub value: Value,
    /// Receipt time; the headset sends no clock
    pub timestamp: DateTime<Local>,
}

impl Event {
    /// Signal quality event reporting no sensor contact
    pub fn is_no_contact(&self) -> bool {
        self.code.code == Code::SignalQuality && self.value == Value::Byte(NO_CONTACT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_byte_roundtrip_for_known_codes() {
        for b in [0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x80, 0x81, 0x83, 0x86] {
            let code = Code::from(b);
            assert!(!matches!(code, Code::Unrecognized(_)), "0x{:02X}", b);
            assert_eq!(code.byte(), b);
        }
    }

    #[test]
    fn test_unknown_byte_is_unrecognized() {
        assert_eq!(Code::from(0x99), Code::Unrecognized(0x99));
        assert_eq!(Code::from(0x99).field_len(), None);
        assert_eq!(Code::from(0x99).byte(), 0x99);
    }

    #[test]
    fn test_field_lengths() {
        assert_eq!(Code::Attention.field_len(), Some(1));
        assert_eq!(Code::RawMarker.field_len(), Some(0));
        assert_eq!(Code::RawWave.field_len(), Some(2));
        assert_eq!(Code::EegPower.field_len(), Some(32));
        assert_eq!(Code::AsicEegPower.field_len(), Some(24));
    }

    #[test]
    fn test_logical_code_adds_excode_level() {
        let code = ExtendedCode::new(2, Code::Attention);
        assert_eq!(code.logical(), 0x06);
        assert_eq!(ExtendedCode::from(Code::RawWave).logical(), 0x80);
    }

    #[test]
    fn test_no_contact() {
        let row = DataRow {
            code: Code::SignalQuality.into(),
            value: Value::Byte(NO_CONTACT),
        };
        assert!(row.at(Local::now()).is_no_contact());

        let row = DataRow {
            code: Code::Attention.into(),
            value: Value::Byte(NO_CONTACT),
        };
        assert!(!row.at(Local::now()).is_no_contact());
    }
}
