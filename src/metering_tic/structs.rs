use serde::{Deserialize, Serialize};
use std::fmt;

use super::utils::{
    HISTORIC_BAUD_RATE, HISTORIC_FIELD_SEPARATOR, STANDARD_BAUD_RATE, STANDARD_FIELD_SEPARATOR,
};

/// Wire format spoken by the meter, selected once per session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireMode {
    Historic,
    Standard,
}

impl WireMode {
    pub fn from_standard_flag(standard_mode: bool) -> Self {
        if standard_mode {
            WireMode::Standard
        } else {
            WireMode::Historic
        }
    }

    pub fn baud_rate(&self) -> u32 {
        match self {
            WireMode::Historic => HISTORIC_BAUD_RATE,
            WireMode::Standard => STANDARD_BAUD_RATE,
        }
    }

    pub fn separator(&self) -> u8 {
        match self {
            WireMode::Historic => HISTORIC_FIELD_SEPARATOR,
            WireMode::Standard => STANDARD_FIELD_SEPARATOR,
        }
    }
}

impl fmt::Display for WireMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireMode::Historic => write!(f, "historic"),
            WireMode::Standard => write!(f, "standard"),
        }
    }
}

/// One validated information group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedField {
    pub tag: String,
    pub value: String,
    pub timestamp: Option<String>,
}

/// Latest value stored for a tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicValue {
    pub value: String,
    pub timestamp: Option<String>,
    pub updated: u64,
}

impl TicValue {
    pub fn from_field(field: DecodedField) -> Self {
        TicValue {
            value: field.value,
            timestamp: field.timestamp,
            updated: crate::get_unix_ts(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Disconnected,
    AwaitingFirstLine,
    Connected,
    Stopped,
}

impl SessionState {
    pub fn to_string(&self) -> String {
        match self {
            SessionState::Disconnected => "Disconnected".to_string(),
            SessionState::AwaitingFirstLine => "AwaitingFirstLine".to_string(),
            SessionState::Connected => "Connected".to_string(),
            SessionState::Stopped => "Stopped".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_mode_constants() {
        assert_eq!(WireMode::Historic.baud_rate(), 1200);
        assert_eq!(WireMode::Standard.baud_rate(), 9600);
        assert_eq!(WireMode::Historic.separator(), b' ');
        assert_eq!(WireMode::Standard.separator(), b'\t');
    }

    #[test]
    fn test_wire_mode_from_flag() {
        assert_eq!(WireMode::from_standard_flag(true), WireMode::Standard);
        assert_eq!(WireMode::from_standard_flag(false), WireMode::Historic);
        assert_eq!(WireMode::Standard.to_string(), "standard");
    }
}
