/*!
 * Error kinds reported by layout validation and by the codec
 */

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    /// A signal description that cannot be encoded or decoded at all.
    #[error("invalid signal '{signal}': {reason}")]
    InvalidSignal { signal: String, reason: String },

    /// A message description that breaks a layout invariant
    /// (out-of-bounds or overlapping signals, bad multiplexer tree, ...).
    #[error("invalid layout for message '{message}': {reason}")]
    InvalidLayout { message: String, reason: String },

    #[error("buffer too short for message '{message}': need {expected} bytes, got {actual}")]
    BufferTooShort {
        message: String,
        expected: usize,
        actual: usize,
    },

    #[error("value {value} for signal '{signal}' is out of range ({range})")]
    OutOfRange {
        signal: String,
        value: String,
        range: String,
    },

    #[error("value {value} for signal '{signal}' is invalid: {reason}")]
    InvalidValue {
        signal: String,
        value: String,
        reason: String,
    },

    #[error("missing value for signal '{0}'")]
    MissingValue(String),

    #[error("unknown signal '{signal}' in message '{message}'")]
    UnknownSignal { message: String, signal: String },

    /// A value was supplied for a signal its multiplexer does not select.
    #[error("signal '{signal}' is not selected by multiplexer '{multiplexer}' (selector {selector:?})")]
    InactiveSignal {
        signal: String,
        multiplexer: String,
        selector: Option<i64>,
    },

    #[error("signal '{signal}' has no choice named '{label}'")]
    UnknownChoice { signal: String, label: String },

    #[error("payload of {0} bytes does not fit a CAN frame")]
    PayloadTooLong(usize),

    #[error("unknown frame id 0x{0:X}")]
    UnknownFrameId(u32),

    #[error("unknown message '{0}'")]
    UnknownMessage(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;

impl CodecError {
    pub(crate) fn invalid_signal(signal: &str, reason: impl Into<String>) -> Self {
        CodecError::InvalidSignal {
            signal: signal.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_layout(message: &str, reason: impl Into<String>) -> Self {
        CodecError::InvalidLayout {
            message: message.to_owned(),
            reason: reason.into(),
        }
    }
}
