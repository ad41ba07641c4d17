/*!
 * Values exchanged with callers of the codec.
 */

use std::collections::HashMap;
use std::fmt;

/// A signal's value as seen by the caller.
///
/// Integer variants are used where the physical value is exact (identity
/// scaled signals, or raw values when scaling is off) so that 64-bit
/// quantities are never squeezed through an `f64`.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalValue {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    /// Symbolic choice label, e.g. `"Enabled"`.
    Label(String),
}

/// Signal name to value.
pub type SignalValues = HashMap<String, SignalValue>;

impl SignalValue {
    /// Numeric view of the value. Labels have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SignalValue::Unsigned(v) => Some(*v as f64),
            SignalValue::Signed(v) => Some(*v as f64),
            SignalValue::Float(v) => Some(*v),
            SignalValue::Label(_) => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            SignalValue::Label(label) => Some(label),
            _ => None,
        }
    }

    /// Exact integer view, if the value is integral.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            SignalValue::Unsigned(v) => Some(*v as i128),
            SignalValue::Signed(v) => Some(*v as i128),
            SignalValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i128),
            _ => None,
        }
    }
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Unsigned(v) => write!(f, "{v}"),
            SignalValue::Signed(v) => write!(f, "{v}"),
            SignalValue::Float(v) => write!(f, "{v}"),
            SignalValue::Label(label) => write!(f, "'{label}'"),
        }
    }
}

impl From<f64> for SignalValue {
    fn from(value: f64) -> Self {
        SignalValue::Float(value)
    }
}

impl From<f32> for SignalValue {
    fn from(value: f32) -> Self {
        SignalValue::Float(value as f64)
    }
}

impl From<u64> for SignalValue {
    fn from(value: u64) -> Self {
        SignalValue::Unsigned(value)
    }
}

impl From<u32> for SignalValue {
    fn from(value: u32) -> Self {
        SignalValue::Unsigned(value as u64)
    }
}

impl From<i64> for SignalValue {
    fn from(value: i64) -> Self {
        SignalValue::Signed(value)
    }
}

impl From<i32> for SignalValue {
    fn from(value: i32) -> Self {
        SignalValue::Signed(value as i64)
    }
}

impl From<bool> for SignalValue {
    fn from(value: bool) -> Self {
        SignalValue::Unsigned(value as u64)
    }
}

impl From<&str> for SignalValue {
    fn from(label: &str) -> Self {
        SignalValue::Label(label.to_owned())
    }
}

impl From<String> for SignalValue {
    fn from(label: String) -> Self {
        SignalValue::Label(label)
    }
}
