/*!
 * Range checks for signal values.
 *
 * Declared bounds are physical and inclusive. Raw integers are compared
 * against those bounds mapped into the raw domain, rounded inward only when
 * the mapped bound is not already an integer up to float noise, so a value
 * that is exactly on a bound is never rejected.
 */

use crate::error::{CodecError, Result};
use crate::signal::{SignalGeometry, SignalKind};

/// Slack for comparing physical values, in units of `f64::EPSILON` relative
/// to the larger operand.
const PHYSICAL_TOLERANCE: f64 = 8.0 * f64::EPSILON;
/// Relative slack when deciding whether a mapped raw bound is an integer.
const RAW_TOLERANCE: f64 = 1e-9;

/// A value to test with [`is_in_range`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Candidate {
    /// Raw integer as stored on the wire (after sign extension).
    Raw(i64),
    /// Physical value, `raw * scale + offset`.
    Physical(f64),
}

/// Whether `candidate` lies within the signal's declared bounds.
///
/// Raw candidates of integer signals must also fit the field width.
pub fn is_in_range(signal: &SignalGeometry, candidate: Candidate) -> bool {
    match candidate {
        Candidate::Physical(value) => physical_in_bounds(signal, value),
        Candidate::Raw(raw) if signal.is_float() => physical_in_bounds(signal, raw as f64),
        Candidate::Raw(raw) => {
            let (lo, hi) = raw_bounds(signal);
            (lo..=hi).contains(&(raw as i128))
        }
    }
}

pub fn check_physical(signal: &SignalGeometry, value: f64) -> Result<()> {
    if physical_in_bounds(signal, value) {
        Ok(())
    } else {
        Err(CodecError::OutOfRange {
            signal: signal.name().to_owned(),
            value: value.to_string(),
            range: describe_bounds(signal),
        })
    }
}

/// Check a raw integer against the declared bounds and the field width.
pub fn check_raw(signal: &SignalGeometry, raw: i128) -> Result<()> {
    let (lo, hi) = raw_bounds(signal);
    if (lo..=hi).contains(&raw) {
        Ok(())
    } else {
        Err(CodecError::OutOfRange {
            signal: signal.name().to_owned(),
            value: raw.to_string(),
            range: format!("raw {lo}..={hi}"),
        })
    }
}

/// Check a raw integer against the field width only.
pub fn check_raw_fits(signal: &SignalGeometry, raw: i128) -> Result<()> {
    let (lo, hi) = field_bounds(signal);
    if (lo..=hi).contains(&raw) {
        Ok(())
    } else {
        Err(CodecError::OutOfRange {
            signal: signal.name().to_owned(),
            value: raw.to_string(),
            range: format!("{}-bit field {lo}..={hi}", signal.bit_length()),
        })
    }
}

/// Representable raw range of the field: two's complement for signed
/// signals, plain binary otherwise.
pub fn field_bounds(signal: &SignalGeometry) -> (i128, i128) {
    let bits = signal.bit_length() as u32;
    match signal.kind() {
        SignalKind::Signed => (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1),
        _ => (0, (1i128 << bits) - 1),
    }
}

/// The narrower of the field range and the declared bounds in raw units.
pub fn raw_bounds(signal: &SignalGeometry) -> (i128, i128) {
    let (mut lo, mut hi) = field_bounds(signal);
    let to_raw = |bound: f64| (bound - signal.offset()) / signal.scale();
    let (lower, upper) = if signal.scale() > 0.0 {
        (signal.minimum(), signal.maximum())
    } else {
        (signal.maximum(), signal.minimum())
    };
    if let Some(bound) = lower {
        lo = lo.max(round_up(to_raw(bound)));
    }
    if let Some(bound) = upper {
        hi = hi.min(round_down(to_raw(bound)));
    }
    (lo, hi)
}

/// Pull a physical value back inside the declared bounds.
pub fn clamp_physical(signal: &SignalGeometry, value: f64) -> f64 {
    let mut value = value;
    if let Some(min) = signal.minimum() {
        value = value.max(min);
    }
    if let Some(max) = signal.maximum() {
        value = value.min(max);
    }
    value
}

/// Physical value used for an active signal nobody supplied: zero when the
/// declared bounds allow it, else the bound nearest to zero.
pub fn default_physical(signal: &SignalGeometry) -> f64 {
    match (signal.minimum(), signal.maximum()) {
        (Some(min), _) if min > 0.0 => min,
        (_, Some(max)) if max < 0.0 => max,
        _ => 0.0,
    }
}

fn physical_in_bounds(signal: &SignalGeometry, value: f64) -> bool {
    if value.is_nan() {
        return signal.minimum().is_none() && signal.maximum().is_none();
    }
    signal.minimum().map_or(true, |min| at_most(min, value))
        && signal.maximum().map_or(true, |max| at_most(value, max))
}

/// `a <= b`, forgiving a few ULPs of noise between finite operands.
fn at_most(a: f64, b: f64) -> bool {
    a <= b
        || (a.is_finite() && b.is_finite() && a - b <= PHYSICAL_TOLERANCE * a.abs().max(b.abs()))
}

fn near_integer(x: f64) -> Option<f64> {
    let nearest = x.round();
    ((x - nearest).abs() <= RAW_TOLERANCE * x.abs().max(1.0)).then_some(nearest)
}

fn round_up(x: f64) -> i128 {
    near_integer(x).unwrap_or_else(|| x.ceil()) as i128
}

fn round_down(x: f64) -> i128 {
    near_integer(x).unwrap_or_else(|| x.floor()) as i128
}

fn describe_bounds(signal: &SignalGeometry) -> String {
    let min = signal.minimum().map_or("-inf".to_owned(), |v| v.to_string());
    let max = signal.maximum().map_or("inf".to_owned(), |v| v.to_string());
    format!("[{min}, {max}]")
}
