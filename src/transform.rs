/*!
 * Conversion between a signal's raw bit pattern and its value.
 *
 * Decode: bits -> [`RawValue`] (sign extension, float reinterpretation) ->
 * [`SignalValue`] (scale and offset). Encode runs the other way and ends with
 * the bits masked to the field width, ready for `SignalLayout::pack`.
 */

use crate::error::{CodecError, Result};
use crate::range;
use crate::signal::{SignalGeometry, SignalKind};
use crate::value::SignalValue;

/// Raw field content after interpreting the bits per the signal kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

impl RawValue {
    /// Integer used to match multiplexer ids and choices.
    pub fn as_selector(self) -> Option<i64> {
        match self {
            RawValue::Unsigned(v) => i64::try_from(v).ok(),
            RawValue::Signed(v) => Some(v),
            RawValue::Float(_) => None,
        }
    }
}

/// All-ones mask covering the low `bit_length` bits.
pub fn field_mask(bit_length: u8) -> u64 {
    if bit_length >= 64 {
        u64::MAX
    } else {
        (1u64 << bit_length) - 1
    }
}

/// Interpret the bits extracted for `signal`.
pub fn decode_raw(signal: &SignalGeometry, bits: u64) -> RawValue {
    let mask = field_mask(signal.bit_length());
    let bits = bits & mask;
    match signal.kind() {
        SignalKind::Unsigned => RawValue::Unsigned(bits),
        SignalKind::Signed => {
            let sign_bit = 1u64 << (signal.bit_length() - 1);
            if bits & sign_bit != 0 {
                // sign extend into i64
                RawValue::Signed((bits | !mask) as i64)
            } else {
                RawValue::Signed(bits as i64)
            }
        }
        SignalKind::Float32 => RawValue::Float(f32::from_bits(bits as u32) as f64),
        SignalKind::Float64 => RawValue::Float(f64::from_bits(bits)),
    }
}

/// Turn a raw field value into what the caller sees.
///
/// Floats are never scaled. Identity-scaled integers stay integers.
pub fn to_physical(signal: &SignalGeometry, raw: RawValue, scaling: bool) -> SignalValue {
    match raw {
        RawValue::Float(v) => SignalValue::Float(v),
        RawValue::Unsigned(v) if !scaling || signal.is_identity_scaled() => SignalValue::Unsigned(v),
        RawValue::Signed(v) if !scaling || signal.is_identity_scaled() => SignalValue::Signed(v),
        RawValue::Unsigned(v) => SignalValue::Float(v as f64 * signal.scale() + signal.offset()),
        RawValue::Signed(v) => SignalValue::Float(v as f64 * signal.scale() + signal.offset()),
    }
}

/// Encode a value into the signal's field bits, rejecting anything out of
/// range.
pub fn encode_bits(signal: &SignalGeometry, value: &SignalValue, scaling: bool) -> Result<u64> {
    encode(signal, value, scaling, false)
}

/// Encode a value into the signal's field bits, clamping it into range
/// instead of failing. Labels and non-numeric input still fail.
pub fn encode_bits_clamped(
    signal: &SignalGeometry,
    value: &SignalValue,
    scaling: bool,
) -> Result<u64> {
    encode(signal, value, scaling, true)
}

/// Bits of the value used for an active signal with nothing supplied.
pub fn default_bits(signal: &SignalGeometry) -> Result<u64> {
    encode_bits_clamped(signal, &SignalValue::Float(range::default_physical(signal)), true)
}

/// A finite value must stay finite once narrowed to 32 bits.
fn f32_range(signal: &SignalGeometry, physical: f64, clamp: bool) -> Result<f64> {
    let (lo, hi) = (f32::MIN as f64, f32::MAX as f64);
    if clamp {
        Ok(physical.clamp(lo, hi))
    } else if (physical as f32).is_infinite() {
        Err(CodecError::OutOfRange {
            signal: signal.name().to_owned(),
            value: physical.to_string(),
            range: format!("32-bit float {lo}..={hi}"),
        })
    } else {
        Ok(physical)
    }
}

fn encode(signal: &SignalGeometry, value: &SignalValue, scaling: bool, clamp: bool) -> Result<u64> {
    match signal.kind() {
        SignalKind::Float32 | SignalKind::Float64 => {
            let mut physical = match value {
                SignalValue::Label(label) => choice_raw(signal, label)? as f64,
                other => other.as_f64().unwrap_or(f64::NAN),
            };
            if clamp {
                physical = range::clamp_physical(signal, physical);
            } else {
                range::check_physical(signal, physical)?;
            }
            if signal.kind() == SignalKind::Float32 && physical.is_finite() {
                physical = f32_range(signal, physical, clamp)?;
            }
            Ok(match signal.kind() {
                SignalKind::Float32 => (physical as f32).to_bits() as u64,
                _ => physical.to_bits(),
            })
        }
        SignalKind::Unsigned | SignalKind::Signed => {
            let raw = integer_raw(signal, value, scaling, clamp)?;
            let raw = if clamp {
                let (lo, hi) = range::raw_bounds(signal);
                raw.max(lo).min(hi)
            } else {
                range::check_raw_fits(signal, raw)?;
                raw
            };
            Ok((raw as u64) & field_mask(signal.bit_length()))
        }
    }
}

/// Raw integer for an integer signal, before it is fitted to the field.
fn integer_raw(signal: &SignalGeometry, value: &SignalValue, scaling: bool, clamp: bool) -> Result<i128> {
    if let SignalValue::Label(label) = value {
        return Ok(choice_raw(signal, label)? as i128);
    }

    if !scaling {
        let raw = value.as_i128().ok_or_else(|| invalid(signal, value, "raw value is not an integer"))?;
        if !clamp {
            range::check_raw(signal, raw)?;
        }
        return Ok(raw);
    }

    let physical = value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(signal, value, "value is not a finite number"))?;
    if !clamp {
        range::check_physical(signal, physical)?;
    }

    // Exact path, integers wider than 53 bits survive untouched.
    if signal.is_identity_scaled() {
        if let Some(raw) = value.as_i128() {
            return Ok(raw);
        }
    }

    let raw = ((physical - signal.offset()) / signal.scale()).round();
    if !raw.is_finite() {
        return Err(invalid(signal, value, "value overflows after scaling"));
    }
    // Saturating cast; anything past i128 is out of every field's range anyway.
    Ok(raw as i128)
}

fn choice_raw(signal: &SignalGeometry, label: &str) -> Result<i64> {
    signal
        .choice_value(label)
        .ok_or_else(|| CodecError::UnknownChoice {
            signal: signal.name().to_owned(),
            label: label.to_owned(),
        })
}

fn invalid(signal: &SignalGeometry, value: &SignalValue, reason: &str) -> CodecError {
    CodecError::InvalidValue {
        signal: signal.name().to_owned(),
        value: value.to_string(),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::ByteOrder;

    fn signal(bit_length: u8) -> crate::signal::SignalGeometryBuilder {
        SignalGeometry::builder("S", 0, bit_length, ByteOrder::LittleEndian)
    }

    #[test]
    fn test_sign_extension_4_bits() {
        let s4 = signal(4).signed(true).build().unwrap();
        assert_eq!(decode_raw(&s4, 0b1111), RawValue::Signed(-1));
        assert_eq!(decode_raw(&s4, 0b0111), RawValue::Signed(7));
        assert_eq!(decode_raw(&s4, 0b1000), RawValue::Signed(-8));

        let u4 = signal(4).build().unwrap();
        assert_eq!(decode_raw(&u4, 0b1111), RawValue::Unsigned(15));
    }

    #[test]
    fn test_sign_extension_full_width() {
        let s64 = signal(64).signed(true).build().unwrap();
        assert_eq!(decode_raw(&s64, 0x8000000000000000), RawValue::Signed(i64::MIN));
        assert_eq!(decode_raw(&s64, 0xFFFF_FFFF_FFFF_FFFE), RawValue::Signed(-2));
        assert_eq!(decode_raw(&s64, 0x7FFF_FFFF_FFFF_FFFF), RawValue::Signed(i64::MAX));
        let s12 = signal(12).signed(true).build().unwrap();
        assert_eq!(decode_raw(&s12, 0xDB6), RawValue::Signed(-586));
    }

    #[test]
    fn test_float_reinterpretation() {
        let f32_signal = signal(32).float(true).build().unwrap();
        let bits = encode_bits(&f32_signal, &SignalValue::Float(1.5), true).unwrap();
        assert_eq!(bits, 1.5f32.to_bits() as u64);
        assert_eq!(bits, 0x3FC0_0000);
        assert_eq!(decode_raw(&f32_signal, bits), RawValue::Float(1.5));

        let f64_signal = signal(64).float(true).build().unwrap();
        let bits = encode_bits(&f64_signal, &SignalValue::Float(-0.1), true).unwrap();
        assert_eq!(bits, (-0.1f64).to_bits());
        assert_eq!(decode_raw(&f64_signal, bits), RawValue::Float(-0.1));
    }

    #[test]
    fn test_float32_rejects_values_past_f32() {
        let f32_signal = signal(32).float(true).build().unwrap();
        assert!(matches!(
            encode_bits(&f32_signal, &SignalValue::Float(1e300), true),
            Err(CodecError::OutOfRange { ref signal, .. }) if signal == "S"
        ));
        assert!(encode_bits(&f32_signal, &SignalValue::Float(-1e39), true).is_err());

        let clamped = encode_bits_clamped(&f32_signal, &SignalValue::Float(1e300), true).unwrap();
        assert_eq!(clamped, f32::MAX.to_bits() as u64);
        let clamped = encode_bits_clamped(&f32_signal, &SignalValue::Float(-1e300), true).unwrap();
        assert_eq!(clamped, f32::MIN.to_bits() as u64);

        // Infinity itself is still a legal IEEE value for an unbounded field.
        let bits = encode_bits(&f32_signal, &SignalValue::Float(f64::INFINITY), true).unwrap();
        assert_eq!(bits, f32::INFINITY.to_bits() as u64);
    }

    #[test]
    fn test_float_ignores_scale_and_offset() {
        let f = signal(32).float(true).scale(10.0).offset(3.0).build().unwrap();
        let bits = encode_bits(&f, &SignalValue::Float(2.0), true).unwrap();
        assert_eq!(bits, 2.0f32.to_bits() as u64);
        assert_eq!(to_physical(&f, decode_raw(&f, bits), true), SignalValue::Float(2.0));
    }

    #[test]
    fn test_scaled_encode_and_decode() {
        // Temperature: factor=0.01, offset=250, signed 12-bit
        // physical=244.14 → raw = (244.14 - 250) / 0.01 = -586 → 0xDB6
        let temperature = signal(12).signed(true).scale(0.01).offset(250.0).build().unwrap();
        let bits = encode_bits(&temperature, &SignalValue::Float(244.14), true).unwrap();
        assert_eq!(bits, 0xDB6);
        let physical = to_physical(&temperature, decode_raw(&temperature, bits), true);
        match physical {
            SignalValue::Float(v) => assert!((v - 244.14).abs() < 1e-9),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_identity_scaled_integers_stay_exact() {
        let u64_signal = signal(64).build().unwrap();
        let bits = encode_bits(&u64_signal, &SignalValue::Unsigned(u64::MAX - 1), true).unwrap();
        assert_eq!(bits, u64::MAX - 1);
        assert_eq!(
            to_physical(&u64_signal, decode_raw(&u64_signal, bits), true),
            SignalValue::Unsigned(u64::MAX - 1)
        );

        let s64 = signal(64).signed(true).build().unwrap();
        let bits = encode_bits(&s64, &SignalValue::Signed(i64::MIN + 3), true).unwrap();
        assert_eq!(decode_raw(&s64, bits), RawValue::Signed(i64::MIN + 3));
    }

    #[test]
    fn test_encode_rejects_field_overflow() {
        let u4 = signal(4).build().unwrap();
        assert!(matches!(
            encode_bits(&u4, &SignalValue::Unsigned(16), true),
            Err(CodecError::OutOfRange { .. })
        ));
        assert!(encode_bits(&u4, &SignalValue::Signed(-1), true).is_err());

        let s4 = signal(4).signed(true).build().unwrap();
        assert_eq!(encode_bits(&s4, &SignalValue::Signed(-1), true).unwrap(), 0xF);
        assert!(encode_bits(&s4, &SignalValue::Signed(8), true).is_err());
        assert!(encode_bits(&s4, &SignalValue::Signed(-9), true).is_err());
    }

    #[test]
    fn test_encode_rejects_declared_range() {
        let radius = signal(6).scale(0.1).range(0.0, 5.0).build().unwrap();
        assert_eq!(encode_bits(&radius, &SignalValue::Float(1.8), true).unwrap(), 18);
        assert_eq!(encode_bits(&radius, &SignalValue::Float(5.0), true).unwrap(), 50);
        assert!(encode_bits(&radius, &SignalValue::Float(5.5), true).is_err());
    }

    #[test]
    fn test_encode_clamped() {
        let radius = signal(6).scale(0.1).range(0.0, 5.0).build().unwrap();
        assert_eq!(encode_bits_clamped(&radius, &SignalValue::Float(9.0), true).unwrap(), 50);
        assert_eq!(encode_bits_clamped(&radius, &SignalValue::Float(-2.0), true).unwrap(), 0);

        let u4 = signal(4).build().unwrap();
        assert_eq!(encode_bits_clamped(&u4, &SignalValue::Unsigned(99), true).unwrap(), 15);
    }

    #[test]
    fn test_encode_without_scaling_takes_raw() {
        let temperature = signal(12).signed(true).scale(0.01).offset(250.0).build().unwrap();
        assert_eq!(encode_bits(&temperature, &SignalValue::Signed(-586), false).unwrap(), 0xDB6);
        assert!(encode_bits(&temperature, &SignalValue::Float(1.5), false).is_err());
        assert_eq!(
            to_physical(&temperature, RawValue::Signed(-586), false),
            SignalValue::Signed(-586)
        );
    }

    #[test]
    fn test_encode_labels() {
        let enable = signal(1).choices([(0, "Disabled"), (1, "Enabled")]).build().unwrap();
        assert_eq!(encode_bits(&enable, &SignalValue::from("Enabled"), true).unwrap(), 1);
        assert!(matches!(
            encode_bits(&enable, &SignalValue::from("Maybe"), true),
            Err(CodecError::UnknownChoice { .. })
        ));
    }

    #[test]
    fn test_encode_rejects_non_finite() {
        let u8_signal = signal(8).build().unwrap();
        assert!(matches!(
            encode_bits(&u8_signal, &SignalValue::Float(f64::NAN), true),
            Err(CodecError::InvalidValue { .. })
        ));
        assert!(encode_bits(&u8_signal, &SignalValue::Float(f64::INFINITY), true).is_err());
    }

    #[test]
    fn test_default_bits_respect_bounds() {
        let offset_only = signal(8).offset(10.0).build().unwrap();
        // Physical 0 would need raw -10; the default clamps to raw 0.
        assert_eq!(default_bits(&offset_only).unwrap(), 0);

        let bounded = signal(8).range(3.0, 9.0).build().unwrap();
        assert_eq!(default_bits(&bounded).unwrap(), 3);
    }
}
