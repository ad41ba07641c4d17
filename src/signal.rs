/*!
 * Static description of one signal: where its bits live and what they mean
 */

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CodecError, Result};

/// Wire bit-addressing convention of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Motorola: `start_bit` is the MSB position, bits walk down within a byte
    /// and continue at bit 7 of the next byte.
    BigEndian,
    /// Intel: `start_bit` is the LSB position, bits walk up through the bytes.
    LittleEndian,
}

/// Numeric encoding of the raw bits, fixed when the signal is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Unsigned,
    Signed,
    /// IEEE-754 single precision, always 32 bits wide.
    Float32,
    /// IEEE-754 double precision, always 64 bits wide.
    Float64,
}

impl SignalKind {
    /// Pick the kind from the flag pair used by signal databases.
    ///
    /// `is_signed` is ignored for floats. A float whose width is not 32 or 64
    /// bits has no kind.
    pub fn from_flags(is_signed: bool, is_float: bool, bit_length: u8) -> Option<Self> {
        match (is_float, bit_length) {
            (true, 32) => Some(SignalKind::Float32),
            (true, 64) => Some(SignalKind::Float64),
            (true, _) => None,
            (false, _) if is_signed => Some(SignalKind::Signed),
            (false, _) => Some(SignalKind::Unsigned),
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, SignalKind::Float32 | SignalKind::Float64)
    }
}

/// Immutable geometry and scaling of a single signal.
///
/// Built once through [`SignalGeometry::builder`] and then only read. The
/// physical value of an integer signal is `raw * scale + offset`; float
/// signals carry their value directly in the raw bits.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalGeometry {
    name: String,
    start_bit: u16,
    bit_length: u8,
    byte_order: ByteOrder,
    kind: SignalKind,
    scale: f64,
    offset: f64,
    minimum: Option<f64>,
    maximum: Option<f64>,
    choices: BTreeMap<i64, String>,
    is_multiplexer: bool,
    multiplexer_ids: BTreeSet<i64>,
    multiplexer_signal: Option<String>,
    unit: Option<String>,
    comment: Option<String>,
}

impl SignalGeometry {
    pub fn builder(
        name: impl Into<String>,
        start_bit: u16,
        bit_length: u8,
        byte_order: ByteOrder,
    ) -> SignalGeometryBuilder {
        SignalGeometryBuilder {
            name: name.into(),
            start_bit,
            bit_length,
            byte_order,
            is_signed: false,
            is_float: false,
            scale: 1.0,
            offset: 0.0,
            minimum: None,
            maximum: None,
            choices: BTreeMap::new(),
            is_multiplexer: false,
            multiplexer_ids: BTreeSet::new(),
            multiplexer_signal: None,
            unit: None,
            comment: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_bit(&self) -> u16 {
        self.start_bit
    }

    pub fn bit_length(&self) -> u8 {
        self.bit_length
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    pub fn is_signed(&self) -> bool {
        self.kind == SignalKind::Signed
    }

    pub fn is_float(&self) -> bool {
        self.kind.is_float()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn minimum(&self) -> Option<f64> {
        self.minimum
    }

    pub fn maximum(&self) -> Option<f64> {
        self.maximum
    }

    pub fn choices(&self) -> &BTreeMap<i64, String> {
        &self.choices
    }

    pub fn choice_label(&self, raw: i64) -> Option<&str> {
        self.choices.get(&raw).map(String::as_str)
    }

    pub fn choice_value(&self, label: &str) -> Option<i64> {
        self.choices
            .iter()
            .find(|(_, name)| name.as_str() == label)
            .map(|(raw, _)| *raw)
    }

    pub fn is_multiplexer(&self) -> bool {
        self.is_multiplexer
    }

    /// Selector values of the governing multiplexer for which this signal is
    /// present. Empty means the signal is always present.
    pub fn multiplexer_ids(&self) -> &BTreeSet<i64> {
        &self.multiplexer_ids
    }

    pub fn is_multiplexed(&self) -> bool {
        !self.multiplexer_ids.is_empty()
    }

    /// Name of the governing multiplexer, if given explicitly.
    pub fn multiplexer_signal(&self) -> Option<&str> {
        self.multiplexer_signal.as_deref()
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// True when the physical value equals the raw value, so integers can be
    /// carried without a round trip through `f64`.
    pub fn is_identity_scaled(&self) -> bool {
        self.scale == 1.0 && self.offset == 0.0
    }
}

/// Consuming-self builder for [`SignalGeometry`].
#[derive(Debug, Clone)]
pub struct SignalGeometryBuilder {
    name: String,
    start_bit: u16,
    bit_length: u8,
    byte_order: ByteOrder,
    is_signed: bool,
    is_float: bool,
    scale: f64,
    offset: f64,
    minimum: Option<f64>,
    maximum: Option<f64>,
    choices: BTreeMap<i64, String>,
    is_multiplexer: bool,
    multiplexer_ids: BTreeSet<i64>,
    multiplexer_signal: Option<String>,
    unit: Option<String>,
    comment: Option<String>,
}

impl SignalGeometryBuilder {
    pub fn signed(mut self, is_signed: bool) -> Self {
        self.is_signed = is_signed;
        self
    }

    pub fn float(mut self, is_float: bool) -> Self {
        self.is_float = is_float;
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn minimum(mut self, minimum: Option<f64>) -> Self {
        self.minimum = minimum;
        self
    }

    pub fn maximum(mut self, maximum: Option<f64>) -> Self {
        self.maximum = maximum;
        self
    }

    pub fn range(self, minimum: f64, maximum: f64) -> Self {
        self.minimum(Some(minimum)).maximum(Some(maximum))
    }

    pub fn choice(mut self, raw: i64, label: impl Into<String>) -> Self {
        self.choices.insert(raw, label.into());
        self
    }

    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        self.choices
            .extend(choices.into_iter().map(|(raw, label)| (raw, label.into())));
        self
    }

    pub fn multiplexer(mut self, is_multiplexer: bool) -> Self {
        self.is_multiplexer = is_multiplexer;
        self
    }

    pub fn multiplexer_ids<I: IntoIterator<Item = i64>>(mut self, ids: I) -> Self {
        self.multiplexer_ids.extend(ids);
        self
    }

    pub fn multiplexer_signal(mut self, name: impl Into<String>) -> Self {
        self.multiplexer_signal = Some(name.into());
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Validate the description and freeze it.
    pub fn build(self) -> Result<SignalGeometry> {
        let name = self.name.as_str();
        if name.is_empty() {
            return Err(CodecError::invalid_signal(name, "empty name"));
        }
        if !(1..=64).contains(&self.bit_length) {
            return Err(CodecError::invalid_signal(
                name,
                format!("bit length {} is outside 1..=64", self.bit_length),
            ));
        }
        if self.start_bit >= 512 {
            return Err(CodecError::invalid_signal(
                name,
                format!("start bit {} is past a 64 byte frame", self.start_bit),
            ));
        }
        let kind = SignalKind::from_flags(self.is_signed, self.is_float, self.bit_length)
            .ok_or_else(|| {
                CodecError::invalid_signal(
                    name,
                    format!(
                        "float signals must be 32 or 64 bits wide, got {}",
                        self.bit_length
                    ),
                )
            })?;
        if !self.scale.is_finite() || self.scale == 0.0 {
            return Err(CodecError::invalid_signal(
                name,
                format!("scale {} must be finite and non-zero", self.scale),
            ));
        }
        if !self.offset.is_finite() {
            return Err(CodecError::invalid_signal(
                name,
                format!("offset {} must be finite", self.offset),
            ));
        }
        if let (Some(min), Some(max)) = (self.minimum, self.maximum) {
            if min > max {
                return Err(CodecError::invalid_signal(
                    name,
                    format!("minimum {min} is greater than maximum {max}"),
                ));
            }
        }
        if self.minimum.is_some_and(f64::is_nan) || self.maximum.is_some_and(f64::is_nan) {
            return Err(CodecError::invalid_signal(name, "NaN range bound"));
        }
        if self.is_multiplexer && kind.is_float() {
            return Err(CodecError::invalid_signal(
                name,
                "a multiplexer must be an integer signal",
            ));
        }
        let mut labels = BTreeSet::new();
        for label in self.choices.values() {
            if !labels.insert(label.as_str()) {
                return Err(CodecError::invalid_signal(
                    name,
                    format!("duplicate choice label '{label}'"),
                ));
            }
        }

        Ok(SignalGeometry {
            name: self.name,
            start_bit: self.start_bit,
            bit_length: self.bit_length,
            byte_order: self.byte_order,
            kind,
            scale: self.scale,
            offset: self.offset,
            minimum: self.minimum,
            maximum: self.maximum,
            choices: self.choices,
            is_multiplexer: self.is_multiplexer,
            multiplexer_ids: self.multiplexer_ids,
            multiplexer_signal: self.multiplexer_signal,
            unit: self.unit,
            comment: self.comment,
        })
    }
}
