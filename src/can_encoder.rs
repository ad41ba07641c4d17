use log::debug;

use crate::error::{CodecError, Result};
use crate::frame::CanFrame;
use crate::message_layout::MessageLayout;
use crate::multiplex;
use crate::options::{EncodeOptions, OutOfRange};
use crate::signal::SignalGeometry;
use crate::transform;
use crate::value::{SignalValue, SignalValues};

/// Encode a full message from signal name/value pairs into its payload.
///
/// Only signals selected by the message's multiplexers are written. The
/// result is always exactly `length_bytes` long; bits no present signal
/// covers are 0, or 1 with `padding`.
///
/// Under `strict`, unknown names, values for absent signals, missing values
/// and out-of-range values are errors. Otherwise unknown and absent names are
/// ignored and missing or rejected values are replaced by the signal default
/// (or clamped, per `out_of_range`).
pub fn encode(
    layout: &MessageLayout,
    values: &SignalValues,
    options: &EncodeOptions,
) -> Result<Vec<u8>> {
    let active = multiplex::resolve_for_encode(layout, values, options)?;

    for name in values.keys() {
        match layout.signal_index(name) {
            None if options.strict => {
                return Err(CodecError::UnknownSignal {
                    message: layout.name().to_owned(),
                    signal: name.clone(),
                });
            }
            None => debug!("{}: ignoring unknown signal '{name}'", layout.name()),
            Some(index) if !active.is_active(index) => {
                let governor = layout.governor(index);
                if options.strict {
                    return Err(CodecError::InactiveSignal {
                        signal: name.clone(),
                        multiplexer: governor
                            .map(|g| layout.signals()[g].name().to_owned())
                            .unwrap_or_default(),
                        selector: governor.and_then(|g| active.selector(g)),
                    });
                }
                debug!("{}: ignoring '{name}', not selected", layout.name());
            }
            Some(_) => {}
        }
    }

    let fill = if options.padding { 0xFF } else { 0x00 };
    let mut data = vec![fill; layout.length_bytes() as usize];
    for index in active.iter() {
        let signal = &layout.signals()[index];
        let bits = signal_bits(signal, values.get(signal.name()), options)?;
        layout.plan(index).pack(&mut data, bits);
    }
    Ok(data)
}

/// [`encode`], wrapped in a frame carrying the message's id.
pub fn encode_frame(
    layout: &MessageLayout,
    values: &SignalValues,
    options: &EncodeOptions,
) -> Result<CanFrame> {
    let data = encode(layout, values, options)?;
    CanFrame::new(layout.frame_id(), layout.is_extended_id(), &data)
}

/// Field bits for one present signal, applying the missing and out-of-range
/// rules of `options`.
pub(crate) fn signal_bits(
    signal: &SignalGeometry,
    value: Option<&SignalValue>,
    options: &EncodeOptions,
) -> Result<u64> {
    let Some(value) = value else {
        if options.strict {
            return Err(CodecError::MissingValue(signal.name().to_owned()));
        }
        debug!("'{}' not supplied, encoding its default", signal.name());
        return transform::default_bits(signal);
    };

    match transform::encode_bits(signal, value, options.scaling) {
        Err(CodecError::OutOfRange { .. }) if !options.strict => match options.out_of_range {
            OutOfRange::Omit => {
                debug!("'{}' = {value} is out of range, encoding its default", signal.name());
                transform::default_bits(signal)
            }
            OutOfRange::Clamp => {
                debug!("'{}' = {value} is out of range, clamping", signal.name());
                transform::encode_bits_clamped(signal, value, options.scaling)
            }
        },
        result => result,
    }
}

/// Builder for constructing encoded CAN frames signal-by-signal.
///
/// Uses the consuming-self pattern so that each `.set()` call moves
/// the builder, preventing accidental reuse of a half-built frame.
pub struct CanFrameBuilder<'a> {
    layout: &'a MessageLayout,
    values: SignalValues,
    options: EncodeOptions,
}

impl<'a> CanFrameBuilder<'a> {
    pub fn new(layout: &'a MessageLayout) -> Self {
        Self {
            layout,
            values: SignalValues::with_capacity(layout.signals().len()),
            options: EncodeOptions::default(),
        }
    }

    /// Set a signal by name. Returns Err if the signal name is not found.
    pub fn set(mut self, signal_name: &str, value: impl Into<SignalValue>) -> Result<Self> {
        if self.layout.signal_index(signal_name).is_none() {
            return Err(CodecError::UnknownSignal {
                message: self.layout.name().to_owned(),
                signal: signal_name.to_owned(),
            });
        }
        self.values.insert(signal_name.to_owned(), value.into());
        Ok(self)
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    pub fn padding(mut self, padding: bool) -> Self {
        self.options.padding = padding;
        self
    }

    pub fn options(mut self, options: EncodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Consume the builder and produce the finished frame.
    pub fn build(self) -> Result<CanFrame> {
        encode_frame(self.layout, &self.values, &self.options)
    }
}
