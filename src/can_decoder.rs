use log::trace;

use crate::error::{CodecError, Result};
use crate::message_layout::MessageLayout;
use crate::multiplex;
use crate::options::DecodeOptions;
use crate::signal::SignalGeometry;
use crate::transform::{self, RawValue};
use crate::value::{SignalValue, SignalValues};

/// Decode every present signal of a message payload.
///
/// A payload shorter than `length_bytes` is an error unless
/// `allow_truncated` is set, in which case only signals whose bytes all
/// arrived are returned. Bytes past `length_bytes` are ignored.
pub fn decode(layout: &MessageLayout, data: &[u8], options: &DecodeOptions) -> Result<SignalValues> {
    let expected = layout.length_bytes() as usize;
    if data.len() < expected && !options.allow_truncated {
        return Err(CodecError::BufferTooShort {
            message: layout.name().to_owned(),
            expected,
            actual: data.len(),
        });
    }
    let data = &data[..expected.min(data.len())];

    let active = multiplex::resolve_for_decode(layout, data);
    let mut values = SignalValues::with_capacity(active.count());
    for index in active.iter() {
        let signal = &layout.signals()[index];
        let plan = layout.plan(index);
        if !plan.fits(data.len()) {
            trace!("{}: '{}' is past the received bytes", layout.name(), signal.name());
            continue;
        }
        let raw = transform::decode_raw(signal, plan.extract(data));
        values.insert(signal.name().to_owned(), decode_signal(signal, raw, options));
    }
    Ok(values)
}

fn decode_signal(signal: &SignalGeometry, raw: RawValue, options: &DecodeOptions) -> SignalValue {
    if options.decode_choices {
        if let Some(label) = raw.as_selector().and_then(|raw| signal.choice_label(raw)) {
            return SignalValue::Label(label.to_owned());
        }
    }
    transform::to_physical(signal, raw, options.scaling)
}
