/*!
 * Builds a [`Database`] from a DBC file parsed by `can-dbc`.
 *
 * Byte order, value type, factor/offset, bounds, units, `VAL_` choices,
 * `SIG_VALTYPE_` float types and simple `M`/`mN` multiplexing are carried
 * over. `[0|0]` bounds mean the signal is unbounded.
 */

use std::path::Path;

use anyhow::{anyhow, Context};
use can_dbc::{MessageId, MultiplexIndicator, SignalExtendedValueType, Transmitter, DBC};
use log::warn;

use crate::database::Database;
use crate::error::{CodecError, Result};
use crate::message_layout::MessageLayout;
use crate::signal::{ByteOrder, SignalGeometry};

impl Database {
    /// Convert every message of a parsed DBC file.
    ///
    /// Messages using extended multiplexing (`mNM` signals) are skipped
    /// with a warning. Any other malformed message is an error.
    pub fn from_dbc(dbc: &DBC) -> Result<Database> {
        let mut database = Database::new();
        for message in dbc.messages() {
            if let Some(layout) = message_layout(dbc, message)? {
                database.add_message(layout);
            }
        }
        Ok(database)
    }

    /// Parse DBC text and convert it.
    pub fn from_dbc_slice(bytes: &[u8]) -> anyhow::Result<Database> {
        let dbc = DBC::from_slice(bytes).map_err(|e| anyhow!("Failed to parse DBC: {e:?}"))?;
        Ok(Database::from_dbc(&dbc)?)
    }
}

/// Read, parse and convert a DBC file.
pub fn load_dbc(dbc_path: impl AsRef<Path>) -> anyhow::Result<Database> {
    let dbc_path = dbc_path.as_ref();
    let buffer = std::fs::read(dbc_path)
        .with_context(|| format!("reading {}", dbc_path.display()))?;
    Database::from_dbc_slice(&buffer).with_context(|| format!("loading {}", dbc_path.display()))
}

fn message_layout(dbc: &DBC, message: &can_dbc::Message) -> Result<Option<MessageLayout>> {
    let name = message.message_name().as_str();
    let (frame_id, is_extended_id) = match message.message_id() {
        MessageId::Standard(id) => (*id as u32, false),
        MessageId::Extended(id) => (*id, true),
    };

    if message.signals().iter().any(|signal| {
        matches!(
            signal.multiplexer_indicator(),
            MultiplexIndicator::MultiplexorAndMultiplexedSignal(_)
        )
    }) {
        warn!("Skipping '{name}': extended multiplexing is not supported");
        return Ok(None);
    }

    let length_bytes = u8::try_from(*message.message_size()).map_err(|_| {
        CodecError::invalid_layout(name, format!("length {} is too large", message.message_size()))
    })?;

    let signals = message
        .signals()
        .iter()
        .map(|signal| signal_geometry(dbc, message.message_id(), signal))
        .collect::<Result<Vec<_>>>()?;

    let mut layout = MessageLayout::new(name, frame_id, is_extended_id, length_bytes, signals)?;
    if let Transmitter::NodeName(node) = message.transmitter() {
        layout = layout.with_senders([node.as_str()]);
    }
    Ok(Some(layout))
}

fn signal_geometry(
    dbc: &DBC,
    message_id: &MessageId,
    signal: &can_dbc::Signal,
) -> Result<SignalGeometry> {
    let name = signal.name().as_str();
    let start_bit = u16::try_from(*signal.start_bit())
        .map_err(|_| CodecError::invalid_signal(name, "start bit out of range"))?;
    let bit_length = u8::try_from(*signal.signal_size())
        .map_err(|_| CodecError::invalid_signal(name, "size out of range"))?;
    let byte_order = match signal.byte_order() {
        can_dbc::ByteOrder::LittleEndian => ByteOrder::LittleEndian,
        can_dbc::ByteOrder::BigEndian => ByteOrder::BigEndian,
    };
    let is_float = matches!(
        dbc.extended_value_type_for_signal(message_id.clone(), name),
        Some(SignalExtendedValueType::IEEEfloat32Bit | SignalExtendedValueType::IEEEdouble64bit)
    );

    let mut builder = SignalGeometry::builder(name, start_bit, bit_length, byte_order)
        .signed(matches!(signal.value_type(), can_dbc::ValueType::Signed))
        .float(is_float)
        .scale(*signal.factor())
        .offset(*signal.offset());

    let (min, max) = (*signal.min(), *signal.max());
    if !(min == 0.0 && max == 0.0) {
        builder = builder.range(min, max);
    }
    if !signal.unit().is_empty() {
        builder = builder.unit(signal.unit().as_str());
    }

    if let Some(descriptions) = dbc.value_descriptions_for_signal(message_id.clone(), name) {
        builder = builder.choices(
            descriptions
                .iter()
                .map(|description| (*description.a() as i64, description.b().as_str())),
        );
    }

    match signal.multiplexer_indicator() {
        MultiplexIndicator::Multiplexor => builder = builder.multiplexer(true),
        MultiplexIndicator::MultiplexedSignal(id) => builder = builder.multiplexer_ids([*id as i64]),
        // Filtered out per message before signals are converted.
        MultiplexIndicator::MultiplexorAndMultiplexedSignal(_) | MultiplexIndicator::Plain => {}
    }

    builder.build()
}
