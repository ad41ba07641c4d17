/*!
 * A frame's signals plus the derived structure the codec needs:
 * who governs whom, in which order multiplexers resolve, and the
 * lazily built per-signal bit plans.
 */

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use crate::can_decoder;
use crate::can_encoder;
use crate::error::{CodecError, Result};
use crate::frame::CanFrame;
use crate::options::{DecodeOptions, EncodeOptions};
use crate::signal::SignalGeometry;
use crate::signal_layout::{SignalLayout, MAX_PAYLOAD_LEN};
use crate::value::SignalValues;

const MAX_STANDARD_ID: u32 = 0x7FF;
const MAX_EXTENDED_ID: u32 = 0x1FFF_FFFF;

/// Bit plans keyed by signal position, each computed on first use and then
/// only read. Concurrent first use publishes exactly one plan per slot.
#[derive(Debug, Clone)]
struct PlanCache {
    slots: Vec<OnceLock<SignalLayout>>,
}

impl PlanCache {
    fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| OnceLock::new()).collect(),
        }
    }

    fn get_or_plan(&self, index: usize, signal: &SignalGeometry) -> &SignalLayout {
        self.slots[index].get_or_init(|| SignalLayout::from_geometry(signal))
    }
}

/// Immutable description of one CAN message.
///
/// Construction checks every layout invariant, so a `MessageLayout` that
/// exists is always safe to encode and decode against.
#[derive(Debug, Clone)]
pub struct MessageLayout {
    name: String,
    frame_id: u32,
    is_extended_id: bool,
    length_bytes: u8,
    signals: Vec<SignalGeometry>,
    index_by_name: HashMap<String, usize>,
    governors: Vec<Option<usize>>,
    resolution_order: Vec<usize>,
    plans: PlanCache,
    senders: Vec<String>,
    comment: Option<String>,
}

impl MessageLayout {
    pub fn new(
        name: impl Into<String>,
        frame_id: u32,
        is_extended_id: bool,
        length_bytes: u8,
        signals: Vec<SignalGeometry>,
    ) -> Result<Self> {
        let name = name.into();

        if length_bytes as usize > MAX_PAYLOAD_LEN {
            return Err(CodecError::invalid_layout(
                &name,
                format!("length {length_bytes} exceeds {MAX_PAYLOAD_LEN} bytes"),
            ));
        }
        let max_id = if is_extended_id { MAX_EXTENDED_ID } else { MAX_STANDARD_ID };
        if frame_id > max_id {
            return Err(CodecError::invalid_layout(
                &name,
                format!("frame id 0x{frame_id:X} does not fit the id format"),
            ));
        }

        let mut index_by_name = HashMap::with_capacity(signals.len());
        for (index, signal) in signals.iter().enumerate() {
            if index_by_name.insert(signal.name().to_owned(), index).is_some() {
                return Err(CodecError::invalid_layout(
                    &name,
                    format!("duplicate signal '{}'", signal.name()),
                ));
            }
        }

        let governors = find_governors(&name, &signals, &index_by_name)?;
        let resolution_order = order_by_depth(&name, &signals, &governors)?;
        let plans = PlanCache::new(signals.len());

        let layout = Self {
            name,
            frame_id,
            is_extended_id,
            length_bytes,
            signals,
            index_by_name,
            governors,
            resolution_order,
            plans,
            senders: Vec::new(),
            comment: None,
        };
        // The cache itself fills on first codec use.
        let plans: Vec<SignalLayout> =
            layout.signals.iter().map(SignalLayout::from_geometry).collect();
        layout.check_bounds(&plans)?;
        layout.check_overlaps(&plans)?;
        Ok(layout)
    }

    pub fn with_senders<I, S>(mut self, senders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.senders = senders.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame_id(&self) -> u32 {
        self.frame_id
    }

    pub fn is_extended_id(&self) -> bool {
        self.is_extended_id
    }

    pub fn length_bytes(&self) -> u8 {
        self.length_bytes
    }

    pub fn signals(&self) -> &[SignalGeometry] {
        &self.signals
    }

    pub fn senders(&self) -> &[String] {
        &self.senders
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn signal(&self, name: &str) -> Option<&SignalGeometry> {
        self.signal_index(name).map(|index| &self.signals[index])
    }

    pub fn signal_index(&self, name: &str) -> Option<usize> {
        self.index_by_name.get(name).copied()
    }

    /// Position of the multiplexer governing the signal at `index`. `None`
    /// for ungoverned signals and for positions past the last signal.
    pub fn governor(&self, index: usize) -> Option<usize> {
        self.governors.get(index).copied().flatten()
    }

    /// Every signal position, governors ahead of the signals they govern.
    pub fn resolution_order(&self) -> &[usize] {
        &self.resolution_order
    }

    pub fn multiplexer_signals(&self) -> impl Iterator<Item = &SignalGeometry> + '_ {
        self.signals.iter().filter(|signal| signal.is_multiplexer())
    }

    pub fn is_multiplexed(&self) -> bool {
        self.signals.iter().any(SignalGeometry::is_multiplexer)
    }

    /// Segment plan of the named signal, built on first request.
    pub fn signal_plan(&self, name: &str) -> Option<&SignalLayout> {
        self.signal_index(name).map(|index| self.plan(index))
    }

    /// `index` must come from this layout.
    pub(crate) fn plan(&self, index: usize) -> &SignalLayout {
        self.plans.get_or_plan(index, &self.signals[index])
    }

    pub fn encode(&self, values: &SignalValues, options: &EncodeOptions) -> Result<Vec<u8>> {
        can_encoder::encode(self, values, options)
    }

    pub fn encode_frame(&self, values: &SignalValues, options: &EncodeOptions) -> Result<CanFrame> {
        can_encoder::encode_frame(self, values, options)
    }

    pub fn decode(&self, data: &[u8], options: &DecodeOptions) -> Result<SignalValues> {
        can_decoder::decode(self, data, options)
    }

    pub fn decode_frame(&self, frame: &CanFrame, options: &DecodeOptions) -> Result<SignalValues> {
        can_decoder::decode(self, frame.payload(), options)
    }

    fn check_bounds(&self, plans: &[SignalLayout]) -> Result<()> {
        for (signal, plan) in self.signals.iter().zip(plans) {
            if !plan.fits(self.length_bytes as usize) {
                return Err(CodecError::invalid_layout(
                    &self.name,
                    format!(
                        "signal '{}' needs {} bytes but the message has {}",
                        signal.name(),
                        plan.end_byte(),
                        self.length_bytes
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Multiplexer conditions on the path from a signal up to its root:
    /// (governor position, ids the governor must take).
    fn conditions(&self, mut index: usize) -> Vec<(usize, &BTreeSet<i64>)> {
        let mut conditions = Vec::new();
        while let Some(governor) = self.governors[index] {
            conditions.push((governor, self.signals[index].multiplexer_ids()));
            index = governor;
        }
        conditions
    }

    /// Two signals can never be present together when they need disjoint
    /// selector values from a common multiplexer.
    fn mutually_exclusive(&self, a: usize, b: usize) -> bool {
        let conditions_b = self.conditions(b);
        self.conditions(a).iter().any(|(governor_a, ids_a)| {
            conditions_b
                .iter()
                .any(|(governor_b, ids_b)| governor_a == governor_b && ids_a.is_disjoint(ids_b))
        })
    }

    fn check_overlaps(&self, plans: &[SignalLayout]) -> Result<()> {
        let footprints: Vec<_> = plans.iter().map(SignalLayout::footprint).collect();
        for a in 0..self.signals.len() {
            for b in a + 1..self.signals.len() {
                let overlaps = footprints[a]
                    .iter()
                    .zip(footprints[b].iter())
                    .any(|(x, y)| x & y != 0);
                if overlaps && !self.mutually_exclusive(a, b) {
                    return Err(CodecError::invalid_layout(
                        &self.name,
                        format!(
                            "signals '{}' and '{}' overlap",
                            self.signals[a].name(),
                            self.signals[b].name()
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn find_governors(
    message: &str,
    signals: &[SignalGeometry],
    index_by_name: &HashMap<String, usize>,
) -> Result<Vec<Option<usize>>> {
    let multiplexers: Vec<usize> = signals
        .iter()
        .enumerate()
        .filter(|(_, signal)| signal.is_multiplexer())
        .map(|(index, _)| index)
        .collect();

    signals
        .iter()
        .enumerate()
        .map(|(index, signal)| {
            if !signal.is_multiplexed() {
                if let Some(governor) = signal.multiplexer_signal() {
                    return Err(CodecError::invalid_layout(
                        message,
                        format!(
                            "signal '{}' names multiplexer '{governor}' but no selector ids",
                            signal.name()
                        ),
                    ));
                }
                return Ok(None);
            }

            let governor = match signal.multiplexer_signal() {
                Some(governor_name) => {
                    *index_by_name.get(governor_name).ok_or_else(|| {
                        CodecError::invalid_layout(
                            message,
                            format!(
                                "signal '{}' refers to unknown multiplexer '{governor_name}'",
                                signal.name()
                            ),
                        )
                    })?
                }
                None => {
                    let candidates: Vec<usize> =
                        multiplexers.iter().copied().filter(|m| *m != index).collect();
                    match candidates.as_slice() {
                        [only] => *only,
                        _ => {
                            return Err(CodecError::invalid_layout(
                                message,
                                format!(
                                    "cannot tell which multiplexer governs '{}'",
                                    signal.name()
                                ),
                            ))
                        }
                    }
                }
            };

            if governor == index || !signals[governor].is_multiplexer() {
                return Err(CodecError::invalid_layout(
                    message,
                    format!(
                        "'{}' cannot govern '{}': not a multiplexer",
                        signals[governor].name(),
                        signal.name()
                    ),
                ));
            }
            Ok(Some(governor))
        })
        .collect()
}

/// Sort positions by their depth in the multiplexer tree, rejecting cycles.
fn order_by_depth(
    message: &str,
    signals: &[SignalGeometry],
    governors: &[Option<usize>],
) -> Result<Vec<usize>> {
    let mut depths = Vec::with_capacity(signals.len());
    for (index, signal) in signals.iter().enumerate() {
        let mut depth = 0usize;
        let mut current = index;
        while let Some(governor) = governors[current] {
            depth += 1;
            if depth > signals.len() {
                return Err(CodecError::invalid_layout(
                    message,
                    format!("multiplexer cycle through '{}'", signal.name()),
                ));
            }
            current = governor;
        }
        depths.push(depth);
    }

    let mut order: Vec<usize> = (0..signals.len()).collect();
    order.sort_by_key(|index| depths[*index]);
    Ok(order)
}
