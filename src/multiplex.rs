/*!
 * Decides which signals of a message are present.
 *
 * A signal is present when it is ungoverned, or when its governing
 * multiplexer is present itself and resolves to one of the signal's
 * multiplexer ids. Resolution walks `MessageLayout::resolution_order`, so a
 * governor is always settled before the signals it governs.
 */

use std::convert::Infallible;

use log::trace;

use crate::can_encoder;
use crate::error::Result;
use crate::message_layout::MessageLayout;
use crate::options::EncodeOptions;
use crate::signal::SignalGeometry;
use crate::transform;
use crate::value::SignalValues;

/// Presence of each signal of one message, plus the value each present
/// multiplexer resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSignals {
    active: Vec<bool>,
    selectors: Vec<Option<i64>>,
}

impl ActiveSignals {
    pub fn is_active(&self, index: usize) -> bool {
        self.active.get(index).copied().unwrap_or(false)
    }

    /// Selector value the multiplexer at `index` resolved to, if it is a
    /// present multiplexer whose value could be read.
    pub fn selector(&self, index: usize) -> Option<i64> {
        self.selectors.get(index).copied().flatten()
    }

    /// Positions of the present signals, in layout order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.active
            .iter()
            .enumerate()
            .filter(|(_, active)| **active)
            .map(|(index, _)| index)
    }

    pub fn count(&self) -> usize {
        self.active.iter().filter(|active| **active).count()
    }

    fn resolve<F, E>(layout: &MessageLayout, mut read_selector: F) -> std::result::Result<Self, E>
    where
        F: FnMut(usize, &SignalGeometry) -> std::result::Result<Option<i64>, E>,
    {
        let len = layout.signals().len();
        let mut resolved = Self {
            active: vec![false; len],
            selectors: vec![None; len],
        };

        for &index in layout.resolution_order() {
            let signal = &layout.signals()[index];
            let active = match layout.governor(index) {
                None => true,
                Some(governor) => {
                    resolved.active[governor]
                        && resolved.selectors[governor]
                            .is_some_and(|selector| signal.multiplexer_ids().contains(&selector))
                }
            };
            resolved.active[index] = active;

            if active && signal.is_multiplexer() {
                let selector = read_selector(index, signal)?;
                trace!(
                    "{}: multiplexer '{}' selects {:?}",
                    layout.name(),
                    signal.name(),
                    selector
                );
                resolved.selectors[index] = selector;
            }
        }
        Ok(resolved)
    }
}

/// Presence of each signal given the received payload.
///
/// A multiplexer whose bits are not all in `data` leaves its dependents
/// absent.
pub fn resolve_for_decode(layout: &MessageLayout, data: &[u8]) -> ActiveSignals {
    let resolved = ActiveSignals::resolve(layout, |index, signal| {
        let plan = layout.plan(index);
        if !plan.fits(data.len()) {
            return Ok::<_, Infallible>(None);
        }
        Ok(transform::decode_raw(signal, plan.extract(data)).as_selector())
    });
    match resolved {
        Ok(active) => active,
        Err(never) => match never {},
    }
}

/// Presence of each signal given the values a caller wants to encode.
///
/// Each present multiplexer resolves to the raw value that will actually be
/// written for it, so missing or out-of-range selectors follow the same
/// recovery rules as any other signal.
pub fn resolve_for_encode(
    layout: &MessageLayout,
    values: &SignalValues,
    options: &EncodeOptions,
) -> Result<ActiveSignals> {
    ActiveSignals::resolve(layout, |_, signal| {
        let bits = can_encoder::signal_bits(signal, values.get(signal.name()), options)?;
        Ok(transform::decode_raw(signal, bits).as_selector())
    })
}
