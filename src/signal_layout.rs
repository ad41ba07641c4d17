/*!
 * Defines the layout in bits of a signal so that it can be reused to pack/unpack into bytes
 */

use crate::signal::{ByteOrder, SignalGeometry};

/// Largest CAN-FD payload, in bytes.
pub const MAX_PAYLOAD_LEN: usize = 64;

/// One contiguous span of bits within a single byte of the CAN frame data.
///
/// Describes a mapping: "take `num_bits` consecutive bits starting at
/// `bit_offset` in `data[byte_index]`, and place them at `value_shift`
/// in the raw u64 value."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSpan {
    pub byte_index: usize,
    /// Lowest bit position within the byte (0..=7).
    pub bit_offset: u8,
    /// How many consecutive bits in this span (1..=8).
    pub num_bits: u8,
    /// The span's bits in place within the byte.
    pub mask: u8,
    /// Where these bits land in the raw u64, LSB-relative.
    /// i.e., the extracted bits are shifted left by this amount.
    pub value_shift: u8,
}

impl BitSpan {
    fn new(byte_index: usize, bit_offset: u8, num_bits: u8, value_shift: u8) -> Self {
        let mask = (((1u16 << num_bits) - 1) as u8) << bit_offset;
        Self {
            byte_index,
            bit_offset,
            num_bits,
            mask,
            value_shift,
        }
    }
}

/// Precomputed mapping from a signal's bit positions to frame data bytes.
///
/// The same layout is used by both `extract` (decode) and `pack` (encode),
/// guaranteeing they are inverses by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalLayout {
    /// Each segment describes one contiguous run of bits within a single byte.
    /// A 64-bit signal produces at most 9 segments (partial, 7 full, partial).
    segments: Vec<BitSpan>,
    signal_size: u8,
}

impl SignalLayout {
    pub fn from_geometry(signal: &SignalGeometry) -> Self {
        Self::plan(signal.start_bit(), signal.bit_length(), signal.byte_order())
    }

    /// Split a signal's bit range into per-byte spans.
    ///
    /// This is the single source of truth for how `start_bit` + byte order
    /// maps to physical byte/bit positions in the CAN frame data array.
    pub fn plan(start_bit: u16, bit_length: u8, byte_order: ByteOrder) -> Self {
        let mut segments = Vec::with_capacity(bit_length as usize / 8 + 2);
        let mut byte_index = (start_bit / 8) as usize;
        let mut bit_index = (start_bit % 8) as u8;
        let mut remaining = bit_length;

        match byte_order {
            ByteOrder::BigEndian => {
                // Big-endian (Motorola): start_bit is the MSB position.
                // Walk downward within each byte, then move to next byte at bit 7.
                // First bits extracted are the MSB of the raw value.
                while remaining > 0 {
                    let num_bits = std::cmp::min(bit_index + 1, remaining);
                    let bit_offset = bit_index + 1 - num_bits;
                    remaining -= num_bits;
                    segments.push(BitSpan::new(byte_index, bit_offset, num_bits, remaining));
                    byte_index += 1;
                    bit_index = 7;
                }
            }
            ByteOrder::LittleEndian => {
                // Little-endian (Intel): start_bit is the LSB position.
                // Walk upward within each byte, then move to next byte at bit 0.
                // First bits extracted are the LSB of the raw value.
                let mut value_shift = 0u8;
                while remaining > 0 {
                    let num_bits = std::cmp::min(8 - bit_index, remaining);
                    segments.push(BitSpan::new(byte_index, bit_index, num_bits, value_shift));
                    value_shift += num_bits;
                    remaining -= num_bits;
                    byte_index += 1;
                    bit_index = 0;
                }
            }
        }

        Self {
            segments,
            signal_size: bit_length,
        }
    }

    pub fn segments(&self) -> &[BitSpan] {
        &self.segments
    }

    pub fn signal_size(&self) -> u8 {
        self.signal_size
    }

    /// Number of payload bytes needed to hold every span of the signal.
    pub fn end_byte(&self) -> usize {
        self.segments
            .iter()
            .map(|span| span.byte_index + 1)
            .max()
            .unwrap_or(0)
    }

    /// Whether all spans fall inside a payload of `len` bytes.
    pub fn fits(&self, len: usize) -> bool {
        self.end_byte() <= len
    }

    /// Per-byte masks of every bit the signal occupies.
    ///
    /// Spans past the largest payload are dropped; callers check `fits` first.
    pub fn footprint(&self) -> [u8; MAX_PAYLOAD_LEN] {
        let mut bits = [0u8; MAX_PAYLOAD_LEN];
        for span in &self.segments {
            if let Some(byte) = bits.get_mut(span.byte_index) {
                *byte |= span.mask;
            }
        }
        bits
    }

    /// Extract the raw unsigned value from the CAN frame data bytes.
    ///
    /// Iterates over the precomputed segments, masking and shifting bits
    /// from each byte into the correct position in the result.
    /// `data` must be at least `end_byte()` long.
    pub fn extract(&self, data: &[u8]) -> u64 {
        let mut result: u64 = 0;
        for span in &self.segments {
            let bits = (data[span.byte_index] & span.mask) >> span.bit_offset;
            result |= (bits as u64) << span.value_shift;
        }
        result
    }

    /// Pack a raw unsigned value into the CAN frame data bytes.
    ///
    /// Iterates over the precomputed segments, slicing bits from the raw value
    /// and writing them into the correct byte positions. Clears target bits
    /// before writing so that multiple signals can be packed into the same frame.
    pub fn pack(&self, data: &mut [u8], raw: u64) {
        for span in &self.segments {
            let bits = ((raw >> span.value_shift) as u8) << span.bit_offset;
            data[span.byte_index] &= !span.mask;
            data[span.byte_index] |= bits & span.mask;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{hex_bytes, motohawk};

    #[test]
    fn test_plan_little_endian_cross_byte() {
        let layout = SignalLayout::plan(4, 12, ByteOrder::LittleEndian);
        assert_eq!(
            layout.segments(),
            &[
                BitSpan { byte_index: 0, bit_offset: 4, num_bits: 4, mask: 0xF0, value_shift: 0 },
                BitSpan { byte_index: 1, bit_offset: 0, num_bits: 8, mask: 0xFF, value_shift: 4 },
            ]
        );
        assert_eq!(layout.end_byte(), 2);
    }

    #[test]
    fn test_plan_big_endian_walks_down() {
        // Temperature of the motohawk example: MSB at bit 0 of byte 0.
        let layout = SignalLayout::plan(0, 12, ByteOrder::BigEndian);
        assert_eq!(
            layout.segments(),
            &[
                BitSpan { byte_index: 0, bit_offset: 0, num_bits: 1, mask: 0x01, value_shift: 11 },
                BitSpan { byte_index: 1, bit_offset: 0, num_bits: 8, mask: 0xFF, value_shift: 3 },
                BitSpan { byte_index: 2, bit_offset: 5, num_bits: 3, mask: 0xE0, value_shift: 0 },
            ]
        );
    }

    #[test]
    fn test_plan_covers_exact_bit_length() {
        for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
            for start_bit in 0..64u16 {
                for bit_length in 1..=64u8 {
                    let layout = SignalLayout::plan(start_bit, bit_length, order);
                    let total: u32 = layout.segments().iter().map(|s| s.num_bits as u32).sum();
                    assert_eq!(total, bit_length as u32);
                    let shifts: u64 = layout
                        .segments()
                        .iter()
                        .map(|s| (((1u128 << s.num_bits) - 1) << s.value_shift) as u64)
                        .fold(0, |acc, m| {
                            assert_eq!(acc & m, 0, "spans overlap in the raw value");
                            acc | m
                        });
                    assert_eq!(shifts.count_ones(), bit_length as u32);
                }
            }
        }
    }

    #[test]
    fn test_extract_motohawk_temperature() {
        // Temperature: start_bit=0, size=12, big-endian, signed, factor=0.01, offset=250
        // -586 as signed 12-bit two's complement: 4096 - 586 = 3510 = 0xDB6
        let data = hex_bytes("A5B6D90000000000");
        let layout = motohawk();
        let index = layout.signal_index("Temperature").unwrap();
        assert_eq!(layout.plan(index).extract(&data), 0xDB6);
    }

    #[test]
    fn test_extract_motohawk_average_radius_and_enable() {
        let data = hex_bytes("A5B6D90000000000");
        let layout = motohawk();
        let radius = layout.signal_index("AverageRadius").unwrap();
        assert_eq!(layout.plan(radius).extract(&data), 18);
        let enable = layout.signal_index("Enable").unwrap();
        assert_eq!(layout.plan(enable).extract(&data), 1);
    }

    #[test]
    fn test_extract_64bit_signals() {
        let data = hex_bytes("11223344FF667788");
        let le = SignalLayout::plan(0, 64, ByteOrder::LittleEndian);
        assert_eq!(le.extract(&data), 0x887766FF44332211);

        let be = SignalLayout::plan(7, 64, ByteOrder::BigEndian);
        assert_eq!(be.extract(&data), 0x11223344FF667788);
    }

    // ---------------------------------------------------------------
    // Pack tests
    // ---------------------------------------------------------------

    #[test]
    fn test_pack_motohawk_golden_bytes() {
        // Temperature: raw=3510 (0xDB6), 12-bit BE, start_bit=0
        //   byte 0 bit 0 = MSB(1)           → 0x01
        //   byte 1 bits 7..0 = 0xB6          → 0xB6
        //   byte 2 bits 7..5 = 0b110          → 0xC0
        //
        // AverageRadius: raw=18, 6-bit BE, start_bit=6
        //   byte 0 bits 6..1 = 18 = 0b010010 → 0x24
        //
        // Enable: raw=1, 1-bit BE, start_bit=7
        //   byte 0 bit 7 = 1                  → 0x80
        let layout = motohawk();
        let mut data = [0u8; 8];
        for (name, raw) in [("Temperature", 0xDB6), ("AverageRadius", 18), ("Enable", 1)] {
            let index = layout.signal_index(name).unwrap();
            layout.plan(index).pack(&mut data, raw);
        }

        assert_eq!(data[0], 0xA5, "byte 0");
        assert_eq!(data[1], 0xB6, "byte 1");
        assert_eq!(data[2], 0xC0, "byte 2"); // only bits 5-7 used
        assert_eq!(data[3], 0x00, "byte 3");
    }

    #[test]
    fn test_pack_cross_byte_little_endian() {
        let layout = SignalLayout::plan(4, 12, ByteOrder::LittleEndian);
        let mut data = [0u8; 8];
        layout.pack(&mut data, 0xABC);
        assert_eq!(data[0], 0xC0);
        assert_eq!(data[1], 0xAB);
        assert_eq!(&data[2..], &[0; 6]);
        assert_eq!(layout.extract(&data), 0xABC);
    }

    #[test]
    fn test_pack_64bit_golden_bytes() {
        let golden = hex_bytes("11223344FF667788");
        let layout = SignalLayout::plan(0, 64, ByteOrder::LittleEndian);
        let mut data = [0u8; 8];
        layout.pack(&mut data, 0x887766FF44332211);
        assert_eq!(&data[..], &golden[..8]);

        let layout_big = SignalLayout::plan(7, 64, ByteOrder::BigEndian);
        let mut data = [0u8; 8];
        layout_big.pack(&mut data, 0x8000000000000000);
        assert_eq!(data, [0x80, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_pack_clears_existing_bits() {
        // Enable is bit 7 of byte 0. Packing 0 should clear it.
        let layout = SignalLayout::plan(7, 1, ByteOrder::BigEndian);
        let mut data = [0xFFu8; 8];
        layout.pack(&mut data, 0);
        assert_eq!(data[0], 0x7F); // bit 7 cleared, rest untouched
        assert_eq!(data[1], 0xFF); // other bytes untouched
    }

    #[test]
    fn test_pack_ignores_bits_above_width() {
        let layout = SignalLayout::plan(0, 4, ByteOrder::LittleEndian);
        let mut data = [0u8; 1];
        layout.pack(&mut data, 0xFFFF_FFFF_FFFF_FFFF);
        assert_eq!(data[0], 0x0F);
    }

    #[test]
    fn test_footprint_marks_occupied_bits() {
        let layout = SignalLayout::plan(6, 6, ByteOrder::BigEndian);
        let footprint = layout.footprint();
        assert_eq!(footprint[0], 0b0111_1110);
        assert!(footprint[1..].iter().all(|b| *b == 0));
    }

    // ---------------------------------------------------------------
    // Round-trip tests: extract → pack → extract
    // ---------------------------------------------------------------

    #[test]
    fn test_roundtrip_extract_pack_motohawk() {
        let data = hex_bytes("A5B6D90000000000");
        let layout = motohawk();
        for index in 0..layout.signals().len() {
            let plan = layout.plan(index);
            let raw = plan.extract(&data);
            let mut packed = [0u8; 8];
            plan.pack(&mut packed, raw);
            let raw2 = plan.extract(&packed);
            assert_eq!(
                raw, raw2,
                "extract-pack roundtrip failed for signal '{}': {} != {}",
                layout.signals()[index].name(), raw, raw2
            );
        }
    }

    #[test]
    fn test_roundtrip_extract_pack_fd_payload() {
        let data: Vec<u8> = (0..64u8).map(|b| b.wrapping_mul(37).wrapping_add(11)).collect();
        for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
            for (start_bit, bit_length) in [(0u16, 64u8), (100, 33), (263, 17), (455, 9), (504, 8)] {
                let plan = SignalLayout::plan(start_bit, bit_length, order);
                if !plan.fits(data.len()) {
                    continue;
                }
                let raw = plan.extract(&data);
                let mut packed = vec![0u8; 64];
                plan.pack(&mut packed, raw);
                assert_eq!(plan.extract(&packed), raw, "{order:?} {start_bit}|{bit_length}");
            }
        }
    }
}
