/*!
 * Layouts shared by the unit tests.
 */

use crate::message_layout::MessageLayout;
use crate::signal::{ByteOrder, SignalGeometry};

/// Parse candump style hex ("A5B6D9...") into bytes.
pub fn hex_bytes(hex: &str) -> Vec<u8> {
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
        .collect()
}

/// `ExampleMessage` of the well known motohawk.dbc, frame 0x1F0.
///
/// ```text
/// BO_ 496 ExampleMessage: 8 PCM1
///  SG_ Temperature : 0|12@0- (0.01,250) [229.52|270.47] "degK" PCM1,FOO
///  SG_ AverageRadius : 6|6@0+ (0.1,0) [0|5] "m" Vector__XXX
///  SG_ Enable : 7|1@0+ (1,0) [0|0] "-" Vector__XXX
/// ```
pub fn motohawk() -> MessageLayout {
    let signals = vec![
        SignalGeometry::builder("Temperature", 0, 12, ByteOrder::BigEndian)
            .signed(true)
            .scale(0.01)
            .offset(250.0)
            .range(229.52, 270.47)
            .unit("degK")
            .build()
            .unwrap(),
        SignalGeometry::builder("AverageRadius", 6, 6, ByteOrder::BigEndian)
            .scale(0.1)
            .range(0.0, 5.0)
            .unit("m")
            .build()
            .unwrap(),
        SignalGeometry::builder("Enable", 7, 1, ByteOrder::BigEndian)
            .choices([(0, "Disabled"), (1, "Enabled")])
            .unit("-")
            .build()
            .unwrap(),
    ];
    MessageLayout::new("ExampleMessage", 0x1F0, false, 8, signals)
        .unwrap()
        .with_senders(["PCM1"])
}

fn le(name: &str, start_bit: u16, bit_length: u8) -> crate::signal::SignalGeometryBuilder {
    SignalGeometry::builder(name, start_bit, bit_length, ByteOrder::LittleEndian)
}

/// One multiplexer in byte 0 choosing between two overlapping signal groups.
pub fn multiplexed() -> MessageLayout {
    let signals = vec![
        le("Mux", 0, 8).multiplexer(true).build().unwrap(),
        le("A1", 8, 16).multiplexer_ids([0]).build().unwrap(),
        le("A2", 24, 8).multiplexer_ids([0]).build().unwrap(),
        le("B1", 8, 8).signed(true).multiplexer_ids([1]).build().unwrap(),
        le("B2", 16, 16).scale(0.5).multiplexer_ids([1]).build().unwrap(),
        le("Always", 56, 8).build().unwrap(),
    ];
    MessageLayout::new("Multiplexed", 0x200, false, 8, signals).unwrap()
}

/// `Sub` is itself multiplexed by `Mux` and governs `C` and `D`.
pub fn nested_multiplexed() -> MessageLayout {
    let signals = vec![
        le("Mux", 0, 8).multiplexer(true).build().unwrap(),
        le("Sub", 8, 4)
            .multiplexer(true)
            .multiplexer_ids([2])
            .multiplexer_signal("Mux")
            .build()
            .unwrap(),
        le("C", 16, 8)
            .multiplexer_ids([3])
            .multiplexer_signal("Sub")
            .build()
            .unwrap(),
        le("D", 16, 8)
            .multiplexer_ids([4])
            .multiplexer_signal("Sub")
            .build()
            .unwrap(),
        le("E", 8, 8)
            .multiplexer_ids([1])
            .multiplexer_signal("Mux")
            .build()
            .unwrap(),
    ];
    MessageLayout::new("Nested", 0x300, false, 8, signals).unwrap()
}
