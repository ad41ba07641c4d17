//! Encode and decode the signals of CAN and CAN FD frames.
//!
//! A [`MessageLayout`] describes where each [`SignalGeometry`] sits in a
//! frame payload. Layouts are validated once at construction and can then be
//! shared by reference between threads; the per-signal bit plans are built
//! lazily on first use.
//!
//! ```
//! use cansignal::{ByteOrder, DecodeOptions, EncodeOptions, MessageLayout, SignalGeometry};
//! use cansignal::{SignalValue, SignalValues};
//!
//! let speed = SignalGeometry::builder("Speed", 0, 16, ByteOrder::LittleEndian)
//!     .scale(0.5)
//!     .range(0.0, 300.0)
//!     .build()?;
//! let layout = MessageLayout::new("Vehicle", 0x123, false, 8, vec![speed])?;
//!
//! let values = SignalValues::from([("Speed".to_owned(), SignalValue::Float(42.5))]);
//! let data = layout.encode(&values, &EncodeOptions::default())?;
//! assert_eq!(data, [0x55, 0, 0, 0, 0, 0, 0, 0]);
//!
//! let decoded = layout.decode(&data, &DecodeOptions::default())?;
//! assert_eq!(decoded["Speed"].as_f64(), Some(42.5));
//! # Ok::<(), cansignal::CodecError>(())
//! ```
//!
//! DBC files are read with the `can-dbc` crate and converted with
//! [`Database::from_dbc`] or [`dbc::load_dbc`].

pub mod can_decoder;
pub mod can_encoder;
pub mod database;
pub mod dbc;
pub mod error;
pub mod frame;
pub mod message_layout;
pub mod multiplex;
pub mod options;
pub mod range;
pub mod signal;
pub mod signal_layout;
pub mod transform;
pub mod value;

#[cfg(test)]
mod test_fixtures;

pub use can_encoder::CanFrameBuilder;
pub use database::Database;
pub use error::{CodecError, Result};
pub use frame::CanFrame;
pub use message_layout::MessageLayout;
pub use options::{DecodeOptions, EncodeOptions, OutOfRange};
pub use signal::{ByteOrder, SignalGeometry, SignalKind};
pub use value::{SignalValue, SignalValues};
