//! Pure domain logic for the gas-supply monitoring pipeline.
//!
//! No I/O lives here. This crate provides:
//!
//! - [`Reading`] — one decoded telemetry sample from a hospital central
//!   or an oxygen generation plant.
//! - [`evaluator`] — threshold rules mapping a reading to fault
//!   [`Finding`]s.
//! - [`AlertGate`] — per-entity cooldown deciding whether findings
//!   become an outbound notification.
//! - [`compose`] — alert email title/body composition.

pub mod compose;
pub mod evaluator;
pub mod gate;
pub mod reading;

pub use compose::AlertMessage;
pub use evaluator::Finding;
pub use gate::AlertGate;
pub use reading::{DeviceClass, Reading, ReadingData, Section};
