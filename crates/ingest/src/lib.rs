//! `gasmon-ingest` library crate.
//!
//! Boundary layer of the gas-supply monitor: payload decoding, the
//! persistence/directory adapters, the message router, and the
//! WebSocket frame source. The daemon entrypoint lives in `main.rs`.

pub mod codec;
pub mod directory;
pub mod router;
pub mod source;
pub mod store;
