#![forbid(unsafe_code)]

//! Browser host for the listgrip gesture engine.
//!
//! The page script owns the DOM, the clock, timers, and animation frames.
//! It forwards pointer events and row lists as JSON, answers layout queries
//! through a measure callback, and applies the effect objects it drains.
//!
//! [`protocol`] is target-independent and tested natively; the
//! `wasm-bindgen` surface (`ListGripWeb`) only exists on `wasm32`.

pub mod protocol;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::ListGripWeb;

pub use protocol::{PointerPayload, ProtocolError, RowPayload, effect_to_json};
