//! Platform abstraction layer
//!
//! The simulation never reads a clock or touches the DOM; the host does:
//! - Time (`requestAnimationFrame` / `performance.now()`)
//! - Input events and visibility detection
//! - Applying view commands
//!
//! Storage lives in [`crate::persistence`].

#[cfg(target_arch = "wasm32")]
pub mod web;
