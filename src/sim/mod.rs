//! Deterministic round simulation
//!
//! All gameplay logic lives here. This module must stay host-independent:
//! - Time comes in as host milliseconds, never read from a clock
//! - Seeded RNG only
//! - Output is a queue of view commands, no DOM access

pub mod command;
pub mod controller;
pub mod spawn;
pub mod state;

pub use command::{InputEvent, ViewCommand};
pub use controller::RoundController;
pub use spawn::{BubbleDraw, draw_bubble, spawn_delay};
pub use state::{Bubble, BubbleId, GamePhase, Outcome, Round, RoundClock};
