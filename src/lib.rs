//! Bubble Pop - A timed pop-the-bubbles arcade game
//!
//! Core modules:
//! - `sim`: Deterministic round controller (countdown, spawner, scoring)
//! - `config`: Data-driven round tuning
//! - `persistence`: Key-value storage (LocalStorage on web, in-memory elsewhere)
//! - `highscores`: Best score tracking
//! - `platform`: Browser host (DOM view, input, animation frame loop)

pub mod config;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod sim;

pub use config::{ConfigError, RoundConfig};
pub use highscores::BestScore;
pub use persistence::{KeyValueStore, MemoryStore, StorageError};
pub use sim::{InputEvent, Outcome, RoundController, ViewCommand};

/// Game configuration constants
pub mod consts {
    /// Round length (35 seconds)
    pub const DURATION_MS: f64 = 35_000.0;
    /// Score needed to "win" a round
    pub const GOAL: u32 = 110;
    /// Maximum bubbles alive at once
    pub const MAX_ACTIVE_BUBBLES: usize = 40;

    /// Bubble diameter range (px)
    pub const MIN_SIZE: f64 = 56.0;
    pub const MAX_SIZE: f64 = 130.0;

    /// Bubble rise time range (seconds) - also its lifetime
    pub const MIN_RISE: f64 = 3.0;
    pub const MAX_RISE: f64 = 6.0;

    /// Spawn delay at round start, ramping linearly down to the end value
    pub const SPAWN_DELAY_START_MS: f64 = 420.0;
    pub const SPAWN_DELAY_END_MS: f64 = 170.0;

    /// Countdown: "3", "2", "1", "Go!" at 700ms each
    pub const COUNTDOWN_LABELS: [&str; 4] = ["3", "2", "1", "Go!"];
    pub const COUNTDOWN_STEP_MS: f64 = 700.0;

    /// How long a popped bubble lingers for its pop animation
    pub const POP_FEEDBACK_MS: f64 = 300.0;
    /// Vibration pulse on pop
    pub const HAPTIC_MS: u32 = 10;

    /// Playfield width used until the host reports the real one
    pub const DEFAULT_PLAYFIELD_WIDTH: f64 = 360.0;
}

/// Clamp `v` into `[lo, hi]`
#[inline]
pub fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

/// Linear interpolation from `a` to `b` by `t`
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Milliseconds left → whole seconds shown on the HUD (rounded up)
#[inline]
pub fn seconds_left(ms_left: f64) -> u32 {
    (ms_left.max(0.0) / 1000.0).ceil() as u32
}
