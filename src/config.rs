//! Round tuning
//!
//! Defaults come from [`crate::consts`]. A host may override them from JSON,
//! but a config is fixed once handed to a controller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::persistence::KeyValueStore;

/// Errors from loading a round config
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse round config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid round config: {0}")]
    Invalid(&'static str),
}

/// Round tuning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    // === Round ===
    /// Round length (ms)
    pub duration_ms: f64,
    /// Score that counts as a win
    pub goal: u32,

    // === Spawner ===
    /// Cap on concurrently alive bubbles
    pub max_active: usize,
    /// Bubble diameter range (px)
    pub min_size: f64,
    pub max_size: f64,
    /// Bubble rise time range (s)
    pub min_rise_secs: f64,
    pub max_rise_secs: f64,
    /// Spawn delay interpolation bounds (ms)
    pub spawn_delay_start_ms: f64,
    pub spawn_delay_end_ms: f64,

    // === Presentation timing ===
    /// Number of countdown steps before a round starts
    pub countdown_steps: u32,
    /// How long each countdown step is held (ms)
    pub countdown_step_ms: f64,
    /// Delay between a pop and the bubble's removal (ms)
    pub pop_feedback_ms: f64,
    /// Vibration length on pop (ms)
    pub haptic_ms: u32,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            duration_ms: DURATION_MS,
            goal: GOAL,

            max_active: MAX_ACTIVE_BUBBLES,
            min_size: MIN_SIZE,
            max_size: MAX_SIZE,
            min_rise_secs: MIN_RISE,
            max_rise_secs: MAX_RISE,
            spawn_delay_start_ms: SPAWN_DELAY_START_MS,
            spawn_delay_end_ms: SPAWN_DELAY_END_MS,

            countdown_steps: COUNTDOWN_LABELS.len() as u32,
            countdown_step_ms: COUNTDOWN_STEP_MS,
            pop_feedback_ms: POP_FEEDBACK_MS,
            haptic_ms: HAPTIC_MS,
        }
    }
}

impl RoundConfig {
    /// Storage key for a tuning override
    pub const STORAGE_KEY: &'static str = "bubble_config";

    /// Parse a config from JSON; missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load an override config from the store, falling back to defaults
    ///
    /// A missing, unreadable, malformed or invalid override is ignored.
    pub fn load(store: &impl KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded round config override");
                    config
                }
                Err(e) => {
                    log::warn!("Ignoring round config override: {}", e);
                    Self::default()
                }
            },
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("Round config unreadable ({}), using defaults", e);
                Self::default()
            }
        }
    }

    /// Check ranges and positivity
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.duration_ms > 0.0) {
            return Err(ConfigError::Invalid("duration_ms must be positive"));
        }
        if self.goal == 0 {
            return Err(ConfigError::Invalid("goal must be positive"));
        }
        if self.max_active == 0 {
            return Err(ConfigError::Invalid("max_active must be positive"));
        }
        if !(self.min_size > 0.0 && self.min_size <= self.max_size) {
            return Err(ConfigError::Invalid("size range must be positive and ordered"));
        }
        if !(self.min_rise_secs > 0.0 && self.min_rise_secs <= self.max_rise_secs) {
            return Err(ConfigError::Invalid("rise range must be positive and ordered"));
        }
        // The spawner drains its accumulator in a loop; a zero delay would never finish
        if !(self.spawn_delay_end_ms > 0.0 && self.spawn_delay_start_ms > 0.0) {
            return Err(ConfigError::Invalid("spawn delays must be positive"));
        }
        if self.countdown_steps == 0 {
            return Err(ConfigError::Invalid("countdown_steps must be positive"));
        }
        if self.countdown_step_ms < 0.0 || self.pop_feedback_ms < 0.0 {
            return Err(ConfigError::Invalid("timings must not be negative"));
        }
        Ok(())
    }

    /// Total countdown length (ms)
    pub fn countdown_total_ms(&self) -> f64 {
        self.countdown_steps as f64 * self.countdown_step_ms
    }

    /// Label shown for a countdown step
    pub fn countdown_label(&self, step: u32) -> String {
        if step + 1 >= self.countdown_steps {
            return COUNTDOWN_LABELS[COUNTDOWN_LABELS.len() - 1].to_string();
        }
        // Count down toward the final "Go!" step
        (self.countdown_steps - 1 - step).to_string()
    }
}
