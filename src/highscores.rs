//! Best score tracking
//!
//! A single integer per device, stored under `bubble_highscore`.
//! Storage errors read as "no score yet" and failed writes are dropped.

use crate::persistence::KeyValueStore;

/// Persistent best score (monotonic)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BestScore {
    value: u32,
}

impl BestScore {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "bubble_highscore";

    /// Current best
    pub fn get(&self) -> u32 {
        self.value
    }

    /// Read the stored best score, defaulting to 0
    pub fn load(store: &impl KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(raw)) => {
                let value = parse_score(&raw);
                log::info!("Loaded best score {}", value);
                Self { value }
            }
            Ok(None) => {
                log::info!("No best score found, starting fresh");
                Self::default()
            }
            Err(e) => {
                log::warn!("Best score unreadable ({}), using 0", e);
                Self::default()
            }
        }
    }

    /// Fold a finished round's score in and persist if it is a new record.
    ///
    /// Returns true when the record was beaten. The in-memory value is
    /// updated even if the write fails.
    pub fn record(&mut self, score: u32, store: &mut impl KeyValueStore) -> bool {
        if score <= self.value {
            return false;
        }
        self.value = score;
        match store.set(Self::STORAGE_KEY, &score.to_string()) {
            Ok(()) => log::info!("New best score saved: {}", score),
            Err(e) => log::warn!("Failed to save best score {}: {}", score, e),
        }
        true
    }
}

/// Lenient integer parse: anything non-numeric or negative is 0
fn parse_score(raw: &str) -> u32 {
    let trimmed = raw.trim();
    if let Ok(v) = trimmed.parse::<u32>() {
        return v;
    }
    // Older writers may have stored a float
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v.min(u32::MAX as f64) as u32,
        _ => 0,
    }
}
