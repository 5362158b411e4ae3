//! Round state and entity types
//!
//! Everything the controller mutates per frame lives here.

use serde::{Deserialize, Serialize};

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Start screen, nothing scheduled
    Idle,
    /// Pre-round countdown ("3", "2", "1", "Go!")
    Countdown {
        /// Wall-clock time the countdown began (ms)
        started_at: f64,
        /// Step currently displayed
        step: u32,
    },
    /// Round in progress
    Running,
    /// Round over, end screen showing
    Ended,
}

/// How a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Score reached the goal
    GoalMet,
    /// Clock ran out short of the goal
    TimeExpired,
}

impl Outcome {
    pub fn classify(score: u32, goal: u32) -> Self {
        if score >= goal {
            Outcome::GoalMet
        } else {
            Outcome::TimeExpired
        }
    }
}

/// Bubble handle, tagged with the round generation that spawned it
///
/// Host callbacks (pointer-down, animation end) carry this back. A handle
/// from an older generation never matches anything in the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BubbleId {
    pub generation: u32,
    pub index: u32,
}

/// A rising bubble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bubble {
    pub id: BubbleId,
    /// Diameter (px)
    pub size: f64,
    /// Left offset inside the playfield (px)
    pub x: f64,
    /// Time to float off the top; the bubble's natural lifetime (ms)
    pub rise_ms: f64,
    /// Play-clock time at spawn (ms)
    pub spawned_at: f64,
    /// Play-clock time of the pop, if popped
    pub popped_at: Option<f64>,
}

impl Bubble {
    pub fn is_popped(&self) -> bool {
        self.popped_at.is_some()
    }

    /// Whether the bubble should leave the playfield at play time `now`
    pub fn is_done(&self, now: f64, pop_feedback_ms: f64) -> bool {
        match self.popped_at {
            Some(at) => now - at >= pop_feedback_ms,
            None => now - self.spawned_at >= self.rise_ms,
        }
    }
}

/// Round clock: either ticking toward a deadline or frozen while hidden
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RoundClock {
    /// Absolute end time (ms, host clock)
    Live { deadline: f64 },
    /// Paused with this much time left
    Frozen { remaining: f64 },
}

impl RoundClock {
    /// Time left at host time `now`, clamped to `[0, duration]`
    pub fn remaining(&self, now: f64, duration: f64) -> f64 {
        let left = match *self {
            RoundClock::Live { deadline } => deadline - now,
            RoundClock::Frozen { remaining } => remaining,
        };
        crate::clamp(left, 0.0, duration)
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self, RoundClock::Frozen { .. })
    }
}

/// One play session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub clock: RoundClock,
    pub score: u32,
    /// Spawn timing accumulator (ms)
    pub accumulator: f64,
    /// Host timestamp of the previous frame; None until the first frame
    pub last_frame: Option<f64>,
    /// Last whole-second value sent to the HUD
    pub shown_seconds: Option<u32>,
    /// Active bubbles, in spawn order
    pub bubbles: Vec<Bubble>,
    /// Next bubble index within this generation
    next_index: u32,
}

impl Round {
    /// Fresh round ending `duration` ms after `now`
    pub fn new(now: f64, duration: f64) -> Self {
        Self {
            clock: RoundClock::Live {
                deadline: now + duration,
            },
            score: 0,
            accumulator: 0.0,
            last_frame: None,
            shown_seconds: None,
            bubbles: Vec::new(),
            next_index: 0,
        }
    }

    /// Elapsed play time at host time `now` (excludes frozen time)
    pub fn elapsed(&self, now: f64, duration: f64) -> f64 {
        duration - self.clock.remaining(now, duration)
    }

    /// Allocate a bubble ID in the given generation
    pub fn next_bubble_id(&mut self, generation: u32) -> BubbleId {
        let index = self.next_index;
        self.next_index += 1;
        BubbleId { generation, index }
    }

    pub fn bubble_mut(&mut self, id: BubbleId) -> Option<&mut Bubble> {
        self.bubbles.iter_mut().find(|b| b.id == id)
    }

    /// Remove a bubble; returns whether it was present
    pub fn remove_bubble(&mut self, id: BubbleId) -> bool {
        let before = self.bubbles.len();
        self.bubbles.retain(|b| b.id != id);
        self.bubbles.len() != before
    }
}
