//! Controller ⇄ view messages
//!
//! The controller never touches a rendering surface. It queues
//! `ViewCommand`s for the host to apply, and the host feeds browser
//! events back as `InputEvent`s.

use serde::{Deserialize, Serialize};

use super::state::{BubbleId, Outcome};

/// Events delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Start button on the title screen
    Start,
    /// Restart button on the end screen
    Restart,
    /// Pointer-down on a bubble
    Pop(BubbleId),
    /// A bubble's rise animation finished
    BubbleExpired(BubbleId),
    /// A popped bubble's pop animation finished
    PopFinished(BubbleId),
    /// Page visibility changed
    Visibility { hidden: bool },
}

impl InputEvent {
    /// Map a bubble's `animationend` to the matching event
    ///
    /// Rise and pop animations fire the same browser event; only the
    /// popped look tells them apart.
    pub fn animation_end(id: BubbleId, popped: bool) -> Self {
        if popped {
            InputEvent::PopFinished(id)
        } else {
            InputEvent::BubbleExpired(id)
        }
    }
}

/// Render/update requests for the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewCommand {
    /// Show the countdown overlay at this step
    ShowCountdown { step: u32, label: String },
    HideCountdown,
    /// Create a bubble element
    SpawnBubble {
        id: BubbleId,
        size: f64,
        x: f64,
        rise_ms: f64,
    },
    /// Switch a bubble to its popped look
    MarkPopped(BubbleId),
    RemoveBubble(BubbleId),
    /// Remove every bubble element
    ClearBubbles,
    SetScore(u32),
    /// Whole seconds left on the clock
    SetTimeLeft(u32),
    SetGoalTotal(u32),
    /// Goal progress in `[0, 1]`
    SetProgress(f64),
    /// Best-effort vibration; failures are ignored by the host
    Haptic { duration_ms: u32 },
    ShowEnd {
        final_score: u32,
        best_score: u32,
        outcome: Outcome,
    },
    /// Record line on the title screen
    ShowBestHint(u32),
}
