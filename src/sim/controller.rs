//! Round controller
//!
//! Owns the round lifecycle (Idle → Countdown → Running → Ended), the
//! ramped spawner, scoring, hidden-tab freezing and the best score.
//!
//! Driven entirely by the host: `tick(now)` once per animation frame and
//! `handle(event, now)` for input. Time is host milliseconds (e.g.
//! `performance.now()`), so the controller is deterministic under test.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::command::{InputEvent, ViewCommand};
use super::spawn::{draw_bubble, spawn_delay};
use super::state::{Bubble, BubbleId, GamePhase, Outcome, Round, RoundClock};
use crate::config::{ConfigError, RoundConfig};
use crate::consts::DEFAULT_PLAYFIELD_WIDTH;
use crate::highscores::BestScore;
use crate::persistence::KeyValueStore;
use crate::seconds_left;

/// The game's single stateful component
pub struct RoundController<S: KeyValueStore> {
    config: RoundConfig,
    store: S,
    best: BestScore,
    rng: Pcg32,
    phase: GamePhase,
    /// Bumped whenever a round is superseded; stale handles stop matching
    generation: u32,
    round: Option<Round>,
    last_outcome: Option<Outcome>,
    playfield_width: f64,
    commands: Vec<ViewCommand>,
}

impl<S: KeyValueStore> RoundController<S> {
    /// Create a controller, reading the best score once
    ///
    /// Rejects configs that fail [`RoundConfig::validate`].
    pub fn new(config: RoundConfig, store: S, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let best = BestScore::load(&store);
        let mut controller = Self {
            config,
            store,
            best,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Idle,
            generation: 0,
            round: None,
            last_outcome: None,
            playfield_width: DEFAULT_PLAYFIELD_WIDTH,
            commands: Vec::new(),
        };
        controller.show_best_hint();
        Ok(controller)
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    /// Score of the current (or just finished) round
    pub fn score(&self) -> u32 {
        self.round.as_ref().map_or(0, |r| r.score)
    }

    pub fn best_score(&self) -> u32 {
        self.best.get()
    }

    pub fn last_outcome(&self) -> Option<Outcome> {
        self.last_outcome
    }

    /// Bubbles on the playfield, popped ones included until removed
    pub fn bubbles(&self) -> &[Bubble] {
        match &self.round {
            Some(round) => &round.bubbles,
            None => &[],
        }
    }

    pub fn active_count(&self) -> usize {
        self.bubbles().len()
    }

    /// Round time left at host time `now` (0 outside a round)
    pub fn remaining_ms(&self, now: f64) -> f64 {
        match (&self.round, self.phase) {
            (Some(round), GamePhase::Running) => round.clock.remaining(now, self.config.duration_ms),
            _ => 0.0,
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.round.as_ref().is_some_and(|r| r.clock.is_frozen())
    }

    pub fn set_playfield_width(&mut self, width: f64) {
        self.playfield_width = width.max(0.0);
    }

    /// Take all queued view commands
    pub fn drain_commands(&mut self) -> Vec<ViewCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Dispatch a host input event
    pub fn handle(&mut self, event: InputEvent, now: f64) {
        match event {
            InputEvent::Start | InputEvent::Restart => self.start(now),
            InputEvent::Pop(id) => {
                self.pop(id, now);
            }
            InputEvent::BubbleExpired(id) => {
                self.expire(id);
            }
            InputEvent::PopFinished(id) => {
                self.finish_pop(id);
            }
            InputEvent::Visibility { hidden } => self.set_hidden(hidden, now),
        }
    }

    /// Begin the countdown, superseding whatever was in flight
    pub fn start(&mut self, now: f64) {
        self.invalidate();
        self.phase = GamePhase::Countdown {
            started_at: now,
            step: 0,
        };
        self.commands.push(ViewCommand::ShowCountdown {
            step: 0,
            label: self.config.countdown_label(0),
        });
        log::info!("Countdown started (generation {})", self.generation);
    }

    /// Back to the title screen; anything in flight is invalidated
    pub fn reset(&mut self) {
        self.invalidate();
        self.phase = GamePhase::Idle;
        self.last_outcome = None;
        self.commands.push(ViewCommand::HideCountdown);
        self.show_best_hint();
    }

    /// Tear down, handing back the store
    pub fn dispose(mut self) -> S {
        self.invalidate();
        log::info!("Controller disposed (best {})", self.best.get());
        self.store
    }

    /// Advance by one animation frame at host time `now`
    pub fn tick(&mut self, now: f64) {
        match self.phase {
            GamePhase::Countdown { started_at, step } => self.advance_countdown(now, started_at, step),
            GamePhase::Running => self.run_frame(now),
            GamePhase::Idle | GamePhase::Ended => {}
        }
    }

    /// Spawn one bubble unless at the cap or outside a round
    pub fn spawn(&mut self, now: f64) -> Option<BubbleId> {
        if !self.is_running() {
            return None;
        }
        let round = self.round.as_mut()?;
        let elapsed = round.elapsed(now, self.config.duration_ms);
        spawn_into(
            round,
            &mut self.rng,
            &self.config,
            self.playfield_width,
            self.generation,
            elapsed,
            &mut self.commands,
        )
    }

    /// Pop a bubble. Returns true if it scored.
    ///
    /// Already popped, unknown or stale bubbles and pops outside a running
    /// round are ignored.
    pub fn pop(&mut self, id: BubbleId, now: f64) -> bool {
        if !self.is_running() || id.generation != self.generation {
            log::trace!("Ignoring pop of {:?}", id);
            return false;
        }
        let Some(round) = self.round.as_mut() else {
            return false;
        };
        let elapsed = round.elapsed(now, self.config.duration_ms);
        let Some(bubble) = round.bubble_mut(id) else {
            return false;
        };
        if bubble.is_popped() {
            return false;
        }
        bubble.popped_at = Some(elapsed);
        round.score += 1;

        let score = round.score;
        let progress = (score as f64 / self.config.goal as f64).min(1.0);
        self.commands.push(ViewCommand::MarkPopped(id));
        self.commands.push(ViewCommand::SetScore(score));
        self.commands.push(ViewCommand::SetProgress(progress));
        self.commands.push(ViewCommand::Haptic {
            duration_ms: self.config.haptic_ms,
        });
        log::debug!("Popped {:?}, score {}", id, score);
        true
    }

    /// Host reports a bubble floated off unpopped (a miss, no penalty)
    pub fn expire(&mut self, id: BubbleId) -> bool {
        self.remove_where(id, |b| !b.is_popped())
    }

    /// Host reports a popped bubble's pop animation finished
    pub fn finish_pop(&mut self, id: BubbleId) -> bool {
        self.remove_where(id, Bubble::is_popped)
    }

    /// Freeze the round clock while hidden and resume it on return
    pub fn set_hidden(&mut self, hidden: bool, now: f64) {
        if !self.is_running() {
            return;
        }
        let Some(round) = self.round.as_mut() else {
            return;
        };
        match (hidden, round.clock) {
            (true, RoundClock::Live { .. }) => {
                let remaining = round.clock.remaining(now, self.config.duration_ms);
                round.clock = RoundClock::Frozen { remaining };
                log::info!("Round frozen with {:.0}ms left (tab hidden)", remaining);
            }
            (false, RoundClock::Frozen { remaining }) => {
                round.clock = RoundClock::Live {
                    deadline: now + remaining,
                };
                // The first frame after resuming must not see the hidden gap
                round.last_frame = None;
                log::info!("Round resumed with {:.0}ms left", remaining);
            }
            _ => {}
        }
    }

    fn advance_countdown(&mut self, now: f64, started_at: f64, step: u32) {
        let since = now - started_at;
        if since >= self.config.countdown_total_ms() {
            self.begin_round(now);
            return;
        }
        let current = if self.config.countdown_step_ms > 0.0 {
            ((since / self.config.countdown_step_ms).floor().max(0.0) as u32)
                .min(self.config.countdown_steps.saturating_sub(1))
        } else {
            step
        };
        if current != step {
            self.phase = GamePhase::Countdown {
                started_at,
                step: current,
            };
            self.commands.push(ViewCommand::ShowCountdown {
                step: current,
                label: self.config.countdown_label(current),
            });
        }
    }

    fn begin_round(&mut self, now: f64) {
        let mut round = Round::new(now, self.config.duration_ms);
        let secs = seconds_left(self.config.duration_ms);
        round.shown_seconds = Some(secs);
        self.round = Some(round);
        self.phase = GamePhase::Running;
        self.last_outcome = None;

        self.commands.push(ViewCommand::HideCountdown);
        self.commands.push(ViewCommand::SetGoalTotal(self.config.goal));
        self.commands.push(ViewCommand::SetScore(0));
        self.commands.push(ViewCommand::SetProgress(0.0));
        self.commands.push(ViewCommand::SetTimeLeft(secs));
        log::info!("Round started (generation {})", self.generation);
    }

    /// Time accounting, then spawning, then the end check
    fn run_frame(&mut self, now: f64) {
        let duration = self.config.duration_ms;
        let Some(round) = self.round.as_mut() else {
            return;
        };
        if round.clock.is_frozen() {
            return;
        }

        let dt = round.last_frame.map_or(0.0, |last| (now - last).max(0.0));
        round.last_frame = Some(now);
        let remaining = round.clock.remaining(now, duration);
        let elapsed = duration - remaining;

        let secs = seconds_left(remaining);
        if round.shown_seconds != Some(secs) {
            round.shown_seconds = Some(secs);
            self.commands.push(ViewCommand::SetTimeLeft(secs));
        }

        let feedback = self.config.pop_feedback_ms;
        let commands = &mut self.commands;
        round.bubbles.retain(|b| {
            let done = b.is_done(elapsed, feedback);
            if done {
                commands.push(ViewCommand::RemoveBubble(b.id));
            }
            !done
        });

        // Drain fully so long frames keep the spawn rate
        round.accumulator += dt;
        let delay = spawn_delay(elapsed, &self.config);
        while delay > 0.0 && round.accumulator >= delay {
            round.accumulator -= delay;
            spawn_into(
                round,
                &mut self.rng,
                &self.config,
                self.playfield_width,
                self.generation,
                elapsed,
                &mut self.commands,
            );
        }

        if remaining <= 0.0 {
            self.end_round();
        }
    }

    fn end_round(&mut self) {
        let score = self.score();
        if let Some(round) = self.round.as_mut() {
            round.bubbles.clear();
        }
        self.phase = GamePhase::Ended;
        self.commands.push(ViewCommand::ClearBubbles);

        let new_record = self.best.record(score, &mut self.store);
        let outcome = Outcome::classify(score, self.config.goal);
        self.last_outcome = Some(outcome);
        self.commands.push(ViewCommand::ShowEnd {
            final_score: score,
            best_score: self.best.get(),
            outcome,
        });
        log::info!(
            "Round ended: score {} ({:?}){}",
            score,
            outcome,
            if new_record { ", new best" } else { "" }
        );
    }

    /// Drop the current round and bump the generation
    fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if self.round.take().is_some_and(|r| !r.bubbles.is_empty()) {
            self.commands.push(ViewCommand::ClearBubbles);
        }
    }

    fn remove_where(&mut self, id: BubbleId, pred: impl Fn(&Bubble) -> bool) -> bool {
        if id.generation != self.generation {
            return false;
        }
        let Some(round) = self.round.as_mut() else {
            return false;
        };
        if !round.bubbles.iter().any(|b| b.id == id && pred(b)) {
            return false;
        }
        round.remove_bubble(id);
        self.commands.push(ViewCommand::RemoveBubble(id));
        true
    }

    fn show_best_hint(&mut self) {
        if self.best.get() > 0 {
            self.commands.push(ViewCommand::ShowBestHint(self.best.get()));
        }
    }
}

fn spawn_into(
    round: &mut Round,
    rng: &mut Pcg32,
    config: &RoundConfig,
    playfield_width: f64,
    generation: u32,
    elapsed: f64,
    commands: &mut Vec<ViewCommand>,
) -> Option<BubbleId> {
    if round.bubbles.len() >= config.max_active {
        return None;
    }
    let draw = draw_bubble(rng, config, playfield_width);
    let id = round.next_bubble_id(generation);
    round.bubbles.push(Bubble {
        id,
        size: draw.size,
        x: draw.x,
        rise_ms: draw.rise_ms,
        spawned_at: elapsed,
        popped_at: None,
    });
    commands.push(ViewCommand::SpawnBubble {
        id,
        size: draw.size,
        x: draw.x,
        rise_ms: draw.rise_ms,
    });
    log::trace!("Spawned {:?} ({}px, {:.0}ms)", id, draw.size, draw.rise_ms);
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    /// Round start time when the countdown begins at t=0
    const T0: f64 = 2800.0;

    fn controller() -> RoundController<MemoryStore> {
        RoundController::new(RoundConfig::default(), MemoryStore::new(), 12345).unwrap()
    }

    fn running(config: RoundConfig) -> RoundController<MemoryStore> {
        let mut c = RoundController::new(config, MemoryStore::new(), 12345).unwrap();
        c.start(0.0);
        c.tick(T0);
        assert!(c.is_running());
        c.tick(T0);
        c.drain_commands();
        c
    }

    fn spawns(cmds: &[ViewCommand]) -> usize {
        cmds.iter()
            .filter(|c| matches!(c, ViewCommand::SpawnBubble { .. }))
            .count()
    }

    /// Play out a round at 60 fps, popping every bubble until `target` is reached
    fn play_round(c: &mut RoundController<MemoryStore>, start: f64, target: u32) {
        let mut now = start;
        while c.is_running() {
            now += 16.0;
            c.tick(now);
            let ids: Vec<BubbleId> = c.bubbles().iter().map(|b| b.id).collect();
            for id in ids {
                if c.score() < target {
                    c.pop(id, now);
                }
            }
        }
    }

    #[test]
    fn test_countdown_steps() {
        let mut c = controller();
        assert_eq!(c.phase(), GamePhase::Idle);

        c.start(0.0);
        assert_eq!(
            c.drain_commands(),
            vec![ViewCommand::ShowCountdown {
                step: 0,
                label: "3".to_string()
            }]
        );

        c.tick(350.0);
        assert!(c.drain_commands().is_empty());

        let mut labels = Vec::new();
        for t in [700.0, 1400.0, 2100.0] {
            c.tick(t);
            for cmd in c.drain_commands() {
                if let ViewCommand::ShowCountdown { label, .. } = cmd {
                    labels.push(label);
                }
            }
        }
        assert_eq!(labels, vec!["2", "1", "Go!"]);
        assert!(!c.is_running());

        c.tick(T0);
        assert!(c.is_running());
        let cmds = c.drain_commands();
        assert!(cmds.contains(&ViewCommand::HideCountdown));
        assert!(cmds.contains(&ViewCommand::SetGoalTotal(110)));
        assert!(cmds.contains(&ViewCommand::SetScore(0)));
        assert!(cmds.contains(&ViewCommand::SetTimeLeft(35)));
        assert_eq!(c.remaining_ms(T0), 35_000.0);
    }

    #[test]
    fn test_countdown_skips_late_frames() {
        let mut c = controller();
        c.start(0.0);
        c.drain_commands();
        c.tick(1500.0);
        assert_eq!(
            c.drain_commands(),
            vec![ViewCommand::ShowCountdown {
                step: 2,
                label: "1".to_string()
            }]
        );
    }

    #[test]
    fn test_first_frame_spawns_nothing() {
        let mut c = controller();
        c.start(0.0);
        c.tick(T0);
        c.tick(T0);
        assert_eq!(spawns(&c.drain_commands()), 0);
        assert_eq!(c.active_count(), 0);
    }

    #[test]
    fn test_large_frame_spawns_multiple() {
        let mut c = running(RoundConfig::default());
        let delay = spawn_delay(0.0, c.config());
        c.tick(T0 + 3.0 * delay);
        assert_eq!(spawns(&c.drain_commands()), 3);
        assert_eq!(c.active_count(), 3);
    }

    #[test]
    fn test_accumulator_carries_remainder() {
        let mut c = running(RoundConfig::default());
        // Two frames just under one delay each still add up to a spawn
        c.tick(T0 + 300.0);
        assert_eq!(c.active_count(), 0);
        c.tick(T0 + 600.0);
        assert_eq!(c.active_count(), 1);
    }

    #[test]
    fn test_spawn_cap() {
        let config = RoundConfig {
            max_active: 3,
            ..Default::default()
        };
        let mut c = running(config);
        c.tick(T0 + 2000.0);
        assert_eq!(c.active_count(), 3);
        assert!(c.spawn(T0 + 2000.0).is_none());
        assert_eq!(c.active_count(), 3);
    }

    #[test]
    fn test_spawn_outside_round_is_noop() {
        let mut c = controller();
        assert!(c.spawn(0.0).is_none());
        c.start(0.0);
        assert!(c.spawn(100.0).is_none());
    }

    #[test]
    fn test_pop_scores_once() {
        let mut c = running(RoundConfig::default());
        let id = c.spawn(T0).unwrap();
        c.drain_commands();

        assert!(c.pop(id, T0 + 10.0));
        assert_eq!(c.score(), 1);
        let cmds = c.drain_commands();
        assert!(cmds.contains(&ViewCommand::MarkPopped(id)));
        assert!(cmds.contains(&ViewCommand::SetScore(1)));
        assert!(cmds.contains(&ViewCommand::Haptic { duration_ms: 10 }));

        assert!(!c.pop(id, T0 + 20.0));
        assert_eq!(c.score(), 1);
        assert!(c.drain_commands().is_empty());
    }

    #[test]
    fn test_pop_unknown_or_idle_is_noop() {
        let mut c = controller();
        let bogus = BubbleId {
            generation: 0,
            index: 0,
        };
        assert!(!c.pop(bogus, 0.0));

        let mut c = running(RoundConfig::default());
        let bogus = BubbleId {
            generation: c.generation(),
            index: 99,
        };
        assert!(!c.pop(bogus, T0));
        assert_eq!(c.score(), 0);
    }

    #[test]
    fn test_popped_bubble_removed_after_feedback() {
        let mut c = running(RoundConfig::default());
        let id = c.spawn(T0).unwrap();
        c.pop(id, T0);
        c.drain_commands();

        c.tick(T0 + 100.0);
        assert_eq!(c.active_count(), 1);
        c.tick(T0 + 300.0);
        assert!(c.drain_commands().contains(&ViewCommand::RemoveBubble(id)));
        assert!(c.bubbles().iter().all(|b| b.id != id));
    }

    #[test]
    fn test_host_callbacks_remove_bubbles() {
        let mut c = running(RoundConfig::default());
        let a = c.spawn(T0).unwrap();
        let b = c.spawn(T0).unwrap();
        c.pop(b, T0);

        // Expiry only applies to unpopped bubbles, pop-finished only to popped ones
        assert!(!c.expire(b));
        assert!(!c.finish_pop(a));

        assert!(c.expire(a));
        assert!(c.finish_pop(b));
        assert_eq!(c.active_count(), 0);
        assert!(!c.expire(a));
    }

    #[test]
    fn test_animation_end_events_drain_many_bubbles() {
        let config = RoundConfig { max_active: 200, ..Default::default() };
        let mut c = running(config);
        let ids: Vec<BubbleId> = (0..150).filter_map(|_| c.spawn(T0)).collect();
        assert_eq!(ids.len(), 150);
        for id in ids.iter().step_by(2) {
            c.pop(*id, T0);
        }

        // One animationend per bubble, routed by whether it was popped
        for id in &ids {
            let popped = c.bubbles().iter().any(|b| b.id == *id && b.is_popped());
            c.handle(InputEvent::animation_end(*id, popped), T0 + 10.0);
        }
        assert_eq!(c.active_count(), 0);
        assert!(c.bubbles().is_empty());

        // Late duplicates are ignored
        c.handle(InputEvent::animation_end(ids[0], true), T0 + 20.0);
        c.handle(InputEvent::animation_end(ids[1], false), T0 + 20.0);
        assert_eq!(c.score(), 75);
    }

    #[test]
    fn test_unpopped_bubbles_expire_on_play_clock() {
        let mut c = running(RoundConfig::default());
        let id = c.spawn(T0).unwrap();
        let rise = c.bubbles()[0].rise_ms;

        c.tick(T0 + rise - 1.0);
        assert!(c.bubbles().iter().any(|b| b.id == id));
        c.tick(T0 + rise + 1.0);
        assert!(c.bubbles().iter().all(|b| b.id != id));
        assert_eq!(c.score(), 0);
    }

    #[test]
    fn test_restart_cancels_stale_callbacks() {
        let mut c = running(RoundConfig::default());
        c.tick(T0 + 1500.0);
        let stale: Vec<BubbleId> = c.bubbles().iter().map(|b| b.id).collect();
        assert!(!stale.is_empty());

        c.handle(InputEvent::Restart, T0 + 1600.0);
        assert!(c.drain_commands().contains(&ViewCommand::ClearBubbles));
        assert_eq!(c.active_count(), 0);

        let restart_at = T0 + 1600.0 + 2800.0;
        c.tick(restart_at);
        c.tick(restart_at);
        c.tick(restart_at + 1500.0);
        let fresh = c.active_count();
        assert!(fresh > 0);

        for id in &stale {
            c.handle(InputEvent::Pop(*id), restart_at + 1500.0);
            c.handle(InputEvent::BubbleExpired(*id), restart_at + 1500.0);
            c.handle(InputEvent::PopFinished(*id), restart_at + 1500.0);
        }
        assert_eq!(c.score(), 0);
        assert_eq!(c.active_count(), fresh);
    }

    #[test]
    fn test_restart_during_countdown_restarts_countdown() {
        let mut c = controller();
        c.start(0.0);
        c.tick(1500.0);
        c.start(1600.0);
        c.tick(T0);
        assert!(!c.is_running());
        c.tick(1600.0 + T0);
        assert!(c.is_running());
    }

    #[test]
    fn test_round_ends_on_time() {
        let mut c = running(RoundConfig::default());
        c.tick(T0 + 34_999.0);
        assert!(c.is_running());
        c.tick(T0 + 35_000.0);
        assert_eq!(c.phase(), GamePhase::Ended);
        assert_eq!(c.active_count(), 0);

        let cmds = c.drain_commands();
        assert!(cmds.contains(&ViewCommand::ClearBubbles));
        assert!(cmds.contains(&ViewCommand::ShowEnd {
            final_score: 0,
            best_score: 0,
            outcome: Outcome::TimeExpired,
        }));
    }

    #[test]
    fn test_goal_met_at_threshold() {
        let mut c = running(RoundConfig::default());
        play_round(&mut c, T0, 110);
        assert_eq!(c.score(), 110);
        assert_eq!(c.last_outcome(), Some(Outcome::GoalMet));
    }

    #[test]
    fn test_time_expired_one_short() {
        let mut c = running(RoundConfig::default());
        play_round(&mut c, T0, 109);
        assert_eq!(c.score(), 109);
        assert_eq!(c.last_outcome(), Some(Outcome::TimeExpired));
    }

    #[test]
    fn test_pop_after_end_is_noop() {
        let mut c = running(RoundConfig::default());
        let id = c.spawn(T0).unwrap();
        c.tick(T0 + 40_000.0);
        assert_eq!(c.phase(), GamePhase::Ended);
        assert!(!c.pop(id, T0 + 40_001.0));
        assert_eq!(c.score(), 0);
    }

    #[test]
    fn test_hidden_time_is_not_charged() {
        let mut c = running(RoundConfig::default());
        c.tick(T0 + 5000.0);
        assert_eq!(c.remaining_ms(T0 + 5000.0), 30_000.0);

        c.handle(InputEvent::Visibility { hidden: true }, T0 + 5000.0);
        assert!(c.is_frozen());
        assert_eq!(c.remaining_ms(T0 + 50_000.0), 30_000.0);

        // Past the original deadline, but the round is frozen
        c.tick(T0 + 60_000.0);
        assert!(c.is_running());

        c.handle(InputEvent::Visibility { hidden: false }, T0 + 65_000.0);
        assert!(!c.is_frozen());
        assert_eq!(c.remaining_ms(T0 + 65_000.0), 30_000.0);
        assert_eq!(c.remaining_ms(T0 + 66_000.0), 29_000.0);

        // The resume frame contributes no spawn backlog
        c.drain_commands();
        let before = c.active_count();
        c.tick(T0 + 65_000.0);
        assert_eq!(c.active_count(), before);
        assert!(c.is_running());
    }

    #[test]
    fn test_repeated_hidden_events_keep_first_freeze() {
        let mut c = running(RoundConfig::default());
        c.set_hidden(true, T0 + 1000.0);
        c.set_hidden(true, T0 + 9000.0);
        c.set_hidden(false, T0 + 20_000.0);
        assert_eq!(c.remaining_ms(T0 + 20_000.0), 34_000.0);
        // A second visible event doesn't move the deadline again
        c.set_hidden(false, T0 + 25_000.0);
        assert_eq!(c.remaining_ms(T0 + 25_000.0), 29_000.0);
    }

    #[test]
    fn test_visibility_outside_round_ignored() {
        let mut c = controller();
        c.set_hidden(true, 0.0);
        assert!(!c.is_frozen());
        c.start(0.0);
        c.set_hidden(true, 100.0);
        c.tick(T0);
        assert!(c.is_running());
        assert!(!c.is_frozen());
    }

    #[test]
    fn test_best_score_persisted() {
        let mut c = running(RoundConfig::default());
        play_round(&mut c, T0, 7);
        assert_eq!(c.best_score(), 7);

        c.start(100_000.0);
        c.tick(100_000.0 + T0);
        play_round(&mut c, 100_000.0 + T0, 3);
        assert_eq!(c.score(), 3);
        assert_eq!(c.best_score(), 7);

        let store = c.dispose();
        assert_eq!(store.peek(BestScore::STORAGE_KEY), Some("7"));
    }

    #[test]
    fn test_best_hint_on_startup() {
        let store = MemoryStore::with_value(BestScore::STORAGE_KEY, "64");
        let mut c = RoundController::new(RoundConfig::default(), store, 1).unwrap();
        assert_eq!(c.best_score(), 64);
        assert_eq!(c.drain_commands(), vec![ViewCommand::ShowBestHint(64)]);

        let mut fresh = controller();
        assert!(fresh.drain_commands().is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RoundConfig {
            min_size: 200.0,
            ..Default::default()
        };
        let result = RoundController::new(config, MemoryStore::new(), 1);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let config = RoundConfig {
            spawn_delay_end_ms: 0.0,
            ..Default::default()
        };
        assert!(RoundController::new(config, MemoryStore::new(), 1).is_err());
    }

    #[test]
    fn test_storage_failures_are_not_fatal() {
        let store = MemoryStore::with_value(BestScore::STORAGE_KEY, "50")
            .fail_reads(true)
            .fail_writes(true);
        let mut c = RoundController::new(RoundConfig::default(), store, 1).unwrap();
        assert_eq!(c.best_score(), 0);

        c.start(0.0);
        c.tick(T0);
        play_round(&mut c, T0, 4);
        assert_eq!(c.phase(), GamePhase::Ended);
        assert_eq!(c.best_score(), 4);
    }

    #[test]
    fn test_reset_invalidates_round() {
        let mut c = running(RoundConfig::default());
        let id = c.spawn(T0).unwrap();
        let gen_before = c.generation();

        c.reset();
        assert_eq!(c.phase(), GamePhase::Idle);
        assert_ne!(c.generation(), gen_before);
        assert_eq!(c.active_count(), 0);
        assert!(!c.pop(id, T0));
        assert!(!c.expire(id));
    }
}
