//! Bubble Pop entry point
//!
//! On the web this boots the browser host. Natively it plays one headless
//! round with a simple auto-popper and logs the result.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    bubble_pop::platform::web::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Bubble Pop (native) starting...");
    log::info!("Native mode runs a headless demo round - run with `trunk serve` for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(12345);
    demo_round(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Simulated player: pops every bubble once it has been on screen for a while
#[cfg(not(target_arch = "wasm32"))]
fn demo_round(seed: u64) {
    use bubble_pop::{MemoryStore, RoundConfig, RoundController, ViewCommand};

    /// 60 fps
    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Reaction time before the auto-popper taps a bubble
    const REACTION_MS: f64 = 900.0;

    let mut controller = match RoundController::new(RoundConfig::default(), MemoryStore::new(), seed) {
        Ok(controller) => controller,
        Err(e) => {
            log::error!("Cannot start demo round: {}", e);
            return;
        }
    };
    let mut now = 0.0;
    controller.start(now);

    let mut spawned = 0u32;
    loop {
        now += FRAME_MS;
        controller.tick(now);

        let elapsed = controller.config().duration_ms - controller.remaining_ms(now);
        let ready: Vec<_> = controller
            .bubbles()
            .iter()
            .filter(|b| !b.is_popped() && elapsed - b.spawned_at >= REACTION_MS)
            .map(|b| b.id)
            .collect();
        for id in ready {
            controller.pop(id, now);
        }

        for command in controller.drain_commands() {
            match command {
                ViewCommand::SpawnBubble { .. } => spawned += 1,
                ViewCommand::ShowEnd {
                    final_score,
                    best_score,
                    outcome,
                } => {
                    log::info!(
                        "Round over after {:.1}s: {} of {} bubbles popped, best {}, {:?}",
                        now / 1000.0,
                        final_score,
                        spawned,
                        best_score,
                        outcome
                    );
                    return;
                }
                _ => {}
            }
        }
    }
}
