//! Spawner: difficulty ramp and randomized bubble properties

use rand::Rng;

use crate::config::RoundConfig;
use crate::{clamp, lerp};

/// Target delay between spawns (ms) after `elapsed_ms` of play.
///
/// Linear from the start delay to the end delay over the round, clamped at
/// both ends, so it never increases with elapsed time.
pub fn spawn_delay(elapsed_ms: f64, config: &RoundConfig) -> f64 {
    let t = clamp(elapsed_ms / config.duration_ms, 0.0, 1.0);
    lerp(config.spawn_delay_start_ms, config.spawn_delay_end_ms, t)
}

/// Randomized properties of a new bubble
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BubbleDraw {
    /// Diameter, whole pixels
    pub size: f64,
    /// Left offset, whole pixels, within `[0, width - size]`
    pub x: f64,
    pub rise_ms: f64,
}

/// Draw size, rise time and horizontal position independently
pub fn draw_bubble<R: Rng>(rng: &mut R, config: &RoundConfig, playfield_width: f64) -> BubbleDraw {
    let size = rng.random_range(config.min_size..=config.max_size).round();
    let rise_secs = rng.random_range(config.min_rise_secs..=config.max_rise_secs);

    // Narrow playfields pin the bubble to the left edge
    let max_x = playfield_width - size;
    let x = if max_x > 0.0 {
        rng.random_range(0.0..=max_x).round()
    } else {
        0.0
    };

    BubbleDraw {
        size,
        x,
        rise_ms: rise_secs * 1000.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_spawn_delay_endpoints() {
        let config = RoundConfig::default();
        assert_eq!(spawn_delay(0.0, &config), 420.0);
        assert_eq!(spawn_delay(config.duration_ms, &config), 170.0);
        assert_eq!(spawn_delay(config.duration_ms / 2.0, &config), 295.0);
        // Clamped outside the round
        assert_eq!(spawn_delay(-1000.0, &config), 420.0);
        assert_eq!(spawn_delay(config.duration_ms * 3.0, &config), 170.0);
    }

    #[test]
    fn test_draw_within_ranges() {
        let config = RoundConfig::default();
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..500 {
            let d = draw_bubble(&mut rng, &config, 400.0);
            assert!((56.0..=130.0).contains(&d.size));
            assert_eq!(d.size, d.size.round());
            assert!((3000.0..=6000.0).contains(&d.rise_ms));
            assert!(d.x >= 0.0 && d.x + d.size <= 400.0 + 0.5);
        }
    }

    #[test]
    fn test_draw_narrow_playfield() {
        let config = RoundConfig::default();
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..50 {
            let d = draw_bubble(&mut rng, &config, 40.0);
            assert_eq!(d.x, 0.0);
        }
    }

    #[test]
    fn test_draw_is_deterministic() {
        let config = RoundConfig::default();
        let mut a = Pcg32::seed_from_u64(99);
        let mut b = Pcg32::seed_from_u64(99);
        for _ in 0..20 {
            assert_eq!(draw_bubble(&mut a, &config, 360.0), draw_bubble(&mut b, &config, 360.0));
        }
    }
}
