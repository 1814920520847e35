pub const TICK_RATE: u32 = 15;
pub const TICK_SECONDS: f64 = 1.0 / TICK_RATE as f64;

pub const GRID_WIDTH: i32 = 32;
pub const GRID_HEIGHT: i32 = 24;
/// Worms start at least this many cells away from every wall.
pub const START_MARGIN: i32 = 5;

pub const INITIAL_WORM_LEN: usize = 3;
pub const MIN_WORM_LEN: usize = 3;

pub const SECOND_WORM_SPAWN_AT: f64 = 20.0;
pub const SECOND_WORM_TURN_CHANCE: f64 = 0.3;

pub const POISON_DELAY_MIN_SECS: i32 = 10;
pub const POISON_DELAY_MAX_SECS: i32 = 20;
pub const POISON_COUNT_MIN: i32 = 1;
pub const POISON_COUNT_MAX: i32 = 5;
pub const POISON_ACTIVE_SECS: f64 = 5.0;
pub const POISON_SHRINK_SEGMENTS: usize = 2;

pub const BLINKING_CAP: usize = 3;
pub const TYPE1_SPAWN_INTERVAL_SECS: f64 = 5.0;
pub const TYPE1_LIFETIME_SECS: f64 = 5.0;
pub const TYPE2_SPAWN_AT: f64 = 2.0;
pub const TYPE2_LIFETIME_SECS: f64 = 7.0;
pub const BLINKING_BONUS: i32 = 3;

/// Upper bound on re-rolls when a placement must avoid worm bodies.
pub const PLACEMENT_ATTEMPTS: usize = 256;

pub fn blink_visible(game_time: f64) -> bool {
    ((game_time * 2.0).floor() as i64) % 2 == 0
}

#[cfg(test)]
mod tests {
    use super::blink_visible;

    #[test]
    fn blink_toggles_every_half_second() {
        assert!(blink_visible(0.0));
        assert!(blink_visible(0.49));
        assert!(!blink_visible(0.5));
        assert!(!blink_visible(0.99));
        assert!(blink_visible(1.0));
    }
}
