/// Timing Model: game time in seconds since the session started.
///
/// Each tick the caller reports wall-clock elapsed time; the clock never
/// moves backwards even if the source does.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GameClock {
    game_time: f64,
    ticks: u64,
}

impl GameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_to(&mut self, elapsed_seconds: f64) {
        if elapsed_seconds.is_finite() && elapsed_seconds > self.game_time {
            self.game_time = elapsed_seconds;
        }
        self.ticks += 1;
    }

    pub fn game_time(&self) -> f64 {
        self.game_time
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn reached(&self, deadline: f64) -> bool {
        self.game_time >= deadline
    }

    pub fn since(&self, instant: f64) -> f64 {
        self.game_time - instant
    }
}

#[cfg(test)]
mod tests {
    use super::GameClock;

    #[test]
    fn new_clock_starts_at_zero() {
        let clock = GameClock::new();
        assert_eq!(clock.game_time(), 0.0);
        assert_eq!(clock.ticks(), 0);
    }

    #[test]
    fn clock_is_monotonic() {
        let mut clock = GameClock::new();
        clock.advance_to(3.0);
        clock.advance_to(2.0);
        clock.advance_to(f64::NAN);
        assert_eq!(clock.game_time(), 3.0);
        assert_eq!(clock.ticks(), 3);
    }

    #[test]
    fn deadlines_are_inclusive() {
        let mut clock = GameClock::new();
        clock.advance_to(19.9);
        assert!(!clock.reached(20.0));
        clock.advance_to(20.0);
        assert!(clock.reached(20.0));
        assert_eq!(clock.since(15.0), 5.0);
    }
}
