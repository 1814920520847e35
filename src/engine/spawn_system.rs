use tracing::warn;

use super::*;
use crate::constants::{
    PLACEMENT_ATTEMPTS, POISON_ACTIVE_SECS, POISON_COUNT_MAX, POISON_COUNT_MIN,
    POISON_DELAY_MAX_SECS, POISON_DELAY_MIN_SECS, SECOND_WORM_SPAWN_AT,
    TYPE1_SPAWN_INTERVAL_SECS, TYPE2_SPAWN_AT,
};

pub(super) fn schedule_poison(rng: &mut Rng) -> PoisonPhase {
    let count = rng.range_inclusive(POISON_COUNT_MIN, POISON_COUNT_MAX) as usize;
    let at = rng.range_inclusive(POISON_DELAY_MIN_SECS, POISON_DELAY_MAX_SECS) as f64;
    PoisonPhase::Scheduled { at, count }
}

impl WorldState {
    pub(super) fn update_blinking_items(&mut self) {
        let now = self.clock.game_time();

        let before = self.recurring.len();
        self.recurring
            .retain(|item| now - item.spawned_at < TYPE1_LIFETIME_SECS);
        for _ in self.recurring.len()..before {
            self.events.push(RuntimeEvent::BlinkingExpired {
                kind: BlinkingKind::Recurring,
            });
        }

        if let SingleItemPhase::Active(item) = self.single {
            if now - item.spawned_at >= TYPE2_LIFETIME_SECS {
                self.single = SingleItemPhase::Gone;
                self.events.push(RuntimeEvent::BlinkingExpired {
                    kind: BlinkingKind::Single,
                });
            }
        }

        // The cadence timestamp only moves when something actually spawns,
        // so a full cap retries on every following tick.
        if self.clock.since(self.last_recurring_spawn) >= TYPE1_SPAWN_INTERVAL_SECS
            && self.active_blinking_count() < BLINKING_CAP
        {
            let item = self.spawn_blinking_item(BlinkingKind::Recurring);
            self.recurring.push(item);
            self.last_recurring_spawn = now;
        }

        if self.single == SingleItemPhase::Pending
            && self.clock.reached(TYPE2_SPAWN_AT)
            && self.active_blinking_count() < BLINKING_CAP
        {
            let item = self.spawn_blinking_item(BlinkingKind::Single);
            self.single = SingleItemPhase::Active(item);
        }
    }

    fn spawn_blinking_item(&mut self, kind: BlinkingKind) -> BlinkingItem {
        let cell = self.grid.random_cell(&mut self.rng);
        debug!(?kind, ?cell, at = self.clock.game_time(), "blinking item spawned");
        self.events.push(RuntimeEvent::BlinkingSpawned {
            kind,
            x: cell.x,
            y: cell.y,
        });
        BlinkingItem {
            cell,
            spawned_at: self.clock.game_time(),
        }
    }

    pub(super) fn update_poison(&mut self) {
        match mem::replace(&mut self.poison, PoisonPhase::Cleared) {
            PoisonPhase::Scheduled { at, count } if self.clock.reached(at) => {
                let cells = self.place_poison(count);
                debug!(count = cells.len(), at, "poison batch active");
                self.events
                    .push(RuntimeEvent::PoisonSpawned { count: cells.len() });
                self.poison = PoisonPhase::Active {
                    cells,
                    clears_at: self.clock.game_time() + POISON_ACTIVE_SECS,
                };
            }
            PoisonPhase::Active { clears_at, .. } if self.clock.reached(clears_at) => {
                debug!(at = self.clock.game_time(), "poison batch cleared");
                self.events.push(RuntimeEvent::PoisonCleared);
            }
            phase => self.poison = phase,
        }
    }

    fn place_poison(&mut self, count: usize) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(count);
        for _ in 0..count {
            match self.pick_cell_off_worms() {
                Some(cell) => cells.push(cell),
                None => warn!("no free cell for poisonous apple, skipping"),
            }
        }
        cells
    }

    /// Rolls cells until one lies on neither worm. Other consumables are
    /// not checked.
    fn pick_cell_off_worms(&mut self) -> Option<Cell> {
        for _ in 0..PLACEMENT_ATTEMPTS {
            let cell = self.grid.random_cell(&mut self.rng);
            let on_secondary = self
                .secondary()
                .map(|worm| worm.contains(cell))
                .unwrap_or(false);
            if !self.primary.contains(cell) && !on_secondary {
                return Some(cell);
            }
        }
        None
    }

    /// Moves the apple somewhere else; it never lands back on the cell it
    /// was just eaten from.
    pub(super) fn respawn_apple(&mut self) {
        let eaten = self.apple;
        let mut next = self.grid.random_cell(&mut self.rng);
        let mut attempts = 1;
        while next == eaten && attempts < PLACEMENT_ATTEMPTS && self.grid.cell_count() > 1 {
            next = self.grid.random_cell(&mut self.rng);
            attempts += 1;
        }
        self.apple = next;
        self.events.push(RuntimeEvent::AppleRespawned {
            x: next.x,
            y: next.y,
        });
    }

    pub(super) fn spawn_second_worm_if_due(&mut self) {
        if self.secondary != SecondWormPhase::Pending || !self.clock.reached(SECOND_WORM_SPAWN_AT)
        {
            return;
        }

        let dir = self.rng.pick(&Direction::ALL).unwrap_or(Direction::Right);
        for _ in 0..PLACEMENT_ATTEMPTS {
            let head = self.grid.random_start_cell(&mut self.rng);
            let worm = Worm::new(head, dir, INITIAL_WORM_LEN);
            if worm.cells().any(|cell| self.primary.contains(*cell)) {
                continue;
            }
            debug!(?head, ?dir, at = self.clock.game_time(), "second worm spawned");
            self.events.push(RuntimeEvent::SecondWormSpawned {
                x: head.x,
                y: head.y,
                dir,
            });
            self.secondary = SecondWormPhase::Alive(worm);
            return;
        }
        warn!("no free start cell for second worm, retrying next tick");
    }
}
