use std::mem;

use tracing::debug;

use crate::clock::GameClock;
use crate::constants::{
    blink_visible, BLINKING_CAP, INITIAL_WORM_LEN, MIN_WORM_LEN, POISON_SHRINK_SEGMENTS,
    SECOND_WORM_TURN_CHANCE, TYPE1_LIFETIME_SECS, TYPE2_LIFETIME_SECS,
};
use crate::rng::Rng;
use crate::score::{base_score, final_score};
use crate::types::{
    BlinkingItemView, BlinkingKind, Cell, Direction, GameOverReason, GameOverRecord,
    RuntimeEvent, Snapshot, WormId,
};
use crate::world::Grid;
use crate::worm::Worm;

mod collision;
mod spawn_system;

#[derive(Clone, Copy, Debug, Default)]
pub struct SessionOptions {
    pub grid: Grid,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct BlinkingItem {
    cell: Cell,
    spawned_at: f64,
}

/// Poisonous apples are a once-per-session batch.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PoisonPhase {
    Scheduled { at: f64, count: usize },
    Active { cells: Vec<Cell>, clears_at: f64 },
    Cleared,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum SingleItemPhase {
    Pending,
    Active(BlinkingItem),
    Gone,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum SecondWormPhase {
    Pending,
    Alive(Worm),
    Dead,
}

/// Everything one session owns. `step` is the only way time moves forward.
#[derive(Clone, Debug)]
pub struct WorldState {
    grid: Grid,
    rng: Rng,
    clock: GameClock,
    primary: Worm,
    secondary: SecondWormPhase,
    apple: Cell,
    poison: PoisonPhase,
    recurring: Vec<BlinkingItem>,
    last_recurring_spawn: f64,
    single: SingleItemPhase,
    blinking_items_eaten: u32,
    events: Vec<RuntimeEvent>,
    game_over: Option<GameOverRecord>,
}

/// Starts a session on the default grid.
pub fn init_session(seed: u32) -> WorldState {
    WorldState::new(seed, SessionOptions::default())
}

/// Advances `world` by exactly one tick.
pub fn step(
    mut world: WorldState,
    elapsed_seconds: f64,
    command: Option<Direction>,
) -> (WorldState, Option<GameOverRecord>) {
    let outcome = world.step(elapsed_seconds, command);
    (world, outcome)
}

impl WorldState {
    pub fn new(seed: u32, options: SessionOptions) -> Self {
        Self::with_rng(options, Rng::new(seed))
    }

    pub fn with_rng(options: SessionOptions, mut rng: Rng) -> Self {
        let grid = options.grid;
        let start = grid.random_start_cell(&mut rng);
        let primary = Worm::new(start, Direction::Right, INITIAL_WORM_LEN);
        let apple = grid.random_cell(&mut rng);
        let poison = spawn_system::schedule_poison(&mut rng);
        debug!(?start, ?apple, ?poison, "session initialised");

        Self {
            grid,
            rng,
            clock: GameClock::new(),
            primary,
            secondary: SecondWormPhase::Pending,
            apple,
            poison,
            recurring: Vec::new(),
            last_recurring_spawn: 0.0,
            single: SingleItemPhase::Pending,
            blinking_items_eaten: 0,
            events: Vec::new(),
            game_over: None,
        }
    }

    /// One tick: scheduler, primary worm, secondary worm, late spawns.
    /// Events from the previous tick are dropped whether or not a snapshot
    /// drained them. Once the session has ended this returns the stored
    /// record untouched.
    pub fn step(
        &mut self,
        elapsed_seconds: f64,
        command: Option<Direction>,
    ) -> Option<GameOverRecord> {
        if let Some(record) = self.game_over {
            return Some(record);
        }
        self.events.clear();
        self.clock.advance_to(elapsed_seconds);

        self.update_blinking_items();
        self.update_poison();

        if let Some(record) = self.advance_primary(command) {
            self.events.push(RuntimeEvent::GameOver {
                reason: record.reason,
            });
            debug!(?record, tick = self.clock.ticks(), "session over");
            self.game_over = Some(record);
            return Some(record);
        }

        self.advance_secondary();
        self.spawn_second_worm_if_due();

        debug_assert!(self.active_blinking_count() <= BLINKING_CAP);
        None
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn tick(&self) -> u64 {
        self.clock.ticks()
    }

    pub fn game_time(&self) -> f64 {
        self.clock.game_time()
    }

    pub fn is_ended(&self) -> bool {
        self.game_over.is_some()
    }

    pub fn game_over(&self) -> Option<GameOverRecord> {
        self.game_over
    }

    pub fn primary(&self) -> &Worm {
        &self.primary
    }

    pub fn secondary(&self) -> Option<&Worm> {
        match &self.secondary {
            SecondWormPhase::Alive(worm) => Some(worm),
            SecondWormPhase::Pending | SecondWormPhase::Dead => None,
        }
    }

    pub fn apple(&self) -> Cell {
        self.apple
    }

    pub fn poison_cells(&self) -> &[Cell] {
        match &self.poison {
            PoisonPhase::Active { cells, .. } => cells,
            PoisonPhase::Scheduled { .. } | PoisonPhase::Cleared => &[],
        }
    }

    /// Active blinking items, Type 1 in spawn order followed by Type 2.
    pub fn blinking_items(&self) -> Vec<BlinkingItemView> {
        let visible = self.blink_visible();
        let mut out: Vec<BlinkingItemView> = self
            .recurring
            .iter()
            .map(|item| item.view(BlinkingKind::Recurring, TYPE1_LIFETIME_SECS, visible))
            .collect();
        if let SingleItemPhase::Active(item) = self.single {
            out.push(item.view(BlinkingKind::Single, TYPE2_LIFETIME_SECS, visible));
        }
        out
    }

    pub fn blink_visible(&self) -> bool {
        blink_visible(self.clock.game_time())
    }

    pub fn active_blinking_count(&self) -> usize {
        let single = usize::from(matches!(self.single, SingleItemPhase::Active(_)));
        self.recurring.len() + single
    }

    pub fn blinking_items_eaten(&self) -> u32 {
        self.blinking_items_eaten
    }

    pub fn base_score(&self) -> i32 {
        base_score(self.primary.len())
    }

    pub fn score(&self) -> i32 {
        final_score(self.base_score(), self.blinking_items_eaten)
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let events = if include_events {
            mem::take(&mut self.events)
        } else {
            Vec::new()
        };
        Snapshot {
            tick: self.clock.ticks(),
            game_time: self.clock.game_time(),
            blink_visible: self.blink_visible(),
            primary: self.primary.view(),
            secondary: self.secondary().map(Worm::view),
            apple: self.apple,
            poison: self.poison_cells().to_vec(),
            blinking: self.blinking_items(),
            base_score: self.base_score(),
            blinking_items_eaten: self.blinking_items_eaten,
            score: self.score(),
            game_over: self.game_over,
            events,
        }
    }

    fn record(&self, reason: GameOverReason) -> GameOverRecord {
        GameOverRecord {
            reason,
            base_score: self.base_score(),
            blinking_items_eaten: self.blinking_items_eaten,
        }
    }
}

impl BlinkingItem {
    fn view(&self, kind: BlinkingKind, lifetime: f64, visible: bool) -> BlinkingItemView {
        BlinkingItemView {
            kind,
            x: self.cell.x,
            y: self.cell.y,
            spawned_at: self.spawned_at,
            expires_at: self.spawned_at + lifetime,
            visible,
        }
    }
}
