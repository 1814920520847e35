use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dir: Direction) -> Self {
        match dir {
            Direction::Up => Self::new(self.x, self.y - 1),
            Direction::Down => Self::new(self.x, self.y + 1),
            Direction::Left => Self::new(self.x - 1, self.y),
            Direction::Right => Self::new(self.x + 1, self.y),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WormId {
    Primary,
    Secondary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BlinkingKind {
    /// Short-lived, spawned on a fixed cadence.
    #[serde(rename = "type1")]
    Recurring,
    /// Spawned once per session, lives longer.
    #[serde(rename = "type2")]
    Single,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    /// Wall or self-intersection.
    Collision,
    PoisonExhaustion,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GameOverRecord {
    pub reason: GameOverReason,
    #[serde(rename = "baseScore")]
    pub base_score: i32,
    #[serde(rename = "blinkingItemsEaten")]
    pub blinking_items_eaten: u32,
}

impl GameOverRecord {
    pub fn final_score(&self) -> i32 {
        crate::score::final_score(self.base_score, self.blinking_items_eaten)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct WormView {
    pub body: Vec<Cell>,
    pub dir: Direction,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BlinkingItemView {
    pub kind: BlinkingKind,
    pub x: i32,
    pub y: i32,
    #[serde(rename = "spawnedAt")]
    pub spawned_at: f64,
    #[serde(rename = "expiresAt")]
    pub expires_at: f64,
    pub visible: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    AppleEaten {
        by: WormId,
    },
    AppleRespawned {
        x: i32,
        y: i32,
    },
    WormGrew {
        by: WormId,
        len: usize,
    },
    PoisonSpawned {
        count: usize,
    },
    PoisonEaten {
        x: i32,
        y: i32,
    },
    PoisonCleared,
    BlinkingSpawned {
        kind: BlinkingKind,
        x: i32,
        y: i32,
    },
    BlinkingEaten {
        kind: BlinkingKind,
    },
    BlinkingExpired {
        kind: BlinkingKind,
    },
    SecondWormSpawned {
        x: i32,
        y: i32,
        dir: Direction,
    },
    SecondWormDied,
    GameOver {
        reason: GameOverReason,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "gameTime")]
    pub game_time: f64,
    #[serde(rename = "blinkVisible")]
    pub blink_visible: bool,
    pub primary: WormView,
    pub secondary: Option<WormView>,
    pub apple: Cell,
    pub poison: Vec<Cell>,
    pub blinking: Vec<BlinkingItemView>,
    #[serde(rename = "baseScore")]
    pub base_score: i32,
    #[serde(rename = "blinkingItemsEaten")]
    pub blinking_items_eaten: u32,
    pub score: i32,
    #[serde(rename = "gameOver")]
    pub game_over: Option<GameOverRecord>,
    pub events: Vec<RuntimeEvent>,
}

#[cfg(test)]
mod tests {
    use super::{Cell, Direction};

    #[test]
    fn opposite_is_an_involution() {
        for dir in Direction::ALL {
            assert_ne!(dir, dir.opposite());
            assert_eq!(dir, dir.opposite().opposite());
        }
    }

    #[test]
    fn offset_moves_one_cell_in_screen_coordinates() {
        let origin = Cell::new(4, 4);
        assert_eq!(origin.offset(Direction::Up), Cell::new(4, 3));
        assert_eq!(origin.offset(Direction::Down), Cell::new(4, 5));
        assert_eq!(origin.offset(Direction::Left), Cell::new(3, 4));
        assert_eq!(origin.offset(Direction::Right), Cell::new(5, 4));
    }
}
