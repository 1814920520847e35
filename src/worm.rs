use std::collections::VecDeque;

use crate::types::{Cell, Direction, WormView};

/// Ordered body with the head at the front.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Worm {
    body: VecDeque<Cell>,
    dir: Direction,
}

impl Worm {
    /// Lays `len` segments out behind `head`, opposite to the facing
    /// direction, so the first move never runs into the neck.
    pub fn new(head: Cell, dir: Direction, len: usize) -> Self {
        let mut body = VecDeque::with_capacity(len.max(1));
        let mut cell = head;
        body.push_back(cell);
        for _ in 1..len {
            cell = cell.offset(dir.opposite());
            body.push_back(cell);
        }
        Self { body, dir }
    }

    #[cfg(test)]
    pub(crate) fn from_cells(cells: impl IntoIterator<Item = Cell>, dir: Direction) -> Self {
        Self {
            body: cells.into_iter().collect(),
            dir,
        }
    }

    pub fn head(&self) -> Cell {
        // Never empty: `new` always pushes the head and shrinking stops at a
        // floor of at least one.
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn dir(&self) -> Direction {
        self.dir
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.body.iter()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }

    /// Applies a turn unless it reverses straight into the neck. Returns
    /// whether the facing changed.
    pub fn steer(&mut self, dir: Direction) -> bool {
        if dir == self.dir || dir == self.dir.opposite() {
            return false;
        }
        self.dir = dir;
        true
    }

    /// Inserts the next head cell. The tail stays until the tick commits.
    pub fn push_head(&mut self) -> Cell {
        let next = self.head().offset(self.dir);
        self.body.push_front(next);
        next
    }

    /// True when the head shares a cell with any later segment.
    pub fn head_hits_body(&self) -> bool {
        let head = self.head();
        self.body.iter().skip(1).any(|cell| *cell == head)
    }

    pub fn pop_tail(&mut self) -> Option<Cell> {
        if self.body.len() <= 1 {
            return None;
        }
        self.body.pop_back()
    }

    /// Drops one tail segment if the worm stays strictly above `floor`.
    pub fn shrink_above(&mut self, floor: usize) -> bool {
        if self.body.len() <= floor.max(1) {
            return false;
        }
        self.body.pop_back();
        true
    }

    pub fn view(&self) -> WormView {
        WormView {
            body: self.body.iter().copied().collect(),
            dir: self.dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Worm;
    use crate::types::{Cell, Direction};

    #[test]
    fn new_worm_trails_behind_its_facing() {
        let worm = Worm::new(Cell::new(10, 10), Direction::Up, 3);
        let cells: Vec<Cell> = worm.cells().copied().collect();
        assert_eq!(
            cells,
            vec![Cell::new(10, 10), Cell::new(10, 11), Cell::new(10, 12)]
        );
    }

    #[test]
    fn reverse_turn_is_ignored() {
        let mut worm = Worm::new(Cell::new(10, 10), Direction::Right, 3);
        assert!(!worm.steer(Direction::Left));
        assert_eq!(worm.dir(), Direction::Right);
        assert!(worm.steer(Direction::Down));
        assert_eq!(worm.dir(), Direction::Down);
    }

    #[test]
    fn push_head_then_pop_tail_keeps_length() {
        let mut worm = Worm::new(Cell::new(5, 5), Direction::Right, 3);
        let head = worm.push_head();
        assert_eq!(head, Cell::new(6, 5));
        assert_eq!(worm.len(), 4);
        assert_eq!(worm.pop_tail(), Some(Cell::new(3, 5)));
        assert_eq!(worm.len(), 3);
        assert!(!worm.head_hits_body());
    }

    #[test]
    fn head_on_own_segment_is_detected() {
        let mut worm = Worm::from_cells(
            [
                Cell::new(5, 5),
                Cell::new(5, 6),
                Cell::new(6, 6),
                Cell::new(6, 5),
                Cell::new(6, 4),
            ],
            Direction::Right,
        );
        worm.push_head();
        assert_eq!(worm.head(), Cell::new(6, 5));
        assert!(worm.head_hits_body());
    }

    #[test]
    fn shrink_stops_at_floor() {
        let mut worm = Worm::new(Cell::new(10, 10), Direction::Right, 5);
        assert!(worm.shrink_above(3));
        assert!(worm.shrink_above(3));
        assert!(!worm.shrink_above(3));
        assert_eq!(worm.len(), 3);
    }
}
