use super::*;

impl WorldState {
    /// Moves the player's worm one cell and resolves everything its new
    /// head touches. Returns the record when the move ends the session.
    pub(super) fn advance_primary(&mut self, command: Option<Direction>) -> Option<GameOverRecord> {
        if let Some(dir) = command {
            self.primary.steer(dir);
        }

        let head = self.primary.push_head();
        if !self.grid.contains(head) || self.primary.head_hits_body() {
            return Some(self.record(GameOverReason::Collision));
        }

        // Poison owns this tick's tail: the move's own tail comes off, then
        // the shrink, one segment at a time.
        let mut tail_settled = false;
        if self.take_poison_at(head) {
            self.events.push(RuntimeEvent::PoisonEaten {
                x: head.x,
                y: head.y,
            });
            self.primary.pop_tail();
            for _ in 0..POISON_SHRINK_SEGMENTS {
                if !self.primary.shrink_above(MIN_WORM_LEN) {
                    return Some(self.record(GameOverReason::PoisonExhaustion));
                }
            }
            tail_settled = true;
        }

        self.take_blinking_at(head);

        let touched_other = self
            .secondary()
            .map(|worm| worm.contains(head))
            .unwrap_or(false);
        let ate_apple = self.eat_apple_at(head, WormId::Primary);
        if tail_settled {
            return None;
        }
        if touched_other || ate_apple {
            self.events.push(RuntimeEvent::WormGrew {
                by: WormId::Primary,
                len: self.primary.len(),
            });
        } else {
            self.primary.pop_tail();
        }
        None
    }

    /// The autonomous worm: maybe turn, move, then either die quietly or
    /// feed off the apple and the player's body.
    pub(super) fn advance_secondary(&mut self) {
        let mut worm = match mem::replace(&mut self.secondary, SecondWormPhase::Dead) {
            SecondWormPhase::Alive(worm) => worm,
            inactive => {
                self.secondary = inactive;
                return;
            }
        };

        if self.rng.chance(SECOND_WORM_TURN_CHANCE) {
            let reverse = worm.dir().opposite();
            let choices: Vec<Direction> = Direction::ALL
                .into_iter()
                .filter(|dir| *dir != reverse)
                .collect();
            if let Some(dir) = self.rng.pick(&choices) {
                worm.steer(dir);
            }
        }

        let head = worm.push_head();
        if !self.grid.contains(head) || worm.head_hits_body() {
            debug!(?head, at = self.clock.game_time(), "second worm died");
            self.events.push(RuntimeEvent::SecondWormDied);
            return;
        }

        let touched_other = self.primary.contains(head);
        let ate_apple = self.eat_apple_at(head, WormId::Secondary);
        if touched_other || ate_apple {
            self.events.push(RuntimeEvent::WormGrew {
                by: WormId::Secondary,
                len: worm.len(),
            });
        } else {
            worm.shrink_above(MIN_WORM_LEN);
        }
        self.secondary = SecondWormPhase::Alive(worm);
    }

    /// Removes the poison cell under `head`, if any.
    fn take_poison_at(&mut self, head: Cell) -> bool {
        let PoisonPhase::Active { cells, .. } = &mut self.poison else {
            return false;
        };
        let Some(idx) = cells.iter().position(|cell| *cell == head) else {
            return false;
        };
        cells.remove(idx);
        true
    }

    /// Consumes at most one Type-1 item (earliest spawned first) and the
    /// Type-2 item if either sits under `head`.
    fn take_blinking_at(&mut self, head: Cell) {
        if let Some(idx) = self.recurring.iter().position(|item| item.cell == head) {
            self.recurring.remove(idx);
            self.blinking_items_eaten += 1;
            self.events.push(RuntimeEvent::BlinkingEaten {
                kind: BlinkingKind::Recurring,
            });
        }

        if let SingleItemPhase::Active(item) = self.single {
            if item.cell == head {
                self.single = SingleItemPhase::Gone;
                self.blinking_items_eaten += 1;
                self.events.push(RuntimeEvent::BlinkingEaten {
                    kind: BlinkingKind::Single,
                });
            }
        }
    }

    fn eat_apple_at(&mut self, head: Cell, by: WormId) -> bool {
        if head != self.apple {
            return false;
        }
        self.events.push(RuntimeEvent::AppleEaten { by });
        self.respawn_apple();
        true
    }
}
