/// Session: the active board, the one persistent player and win state.
///
/// Every handler resolves one input completely and returns the events
/// it produced, in order. Nothing here blocks or is shared between
/// threads; the game loop feeds commands one at a time.
///
/// ## Win rule
/// Won iff the board has at least one box and every box sits on a
/// target spot. Spare target spots do not matter. The `Victory` event
/// fires on the transition only; a reset or map switch re-arms it.

use std::collections::HashSet;

use log::{debug, info, trace};

use crate::domain::entity::{Coord, Direction, Entity};
use crate::domain::kind::EntityKind;
use super::board::Board;
use super::event::GameEvent;

/// Where the player is created before the first map is attached.
const PLAYER_ORIGIN: Coord = Coord::new(-1, -1);

pub struct Session {
    board: Board,
    /// Index of the persistent player inside `board`.
    player: usize,
    won: bool,
    moves: u32,
    pushes: u32,
}

impl Session {
    /// Create the player once and attach it to an empty board.
    pub fn new() -> Self {
        let mut board = Board::empty();
        let player = board.spawn_player(
            Entity::new(EntityKind::Player, PLAYER_ORIGIN),
            &mut Vec::new(),
        );
        Session { board, player, won: false, moves: 0, pushes: 0 }
    }

    // ── Queries ──

    #[cfg(test)]
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn player(&self) -> &Entity {
        // The player index always points into the current board.
        &self.board.entities()[self.player]
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn pushes(&self) -> u32 {
        self.pushes
    }

    // ── Map lifecycle ──

    /// Replace the board, carrying the same player entity over.
    pub fn switch_map(&mut self, board: Board) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let player = self
            .board
            .detach(self.player)
            .unwrap_or_else(|| Entity::new(EntityKind::Player, PLAYER_ORIGIN));

        self.board = board;
        self.player = self.board.spawn_player(player, &mut events);
        self.won = false;
        self.reset_into(&mut events);

        events.push(GameEvent::FullRedraw {
            width: self.board.width(),
            height: self.board.height(),
            entities: self.board.placements(),
        });
        let (placed, total) = self.board.boxes_on_target();
        info!(
            "map switched: {}x{}, {placed}/{total} boxes on target",
            self.board.width(), self.board.height(),
        );
        events
    }

    /// Put everything back on its spawn and clear the win.
    pub fn reset(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        self.reset_into(&mut events);
        events
    }

    fn reset_into(&mut self, events: &mut Vec<GameEvent>) {
        if self.won {
            events.push(GameEvent::VictoryCleared);
        }
        self.won = false;
        self.moves = 0;
        self.pushes = 0;
        self.board.reset_all(events);
    }

    // ── Input ──

    pub fn handle_direction(&mut self, dir: Direction) -> Vec<GameEvent> {
        let mut events = Vec::new();

        match self.board.attempt_move(self.player, dir, 0, &mut events) {
            Some(plan) => {
                let pushed = plan.pushed().len();
                self.moves += 1;
                if pushed > 0 {
                    self.pushes += 1;
                    events.push(GameEvent::Pushed { count: pushed });
                }
            }
            None => {
                trace!("move {:?} refused at {}", dir, self.player().position());
                events.push(GameEvent::Blocked { direction: dir });
            }
        }

        if !self.won {
            self.check_win(&mut events);
        }
        events
    }

    pub fn handle_reset(&mut self) -> Vec<GameEvent> {
        debug!("reset requested");
        self.reset()
    }

    /// Re-evaluate the win; emits `Victory` on the first transition.
    pub fn check_win(&mut self, events: &mut Vec<GameEvent>) -> bool {
        let groups = self
            .board
            .entities_by_kind(&[EntityKind::Box, EntityKind::TargetSpot]);
        let targets: HashSet<Coord> = groups
            .get(&EntityKind::TargetSpot)
            .into_iter()
            .flatten()
            .map(|t| t.position())
            .collect();
        let all_placed = match groups.get(&EntityKind::Box) {
            Some(boxes) => boxes.iter().all(|b| targets.contains(&b.position())),
            None => false,
        };

        if all_placed && !self.won {
            self.won = true;
            events.push(GameEvent::Victory);
            info!("map solved in {} moves, {} pushes", self.moves, self.pushes);
        }
        self.won
    }
}
