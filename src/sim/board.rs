/// Board: every entity of one level plus the spawn data recorded
/// while parsing the map text.
///
/// ## Map legend
///   'X' = Wall           'O' = Target spot
///   'B' = Box            '8' = Box on a target spot
///   'P' = Player spawn   anything else = floor
///
/// Width and height only count recognized characters, so trailing
/// blank rows and columns never grow the board.
///
/// Columns are counted in `char`s: any Unicode scalar value, emoji
/// included, takes exactly one column.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::domain::entity::{Coord, Direction, Entity};
use crate::domain::kind::EntityKind;
use crate::domain::rules::{self, MapView, MovePlan};
use super::event::{GameEvent, Placement};

/// Player spawn used when the map has no 'P'.
pub const DEFAULT_PLAYER_SPAWN: Coord = Coord::new(1, 1);

#[derive(Clone, Debug)]
pub struct Board {
    entities: Vec<Entity>,
    width: usize,
    height: usize,
    player_spawn: Coord,
    box_spawns: Vec<Coord>,
}

impl Board {
    /// A 0x0 board with no entities.
    pub fn empty() -> Self {
        Board {
            entities: vec![],
            width: 0,
            height: 0,
            player_spawn: DEFAULT_PLAYER_SPAWN,
            box_spawns: vec![],
        }
    }

    /// Parse map text into a board. Never fails: unknown characters are floor.
    pub fn from_text(text: &str) -> Self {
        let mut board = Board::empty();

        for (y, line) in text.split('\n').enumerate() {
            let row = line.strip_suffix('\r').unwrap_or(line);
            let mut row_width = 0;

            for (x, ch) in row.chars().enumerate() {
                let at = Coord::new(x as i32, y as i32);
                let recognized = match ch {
                    'X' => {
                        board.entities.push(Entity::new(EntityKind::Wall, at));
                        true
                    }
                    'O' => {
                        board.entities.push(Entity::new(EntityKind::TargetSpot, at));
                        true
                    }
                    'B' => {
                        board.entities.push(Entity::new(EntityKind::Box, at));
                        board.box_spawns.push(at);
                        true
                    }
                    '8' => {
                        board.entities.push(Entity::new(EntityKind::TargetSpot, at));
                        board.entities.push(Entity::new(EntityKind::Box, at));
                        board.box_spawns.push(at);
                        true
                    }
                    'P' => {
                        board.player_spawn = at;
                        true
                    }
                    _ => false,
                };
                if recognized {
                    row_width = x + 1;
                }
            }

            board.width = board.width.max(row_width);
            if row_width != 0 {
                board.height = y + 1;
            }
        }

        debug!(
            "parsed map {}x{}: {} entities, {} boxes, player spawn {}",
            board.width, board.height, board.entities.len(),
            board.box_spawns.len(), board.player_spawn,
        );
        board
    }

    // ── Queries ──

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[cfg(test)]
    pub fn player_spawn(&self) -> Coord {
        self.player_spawn
    }

    #[cfg(test)]
    /// Coordinates of every 'B' / '8' in the map text.
    pub fn box_spawns(&self) -> &[Coord] {
        &self.box_spawns
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn view(&self) -> MapView<'_> {
        MapView { entities: &self.entities }
    }

    /// Entities of the requested kinds, grouped by kind.
    /// Kinds with no entity are absent from the map.
    pub fn entities_by_kind(&self, kinds: &[EntityKind]) -> HashMap<EntityKind, Vec<&Entity>> {
        let mut out: HashMap<EntityKind, Vec<&Entity>> = HashMap::new();
        for e in &self.entities {
            if kinds.contains(&e.kind()) {
                out.entry(e.kind()).or_default().push(e);
            }
        }
        out
    }

    /// Current coordinates of every entity of `kind`.
    pub fn positions_of(&self, kind: EntityKind) -> Vec<Coord> {
        self.entities
            .iter()
            .filter(|e| e.kind() == kind)
            .map(|e| e.position())
            .collect()
    }

    /// (boxes resting on a target spot, total boxes)
    pub fn boxes_on_target(&self) -> (usize, usize) {
        let targets: HashSet<Coord> = self.positions_of(EntityKind::TargetSpot).into_iter().collect();
        let boxes = self.positions_of(EntityKind::Box);
        let placed = boxes.iter().filter(|b| targets.contains(b)).count();
        (placed, boxes.len())
    }

    pub fn placements(&self) -> Vec<Placement> {
        self.entities.iter().map(Placement::of).collect()
    }

    // ── Mutation ──

    /// Attach the persistent player: move its spawn to this map's
    /// player spawn, reset it there and add it. Returns its index.
    pub fn spawn_player(&mut self, mut player: Entity, events: &mut Vec<GameEvent>) -> usize {
        player.set_spawn(self.player_spawn);
        player.reset();
        events.push(GameEvent::EntityPlaced(Placement::of(&player)));
        self.entities.push(player);
        self.entities.len() - 1
    }

    /// Remove and return the entity at `idx` (used to carry the
    /// player over to the next board).
    pub fn detach(&mut self, idx: usize) -> Option<Entity> {
        if idx < self.entities.len() {
            Some(self.entities.remove(idx))
        } else {
            None
        }
    }

    /// Resolve and apply a move of entity `idx`. Returns the applied
    /// plan, or `None` if the move was refused (nothing changed).
    pub fn attempt_move(
        &mut self,
        idx: usize,
        dir: Direction,
        depth: u32,
        events: &mut Vec<GameEvent>,
    ) -> Option<MovePlan> {
        let plan = rules::plan_move(&self.view(), idx, dir, depth)?;
        self.commit(&plan, events);
        Some(plan)
    }

    /// Apply a validated plan, destination-first.
    pub fn commit(&mut self, plan: &MovePlan, events: &mut Vec<GameEvent>) {
        for &idx in &plan.movers {
            let entity = &mut self.entities[idx];
            entity.advance(plan.direction);
            events.push(GameEvent::EntityPlaced(Placement::of(entity)));
        }
    }

    /// Teleport every entity (player included) back to its spawn.
    pub fn reset_all(&mut self, events: &mut Vec<GameEvent>) {
        for entity in &mut self.entities {
            entity.reset();
            events.push(GameEvent::EntityPlaced(Placement::of(entity)));
        }
    }
}
