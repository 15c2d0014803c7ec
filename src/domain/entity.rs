/// Grid coordinates, directions and the tile occupant entity.
/// Entities carry only position state; legality lives in `rules`.

use std::fmt;

use super::kind::EntityKind;

/// Integer grid coordinate. `y` grows downward (row index).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    /// The neighbouring cell one step in `dir`.
    pub fn step(self, dir: Direction) -> Coord {
        let (dx, dy) = dir.delta();
        Coord::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the four unit moves.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Stable identifier: kind + the coordinate the entity was created at.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EntityId {
    pub kind: EntityKind,
    pub origin: Coord,
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}_{}", self.kind, self.origin.x, self.origin.y)
    }
}

#[derive(Clone, Debug)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    position: Coord,
    spawn: Coord,
}

impl Entity {
    pub fn new(kind: EntityKind, at: Coord) -> Self {
        Entity {
            id: EntityId { kind, origin: at },
            kind,
            position: at,
            spawn: at,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn position(&self) -> Coord {
        self.position
    }

    #[cfg(test)]
    pub fn spawn(&self) -> Coord {
        self.spawn
    }

    pub fn is_moveable(&self) -> bool {
        self.kind.is_moveable()
    }

    pub fn is_tangible(&self) -> bool {
        self.kind.is_tangible()
    }

    /// Teleport back to spawn. Bypasses collision rules entirely.
    pub fn reset(&mut self) {
        self.position = self.spawn;
    }

    /// Reassign the spawn point. Only the persistent player is re-spawned.
    pub fn set_spawn(&mut self, at: Coord) {
        self.spawn = at;
    }

    /// Advance one cell. Callers must have validated the move.
    pub(crate) fn advance(&mut self, dir: Direction) {
        self.position = self.position.step(dir);
    }
}
