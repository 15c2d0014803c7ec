/// Entity kinds and their movement properties.
/// Properties are queried via methods, not stored as flags,
/// so tangibility semantics are centralized here.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum EntityKind {
    Wall,       // Tangible, never moves
    TargetSpot, // Intangible goal cell, stacks under anything
    Box,        // Pushable, subject to the push-chain limit
    Player,
}

impl EntityKind {
    /// Can this entity be relocated (by input or by a push)?
    pub fn is_moveable(self) -> bool {
        matches!(self, EntityKind::Box | EntityKind::Player)
    }

    /// Does this entity block movement / take part in push chains?
    pub fn is_tangible(self) -> bool {
        self.is_moveable() || self == EntityKind::Wall
    }

    /// Is this entity counted against the push-chain limit?
    pub fn is_pushable(self) -> bool {
        matches!(self, EntityKind::Box)
    }

    /// Name used in entity identifiers.
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Wall => "wall",
            EntityKind::TargetSpot => "boxspot",
            EntityKind::Box => "box",
            EntityKind::Player => "player",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
