/// Events emitted by the session: the bridge to presentation.
/// The renderer positions entities from these; the sound engine
/// plays cues from them. Neither reads the board directly.

use crate::domain::entity::{Coord, Direction, Entity, EntityId};
use crate::domain::kind::EntityKind;

/// Where one entity should be drawn.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Placement {
    pub id: EntityId,
    pub kind: EntityKind,
    pub at: Coord,
}

impl Placement {
    pub fn of(entity: &Entity) -> Self {
        Placement {
            id: entity.id(),
            kind: entity.kind(),
            at: entity.position(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// An entity moved or was reset.
    EntityPlaced(Placement),
    /// A new map is active; rebuild the whole view.
    FullRedraw {
        width: usize,
        height: usize,
        entities: Vec<Placement>,
    },
    /// The player's move displaced `count` entities.
    Pushed { count: usize },
    /// The player's move was refused.
    Blocked { direction: Direction },
    /// All boxes are on target spots. Emitted once per win.
    Victory,
    /// A reset cleared a previous win.
    VictoryCleared,
}
