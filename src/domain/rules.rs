/// Movement resolution: recursive push-chain rules.
///
/// Pure functions over a read-only view of the board. They decide
/// "is this move legal, and who moves" without performing it;
/// `Board::commit` applies the resulting plan.
///
/// ## Decision table (`allows_move`)
/// ┌──────────────────────────────┬──────────┬──────────────────────────┐
/// │ Condition (priority order)   │ Result   │ Notes                    │
/// ├──────────────────────────────┼──────────┼──────────────────────────┤
/// │ tangible && !moveable        │ DENY     │ wall                     │
/// │ !tangible                    │ ALLOW    │ target spot, never moves │
/// │ box && depth > chain limit   │ DENY     │ second box in a row      │
/// │ destination empty            │ ALLOW    │                          │
/// │ every occupant allows        │ ALLOW    │ recursive, depth + 1     │
/// │ otherwise                    │ DENY     │                          │
/// └──────────────────────────────┴──────────┴──────────────────────────┘
///
/// ## Push depth
/// The player asks at depth 0. Every tangible moveable bumps the depth
/// before asking the occupants of its destination, so the first box in
/// front of the player sees depth 1 and a box behind it sees depth 2.
///
/// ## Ordering
/// Occupants are planned before the entity that pushes them, so
/// `MovePlan::movers` is destination-first. Committing in that order
/// never moves an entity onto a cell that is still waiting to vacate.

use super::entity::{Coord, Direction, Entity};

/// Maximum number of boxes a single action may push.
pub const MAX_PUSH_CHAIN: u32 = 1;

/// Immutable view of the board's entities for rule queries.
pub struct MapView<'a> {
    pub entities: &'a [Entity],
}

impl<'a> MapView<'a> {
    /// Indices of every entity currently at `at` (stacked ones included).
    pub fn occupants(&self, at: Coord) -> Vec<usize> {
        self.entities
            .iter()
            .enumerate()
            .filter(|(_, e)| e.position() == at)
            .map(|(i, _)| i)
            .collect()
    }
}

/// A validated move: every entity that will advance one step in
/// `direction`, listed destination-first (the initiator is last).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovePlan {
    pub direction: Direction,
    pub movers: Vec<usize>,
}

impl MovePlan {
    /// Entities displaced by the initiator (everything but the initiator).
    pub fn pushed(&self) -> &[usize] {
        match self.movers.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        }
    }
}

/// Plan a move of entity `idx` in `dir`, starting at push depth `depth`.
/// Returns `None` if the move is refused; nothing is mutated either way.
pub fn plan_move(map: &MapView, idx: usize, dir: Direction, depth: u32) -> Option<MovePlan> {
    let mut movers = Vec::new();
    if attempt(map, idx, dir, depth, &mut movers) {
        Some(MovePlan { direction: dir, movers })
    } else {
        None
    }
}

fn attempt(map: &MapView, idx: usize, dir: Direction, depth: u32, movers: &mut Vec<usize>) -> bool {
    if !allows_move(map, idx, dir, depth, movers) {
        return false;
    }
    // Reached twice through stacked occupants: still moves once.
    if map.entities[idx].is_moveable() && !movers.contains(&idx) {
        movers.push(idx);
    }
    true
}

fn allows_move(map: &MapView, idx: usize, dir: Direction, depth: u32, movers: &mut Vec<usize>) -> bool {
    let entity = &map.entities[idx];

    if entity.is_tangible() && !entity.is_moveable() {
        return false;
    }
    if !entity.is_tangible() {
        return true;
    }
    if entity.kind().is_pushable() && depth > MAX_PUSH_CHAIN {
        return false;
    }

    let depth = depth + 1;
    let dest = entity.position().step(dir);

    // Every occupant is asked, even after a refusal, so all of them
    // see the same depth. The plan is discarded on failure anyway.
    map.occupants(dest)
        .into_iter()
        .fold(true, |ok, occ| attempt(map, occ, dir, depth, movers) && ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::kind::EntityKind;

    /// Helper: build entities from a diagram.
    /// Legend:  'X'=Wall  'O'=Target  'B'=Box  '8'=Target+Box  'P'=Player
    /// The player, if any, is always the last entity.
    fn entities_from(rows: &[&str]) -> Vec<Entity> {
        let mut out = vec![];
        let mut player = None;
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let at = Coord::new(x as i32, y as i32);
                match ch {
                    'X' => out.push(Entity::new(EntityKind::Wall, at)),
                    'O' => out.push(Entity::new(EntityKind::TargetSpot, at)),
                    'B' => out.push(Entity::new(EntityKind::Box, at)),
                    '8' => {
                        out.push(Entity::new(EntityKind::TargetSpot, at));
                        out.push(Entity::new(EntityKind::Box, at));
                    }
                    'P' => player = Some(Entity::new(EntityKind::Player, at)),
                    _ => {}
                }
            }
        }
        out.extend(player);
        out
    }

    fn player_of(entities: &[Entity]) -> usize {
        entities.len() - 1
    }

    fn plan(rows: &[&str], dir: Direction) -> (Vec<Entity>, Option<MovePlan>) {
        let entities = entities_from(rows);
        let p = player_of(&entities);
        let result = plan_move(&MapView { entities: &entities }, p, dir, 0);
        (entities, result)
    }

    fn kinds(entities: &[Entity], idxs: &[usize]) -> Vec<EntityKind> {
        idxs.iter().map(|&i| entities[i].kind()).collect()
    }

    // ── Plain movement ──

    #[test]
    fn step_into_empty_floor() {
        let (e, p) = plan(&["  P  "], Direction::Left);
        let p = p.expect("free move");
        assert_eq!(kinds(&e, &p.movers), vec![EntityKind::Player]);
        assert!(p.pushed().is_empty());
    }

    #[test]
    fn wall_blocks() {
        let (_, p) = plan(&[" XP "], Direction::Left);
        assert!(p.is_none());
    }

    #[test]
    fn stepping_off_the_map_is_allowed() {
        // No occupants outside the map means nothing blocks.
        let (_, p) = plan(&["P"], Direction::Up);
        assert!(p.is_some());
    }

    // ── Pushing ──

    #[test]
    fn single_box_push() {
        let (e, p) = plan(&["", "", "  PB  "], Direction::Right);
        let p = p.expect("one box can be pushed");
        assert_eq!(kinds(&e, &p.movers), vec![EntityKind::Box, EntityKind::Player]);
        assert_eq!(kinds(&e, p.pushed()), vec![EntityKind::Box]);
    }

    #[test]
    fn double_box_push_refused() {
        let (_, p) = plan(&["", "", "  PBB "], Direction::Right);
        assert!(p.is_none());
    }

    #[test]
    fn push_into_wall_refused() {
        let (_, p) = plan(&["", "", "  PBX "], Direction::Right);
        assert!(p.is_none());
    }

    #[test]
    fn push_onto_target_spot() {
        let (e, p) = plan(&["  PBO "], Direction::Right);
        let p = p.expect("target spots never block");
        assert_eq!(kinds(&e, &p.movers), vec![EntityKind::Box, EntityKind::Player]);
    }

    #[test]
    fn push_box_off_target_spot() {
        // Box stacked on a target: the target is not asked to move.
        let (e, p) = plan(&["  P8  "], Direction::Right);
        let p = p.expect("stacked target is transparent");
        assert_eq!(kinds(&e, &p.movers), vec![EntityKind::Box, EntityKind::Player]);
    }

    #[test]
    fn stacked_box_behind_box_refused() {
        let (_, p) = plan(&["  PB8 "], Direction::Right);
        assert!(p.is_none());
    }

    #[test]
    fn push_vertical() {
        let (e, p) = plan(&[" ", "B", "P"], Direction::Up);
        let p = p.expect("vertical push");
        assert_eq!(kinds(&e, &p.movers), vec![EntityKind::Box, EntityKind::Player]);
    }

    // ── Depth convention ──

    #[test]
    fn box_refuses_when_already_deep() {
        let entities = entities_from(&["B "]);
        let view = MapView { entities: &entities };
        assert!(plan_move(&view, 0, Direction::Right, MAX_PUSH_CHAIN).is_some());
        assert!(plan_move(&view, 0, Direction::Right, MAX_PUSH_CHAIN + 1).is_none());
    }

    // ── Tangibility ──

    #[test]
    fn intangible_always_allows_and_never_moves() {
        let entities = entities_from(&["OX"]);
        let view = MapView { entities: &entities };
        for dir in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
            let p = plan_move(&view, 0, dir, 0).expect("target spot always allows");
            assert!(p.movers.is_empty());
        }
    }

    #[test]
    fn wall_never_moves() {
        let entities = entities_from(&["X "]);
        let view = MapView { entities: &entities };
        assert!(plan_move(&view, 0, Direction::Right, 0).is_none());
    }

    // ── Degenerate stacks ──

    #[test]
    fn entity_reached_twice_moves_once() {
        // Two boxes overlapping in front of the player both reach the
        // same occupant behind them; it must be planned only once.
        let entities = vec![
            Entity::new(EntityKind::Box, Coord::new(1, 0)),
            Entity::new(EntityKind::Box, Coord::new(1, 0)),
            Entity::new(EntityKind::Player, Coord::new(2, 0)),
            Entity::new(EntityKind::Player, Coord::new(0, 0)),
        ];
        let plan = plan_move(&MapView { entities: &entities }, 3, Direction::Right, 0)
            .expect("stack can advance");
        assert_eq!(plan.movers, vec![2, 0, 1, 3]);
    }

    #[test]
    fn occupants_lists_whole_stack() {
        let entities = entities_from(&[" 8 "]);
        let view = MapView { entities: &entities };
        assert_eq!(view.occupants(Coord::new(1, 0)).len(), 2);
        assert!(view.occupants(Coord::new(0, 0)).is_empty());
    }
}
