/// WorldState: everything the game loop and renderer share.
///
/// The session owns the rules; this struct adds the outer shell around
/// it: which catalogue entry is active, the level-select cursor, and
/// a transient status message.
///
/// ## Map switching
/// `open_map` loads first and swaps only on success, so a bad map file
/// leaves the current board (and player) untouched.

use log::{info, warn};

use super::event::GameEvent;
use super::level::{Catalogue, LevelError};
use super::session::Session;

/// Rows visible in the level-select list.
pub const SELECT_VISIBLE: usize = 16;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    LevelSelect,
}

pub struct WorldState {
    pub session: Session,
    pub phase: Phase,

    // ── Catalogue ──
    pub map_names: Vec<String>,
    pub current_map: usize,
    pub map_name: String,

    // ── Level select ──
    pub select_cursor: usize,
    pub select_scroll: usize,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
}

impl WorldState {
    pub fn new(catalogue: &Catalogue) -> Self {
        WorldState {
            session: Session::new(),
            phase: Phase::Playing,
            map_names: catalogue.names(),
            current_map: 0,
            map_name: String::new(),
            select_cursor: 0,
            select_scroll: 0,
            message: String::new(),
            message_timer: 0,
        }
    }

    pub fn total_maps(&self) -> usize {
        self.map_names.len()
    }

    /// Load catalogue entry `index` and switch the session to it.
    pub fn open_map(&mut self, index: usize, catalogue: &Catalogue) -> Result<Vec<GameEvent>, LevelError> {
        let loaded = catalogue.load(index)?;
        info!("opening map {} \"{}\"", index + 1, loaded.name);

        let events = self.session.switch_map(loaded.board);
        self.current_map = index;
        self.map_name = loaded.name;
        self.phase = Phase::Playing;
        self.message.clear();
        self.message_timer = 0;
        Ok(events)
    }

    /// Like `open_map`, but a failure becomes a status message.
    pub fn try_open_map(&mut self, index: usize, catalogue: &Catalogue) -> Vec<GameEvent> {
        match self.open_map(index, catalogue) {
            Ok(events) => events,
            Err(e) => {
                warn!("{e}");
                self.set_message(&format!("Cannot open map {}: {e}", index + 1), 60);
                vec![]
            }
        }
    }

    /// Next map, wrapping to the first.
    pub fn next_index(&self) -> usize {
        match self.total_maps() {
            0 => 0,
            n => (self.current_map + 1) % n,
        }
    }

    /// Previous map, wrapping to the last.
    pub fn prev_index(&self) -> usize {
        match self.total_maps() {
            0 => 0,
            n => (self.current_map + n - 1) % n,
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// Count the message down; clears it when the timer runs out.
    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }

    // ── Level select ──

    pub fn open_level_select(&mut self) {
        self.phase = Phase::LevelSelect;
        self.select_cursor = self.current_map;
        self.select_scroll = self.current_map.saturating_sub(SELECT_VISIBLE / 2);
        if self.current_map < SELECT_VISIBLE {
            self.select_scroll = 0;
        }
    }

    pub fn close_level_select(&mut self) {
        self.phase = Phase::Playing;
    }

    /// Move the cursor by `delta` rows, clamped, keeping it on screen.
    pub fn move_select_cursor(&mut self, delta: i32) {
        let total = self.total_maps();
        if total == 0 {
            return;
        }
        let target = self.select_cursor as i64 + delta as i64;
        self.select_cursor = target.clamp(0, total as i64 - 1) as usize;

        if self.select_cursor < self.select_scroll {
            self.select_scroll = self.select_cursor;
        } else if self.select_cursor >= self.select_scroll + SELECT_VISIBLE {
            self.select_scroll = self.select_cursor + 1 - SELECT_VISIBLE;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Direction;
    use std::path::Path;

    fn world() -> (WorldState, Catalogue) {
        let cat = Catalogue::embedded();
        let mut w = WorldState::new(&cat);
        w.open_map(0, &cat).unwrap();
        (w, cat)
    }

    #[test]
    fn opens_first_map() {
        let (w, _) = world();
        assert_eq!(w.current_map, 0);
        assert_eq!(w.map_name, "Map 1 - First Push");
        assert_eq!(w.total_maps(), 4);
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn first_map_is_solvable_in_two_pushes() {
        let (mut w, _) = world();
        w.session.handle_direction(Direction::Right);
        w.session.handle_direction(Direction::Right);
        let events = w.session.handle_direction(Direction::Right);
        assert!(events.contains(&GameEvent::Victory));
    }

    #[test]
    fn failed_load_keeps_current_board() {
        let (mut w, _) = world();
        w.session.handle_direction(Direction::Right);
        let player = w.session.player().position();

        let bad = Catalogue::single_file(Path::new("/nonexistent/boxpusher/x.txt"));
        let events = w.try_open_map(0, &bad);
        assert!(events.is_empty());
        assert!(!w.message.is_empty());
        assert_eq!(w.session.player().position(), player);
        assert_eq!(w.map_name, "Map 1 - First Push");
    }

    #[test]
    fn next_and_prev_wrap() {
        let (mut w, cat) = world();
        assert_eq!(w.prev_index(), 3);
        assert_eq!(w.next_index(), 1);
        w.open_map(3, &cat).unwrap();
        assert_eq!(w.next_index(), 0);
    }

    #[test]
    fn switching_map_clears_win() {
        let (mut w, cat) = world();
        for _ in 0..3 {
            w.session.handle_direction(Direction::Right);
        }
        assert!(w.session.is_won());
        w.open_map(1, &cat).unwrap();
        assert!(!w.session.is_won());
        assert_eq!(w.session.moves(), 0);
    }

    #[test]
    fn select_cursor_clamps_and_scrolls() {
        let cat = Catalogue::embedded();
        let mut w = WorldState::new(&cat);
        w.map_names = (0..40).map(|i| format!("m{i}")).collect();
        w.open_level_select();
        assert_eq!(w.phase, Phase::LevelSelect);
        w.move_select_cursor(-5);
        assert_eq!(w.select_cursor, 0);
        w.move_select_cursor(20);
        assert_eq!(w.select_cursor, 20);
        assert_eq!(w.select_scroll, 20 + 1 - SELECT_VISIBLE);
        w.move_select_cursor(100);
        assert_eq!(w.select_cursor, 39);
        w.move_select_cursor(-39);
        assert_eq!(w.select_scroll, 0);
    }

    #[test]
    fn message_times_out() {
        let (mut w, _) = world();
        w.set_message("hi", 2);
        w.tick_message();
        assert_eq!(w.message, "hi");
        w.tick_message();
        assert!(w.message.is_empty());
    }
}
