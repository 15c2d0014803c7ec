/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The map itself is drawn from a `ViewModel` that is fed only by
/// `GameEvent`s. The renderer never looks at the board.

use std::collections::HashMap;
use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{Coord, EntityId};
use crate::domain::kind::EntityKind;
use crate::sim::event::GameEvent;
use crate::sim::world::{Phase, WorldState, SELECT_VISIBLE};

// ── ViewModel: what the screen believes the board looks like ──

/// What to draw in one map cell, highest priority first.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Glyph {
    Player,
    BoxOnTarget,
    Box,
    Wall,
    Target,
    Floor,
}

#[derive(Default)]
pub struct ViewModel {
    width: usize,
    height: usize,
    entities: HashMap<EntityId, (EntityKind, Coord)>,
    won: bool,
}

impl ViewModel {
    pub fn apply(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::FullRedraw { width, height, entities } => {
                    self.width = *width;
                    self.height = *height;
                    self.won = false;
                    self.entities = entities
                        .iter()
                        .map(|p| (p.id, (p.kind, p.at)))
                        .collect();
                }
                GameEvent::EntityPlaced(p) => {
                    self.entities.insert(p.id, (p.kind, p.at));
                }
                GameEvent::Victory => self.won = true,
                GameEvent::VictoryCleared => self.won = false,
                GameEvent::Pushed { .. } | GameEvent::Blocked { .. } => {}
            }
        }
    }

    pub fn won(&self) -> bool {
        self.won
    }

    pub fn glyph_at(&self, at: Coord) -> Glyph {
        let mut wall = false;
        let mut target = false;
        let mut boxed = false;
        let mut player = false;
        for &(kind, pos) in self.entities.values() {
            if pos != at {
                continue;
            }
            match kind {
                EntityKind::Wall => wall = true,
                EntityKind::TargetSpot => target = true,
                EntityKind::Box => boxed = true,
                EntityKind::Player => player = true,
            }
        }

        if player {
            Glyph::Player
        } else if boxed && target {
            Glyph::BoxOnTarget
        } else if boxed {
            Glyph::Box
        } else if wall {
            Glyph::Wall
        } else if target {
            Glyph::Target
        } else {
            Glyph::Floor
        }
    }

    /// (boxes on a target spot, all boxes)
    pub fn box_tally(&self) -> (usize, usize) {
        let targets: Vec<Coord> = self
            .entities
            .values()
            .filter(|(k, _)| *k == EntityKind::TargetSpot)
            .map(|&(_, at)| at)
            .collect();
        let boxes = self.entities.values().filter(|(k, _)| *k == EntityKind::Box);
        boxes.fold((0, 0), |(placed, total), &(_, at)| {
            (placed + targets.contains(&at) as usize, total + 1)
        })
    }
}

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// gaps between rows match the cells on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column; clipped at the edge.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Renderer ──

/// Each map cell is 2 terminal columns wide.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const ACCENT: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const HI: Color = Color::Rgb { r: 80, g: 255, b: 80 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    view: ViewModel,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            view: ViewModel::default(),
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Feed session events into the view model.
    pub fn apply(&mut self, events: &[GameEvent]) {
        self.view.apply(events);
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.compose(world);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn compose(&mut self, world: &WorldState) {
        self.front.clear();
        match world.phase {
            Phase::Playing => self.compose_game(world),
            Phase::LevelSelect => self.compose_level_select(world),
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors; ResetColor would fall back to the terminal default.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, w: &WorldState) {
        let session = &w.session;

        // ── HUD row ──
        let (placed, total) = self.view.box_tally();
        let hud = format!(
            " Map {}/{}  {}   Moves:{:<5} Pushes:{:<5} Boxes:{}/{} ",
            w.current_map + 1, w.total_maps(), w.map_name,
            session.moves(), session.pushes(), placed, total,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Map, centered horizontally ──
        let map_cols = self.view.width * CELL_W;
        let left = self.front.width.saturating_sub(map_cols) / 2;
        for gy in 0..self.view.height {
            let row = MAP_ROW + gy;
            if row >= self.front.height {
                break;
            }
            for gx in 0..self.view.width {
                let col = left + gx * CELL_W;
                if col + 1 >= self.front.width {
                    break;
                }
                let glyph = self.view.glyph_at(Coord::new(gx as i32, gy as i32));
                self.compose_cell(glyph, col, row);
            }
        }

        if self.view.won() {
            self.compose_victory_overlay(left, map_cols);
        }

        // ── Message bar ──
        let msg_row = MAP_ROW + self.view.height + 1;
        if msg_row < self.front.height && !w.message.is_empty() {
            let msg = format!(" ◈ {} ", w.message);
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &msg, Color::Black, MSG_BG);
        }

        // ── Help bar ──
        let help_row = MAP_ROW + self.view.height + 3;
        if help_row < self.front.height {
            let help = " ←↑→↓/WASD:Move  R:Reset  N/P:Next/Prev  1-9:Jump  L:Levels  Q:Quit";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    /// Write the visual for one map cell at (col, row), two columns wide.
    fn compose_cell(&mut self, glyph: Glyph, col: usize, row: usize) {
        let (c0, c1, fg, bg) = match glyph {
            Glyph::Floor       => (' ', ' ', Color::Reset, Color::Reset),
            Glyph::Wall        => ('█', '█', Color::Rgb{r:120,g:120,b:120}, Color::Rgb{r:70,g:70,b:70}),
            Glyph::Target      => ('(', ')', Color::Rgb{r:255,g:120,b:120}, Color::Reset),
            Glyph::Box         => ('[', ']', Color::Rgb{r:210,g:160,b:80}, Color::Rgb{r:90,g:60,b:20}),
            Glyph::BoxOnTarget => ('{', '}', HI, Color::Rgb{r:20,g:80,b:20}),
            Glyph::Player      => ('@', '@', Color::Rgb{r:100,g:200,b:255}, Color::Reset),
        };
        self.front.set(col, row, Cell::new(c0, fg, bg));
        self.front.set(col + 1, row, Cell::new(c1, fg, bg));
    }

    fn compose_victory_overlay(&mut self, left: usize, map_cols: usize) {
        let banner = [
            "╔═══════════════╗",
            "║   YOU  WIN!   ║",
            "╚═══════════════╝",
        ];
        let hint = "ENTER: next map   R: replay";

        let banner_w = banner[0].chars().count();
        let x = left + map_cols.saturating_sub(banner_w) / 2;
        let y = MAP_ROW + self.view.height.saturating_sub(banner.len()) / 2;
        for (i, line) in banner.iter().enumerate() {
            self.front.put_str(x, y + i, line, ACCENT, Color::Rgb{r:40,g:40,b:40});
        }
        let hint_x = left + map_cols.saturating_sub(hint.chars().count()) / 2;
        self.front.put_str(hint_x, y + banner.len(), hint, HI, Color::Reset);
    }

    fn compose_level_select(&mut self, w: &WorldState) {
        let dim = Color::DarkGrey;
        let cursor_bg = Color::Rgb{r:30,g:60,b:30};

        self.front.put_str(2, 1, "╔═══════════════════════════════════╗", ACCENT, Color::Reset);
        self.front.put_str(2, 2, "║           LEVEL  SELECT           ║", ACCENT, Color::Reset);
        self.front.put_str(2, 3, "╚═══════════════════════════════════╝", ACCENT, Color::Reset);

        let list_top = 5;
        let visible = SELECT_VISIBLE.min(self.front.height.saturating_sub(list_top + 4));
        let total = w.total_maps();
        let scroll = w.select_scroll;

        if scroll > 0 {
            self.front.put_str(2, list_top - 1, "    ▲ ▲ ▲", dim, Color::Reset);
        }

        for (i, name) in w.map_names.iter().enumerate().skip(scroll).take(visible) {
            let row = list_top + (i - scroll);
            let num = format!("{:>3}.", i + 1);
            let name: String = name.chars().take(40).collect();
            let current = if i == w.current_map { " *" } else { "" };

            if i == w.select_cursor {
                for x in 0..48.min(self.front.width) {
                    self.front.set(x, row, Cell::new(' ', Color::White, cursor_bg));
                }
                self.front.put_str(2, row, "▸", HI, cursor_bg);
                self.front.put_str(3, row, &num, HI, cursor_bg);
                self.front.put_str(8, row, &format!("{name}{current}"), HI, cursor_bg);
            } else {
                self.front.put_str(3, row, &num, dim, Color::Reset);
                self.front.put_str(8, row, &format!("{name}{current}"), Color::White, Color::Reset);
            }
        }

        if scroll + visible < total {
            self.front.put_str(2, list_top + visible, "    ▼ ▼ ▼", dim, Color::Reset);
        }

        let footer_row = list_top + visible + 2;
        self.front.put_str(2, footer_row, "ENTER: Play   ↑↓: Select   PgUp/PgDn   ESC: Back", dim, Color::Reset);
        let count = format!("{}/{} maps", w.select_cursor + 1, total);
        self.front.put_str(2, footer_row + 1, &count, dim, Color::Reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Direction;
    use crate::sim::board::Board;
    use crate::sim::level::Catalogue;

    fn view_of(text: &str) -> (crate::sim::session::Session, ViewModel) {
        let mut s = crate::sim::session::Session::new();
        let mut v = ViewModel::default();
        v.apply(&s.switch_map(Board::from_text(text)));
        (s, v)
    }

    #[test]
    fn full_redraw_builds_view() {
        let (_, v) = view_of("XPBO8");
        assert_eq!((v.width, v.height), (5, 1));
        assert_eq!(v.glyph_at(Coord::new(0, 0)), Glyph::Wall);
        assert_eq!(v.glyph_at(Coord::new(1, 0)), Glyph::Player);
        assert_eq!(v.glyph_at(Coord::new(2, 0)), Glyph::Box);
        assert_eq!(v.glyph_at(Coord::new(3, 0)), Glyph::Target);
        assert_eq!(v.glyph_at(Coord::new(4, 0)), Glyph::BoxOnTarget);
        assert_eq!(v.glyph_at(Coord::new(9, 9)), Glyph::Floor);
        assert_eq!(v.box_tally(), (1, 2));
    }

    #[test]
    fn placements_track_moves() {
        let (mut s, mut v) = view_of("PB O");
        v.apply(&s.handle_direction(Direction::Right));
        assert_eq!(v.glyph_at(Coord::new(0, 0)), Glyph::Floor);
        assert_eq!(v.glyph_at(Coord::new(1, 0)), Glyph::Player);
        assert_eq!(v.glyph_at(Coord::new(2, 0)), Glyph::Box);

        v.apply(&s.handle_direction(Direction::Right));
        assert_eq!(v.glyph_at(Coord::new(3, 0)), Glyph::BoxOnTarget);
        assert!(v.won());
    }

    #[test]
    fn reset_clears_overlay_and_restores_view() {
        let (mut s, mut v) = view_of("PBO");
        v.apply(&s.handle_direction(Direction::Right));
        assert!(v.won());
        v.apply(&s.handle_reset());
        assert!(!v.won());
        assert_eq!(v.glyph_at(Coord::new(0, 0)), Glyph::Player);
        assert_eq!(v.glyph_at(Coord::new(1, 0)), Glyph::Box);
    }

    #[test]
    fn new_map_replaces_old_entities() {
        let (mut s, mut v) = view_of("XXXX\nXPBX");
        v.apply(&s.switch_map(Board::from_text("P")));
        assert_eq!((v.width, v.height), (1, 1));
        assert_eq!(v.glyph_at(Coord::new(0, 0)), Glyph::Player);
        assert_eq!(v.glyph_at(Coord::new(2, 1)), Glyph::Floor);
        assert_eq!(v.box_tally(), (0, 0));
    }

    #[test]
    fn put_str_clips_at_edge() {
        let mut fb = FrameBuffer::new(4, 1);
        fb.put_str(2, 0, "abc", Color::White, Color::Reset);
        assert_eq!(fb.get(2, 0).ch, 'a');
        assert_eq!(fb.get(3, 0).ch, 'b');
        assert_eq!(fb.get(1, 0), Cell::BLANK);
        assert_eq!(fb.get(3, 0).bg, Cell::BASE_BG);
    }

    #[test]
    fn game_frame_draws_centered_map_and_hud() {
        let cat = Catalogue::embedded();
        let mut world = WorldState::new(&cat);
        let events = world.open_map(0, &cat).unwrap();

        let mut r = Renderer::new();
        r.apply(&events);
        r.front.resize(40, 12);
        r.compose(&world);

        // Map 1 is 8 cells = 16 columns wide, so it starts at column 12.
        assert_eq!(r.front.get(12, MAP_ROW).ch, '█');
        assert_eq!(r.front.get(11, MAP_ROW), Cell::BLANK);
        let hud: String = (0..12).map(|x| r.front.get(x, HUD_ROW).ch).collect();
        assert_eq!(hud, " Map 1/4  Ma");
    }

    #[test]
    fn level_select_marks_cursor() {
        let cat = Catalogue::embedded();
        let mut world = WorldState::new(&cat);
        world.open_level_select();
        world.move_select_cursor(2);

        let mut r = Renderer::new();
        r.front.resize(60, 30);
        r.compose(&world);
        assert_eq!(r.front.get(2, 5 + 2).ch, '▸');
        assert_eq!(r.front.get(2, 5).ch, ' ');
    }
}
