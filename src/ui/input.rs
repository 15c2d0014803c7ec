/// Keyboard input: terminal key events to game commands.
///
/// Every Press or Repeat event becomes at most one `Command`; Release
/// events are ignored. Commands are queued in arrival order and the game
/// loop resolves them one at a time, so a burst of key repeats never
/// merges into a single move.
///
/// ## Default bindings
///   Arrows / WASD          →  Move
///   R                      →  Reset map
///   N / ] / PageDown       →  Next map
///   P / [ / PageUp         →  Previous map
///   1-9                    →  Jump to map
///   L / F4                 →  Level select
///   Enter / Space          →  Confirm
///   Esc                    →  Cancel
///   Q / Ctrl+C             →  Quit

use std::collections::VecDeque;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};

use crate::domain::entity::Direction;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Move(Direction),
    Reset,
    NextMap,
    PrevMap,
    /// 0-based catalogue index.
    JumpTo(usize),
    LevelSelect,
    Confirm,
    Cancel,
    Quit,
}

pub struct InputState {
    queue: VecDeque<Command>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            queue: VecDeque::with_capacity(16),
        }
    }

    /// Drain all pending terminal events without blocking.
    pub fn drain_events(&mut self) {
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.push_key(key);
            }
        }
    }

    /// Wait up to `timeout` for the first event, then drain the rest.
    pub fn wait_events(&mut self, timeout: Duration) {
        if poll(timeout).unwrap_or(false) {
            self.drain_events();
        }
    }

    pub fn push_key(&mut self, key: KeyEvent) {
        if let Some(cmd) = command_for(&key) {
            self.queue.push_back(cmd);
        }
    }

    pub fn push(&mut self, cmd: Command) {
        self.queue.push_back(cmd);
    }

    /// Next command in arrival order.
    pub fn next_command(&mut self) -> Option<Command> {
        self.queue.pop_front()
    }
}

/// Map one key event to a command. `None` for releases and unbound keys.
pub fn command_for(key: &KeyEvent) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Command::Quit),
            _ => None,
        };
    }

    let cmd = match key.code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Command::Move(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Command::Move(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Command::Move(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Command::Move(Direction::Right),

        KeyCode::Char('r') | KeyCode::Char('R') => Command::Reset,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Char(']') | KeyCode::PageDown => Command::NextMap,
        KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Char('[') | KeyCode::PageUp => Command::PrevMap,
        KeyCode::Char(c @ '1'..='9') => Command::JumpTo(c as usize - '1' as usize),
        KeyCode::Char('l') | KeyCode::Char('L') | KeyCode::F(4) => Command::LevelSelect,

        KeyCode::Enter | KeyCode::Char(' ') => Command::Confirm,
        KeyCode::Esc => Command::Cancel,
        KeyCode::Char('q') | KeyCode::Char('Q') => Command::Quit,
        _ => return None,
    };
    Some(cmd)
}
