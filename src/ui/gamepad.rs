/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Move (one step per press edge)
///   Start                 →  Confirm
///   Select                →  Cancel
///   Y                     →  Reset map
///   R1 / L1               →  Next / previous map

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::entity::Direction;
use super::input::Command;

const STICK_DEADZONE: f32 = 0.5;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    L2,      // LeftTrigger2
    R2,      // RightTrigger2
    Start,
    Select,
}

const BTN_COUNT: usize = 10;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    restart: Vec<Btn>,
    next_map: Vec<Btn>,
    prev_map: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            confirm:  vec![Btn::Start],
            cancel:   vec![Btn::Select],
            restart:  vec![Btn::Y],
            next_map: vec![Btn::R1],
            prev_map: vec![Btn::L1],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Buttons that went down since the last `update`.
    just_pressed: [bool; BTN_COUNT],
    /// D-pad presses since the last `update`, in arrival order.
    dpad_presses: Vec<Direction>,

    // Stick: last digital direction, for edge detection
    stick_x: f32,
    stick_y: f32,
    stick_dir: Option<Direction>,

    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(_) => (None, false),
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            just_pressed: [false; BTN_COUNT],
            dpad_presses: Vec::with_capacity(4),
            stick_x: 0.0,
            stick_y: 0.0,
            stick_dir: None,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Lists with no known button names
    /// keep the default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        fn apply(slot: &mut Vec<Btn>, names: &[String]) {
            let parsed = parse_list(names);
            if !parsed.is_empty() {
                *slot = parsed;
            }
        }
        let map = &mut self.action_map;
        apply(&mut map.confirm, &cfg.confirm);
        apply(&mut map.cancel, &cfg.cancel);
        apply(&mut map.restart, &cfg.restart);
        apply(&mut map.next_map, &cfg.next_map);
        apply(&mut map.prev_map, &cfg.prev_map);
    }

    /// Poll the controller and append the resulting commands to `out`.
    pub fn update(&mut self, out: &mut Vec<Command>) {
        self.just_pressed = [false; BTN_COUNT];
        self.dpad_presses.clear();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();

        self.collect_commands(out);
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.press(btn);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => { self.connected = true; }
                EventType::Disconnected => {
                    self.connected = false;
                    self.stick_x = 0.0;
                    self.stick_y = 0.0;
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn press(&mut self, gilrs_btn: Button) {
        let dir = match gilrs_btn {
            Button::DPadUp    => Some(Direction::Up),
            Button::DPadDown  => Some(Direction::Down),
            Button::DPadLeft  => Some(Direction::Left),
            Button::DPadRight => Some(Direction::Right),
            _ => None,
        };
        if let Some(dir) = dir {
            self.dpad_presses.push(dir);
        } else if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.just_pressed[btn_index(btn)] = true;
        }
    }

    /// The stick counts as a direction only past the deadzone, on the
    /// dominant axis. A new direction is an edge; holding it is not.
    fn stick_edge(&mut self) -> Option<Direction> {
        let (x, y) = (self.stick_x, self.stick_y);
        let dir = if x.abs() < STICK_DEADZONE && y.abs() < STICK_DEADZONE {
            None
        } else if x.abs() >= y.abs() {
            Some(if x < 0.0 { Direction::Left } else { Direction::Right })
        } else {
            Some(if y > 0.0 { Direction::Up } else { Direction::Down })
        };

        let edge = if dir != self.stick_dir { dir } else { None };
        self.stick_dir = dir;
        edge
    }

    fn collect_commands(&mut self, out: &mut Vec<Command>) {
        for &dir in &self.dpad_presses {
            out.push(Command::Move(dir));
        }
        if let Some(dir) = self.stick_edge() {
            out.push(Command::Move(dir));
        }

        let map = &self.action_map;
        let bindings = [
            (&map.confirm, Command::Confirm),
            (&map.cancel, Command::Cancel),
            (&map.restart, Command::Reset),
            (&map.next_map, Command::NextMap),
            (&map.prev_map, Command::PrevMap),
        ];
        for (btns, cmd) in bindings {
            if btns.iter().any(|&b| self.just_pressed[btn_index(b)]) {
                out.push(cmd);
            }
        }
    }
}
