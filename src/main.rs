/// Entry point and game loop.

mod config;
mod domain;
mod logging;
mod sim;
mod ui;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use config::GameConfig;
use domain::entity::Direction;
use sim::event::GameEvent;
use sim::level::Catalogue;
use sim::world::{Phase, WorldState, SELECT_VISIBLE};
use ui::gamepad::GamepadState;
use ui::input::{Command, InputState};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

/// How long to wait for input before redrawing.
const FRAME_WAIT: Duration = Duration::from_millis(15);
/// Message timers count in these.
const TICK: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(name = "boxpusher", version, about = "Terminal box pushing puzzle")]
struct Cli {
    /// Config file to use instead of searching for config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory of *.txt maps (overrides general.levels_dir)
    #[arg(long, value_name = "DIR")]
    levels_dir: Option<PathBuf>,

    /// Map to start on, 1-based (overrides general.start_map)
    #[arg(long, value_name = "N")]
    map: Option<usize>,

    /// Play this single map file
    map_file: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => {
            println!();
            println!("Thanks for playing boxpusher!");
        }
        Err(e) => {
            eprintln!("boxpusher: {e:#}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = GameConfig::load(cli.config.as_deref());
    if let Some(dir) = cli.levels_dir {
        config.levels_dir = dir;
    }

    start_logging(&mut config);
    for w in &config.warnings {
        warn!("{w}");
    }
    info!("levels dir: {}", config.levels_dir.display());

    let catalogue = Catalogue::discover(&config.levels_dir, cli.map_file.as_deref());
    let start = cli.map.unwrap_or(config.start_map).max(1) - 1;
    let start = start.min(catalogue.len().saturating_sub(1));

    // Load the first map before touching the terminal, so a bad map file
    // is reported on a normal screen.
    let mut world = WorldState::new(&catalogue);
    let first = world
        .open_map(start, &catalogue)
        .with_context(|| format!("cannot start on map {}", start + 1))?;
    if let Some(w) = config.warnings.first() {
        world.set_message(w, 100);
    }

    let sound = if config.sound_enabled { SoundEngine::new() } else { None };

    let mut renderer = Renderer::new();
    renderer.apply(&first);
    renderer.init().context("terminal init failed")?;

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &catalogue, &config);

    // Restore the terminal before reporting anything.
    let cleanup = renderer.cleanup().context("terminal cleanup failed");
    result?;
    cleanup
}

/// Install the file logger. A log file that cannot be opened becomes a
/// config warning, so it reaches the status line.
fn start_logging(config: &mut GameConfig) {
    if !logging::init(&config.log_file, &config.log_level) {
        config.warnings.push(format!(
            "logging disabled: cannot open {}",
            config.log_file.display(),
        ));
    }
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    catalogue: &Catalogue,
    config: &GameConfig,
) -> anyhow::Result<()> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        info!("gamepad connected");
    }
    let mut pad_commands = Vec::with_capacity(4);
    let mut last_tick = Instant::now();

    loop {
        kb.wait_events(FRAME_WAIT);
        gp.update(&mut pad_commands);
        for cmd in pad_commands.drain(..) {
            kb.push(cmd);
        }

        // One command at a time, each resolved completely.
        while let Some(cmd) = kb.next_command() {
            let mut events = Vec::new();
            let quit = handle_command(world, cmd, catalogue, &mut events);
            renderer.apply(&events);
            process_sound_events(sound, &events);
            if quit {
                info!("quit");
                return Ok(());
            }
        }

        if last_tick.elapsed() >= TICK {
            world.tick_message();
            last_tick = Instant::now();
        }

        renderer.render(world)?;
    }
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::Pushed { .. } => sfx.play_push(),
            GameEvent::Blocked { .. } => sfx.play_bump(),
            GameEvent::Victory => sfx.play_win(),
            _ => {}
        }
    }
}

/// Apply one command. Events for the renderer and sound go to `events`.
/// Returns true when the game should quit.
fn handle_command(
    world: &mut WorldState,
    cmd: Command,
    catalogue: &Catalogue,
    events: &mut Vec<GameEvent>,
) -> bool {
    match world.phase {
        // ── Playing ──
        Phase::Playing => match cmd {
            Command::Move(dir) => events.extend(world.session.handle_direction(dir)),
            Command::Reset => {
                events.extend(world.session.handle_reset());
                world.set_message("Map reset", 20);
            }
            Command::NextMap => {
                let next = world.next_index();
                events.extend(world.try_open_map(next, catalogue));
            }
            Command::PrevMap => {
                let prev = world.prev_index();
                events.extend(world.try_open_map(prev, catalogue));
            }
            Command::JumpTo(index) => {
                if index < world.total_maps() {
                    events.extend(world.try_open_map(index, catalogue));
                } else {
                    world.set_message(&format!("No map {}", index + 1), 30);
                }
            }
            Command::LevelSelect => world.open_level_select(),
            Command::Confirm => {
                if world.session.is_won() {
                    let next = world.next_index();
                    events.extend(world.try_open_map(next, catalogue));
                    if next == 0 && world.total_maps() > 1 {
                        world.set_message("All maps done, back to the first", 60);
                    }
                }
            }
            Command::Cancel | Command::Quit => return true,
        },

        // ── Level Select ──
        Phase::LevelSelect => match cmd {
            Command::Move(Direction::Up) => world.move_select_cursor(-1),
            Command::Move(Direction::Down) => world.move_select_cursor(1),
            Command::PrevMap => world.move_select_cursor(-(SELECT_VISIBLE as i32)),
            Command::NextMap => world.move_select_cursor(SELECT_VISIBLE as i32),
            Command::JumpTo(index) => {
                if index < world.total_maps() {
                    events.extend(world.try_open_map(index, catalogue));
                }
            }
            Command::Confirm => {
                let index = world.select_cursor;
                events.extend(world.try_open_map(index, catalogue));
                world.close_level_select();
            }
            Command::Cancel | Command::LevelSelect => world.close_level_select(),
            Command::Move(_) | Command::Reset => {}
            Command::Quit => return true,
        },
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn world() -> (WorldState, Catalogue) {
        let cat = Catalogue::embedded();
        let mut w = WorldState::new(&cat);
        w.open_map(0, &cat).unwrap();
        (w, cat)
    }

    fn run_cmds(w: &mut WorldState, cat: &Catalogue, cmds: &[Command]) -> (Vec<GameEvent>, bool) {
        let mut events = vec![];
        for &cmd in cmds {
            if handle_command(w, cmd, cat, &mut events) {
                return (events, true);
            }
        }
        (events, false)
    }

    #[test]
    fn cli_parses_flags_and_file() {
        let cli = Cli::try_parse_from(["boxpusher", "--map", "3", "--levels-dir", "maps", "x.txt"]).unwrap();
        assert_eq!(cli.map, Some(3));
        assert_eq!(cli.levels_dir, Some(PathBuf::from("maps")));
        assert_eq!(cli.map_file, Some(PathBuf::from("x.txt")));
        assert!(cli.config.is_none());
    }

    #[test]
    fn unopenable_log_file_becomes_a_warning() {
        let mut config = GameConfig::load(Some(Path::new("/nonexistent/boxpusher/config.toml")));
        config.warnings.clear();
        config.log_file = PathBuf::from("/nonexistent/boxpusher/dir/x.log");
        start_logging(&mut config);
        assert_eq!(config.warnings.len(), 1);
        assert!(config.warnings[0].contains("/nonexistent/boxpusher/dir/x.log"));
    }

    #[test]
    fn solving_then_confirm_advances() {
        let (mut w, cat) = world();
        let right = Command::Move(Direction::Right);
        let (events, quit) = run_cmds(&mut w, &cat, &[right, right, right]);
        assert!(!quit);
        assert!(events.contains(&GameEvent::Victory));

        let (events, _) = run_cmds(&mut w, &cat, &[Command::Confirm]);
        assert_eq!(w.current_map, 1);
        assert!(matches!(events.last(), Some(GameEvent::FullRedraw { .. })));
    }

    #[test]
    fn confirm_does_nothing_before_win() {
        let (mut w, cat) = world();
        let (events, _) = run_cmds(&mut w, &cat, &[Command::Confirm]);
        assert!(events.is_empty());
        assert_eq!(w.current_map, 0);
    }

    #[test]
    fn jump_out_of_range_only_warns() {
        let (mut w, cat) = world();
        let (events, _) = run_cmds(&mut w, &cat, &[Command::JumpTo(8)]);
        assert!(events.is_empty());
        assert_eq!(w.message, "No map 9");
        run_cmds(&mut w, &cat, &[Command::JumpTo(2)]);
        assert_eq!(w.current_map, 2);
    }

    #[test]
    fn prev_from_first_wraps_to_last() {
        let (mut w, cat) = world();
        run_cmds(&mut w, &cat, &[Command::PrevMap]);
        assert_eq!(w.current_map, 3);
    }

    #[test]
    fn escape_closes_level_select_then_quits() {
        let (mut w, cat) = world();
        let (_, quit) = run_cmds(&mut w, &cat, &[Command::LevelSelect, Command::Cancel]);
        assert!(!quit);
        assert_eq!(w.phase, Phase::Playing);
        let (_, quit) = run_cmds(&mut w, &cat, &[Command::Cancel]);
        assert!(quit);
    }

    #[test]
    fn level_select_picks_map() {
        let (mut w, cat) = world();
        let down = Command::Move(Direction::Down);
        let (events, _) = run_cmds(&mut w, &cat, &[Command::LevelSelect, down, down, Command::Confirm]);
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.current_map, 2);
        assert!(!events.is_empty());
    }

    #[test]
    fn moves_are_ignored_in_level_select() {
        let (mut w, cat) = world();
        let before = w.session.player().position();
        run_cmds(&mut w, &cat, &[Command::LevelSelect, Command::Move(Direction::Right)]);
        assert_eq!(w.session.player().position(), before);
    }

    #[test]
    fn quit_works_everywhere() {
        let (mut w, cat) = world();
        assert!(run_cmds(&mut w, &cat, &[Command::Quit]).1);
        w.open_level_select();
        assert!(run_cmds(&mut w, &cat, &[Command::Quit]).1);
    }
}
