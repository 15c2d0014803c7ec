/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD, or the
/// data directories), unless `--config` names a file explicitly.
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub levels_dir: PathBuf,
    /// 1-based, as written in the file.
    pub start_map: usize,
    pub log_file: PathBuf,
    pub log_level: String,
    pub sound_enabled: bool,
    pub gamepad: GamepadConfig,
    /// Problems met while loading; logged once logging is up.
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
    pub next_map: Vec<String>,
    pub prev_map: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    sound: TomlSound,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_start_map")]
    start_map: usize,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

#[derive(Deserialize, Debug)]
struct TomlSound {
    #[serde(default = "default_true")]
    enabled: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
    #[serde(default = "default_next_map")]
    next_map: Vec<String>,
    #[serde(default = "default_prev_map")]
    prev_map: Vec<String>,
}

// ── Defaults ──

fn default_levels_dir() -> String { "levels".into() }
fn default_start_map() -> usize { 1 }
fn default_log_file() -> String { "boxpusher.log".into() }
fn default_log_level() -> String { "warn".into() }
fn default_true() -> bool { true }

fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_restart() -> Vec<String> { vec!["Y".into(), "North".into()] }
fn default_next_map() -> Vec<String> { vec!["R1".into()] }
fn default_prev_map() -> Vec<String> { vec!["L1".into()] }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            start_map: default_start_map(),
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

impl Default for TomlSound {
    fn default() -> Self {
        TomlSound { enabled: default_true() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            restart: default_restart(),
            next_map: default_next_map(),
            prev_map: default_prev_map(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `explicit`, or from `config.toml` in the first
    /// candidate directory that has one.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Self {
        let search_dirs = candidate_dirs();
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => search_dirs
                .iter()
                .map(|d| d.join("config.toml"))
                .find(|p| p.exists()),
        };

        let mut warnings = vec![];
        let toml_cfg = match path {
            Some(path) => read_toml(&path).unwrap_or_else(|e| {
                warnings.push(e);
                TomlConfig::default()
            }),
            None => TomlConfig::default(),
        };

        let mut cfg = GameConfig::resolve(toml_cfg, &search_dirs);
        cfg.warnings = warnings;
        cfg
    }

    /// Parse config text directly; paths stay relative to the CWD.
    #[cfg(test)]
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::resolve(cfg, &[]))
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let general = toml_cfg.general;

        // Resolve levels directory
        let levels_dir_str = &general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        let log_file = if PathBuf::from(&general.log_file).is_absolute() {
            PathBuf::from(&general.log_file)
        } else {
            std::env::temp_dir().join(&general.log_file)
        };

        GameConfig {
            levels_dir,
            start_map: general.start_map.max(1),
            log_file,
            log_level: general.log_level,
            sound_enabled: toml_cfg.sound.enabled,
            gamepad: GamepadConfig {
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
                restart: toml_cfg.gamepad.restart,
                next_map: toml_cfg.gamepad.next_map,
                prev_map: toml_cfg.gamepad.prev_map,
            },
            warnings: vec![],
        }
    }
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/boxpusher");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share/boxpusher");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Read and parse one config file. The error text is user-facing.
fn read_toml(path: &Path) -> Result<TomlConfig, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read {}: {e}", path.display()))?;
    toml::from_str::<TomlConfig>(&text)
        .map_err(|e| format!("{} parse error, using default settings: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.levels_dir, PathBuf::from("levels"));
        assert_eq!(cfg.start_map, 1);
        assert_eq!(cfg.log_level, "warn");
        assert!(cfg.sound_enabled);
        assert_eq!(cfg.gamepad.restart, vec!["Y".to_string(), "North".to_string()]);
        assert!(cfg.log_file.ends_with("boxpusher.log"));
        assert!(cfg.warnings.is_empty());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[general]\nstart_map = 3\n\n[sound]\nenabled = false\n\n[gamepad]\nnext_map = [\"R2\"]\n",
        )
        .unwrap();
        assert_eq!(cfg.start_map, 3);
        assert!(!cfg.sound_enabled);
        assert_eq!(cfg.gamepad.next_map, vec!["R2".to_string()]);
        assert_eq!(cfg.gamepad.prev_map, vec!["L1".to_string()]);
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn start_map_zero_is_clamped() {
        let cfg = GameConfig::from_toml_str("[general]\nstart_map = 0\n").unwrap();
        assert_eq!(cfg.start_map, 1);
    }

    #[test]
    fn absolute_paths_are_kept() {
        let cfg = GameConfig::from_toml_str(
            "[general]\nlevels_dir = \"/opt/maps\"\nlog_file = \"/var/tmp/bp.log\"\n",
        )
        .unwrap();
        assert_eq!(cfg.levels_dir, PathBuf::from("/opt/maps"));
        assert_eq!(cfg.log_file, PathBuf::from("/var/tmp/bp.log"));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(GameConfig::from_toml_str("[general\n").is_err());
    }

    #[test]
    fn unreadable_explicit_file_falls_back() {
        let cfg = GameConfig::load(Some(Path::new("/nonexistent/boxpusher/config.toml")));
        assert_eq!(cfg.start_map, 1);
        assert_eq!(cfg.warnings.len(), 1);
    }
}
