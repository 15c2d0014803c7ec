/// Level catalogue: named maps and where their text comes from.
///
/// ## Sources (priority order):
///   1. A single map file given on the command line
///   2. Built-in maps 1-4, each first looked up as `<levels_dir>/<n>.txt`
///      and falling back to the embedded copy when that file is missing
///   3. Any other `*.txt` in `levels_dir`, sorted by file name
///
/// ## Map file format (`.txt`):
///   Optional line 1: `; Map Name`
///   Remaining lines: map rows (see `Board` for the legend)
///
/// The name line is blanked before parsing so its letters never turn
/// into tiles and the rows below keep their y coordinates.

use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::board::Board;

#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("could not read map {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("map {index} is out of range (catalogue has {len})")]
    OutOfRange { index: usize, len: usize },
}

/// Where a map's text is read from.
#[derive(Clone, Debug)]
pub enum MapSource {
    Embedded(&'static str),
    File(PathBuf),
    /// Try the file; use the embedded text if it cannot be read.
    FileOr { path: PathBuf, fallback: &'static str },
}

#[derive(Clone, Debug)]
pub struct MapEntry {
    pub name: String,
    pub source: MapSource,
}

/// A fully parsed map, ready for `Session::switch_map`.
pub struct LoadedMap {
    pub name: String,
    pub board: Board,
}

pub struct Catalogue {
    entries: Vec<MapEntry>,
}

impl Catalogue {
    /// Resolve the catalogue: an explicit map file wins, otherwise
    /// built-ins (overridable from `levels_dir`) plus extra files there.
    pub fn discover(levels_dir: &Path, map_file: Option<&Path>) -> Self {
        if let Some(path) = map_file {
            return Catalogue::single_file(path);
        }

        let mut entries = builtin_entries(levels_dir);
        let extra = scan_directory(levels_dir);
        if !extra.is_empty() {
            info!("found {} extra maps in {}", extra.len(), levels_dir.display());
        }
        entries.extend(extra);
        Catalogue { entries }
    }

    pub fn single_file(path: &Path) -> Self {
        Catalogue {
            entries: vec![MapEntry {
                name: file_label(path),
                source: MapSource::File(path.to_path_buf()),
            }],
        }
    }

    #[cfg(test)]
    /// Only the embedded maps, no filesystem access.
    pub fn embedded() -> Self {
        let entries = EMBEDDED
            .iter()
            .map(|&(name, text)| MapEntry {
                name: name.to_string(),
                source: MapSource::Embedded(text),
            })
            .collect();
        Catalogue { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    /// Read and parse map `index`. A `; Name` line overrides the entry name.
    pub fn load(&self, index: usize) -> Result<LoadedMap, LevelError> {
        let entry = self.entries.get(index).ok_or(LevelError::OutOfRange {
            index,
            len: self.entries.len(),
        })?;

        let text = read_source(&entry.source)?;
        let (name, rows) = split_name(&text);
        Ok(LoadedMap {
            name: name.unwrap_or_else(|| entry.name.clone()),
            board: Board::from_text(&rows),
        })
    }
}

fn read_source(source: &MapSource) -> Result<String, LevelError> {
    match source {
        MapSource::Embedded(text) => Ok(text.to_string()),
        MapSource::File(path) => read_file(path),
        MapSource::FileOr { path, fallback } => match read_file(path) {
            Ok(text) => Ok(text),
            Err(e) => {
                if path.exists() {
                    warn!("{e}; using built-in copy");
                } else {
                    debug!("{} not found, using built-in copy", path.display());
                }
                Ok(fallback.to_string())
            }
        },
    }
}

fn read_file(path: &Path) -> Result<String, LevelError> {
    std::fs::read_to_string(path).map_err(|source| LevelError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Split off a leading `; Name` line. The line is replaced by an empty
/// row so the remaining rows keep their indices.
pub fn split_name(text: &str) -> (Option<String>, String) {
    let first = text.split('\n').next().unwrap_or("");
    let first = first.strip_suffix('\r').unwrap_or(first);

    match first.strip_prefix(';') {
        Some(rest) => {
            let name = rest.trim();
            let body = &text[text.find('\n').unwrap_or(text.len())..];
            let name = if name.is_empty() { None } else { Some(name.to_string()) };
            (name, body.to_string())
        }
        None => (None, text.to_string()),
    }
}

// ══════════════════════════════════════════════════════════════
// Directory scanning
// ══════════════════════════════════════════════════════════════

/// Built-in maps. Without a levels directory there is nothing to
/// override them, so they skip the filesystem entirely.
fn builtin_entries(levels_dir: &Path) -> Vec<MapEntry> {
    let overridable = levels_dir.is_dir();
    if !overridable {
        debug!("{} is not a directory, using built-in maps", levels_dir.display());
    }
    EMBEDDED
        .iter()
        .enumerate()
        .map(|(i, &(name, text))| MapEntry {
            name: name.to_string(),
            source: if overridable {
                MapSource::FileOr {
                    path: levels_dir.join(format!("{}.txt", i + 1)),
                    fallback: text,
                }
            } else {
                MapSource::Embedded(text)
            },
        })
        .collect()
}

/// `*.txt` files in `dir` that do not shadow a built-in, sorted by name.
fn scan_directory(dir: &Path) -> Vec<MapEntry> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![],
    };

    let builtin_names: Vec<String> = (1..=EMBEDDED.len()).map(|n| format!("{n}.txt")).collect();
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |x| x == "txt"))
        .filter(|p| {
            let file_name = p.file_name().unwrap_or_default().to_string_lossy();
            !builtin_names.iter().any(|b| *b == file_name)
        })
        .collect();
    files.sort();

    files
        .into_iter()
        .map(|path| MapEntry {
            name: file_label(&path),
            source: MapSource::File(path),
        })
        .collect()
}

fn file_label(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

// ══════════════════════════════════════════════════════════════
// Embedded maps
// ══════════════════════════════════════════════════════════════

const EMBEDDED: [(&str, &str); 4] = [
    ("Map 1 - First Push", "\
XXXXXXXX
X      X
X P B OX
X      X
XXXXXXXX
"),
    ("Map 2 - Two Corners", "\
XXXXXXX
XO    X
X  B  X
X B P X
X    OX
XXXXXXX
"),
    ("Map 3 - Already Home", "\
XXXXXXXX
X  8   X
X  B O X
X P    X
XXXXXXXX
"),
    ("Map 4 - Warehouse", "\
XXXXXXXXX
X   X   X
X B   B X
X  XXX  X
XO  P  OX
XXXXXXXXX
"),
];
