//! Content-root scanning and item derivation.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::types::{AssetItem, GameManifest, GameSummary};

/// Image extensions that become selectable items.
const IMAGE_EXTENSIONS: &[&str] = &["png", "svg", "jpg", "jpeg", "webp", "gif"];

/// A folder whose lowercased name contains one of these holds
/// character-like assets.
const CHARACTER_KEYWORDS: &[&str] = &[
    "character", "legend", "hero", "agent", "operator", "champion",
];

/// Likewise for weapon-like assets.
const WEAPON_KEYWORDS: &[&str] = &[
    "weapon", "gun", "rifle", "smg", "shotgun", "lmg", "pistol", "sniper", "melee", "bow",
];

/// Vendor suffix tokens stripped from display names.
const NAME_NOISE_TOKENS: &[&str] = &["mobile", "icon"];

/// Scans a content root for games and their selectable asset pools.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
    preferred_game: String,
}

impl Catalog {
    /// `preferred_game` is the fallback game id used when a manifest
    /// is requested without naming one.
    pub fn new(root: impl Into<PathBuf>, preferred_game: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            preferred_game: preferred_game.into(),
        }
    }

    /// Enumerates immediate subdirectories of the root as games,
    /// sorted by id for a stable notion of "first".
    pub fn discover_games(&self) -> Vec<GameSummary> {
        list_subdirs(&self.root)
            .into_iter()
            .map(|id| {
                let name = display_name(&id);
                GameSummary { id, name }
            })
            .collect()
    }

    /// Builds the manifest for a game.
    ///
    /// Falls back from the requested id to the preferred default, then
    /// to the first discovered game; with nothing discovered at all,
    /// returns an empty manifest. Each call re-reads the filesystem
    /// wholesale — callers that need to keep user toggles must
    /// snapshot and reapply them.
    pub fn manifest(&self, game: Option<&str>) -> GameManifest {
        let games = self.discover_games();
        let chosen = game
            .filter(|id| games.iter().any(|g| g.id == *id))
            .map(str::to_string)
            .or_else(|| {
                games
                    .iter()
                    .find(|g| g.id == self.preferred_game)
                    .map(|g| g.id.clone())
            })
            .or_else(|| games.first().map(|g| g.id.clone()));

        let Some(chosen) = chosen else {
            debug!(root = %self.root.display(), "no games discovered, empty manifest");
            return GameManifest::default();
        };

        let game_root = self.root.join(&chosen);
        let mut legends = Vec::new();
        let mut weapons = Vec::new();

        // A folder can feed both pools when its name matches both
        // keyword sets; one matching neither contributes nothing.
        for dir in list_subdirs(&game_root) {
            let lower = dir.to_lowercase();
            let prefix = format!("{chosen}/{dir}");
            if CHARACTER_KEYWORDS.iter().any(|k| lower.contains(k)) {
                legends.extend(list_items(&game_root.join(&dir), &prefix));
            }
            if WEAPON_KEYWORDS.iter().any(|k| lower.contains(k)) {
                weapons.extend(list_items(&game_root.join(&dir), &prefix));
            }
        }

        GameManifest {
            game_id: Some(chosen),
            legends,
            weapons,
        }
    }
}

/// Lists immediate subdirectory names, sorted. Unreadable directories
/// yield an empty list.
fn list_subdirs(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        debug!(dir = %dir.display(), "directory unreadable, skipping");
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .flatten()
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    names.sort();
    names
}

/// Lists a directory's image files as asset items, sorted by file
/// name. `prefix` is the root-relative path of the directory.
fn list_items(dir: &Path, prefix: &str) -> Vec<AssetItem> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .flatten()
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| is_image_file(name))
        .collect();
    names.sort();
    names
        .into_iter()
        .map(|name| AssetItem::new(format!("{prefix}/{name}"), display_name(&name)))
        .collect()
}

/// Whether a file name carries an allow-listed image extension.
pub fn is_image_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
}

/// Derives a human-readable name from a file or folder name.
///
/// Strips the extension, drops `mobile`/`icon` vendor tokens,
/// collapses `_`/`-`/whitespace runs to single spaces, and
/// capitalizes each word: `r99_icon.png` → `R99`.
pub fn display_name(file_name: &str) -> String {
    let base = match file_name.rsplit_once('.') {
        Some((base, ext)) if IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()) => base,
        _ => file_name,
    };

    base.split(['_', '-', ' '])
        .filter(|token| !token.is_empty())
        .filter(|token| !NAME_NOISE_TOKENS.iter().any(|n| token.eq_ignore_ascii_case(n)))
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
