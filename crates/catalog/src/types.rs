//! Manifest data model.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One selectable asset, derived from an image file.
///
/// `enabled` defaults to true at discovery time; only controller-side
/// toggling or side-filter re-derivation mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetItem {
    /// Root-relative forward-slash path of the source image, stable
    /// across rescans and usable as a URL path component.
    pub source_id: String,
    /// Human-readable name derived from the file name.
    pub display_name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl AssetItem {
    pub fn new(source_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            display_name: display_name.into(),
            enabled: true,
        }
    }
}

/// Captures the enabled flags of a pool, keyed by source id.
///
/// Rescanning replaces pools wholesale with everything enabled; take
/// a snapshot first and reapply it after to keep the user's toggles.
pub fn enabled_snapshot(items: &[AssetItem]) -> HashMap<String, bool> {
    items
        .iter()
        .map(|i| (i.source_id.clone(), i.enabled))
        .collect()
}

/// Reapplies a snapshot onto a freshly scanned pool.
///
/// Items the snapshot does not know (newly discovered files) keep
/// their discovery-time `enabled: true`.
pub fn apply_enabled_snapshot(items: &mut [AssetItem], snapshot: &HashMap<String, bool>) {
    for item in items {
        if let Some(&enabled) = snapshot.get(&item.source_id) {
            item.enabled = enabled;
        }
    }
}

/// A discovered game folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: String,
    pub name: String,
}

/// The selectable pools for one game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameManifest {
    #[serde(rename = "game")]
    pub game_id: Option<String>,
    pub legends: Vec<AssetItem>,
    pub weapons: Vec<AssetItem>,
}
