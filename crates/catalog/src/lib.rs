//! Asset-manifest discovery.
//!
//! Inspects a content root, discovers game sub-trees, classifies
//! their sub-folders into character-like and weapon-like pools by
//! keyword heuristics, and emits a manifest of selectable items.
//!
//! Scanning is deliberately forgiving: an unreadable root or game
//! folder yields empty pools, never an error — a display with no
//! assets renders an empty view until the next successful scan.

mod scanner;
mod types;

pub use scanner::{Catalog, display_name, is_image_file};
pub use types::{
    AssetItem, GameManifest, GameSummary, apply_enabled_snapshot, enabled_snapshot,
};
