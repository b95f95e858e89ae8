//! Side filtering for pools with a secondary binary attribute.
//!
//! Some games split a pool by faction (attackers/defenders and the
//! like). The user's manual include/exclude toggle lives in
//! `enabled_user` and is never touched by filtering; the effective
//! `enabled` flag the pick functions consume is recomputed as
//! `enabled_user AND matches the active side`, so switching the
//! filter back restores the user's exact exclusions.

use reelcast_catalog::AssetItem;

/// An asset item annotated with a side tag and the user's toggle.
#[derive(Debug, Clone, PartialEq)]
pub struct SideItem {
    pub item: AssetItem,
    /// The user's manual include/exclude choice.
    pub enabled_user: bool,
    /// Side tag; untagged items match every filter.
    pub side: Option<String>,
}

impl SideItem {
    /// Wraps a freshly scanned item; the user toggle starts from the
    /// item's discovery-time enabled flag.
    pub fn new(item: AssetItem, side: Option<String>) -> Self {
        let enabled_user = item.enabled;
        Self {
            item,
            enabled_user,
            side,
        }
    }
}

/// Recomputes each item's effective `enabled` for the active side.
///
/// `None` deactivates the filter, leaving only the user mask.
pub fn apply_side_filter(items: &mut [SideItem], active: Option<&str>) {
    for entry in items {
        let matches_side = match (active, entry.side.as_deref()) {
            (None, _) | (_, None) => true,
            (Some(active), Some(side)) => side == active,
        };
        entry.item.enabled = entry.enabled_user && matches_side;
    }
}
