//! Pick functions and spin plans.

use rand::Rng;
use serde::{Deserialize, Serialize};

use reelcast_catalog::AssetItem;

/// The outcome of one spin, carried opaquely inside a command payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon1_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon2_id: Option<String>,
}

/// The pool a pick draws from: enabled items, or the whole list when
/// the user disabled everything — a spin always lands on something
/// rather than failing.
fn eligible<'a>(items: &'a [AssetItem]) -> Vec<&'a AssetItem> {
    let enabled: Vec<&AssetItem> = items.iter().filter(|i| i.enabled).collect();
    if enabled.is_empty() {
        items.iter().collect()
    } else {
        enabled
    }
}

/// Picks one item uniformly at random from the eligible pool.
/// Returns `None` only when the list itself is empty.
pub fn pick_one<'a, R: Rng + ?Sized>(rng: &mut R, items: &'a [AssetItem]) -> Option<&'a AssetItem> {
    let pool = eligible(items);
    if pool.is_empty() {
        return None;
    }
    Some(pool[rng.gen_range(0..pool.len())])
}

/// Picks an ordered pair of distinct items from the eligible pool.
///
/// A pool of one returns that item twice (accepted outcome, not an
/// error); an empty list returns `None` twice. For `n >= 2` the
/// second index is drawn from `[0, n-1)` and shifted past the first
/// when it collides, which is uniform over all ordered pairs of
/// distinct indices without rejection sampling.
pub fn pick_two_distinct<'a, R: Rng + ?Sized>(
    rng: &mut R,
    items: &'a [AssetItem],
) -> (Option<&'a AssetItem>, Option<&'a AssetItem>) {
    let pool = eligible(items);
    match pool.len() {
        0 => (None, None),
        1 => (Some(pool[0]), Some(pool[0])),
        n => {
            let first = rng.gen_range(0..n);
            let mut second = rng.gen_range(0..n - 1);
            if second >= first {
                second += 1;
            }
            (Some(pool[first]), Some(pool[second]))
        }
    }
}

/// Computes a full spin outcome: one legend, two distinct weapons.
pub fn plan_spin<R: Rng + ?Sized>(
    rng: &mut R,
    legends: &[AssetItem],
    weapons: &[AssetItem],
) -> SelectionPlan {
    let legend = pick_one(rng, legends);
    let (weapon1, weapon2) = pick_two_distinct(rng, weapons);
    SelectionPlan {
        legend_id: legend.map(|i| i.source_id.clone()),
        weapon1_id: weapon1.map(|i| i.source_id.clone()),
        weapon2_id: weapon2.map(|i| i.source_id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    fn items(n: usize) -> Vec<AssetItem> {
        (0..n)
            .map(|i| AssetItem::new(format!("pool/item{i}.png"), format!("Item{i}")))
            .collect()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    // -----------------------------------------------------------------------
    // pick_one
    // -----------------------------------------------------------------------

    #[test]
    fn pick_one_empty_list_is_none() {
        assert!(pick_one(&mut rng(), &[]).is_none());
    }

    #[test]
    fn pick_one_honors_enabled_mask() {
        let mut pool = items(5);
        for item in &mut pool {
            item.enabled = false;
        }
        pool[2].enabled = true;

        let mut r = rng();
        for _ in 0..100 {
            let picked = pick_one(&mut r, &pool).unwrap();
            assert_eq!(picked.source_id, pool[2].source_id);
        }
    }

    #[test]
    fn pick_one_all_disabled_falls_back_to_full_list() {
        let mut pool = items(3);
        for item in &mut pool {
            item.enabled = false;
        }
        // Still produces an outcome instead of failing.
        assert!(pick_one(&mut rng(), &pool).is_some());
    }

    // -----------------------------------------------------------------------
    // pick_two_distinct
    // -----------------------------------------------------------------------

    #[test]
    fn pick_two_empty_list_is_none_twice() {
        let (a, b) = pick_two_distinct(&mut rng(), &[]);
        assert!(a.is_none());
        assert!(b.is_none());
    }

    #[test]
    fn pick_two_single_item_duplicates() {
        let pool = items(1);
        let (a, b) = pick_two_distinct(&mut rng(), &pool);
        assert_eq!(a.unwrap().source_id, pool[0].source_id);
        assert_eq!(b.unwrap().source_id, pool[0].source_id);
    }

    #[test]
    fn pick_two_single_enabled_duplicates() {
        let mut pool = items(4);
        for item in &mut pool {
            item.enabled = false;
        }
        pool[1].enabled = true;

        let (a, b) = pick_two_distinct(&mut rng(), &pool);
        assert_eq!(a.unwrap().source_id, pool[1].source_id);
        assert_eq!(b.unwrap().source_id, pool[1].source_id);
    }

    #[test]
    fn pick_two_always_distinct() {
        let pool = items(4);
        let mut r = rng();
        for _ in 0..10_000 {
            let (a, b) = pick_two_distinct(&mut r, &pool);
            assert_ne!(a.unwrap().source_id, b.unwrap().source_id);
        }
    }

    #[test]
    fn pick_two_uniform_over_ordered_pairs() {
        // 4 items → 12 ordered pairs; 10k trials → ~833 each. The rng
        // is seeded, so the observed counts are deterministic; the
        // bounds leave ~5 standard deviations of slack.
        let pool = items(4);
        let mut r = rng();
        let mut counts: HashMap<(String, String), u32> = HashMap::new();
        for _ in 0..10_000 {
            let (a, b) = pick_two_distinct(&mut r, &pool);
            *counts
                .entry((a.unwrap().source_id.clone(), b.unwrap().source_id.clone()))
                .or_default() += 1;
        }

        assert_eq!(counts.len(), 12);
        for (pair, count) in counts {
            assert!(
                (690..=980).contains(&count),
                "pair {pair:?} count {count} outside uniform tolerance"
            );
        }
    }

    // -----------------------------------------------------------------------
    // plan_spin
    // -----------------------------------------------------------------------

    #[test]
    fn plan_spin_fills_all_slots() {
        let legends = items(3);
        let weapons = items(5);
        let plan = plan_spin(&mut rng(), &legends, &weapons);

        assert!(plan.legend_id.is_some());
        let w1 = plan.weapon1_id.unwrap();
        let w2 = plan.weapon2_id.unwrap();
        assert_ne!(w1, w2);
    }

    #[test]
    fn plan_spin_with_empty_pools() {
        let plan = plan_spin(&mut rng(), &[], &[]);
        assert_eq!(plan, SelectionPlan::default());
    }

    #[test]
    fn plan_wire_shape() {
        let plan = SelectionPlan {
            legend_id: Some("a/wraith.svg".into()),
            weapon1_id: Some("a/r99.png".into()),
            weapon2_id: None,
        };
        let json = serde_json::to_string(&plan).unwrap();
        assert_eq!(
            json,
            r#"{"legendId":"a/wraith.svg","weapon1Id":"a/r99.png"}"#
        );
    }
}
