//! Randomized-selection engine.
//!
//! Pure functions deciding what a "spin" produces: pick one or two
//! items from a pool honoring the per-item enabled mask. Callers pass
//! the rng, so outcomes are reproducible in tests and a spin is
//! computed exactly once — every consumer of one spin sees the same
//! [`SelectionPlan`].

mod engine;
mod side;

pub use engine::{SelectionPlan, pick_one, pick_two_distinct, plan_spin};
pub use side::{SideItem, apply_side_filter};
