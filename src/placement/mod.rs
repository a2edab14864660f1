//! Probe placement.
//!
//! Placement assigns ordered probe groups to the spots of a chip region. The
//! QAP placer treats a rectangular region as a quadratic assignment problem
//! between spot weights and probe distances; the sliding-window optimizer
//! re-solves small windows of an existing layout. Sequential and random
//! fillers are kept as baselines.

use crate::core::chip::Chip;
use crate::core::error::Result;
use crate::core::region::Region;
use crate::core::types::ProbeId;

pub mod distance;
pub mod engine;
pub mod fill;
pub mod grasp;
pub mod qap;
pub mod window;

pub use engine::QapPlacer;
pub use fill::{RandomFiller, SequentialFiller};
pub use grasp::{GraspConfig, GraspSolver};
pub use qap::{IdentitySolver, QapSolver, SwappedSolver};
pub use window::{OptimizeReport, OptimizerConfig, SlidingWindowOptimizer};

/// Places probe groups into the free spots of a region
pub trait RegionFiller {
    fn name(&self) -> &'static str;

    /// Place the probe groups `ids[start..=end]` into the region's free
    /// spots, returning how many could not be placed.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedRegionShape` if the filler needs a rectangular
    /// region, or `IndexOutOfRange` for bad bounds or ids.
    fn fill_region(
        &self,
        chip: &mut Chip,
        region: &Region,
        ids: &[ProbeId],
        start: usize,
        end: usize,
    ) -> Result<usize>;

    /// Empty every non-fixed spot and place all movable probe groups over
    /// the whole chip, in the given order. Returns the unplaced count.
    ///
    /// # Errors
    ///
    /// Returns any error of [`RegionFiller::fill_region`].
    fn make_layout(&self, chip: &mut Chip, ids: &[ProbeId]) -> Result<usize> {
        chip.clear_unfixed();
        if ids.is_empty() {
            return Ok(0);
        }
        let region = Region::from(chip.chip_region());
        self.fill_region(chip, &region, ids, 0, ids.len() - 1)
    }
}
