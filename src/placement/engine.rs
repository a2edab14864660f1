use tracing::{debug, info};

use crate::core::chip::Chip;
use crate::core::error::Result;
use crate::core::region::Region;
use crate::core::types::{ConflictDefinition, ConflictMode, ProbeId};
use crate::embed::checked_range;
use crate::placement::distance::{apply_permutation, probe_distance, spot_distance, window_slots};
use crate::placement::qap::{compute_cost, QapSolver};
use crate::placement::RegionFiller;

/// Fills a region by solving one quadratic assignment problem over all of
/// its free spot groups
pub struct QapPlacer {
    solver: Box<dyn QapSolver>,
    mode: ConflictMode,
    definition: ConflictDefinition,
}

impl QapPlacer {
    pub fn new(solver: Box<dyn QapSolver>, mode: ConflictMode) -> Self {
        Self {
            solver,
            mode,
            definition: ConflictDefinition::default(),
        }
    }

    /// Weight table used in conflict-index mode
    #[must_use]
    pub fn with_definition(mut self, definition: ConflictDefinition) -> Self {
        self.definition = definition;
        self
    }

    #[must_use]
    pub fn mode(&self) -> ConflictMode {
        self.mode
    }
}

impl std::fmt::Debug for QapPlacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QapPlacer")
            .field("solver", &self.solver.name())
            .field("mode", &self.mode)
            .field("definition", &self.definition)
            .finish()
    }
}

impl RegionFiller for QapPlacer {
    fn name(&self) -> &'static str {
        "QapPlacer"
    }

    /// Probes past the region's capacity are left out of the problem and
    /// counted as unplaced.
    fn fill_region(
        &self,
        chip: &mut Chip,
        region: &Region,
        ids: &[ProbeId],
        start: usize,
        end: usize,
    ) -> Result<usize> {
        let rect = region.as_rectangle()?;
        let requested = checked_range(ids, start, end)?;
        let slots = window_slots(chip, rect)?;

        let dim = slots.len();
        let placed = requested.len().min(dim);
        let unplaced = requested.len() - placed;
        if unplaced > 0 {
            debug!("Region {rect} holds {dim} probe groups, {unplaced} left unplaced");
        }
        if dim == 0 {
            return Ok(unplaced);
        }
        let probes = &requested[..placed];

        let mut spots = Vec::new();
        let mut distances = Vec::new();
        spot_distance(chip, &slots, self.mode, self.definition, &mut spots);
        probe_distance(chip, probes, dim, &mut distances)?;

        let mut perm = vec![0; dim];
        self.solver.solve(dim, &spots, &distances, &mut perm)?;
        apply_permutation(chip, &slots, probes, &perm)?;
        let cost = compute_cost(dim, &spots, &distances, &perm);

        info!(
            "{} placed {} probe groups in region {} (dim {}, cost {})",
            self.solver.name(),
            placed,
            rect,
            dim,
            cost
        );
        Ok(unplaced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::deposition::DepositionSequence;
    use crate::core::error::LayoutError;
    use crate::core::region::RectangularRegion;
    use crate::core::types::LayoutKind;
    use crate::placement::grasp::GraspSolver;
    use crate::placement::qap::IdentitySolver;

    /// Sends every slot to the first probe
    struct Collapsing;

    impl QapSolver for Collapsing {
        fn name(&self) -> &'static str {
            "Collapsing"
        }

        fn solve(&self, _dim: usize, _a: &[u32], _b: &[u32], perm: &mut [usize]) -> Result<u64> {
            perm.fill(0);
            Ok(0)
        }
    }

    fn chip(rows: usize, cols: usize, probes: &[&str]) -> Chip {
        Chip::new(rows, cols, DepositionSequence::synchronous(32), LayoutKind::Single, probes)
            .unwrap()
    }

    #[test]
    fn test_identity_solver_keeps_order() {
        let mut chip = chip(2, 2, &["ACGT", "ACCT", "GGAT", "TTAC"]);
        let placer = QapPlacer::new(Box::new(IdentitySolver), ConflictMode::BorderLength);
        let region = Region::from(chip.chip_region());
        let unplaced = placer.fill_region(&mut chip, &region, &[0, 1, 2, 3], 0, 3).unwrap();

        assert_eq!(unplaced, 0);
        assert_eq!(chip.spot(0, 0).unwrap(), Some(0));
        assert_eq!(chip.spot(1, 0).unwrap(), Some(1));
        assert_eq!(chip.spot(0, 1).unwrap(), Some(2));
        assert_eq!(chip.spot(1, 1).unwrap(), Some(3));
    }

    #[test]
    fn test_excess_probes_are_unplaced() {
        let probes = ["ACGT", "ACCT", "GGAT", "TTAC", "CATG", "GCGC"];
        let mut chip = chip(2, 3, &probes);
        let placer = QapPlacer::new(Box::new(GraspSolver::default()), ConflictMode::BorderLength);
        let region = Region::from(RectangularRegion::new(0, 1, 0, 1).unwrap());
        let ids: Vec<ProbeId> = (0..6).collect();

        let unplaced = placer.fill_region(&mut chip, &region, &ids, 0, 5).unwrap();
        assert_eq!(unplaced, 2);
        assert_eq!(chip.num_placed(), 4);
        chip.validate_layout().unwrap();
    }

    #[test]
    fn test_fewer_probes_leave_empty_spots() {
        let mut chip = chip(2, 2, &["ACGT", "TTAC"]);
        let placer = QapPlacer::new(Box::new(GraspSolver::default()), ConflictMode::ConflictIndex);
        let region = Region::from(chip.chip_region());
        assert_eq!(placer.fill_region(&mut chip, &region, &[0, 1], 0, 1).unwrap(), 0);
        assert_eq!(chip.num_placed(), 2);
    }

    #[test]
    fn test_fixed_spots_are_kept() {
        let mut chip = chip(2, 2, &["ACGT", "ACCT", "GGAT", "TTAC"]);
        chip.set_spot(1, 1, Some(3)).unwrap();
        chip.set_fixed(1, 1, true).unwrap();

        let placer = QapPlacer::new(Box::new(GraspSolver::default()), ConflictMode::BorderLength);
        let ids = chip.movable_probes();
        assert_eq!(ids, vec![0, 1, 2]);
        let unplaced = placer.make_layout(&mut chip, &ids).unwrap();

        assert_eq!(unplaced, 0);
        assert_eq!(chip.spot(1, 1).unwrap(), Some(3));
        chip.validate_layout().unwrap();
    }

    #[test]
    fn test_rejects_non_rectangular_region() {
        let mut chip = chip(2, 2, &["ACGT"]);
        let placer = QapPlacer::new(Box::new(IdentitySolver), ConflictMode::BorderLength);
        let region = Region::Spots(vec![(0, 0), (1, 1)]);
        let err = placer.fill_region(&mut chip, &region, &[0], 0, 0).unwrap_err();
        assert!(matches!(err, LayoutError::UnsupportedRegionShape));
    }

    #[test]
    fn test_rejects_solver_output_that_is_not_a_permutation() {
        let mut chip = chip(2, 2, &["ACGT", "ACCT", "GGAT", "TTAC"]);
        let placer = QapPlacer::new(Box::new(Collapsing), ConflictMode::BorderLength);
        let region = Region::from(chip.chip_region());

        let err = placer.fill_region(&mut chip, &region, &[0, 1, 2, 3], 0, 3).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidPermutation { dim: 4 }));
        assert_eq!(chip.num_placed(), 0);
    }

    #[test]
    fn test_rejects_region_outside_chip() {
        let mut chip = chip(2, 2, &["ACGT", "ACCT"]);
        let placer = QapPlacer::new(Box::new(IdentitySolver), ConflictMode::BorderLength);
        let region = Region::from(RectangularRegion::new(0, 2, 0, 1).unwrap());

        let err = placer.fill_region(&mut chip, &region, &[0, 1], 0, 1).unwrap_err();
        assert!(matches!(err, LayoutError::IndexOutOfRange { index: 2, len: 2 }));
        assert_eq!(chip.num_placed(), 0);
    }

    #[test]
    fn test_inverted_region_cannot_be_built() {
        let err = RectangularRegion::new(3, 1, 0, 1).unwrap_err();
        assert!(matches!(err, LayoutError::UnsupportedRegionShape));
    }
}
