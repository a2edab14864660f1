//! Baseline fillers that ignore probe similarity.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::core::chip::Chip;
use crate::core::error::{LayoutError, Result};
use crate::core::region::Region;
use crate::core::types::ProbeId;
use crate::embed::checked_range;
use crate::placement::distance::{window_slots, Slot};
use crate::placement::RegionFiller;

/// Free probe-group slots of any region shape. Arbitrary spot sets are
/// taken in the given order, each spot as the top row of a group.
fn region_slots(chip: &Chip, region: &Region) -> Result<Vec<Slot>> {
    match region {
        Region::Rectangular(rect) => window_slots(chip, rect),
        Region::Spots(spots) => {
            let rpp = chip.layout().rows_per_probe();
            let bounds = chip.chip_region();
            let mut slots = Vec::with_capacity(spots.len());
            for &(row, col) in spots {
                let bottom = row + rpp - 1;
                if !bounds.contains(bottom, col) {
                    return Err(if bottom >= chip.rows() {
                        LayoutError::out_of_range(bottom, chip.rows())
                    } else {
                        LayoutError::out_of_range(col, chip.cols())
                    });
                }
                let mut free = true;
                for r in row..row + rpp {
                    free &= !chip.is_fixed(r, col)?;
                }
                if free {
                    slots.push(Slot { row, col });
                }
            }
            Ok(slots)
        }
    }
}

fn place_in_order(chip: &mut Chip, slots: &[Slot], probes: &[ProbeId]) -> Result<usize> {
    for (slot, &id) in slots.iter().zip(probes) {
        chip.place_group(slot.row, slot.col, Some(id))?;
    }
    Ok(probes.len().saturating_sub(slots.len()))
}

/// Places probes in list order, down each column of the region
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialFiller;

impl RegionFiller for SequentialFiller {
    fn name(&self) -> &'static str {
        "SequentialFiller"
    }

    fn fill_region(
        &self,
        chip: &mut Chip,
        region: &Region,
        ids: &[ProbeId],
        start: usize,
        end: usize,
    ) -> Result<usize> {
        let probes = checked_range(ids, start, end)?;
        let slots = region_slots(chip, region)?;
        place_in_order(chip, &slots, probes)
    }
}

/// Places probes on randomly chosen free spots of the region
#[derive(Debug, Clone, Copy)]
pub struct RandomFiller {
    seed: u64,
}

impl RandomFiller {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl RegionFiller for RandomFiller {
    fn name(&self) -> &'static str {
        "RandomFiller"
    }

    fn fill_region(
        &self,
        chip: &mut Chip,
        region: &Region,
        ids: &[ProbeId],
        start: usize,
        end: usize,
    ) -> Result<usize> {
        let probes = checked_range(ids, start, end)?;
        let mut slots = region_slots(chip, region)?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        slots.shuffle(&mut rng);
        debug!("Shuffled {} slots with seed {}", slots.len(), self.seed);
        place_in_order(chip, &slots, probes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::deposition::DepositionSequence;
    use crate::core::types::LayoutKind;

    fn chip(kind: LayoutKind, rows: usize, probes: &[&str]) -> Chip {
        Chip::new(rows, 2, DepositionSequence::synchronous(24), kind, probes).unwrap()
    }

    #[test]
    fn test_sequential_column_major() {
        let mut chip = chip(LayoutKind::Single, 2, &["A", "C", "G"]);
        let region = Region::from(chip.chip_region());
        let unplaced = SequentialFiller.fill_region(&mut chip, &region, &[2, 0, 1], 0, 2).unwrap();
        assert_eq!(unplaced, 0);
        assert_eq!(chip.spot(0, 0).unwrap(), Some(2));
        assert_eq!(chip.spot(1, 0).unwrap(), Some(0));
        assert_eq!(chip.spot(0, 1).unwrap(), Some(1));
        assert_eq!(chip.spot(1, 1).unwrap(), None);
    }

    #[test]
    fn test_sequential_spot_region_and_overflow() {
        let mut chip = chip(LayoutKind::Single, 2, &["A", "C", "G"]);
        chip.set_fixed(0, 1, true).unwrap();
        let region = Region::Spots(vec![(1, 1), (0, 1), (0, 0)]);
        let unplaced = SequentialFiller.fill_region(&mut chip, &region, &[0, 1, 2], 0, 2).unwrap();
        assert_eq!(unplaced, 1);
        assert_eq!(chip.spot(1, 1).unwrap(), Some(0));
        assert_eq!(chip.spot(0, 0).unwrap(), Some(1));
        assert_eq!(chip.spot(0, 1).unwrap(), None);
    }

    #[test]
    fn test_spot_region_outside_chip() {
        let mut single = chip(LayoutKind::Single, 2, &["A", "C"]);
        let region = Region::Spots(vec![(0, 0), (0, 2)]);
        let err = SequentialFiller.fill_region(&mut single, &region, &[0, 1], 0, 1).unwrap_err();
        assert!(matches!(err, LayoutError::IndexOutOfRange { index: 2, len: 2 }));
        assert_eq!(single.num_placed(), 0);

        let mut paired = chip(LayoutKind::Paired, 2, &["ACGA", "ACCA"]);
        let region = Region::Spots(vec![(1, 0)]);
        let err = SequentialFiller.fill_region(&mut paired, &region, &[0], 0, 0).unwrap_err();
        assert!(matches!(err, LayoutError::IndexOutOfRange { index: 2, len: 2 }));
    }

    #[test]
    fn test_random_is_seeded() {
        let probes = ["A", "C", "G", "T"];
        let ids = [0, 1, 2, 3];
        let mut first = chip(LayoutKind::Single, 2, &probes);
        let mut second = chip(LayoutKind::Single, 2, &probes);
        RandomFiller::new(3).make_layout(&mut first, &ids).unwrap();
        RandomFiller::new(3).make_layout(&mut second, &ids).unwrap();

        for row in 0..2 {
            for col in 0..2 {
                assert_eq!(first.spot(row, col).unwrap(), second.spot(row, col).unwrap());
            }
        }
        assert_eq!(first.num_placed(), 4);
        first.validate_layout().unwrap();
    }

    #[test]
    fn test_paired_groups() {
        let mut chip = chip(LayoutKind::Paired, 2, &["ACGA", "ACCA", "TTGC", "TTCC"]);
        let ids = chip.movable_probes();
        assert_eq!(ids, vec![0, 2]);
        SequentialFiller.make_layout(&mut chip, &ids).unwrap();
        assert_eq!(chip.spot(0, 0).unwrap(), Some(0));
        assert_eq!(chip.spot(1, 0).unwrap(), Some(1));
        assert_eq!(chip.spot(0, 1).unwrap(), Some(2));
        assert_eq!(chip.spot(1, 1).unwrap(), Some(3));
        chip.validate_layout().unwrap();
    }
}
