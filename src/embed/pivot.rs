//! Pivot-relative embedding.
//!
//! Probes with exactly one valid embedding ("pivots") cannot move. Every other
//! probe is re-embedded to be as close as possible, in Hamming distance, to
//! the pivot it can get closest to. Ties go to the pivot with the lowest id.

use tracing::debug;

use crate::core::chip::Chip;
use crate::core::deposition::DepositionSequence;
use crate::core::embedding::BitEmbedding;
use crate::core::error::{LayoutError, Result};
use crate::core::types::ProbeId;
use crate::embed::leftmost::leftmost_embedding;
use crate::embed::{checked_range, unsupported, ProbeEmbedder};

const UNREACHABLE: u32 = u32::MAX;

/// Number of distinct embeddings of `probe` into the deposition sequence,
/// saturating at `u64::MAX`.
///
/// Dynamic program over the steps, keeping two rows indexed by the number of
/// probe symbols consumed.
#[must_use]
pub fn number_of_embeddings(deposition: &DepositionSequence, probe: &[u8]) -> u64 {
    let len = probe.len();
    let mut previous = vec![0u64; len + 1];
    let mut current = vec![0u64; len + 1];
    previous[0] = 1;

    for &symbol in deposition.symbols() {
        current[0] = 1;
        for i in 1..=len {
            current[i] = previous[i];
            if probe[i - 1] == symbol {
                current[i] = current[i].saturating_add(previous[i - 1]);
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[len]
}

/// Scratch matrix for the closest-embedding search, reused across probes
#[derive(Debug, Default)]
struct DistanceTable {
    cost: Vec<u32>,
    target: Vec<bool>,
}

impl DistanceTable {
    /// Embedding of `probe` minimizing the Hamming distance to `target`,
    /// with that distance.
    ///
    /// `cost[i][t]` is the least number of disagreeing steps among the first
    /// `t` steps when they produce the first `i` probe symbols.
    fn closest_embedding(
        &mut self,
        deposition: &DepositionSequence,
        probe: &[u8],
        target: &BitEmbedding,
    ) -> Option<(BitEmbedding, usize)> {
        let len = probe.len();
        let steps = deposition.len();
        let width = steps + 1;

        self.target.clear();
        self.target
            .extend((0..steps).map(|t| target.is_set(t).unwrap_or(false)));
        self.cost.clear();
        self.cost.resize((len + 1) * width, UNREACHABLE);

        self.cost[0] = 0;
        for t in 1..=steps {
            self.cost[t] = self.cost[t - 1].saturating_add(u32::from(self.target[t - 1]));
        }
        for i in 1..=len {
            for t in 1..=steps {
                let set = self.target[t - 1];
                let mut best = self.cost[i * width + t - 1].saturating_add(u32::from(set));
                if probe[i - 1] == deposition.symbol(t - 1) {
                    let productive = self.cost[(i - 1) * width + t - 1].saturating_add(u32::from(!set));
                    best = best.min(productive);
                }
                self.cost[i * width + t] = best;
            }
        }

        let total = self.cost[len * width + steps];
        if total == UNREACHABLE {
            return None;
        }

        // walk back from the last step, preferring productive steps on ties
        let mut embedding = BitEmbedding::new(steps);
        let (mut i, mut t) = (len, steps);
        while i > 0 && t > 0 {
            let here = self.cost[i * width + t];
            if probe[i - 1] == deposition.symbol(t - 1) {
                let via = self.cost[(i - 1) * width + t - 1].saturating_add(u32::from(!self.target[t - 1]));
                if via == here {
                    embedding.set(t - 1).ok()?;
                    i -= 1;
                }
            }
            t -= 1;
        }

        (i == 0).then_some((embedding, total as usize))
    }
}

/// Re-embeds probes towards their closest pivot
#[derive(Debug, Clone, Copy, Default)]
pub struct PivotEmbedding;

impl PivotEmbedding {
    fn check_layout(chip: &Chip) -> Result<()> {
        if chip.layout().is_paired() {
            return Err(unsupported("PivotEmbedding", chip));
        }
        Ok(())
    }

    /// Whether probe `id` admits exactly one embedding.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for an unknown probe.
    pub fn is_pivot(chip: &Chip, id: ProbeId) -> Result<bool> {
        Ok(number_of_embeddings(chip.deposition(), chip.sequence(id)?) == 1)
    }

    fn embed_as_pivot(chip: &mut Chip, id: ProbeId) -> Result<()> {
        let embedding = leftmost_embedding(chip.deposition(), chip.sequence(id)?, None, 0)
            .ok_or_else(|| LayoutError::unembeddable(id, "deposition sequence is too short"))?;
        chip.set_embedding(id, embedding)
    }

    fn embed_towards(
        table: &mut DistanceTable,
        chip: &mut Chip,
        id: ProbeId,
        pivots: &[ProbeId],
    ) -> Result<()> {
        let mut best: Option<(BitEmbedding, usize, ProbeId)> = None;
        for &pivot in pivots {
            let target = chip.embedding(pivot)?;
            let Some((candidate, distance)) =
                table.closest_embedding(chip.deposition(), chip.sequence(id)?, target)
            else {
                return Err(LayoutError::unembeddable(id, "deposition sequence is too short"));
            };
            if best.as_ref().map_or(true, |&(_, d, p)| (distance, pivot) < (d, p)) {
                best = Some((candidate, distance, pivot));
            }
        }

        if let Some((embedding, ..)) = best {
            chip.set_embedding(id, embedding)?;
        }
        Ok(())
    }
}

impl ProbeEmbedder for PivotEmbedding {
    fn name(&self) -> &'static str {
        "PivotEmbedding"
    }

    /// Re-embed one probe against the pivots of the whole chip.
    fn reembed_probe(&self, chip: &mut Chip, id: ProbeId) -> Result<()> {
        Self::check_layout(chip)?;
        if Self::is_pivot(chip, id)? {
            return Self::embed_as_pivot(chip, id);
        }

        let mut pivots = Vec::new();
        for other in 0..chip.num_probes() {
            if Self::is_pivot(chip, other)? {
                pivots.push(other);
            }
        }
        Self::embed_towards(&mut DistanceTable::default(), chip, id, &pivots)
    }

    /// Move the pivots of `ids[first..=last]` to the front of that range, in
    /// their original order, then re-embed the remaining probes towards them.
    fn reembed_probe_set(
        &self,
        chip: &mut Chip,
        ids: &mut [ProbeId],
        first: usize,
        last: usize,
    ) -> Result<()> {
        Self::check_layout(chip)?;
        let range = checked_range(ids, first, last)?;

        let mut pivots = Vec::new();
        let mut others = Vec::new();
        for &id in range {
            if Self::is_pivot(chip, id)? {
                pivots.push(id);
            } else {
                others.push(id);
            }
        }

        debug!(
            "Pivot embedding: {} pivots, {} non-pivots",
            pivots.len(),
            others.len()
        );

        for (slot, &id) in ids[first..].iter_mut().zip(pivots.iter().chain(&others)) {
            *slot = id;
        }

        for &pivot in &pivots {
            Self::embed_as_pivot(chip, pivot)?;
        }

        if pivots.is_empty() {
            return Ok(());
        }

        let mut table = DistanceTable::default();
        for &id in &others {
            Self::embed_towards(&mut table, chip, id, &pivots)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::LayoutKind;

    fn steps(e: &BitEmbedding) -> Vec<usize> {
        e.iter_set().collect()
    }

    #[test]
    fn test_number_of_embeddings() {
        let dep = DepositionSequence::new("ACGT").unwrap();
        assert_eq!(number_of_embeddings(&dep, b"ACG"), 1);
        assert_eq!(number_of_embeddings(&dep, b"ACGT"), 1);
        assert_eq!(number_of_embeddings(&dep, b"TA"), 0);

        let dep = DepositionSequence::new("AAA").unwrap();
        assert_eq!(number_of_embeddings(&dep, b"AA"), 3);

        let dep = DepositionSequence::new("ACGTACGT").unwrap();
        // A at 0 or 4, C after it
        assert_eq!(number_of_embeddings(&dep, b"AC"), 3);
        assert_eq!(number_of_embeddings(&dep, b""), 1);
    }

    #[test]
    fn test_number_of_embeddings_saturates() {
        let dep = DepositionSequence::new(&"A".repeat(200)).unwrap();
        assert_eq!(number_of_embeddings(&dep, &[b'A'; 100]), u64::MAX);
    }

    #[test]
    fn test_closest_embedding_matches_target() {
        let dep = DepositionSequence::new("ACGTACGT").unwrap();
        let target = BitEmbedding::from_positions(8, [4, 5]).unwrap();
        let mut table = DistanceTable::default();
        let (e, d) = table.closest_embedding(&dep, b"AC", &target).unwrap();
        assert_eq!(steps(&e), vec![4, 5]);
        assert_eq!(d, 0);

        let target = BitEmbedding::from_positions(8, [5, 6]).unwrap();
        let (e, d) = table.closest_embedding(&dep, b"AC", &target).unwrap();
        assert_eq!(e.decode(&dep), b"AC".to_vec());
        assert_eq!(d, e.hamming_distance(&target));
        assert_eq!(d, 2);
    }

    #[test]
    fn test_closest_embedding_is_optimal() {
        let dep = DepositionSequence::new("ACGTACGTACGT").unwrap();
        let target = BitEmbedding::from_positions(12, [0, 5, 6, 11]).unwrap();
        let mut table = DistanceTable::default();
        let (e, d) = table.closest_embedding(&dep, b"CG", &target).unwrap();

        // brute force over every (C, G) step pair
        let best = (0..12)
            .filter(|&c| dep.symbol(c) == b'C')
            .flat_map(|c| (c + 1..12).filter(|&g| dep.symbol(g) == b'G').map(move |g| (c, g)))
            .map(|(c, g)| BitEmbedding::from_positions(12, [c, g]).unwrap().hamming_distance(&target))
            .min()
            .unwrap();
        assert_eq!(d, best);
        assert_eq!(e.hamming_distance(&target), best);
        assert_eq!(steps(&e), vec![5, 6]);
    }

    #[test]
    fn test_reembed_probe_set_moves_pivots_first() {
        // ACGTACGT: the 8-mer is a pivot, the short probes are not
        let dep = DepositionSequence::new("ACGTACGT").unwrap();
        let mut chip =
            Chip::new(1, 3, dep, LayoutKind::Single, &["GT", "ACGTACGT", "CT"]).unwrap();
        let mut ids = vec![0, 1, 2];
        PivotEmbedding.reembed_probe_set(&mut chip, &mut ids, 0, 2).unwrap();

        assert_eq!(ids, vec![1, 0, 2]);
        // GT stays as close as possible to the all-ones pivot
        assert_eq!(chip.embedding(0).unwrap().decode(chip.deposition()), b"GT".to_vec());
        assert_eq!(chip.embedding(2).unwrap().decode(chip.deposition()), b"CT".to_vec());
    }

    #[test]
    fn test_non_pivot_moves_towards_pivot() {
        let dep = DepositionSequence::new("ACAC").unwrap();
        let mut chip = Chip::new(1, 3, dep, LayoutKind::Single, &["A", "AC", "CAC"]).unwrap();
        assert!(PivotEmbedding::is_pivot(&chip, 2).unwrap());
        assert!(!PivotEmbedding::is_pivot(&chip, 0).unwrap());

        let mut ids = vec![0, 2];
        PivotEmbedding.reembed_probe_set(&mut chip, &mut ids, 0, 1).unwrap();
        assert_eq!(ids, vec![2, 0]);
        // CAC sits at steps 1,2,3; the closest A is at step 2
        assert_eq!(steps(chip.embedding(0).unwrap()), vec![2]);
    }

    #[test]
    fn test_lowest_pivot_id_wins_ties() {
        // "A" is at distance 1 from both AC (steps 0,1) and CA (steps 1,2)
        let dep = DepositionSequence::new("ACA").unwrap();
        for order in [[1, 2, 0], [2, 1, 0], [0, 2, 1]] {
            let mut chip =
                Chip::new(1, 3, dep.clone(), LayoutKind::Single, &["A", "AC", "CA"]).unwrap();
            let mut ids = order.to_vec();
            PivotEmbedding.reembed_probe_set(&mut chip, &mut ids, 0, 2).unwrap();
            assert_eq!(steps(chip.embedding(0).unwrap()), vec![0], "order {order:?}");
        }

        let mut chip = Chip::new(1, 3, dep, LayoutKind::Single, &["A", "CA", "AC"]).unwrap();
        PivotEmbedding.reembed_probe(&mut chip, 0).unwrap();
        assert_eq!(steps(chip.embedding(0).unwrap()), vec![2]);
    }

    #[test]
    fn test_no_pivots_leaves_probes_unchanged() {
        let dep = DepositionSequence::new("ACGTACGTACGT").unwrap();
        let mut chip = Chip::new(1, 2, dep, LayoutKind::Single, &["GT", "CA"]).unwrap();
        let before = chip.embedding(0).unwrap().clone();
        let mut ids = vec![0, 1];
        PivotEmbedding.reembed_probe_set(&mut chip, &mut ids, 0, 1).unwrap();
        assert_eq!(chip.embedding(0).unwrap(), &before);
    }

    #[test]
    fn test_paired_layout_is_unsupported() {
        let dep = DepositionSequence::synchronous(24);
        let mut chip = Chip::new(2, 1, dep, LayoutKind::Paired, &["ACGTA", "ACCTA"]).unwrap();
        assert!(matches!(
            PivotEmbedding.reembed_probe(&mut chip, 0),
            Err(LayoutError::UnsupportedProbeLayout { .. })
        ));
    }
}
