use crate::core::chip::Chip;
use crate::core::deposition::{complement, DepositionSequence};
use crate::core::embedding::BitEmbedding;
use crate::core::error::{LayoutError, Result};
use crate::core::types::ProbeId;
use crate::embed::ProbeEmbedder;

/// Mirror of [`leftmost_embedding`](crate::embed::leftmost::leftmost_embedding):
/// every base at the latest possible step, ignoring the last `shift` steps.
pub(crate) fn rightmost_embedding(
    deposition: &DepositionSequence,
    probe: &[u8],
    middle: Option<usize>,
    shift: usize,
) -> Option<BitEmbedding> {
    let mut embedding = BitEmbedding::new(deposition.len());
    let mut upper = deposition.len().checked_sub(shift + 1);

    for (i, &symbol) in probe.iter().enumerate().rev() {
        let from = upper?;
        let pos = deposition.find_backward(symbol, from)?;
        let lowest = if middle == Some(i) {
            pos.min(deposition.find_backward(complement(symbol), from)?)
        } else {
            pos
        };
        upper = lowest.checked_sub(1);
        embedding.set(pos).ok()?;
    }

    Some(embedding)
}

/// Right-most embedding: every base as late as possible
#[derive(Debug, Clone, Copy, Default)]
pub struct RightMostEmbedding;

impl RightMostEmbedding {
    /// Right-most embed probe `id`, ignoring the last `shift` steps.
    ///
    /// # Errors
    ///
    /// Returns `Unembeddable` if the probe no longer fits after the shift.
    pub fn reembed_probe_shifted(&self, chip: &mut Chip, id: ProbeId, shift: usize) -> Result<()> {
        let middle = chip.layout().middle_base();
        let embedding = rightmost_embedding(chip.deposition(), chip.sequence(id)?, middle, shift)
            .ok_or_else(|| {
                LayoutError::unembeddable(id, format!("no right-most embedding with shift {shift}"))
            })?;
        chip.set_embedding(id, embedding)
    }
}

impl ProbeEmbedder for RightMostEmbedding {
    fn name(&self) -> &'static str {
        "RightMostEmbedding"
    }

    fn reembed_probe(&self, chip: &mut Chip, id: ProbeId) -> Result<()> {
        self.reembed_probe_shifted(chip, id, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::leftmost::leftmost_embedding;

    fn steps(e: &BitEmbedding) -> Vec<usize> {
        e.iter_set().collect()
    }

    #[test]
    fn test_rightmost_acg() {
        let dep = DepositionSequence::new("ACGTACGT").unwrap();
        let e = rightmost_embedding(&dep, b"ACG", None, 0).unwrap();
        assert_eq!(steps(&e), vec![4, 5, 6]);
    }

    #[test]
    fn test_rightmost_with_shift() {
        let dep = DepositionSequence::new("ACGTACGTACGT").unwrap();
        let e = rightmost_embedding(&dep, b"ACG", None, 2).unwrap();
        assert_eq!(steps(&e), vec![4, 5, 6]);
        assert!(rightmost_embedding(&dep, b"ACG", None, 10).is_none());
        assert!(rightmost_embedding(&dep, b"ACG", None, 12).is_none());
    }

    #[test]
    fn test_rightmost_mirrors_leftmost() {
        let forward = "ACGTTGCAAGCTTCGA";
        let reversed: String = forward.chars().rev().collect();
        let dep = DepositionSequence::new(forward).unwrap();
        let rev_dep = DepositionSequence::new(&reversed).unwrap();

        for probe in ["ACG", "TTA", "GCAT", "CC"] {
            let rev_probe: Vec<u8> = probe.bytes().rev().collect();
            let right = rightmost_embedding(&dep, probe.as_bytes(), None, 0).unwrap();
            let left = leftmost_embedding(&rev_dep, &rev_probe, None, 0).unwrap();

            let mirrored: Vec<usize> = steps(&left).into_iter().rev().map(|p| 15 - p).collect();
            assert_eq!(steps(&right), mirrored, "probe {probe}");
        }
    }

    #[test]
    fn test_pair_aware_middle() {
        let dep = DepositionSequence::new("TGCATGCATGCA").unwrap();
        let pm = rightmost_embedding(&dep, b"TGA", Some(1), 0).unwrap();
        let mm = rightmost_embedding(&dep, b"TCA", Some(1), 0).unwrap();
        assert_eq!(steps(&pm), vec![8, 9, 11]);
        assert_eq!(steps(&mm), vec![8, 10, 11]);
    }
}
