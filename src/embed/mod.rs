//! Probe embedding strategies.
//!
//! An embedding strategy chooses, for each probe, which synthesis steps of
//! the deposition sequence produce its bases. Strategies differ in where they
//! put the masked steps:
//!
//! - [`LeftMostEmbedding`]: every base as early as possible
//! - [`RightMostEmbedding`]: every base as late as possible
//! - [`CenteredEmbedding`]: left-most, shifted to center the productive steps
//! - [`PivotEmbedding`]: as close as possible to a probe with a unique embedding
//! - [`SnpPairEmbedding`]: SNP mates share every step outside their mismatch

use crate::core::chip::Chip;
use crate::core::error::{LayoutError, Result};
use crate::core::types::{EmbeddingKind, ProbeId};

pub mod centered;
pub mod leftmost;
pub mod pivot;
pub mod rightmost;
pub mod snp;

pub use centered::CenteredEmbedding;
pub use leftmost::LeftMostEmbedding;
pub use pivot::PivotEmbedding;
pub use rightmost::RightMostEmbedding;
pub use snp::SnpPairEmbedding;

/// A strategy that (re)computes probe embeddings in place
pub trait ProbeEmbedder: Send + Sync {
    /// Name used in logs and reports
    fn name(&self) -> &'static str;

    /// Re-embed a single probe.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedProbeLayout` if the chip's layout is not handled
    /// by this strategy, or `IndexOutOfRange` for an unknown probe.
    fn reembed_probe(&self, chip: &mut Chip, id: ProbeId) -> Result<()>;

    /// Re-embed `ids[first..=last]`. Strategies may reorder that slice.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `last` is outside `ids`, or any error of
    /// [`ProbeEmbedder::reembed_probe`].
    fn reembed_probe_set(
        &self,
        chip: &mut Chip,
        ids: &mut [ProbeId],
        first: usize,
        last: usize,
    ) -> Result<()> {
        for &id in checked_range(ids, first, last)? {
            self.reembed_probe(chip, id)?;
        }
        Ok(())
    }

    /// Re-embed every probe on the chip.
    ///
    /// # Errors
    ///
    /// Returns any error of [`ProbeEmbedder::reembed_probe_set`].
    fn reembed_chip(&self, chip: &mut Chip) -> Result<()> {
        let mut ids: Vec<ProbeId> = (0..chip.num_probes()).collect();
        if ids.is_empty() {
            return Ok(());
        }
        let last = ids.len() - 1;
        self.reembed_probe_set(chip, &mut ids, 0, last)
    }
}

/// Strategy object for a configured embedding kind
#[must_use]
pub fn embedder_for(kind: EmbeddingKind) -> Box<dyn ProbeEmbedder> {
    match kind {
        EmbeddingKind::LeftMost => Box::new(LeftMostEmbedding),
        EmbeddingKind::RightMost => Box::new(RightMostEmbedding),
        EmbeddingKind::Centered => Box::new(CenteredEmbedding),
        EmbeddingKind::Pivot => Box::new(PivotEmbedding),
        EmbeddingKind::SnpLeftMost => Box::new(SnpPairEmbedding::left_most()),
        EmbeddingKind::SnpRightMost => Box::new(SnpPairEmbedding::right_most()),
    }
}

/// `ids[first..=last]`, empty when `first > last`
pub(crate) fn checked_range(ids: &[ProbeId], first: usize, last: usize) -> Result<&[ProbeId]> {
    if first > last {
        return Ok(&[]);
    }
    if last >= ids.len() {
        return Err(LayoutError::out_of_range(last, ids.len()));
    }
    Ok(&ids[first..=last])
}

pub(crate) fn unsupported(strategy: &'static str, chip: &Chip) -> LayoutError {
    LayoutError::UnsupportedProbeLayout {
        strategy,
        layout: match chip.layout().kind() {
            crate::core::types::LayoutKind::Single => "single",
            crate::core::types::LayoutKind::Paired => "paired",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::deposition::DepositionSequence;
    use crate::core::types::LayoutKind;

    #[test]
    fn test_checked_range() {
        let ids = [4, 5, 6];
        assert_eq!(checked_range(&ids, 1, 2).unwrap(), &[5, 6]);
        assert!(checked_range(&ids, 2, 1).unwrap().is_empty());
        assert!(matches!(
            checked_range(&ids, 0, 3),
            Err(LayoutError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_every_strategy_produces_valid_embeddings() {
        let dep = DepositionSequence::synchronous(24);
        let probes = ["ACGT", "ACCT", "GGA", "TTAC", "CATG"];
        for kind in [
            EmbeddingKind::LeftMost,
            EmbeddingKind::RightMost,
            EmbeddingKind::Centered,
            EmbeddingKind::Pivot,
            EmbeddingKind::SnpLeftMost,
            EmbeddingKind::SnpRightMost,
        ] {
            let mut chip = Chip::new(2, 3, dep.clone(), LayoutKind::Single, &probes).unwrap();
            let embedder = embedder_for(kind);
            embedder.reembed_chip(&mut chip).unwrap();
            for (id, probe) in probes.iter().enumerate() {
                let decoded = chip.embedding(id).unwrap().decode(chip.deposition());
                assert_eq!(decoded, probe.as_bytes(), "{} broke probe {id}", embedder.name());
            }
        }
    }
}
