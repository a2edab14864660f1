use crate::core::chip::Chip;
use crate::core::deposition::{complement, DepositionSequence};
use crate::core::embedding::BitEmbedding;
use crate::core::error::{LayoutError, Result};
use crate::core::types::ProbeId;
use crate::embed::ProbeEmbedder;

/// Embed `probe` with every base at the earliest possible step at or after
/// step `shift`.
///
/// With a `middle` index (paired layouts), the scan after the middle base
/// resumes past the first steps realizing both the base and its complement,
/// so both probes of a pair share every step but the middle one.
///
/// Returns `None` if the deposition sequence is too short.
pub(crate) fn leftmost_embedding(
    deposition: &DepositionSequence,
    probe: &[u8],
    middle: Option<usize>,
    shift: usize,
) -> Option<BitEmbedding> {
    let mut embedding = BitEmbedding::new(deposition.len());
    let mut cursor = shift;

    for (i, &symbol) in probe.iter().enumerate() {
        let pos = deposition.find_forward(symbol, cursor)?;
        cursor = if middle == Some(i) {
            let partner = deposition.find_forward(complement(symbol), cursor)?;
            pos.max(partner) + 1
        } else {
            pos + 1
        };
        embedding.set(pos).ok()?;
    }

    Some(embedding)
}

/// Left-most embedding: every base as early as possible
#[derive(Debug, Clone, Copy, Default)]
pub struct LeftMostEmbedding;

impl LeftMostEmbedding {
    /// Left-most embed probe `id`, ignoring the first `shift` steps.
    ///
    /// # Errors
    ///
    /// Returns `Unembeddable` if the probe no longer fits after the shift.
    pub fn reembed_probe_shifted(&self, chip: &mut Chip, id: ProbeId, shift: usize) -> Result<()> {
        let middle = chip.layout().middle_base();
        let embedding = leftmost_embedding(chip.deposition(), chip.sequence(id)?, middle, shift)
            .ok_or_else(|| {
                LayoutError::unembeddable(id, format!("no left-most embedding from step {shift}"))
            })?;
        chip.set_embedding(id, embedding)
    }
}

impl ProbeEmbedder for LeftMostEmbedding {
    fn name(&self) -> &'static str {
        "LeftMostEmbedding"
    }

    fn reembed_probe(&self, chip: &mut Chip, id: ProbeId) -> Result<()> {
        self.reembed_probe_shifted(chip, id, 0)
    }
}
