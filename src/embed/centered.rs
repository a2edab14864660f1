use tracing::trace;

use crate::core::chip::Chip;
use crate::core::embedding::BitEmbedding;
use crate::core::error::{LayoutError, Result};
use crate::core::types::ProbeId;
use crate::embed::leftmost::leftmost_embedding;
use crate::embed::ProbeEmbedder;

/// Shifted left-most embedding whose masked steps before the first and after
/// the last productive step are as even as the deposition sequence allows.
/// Among equally balanced shifts the one nearest half of the trailing steps
/// of the plain left-most embedding wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct CenteredEmbedding;

/// Masked steps before the first and after the last productive step
fn margins(embedding: &BitEmbedding, len: usize) -> Option<(usize, usize)> {
    Some((embedding.first_set()?, len - 1 - embedding.last_set()?))
}

impl ProbeEmbedder for CenteredEmbedding {
    fn name(&self) -> &'static str {
        "CenteredEmbedding"
    }

    fn reembed_probe(&self, chip: &mut Chip, id: ProbeId) -> Result<()> {
        let len = chip.embed_len();
        let middle = chip.layout().middle_base();
        let probe = chip.sequence(id)?;
        let leftmost = leftmost_embedding(chip.deposition(), probe, middle, 0)
            .ok_or_else(|| LayoutError::unembeddable(id, "deposition sequence is too short"))?;

        let Some((_, spaces)) = margins(&leftmost, len) else {
            return chip.set_embedding(id, leftmost);
        };
        let target = spaces / 2;

        // every shift up to the first productive step yields the same
        // embedding, so jump past it
        let mut best: Option<((usize, usize), usize, BitEmbedding)> = None;
        let mut shift = 0;
        while let Some(candidate) = leftmost_embedding(chip.deposition(), probe, middle, shift) {
            let Some((before, after)) = margins(&candidate, len) else {
                break;
            };
            let key = (before.abs_diff(after), shift.abs_diff(target));
            if best.as_ref().map_or(true, |(k, ..)| key < *k) {
                best = Some((key, shift, candidate));
            }
            shift = before + 1;
        }

        let Some(((imbalance, _), shift, embedding)) = best else {
            return chip.set_embedding(id, leftmost);
        };
        trace!(
            "Centered probe {id} with shift {shift} (imbalance {imbalance}, {spaces} trailing steps)"
        );
        chip.set_embedding(id, embedding)
    }
}
