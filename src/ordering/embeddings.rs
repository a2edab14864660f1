use tracing::debug;

use crate::core::chip::Chip;
use crate::core::embedding::BitEmbedding;
use crate::core::error::Result;
use crate::core::types::ProbeId;
use crate::ordering::{checked_range_mut, quick_sort, KeyedIds, ProbeOrdering};

/// Orders probes by their embedding bit vectors, earliest productive steps
/// first
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddingOrdering;

impl ProbeOrdering for EmbeddingOrdering {
    fn name(&self) -> &'static str {
        "EmbeddingOrdering"
    }

    fn order_probes(
        &self,
        chip: &Chip,
        ids: &mut [ProbeId],
        start: usize,
        end: usize,
    ) -> Result<()> {
        let range = checked_range_mut(ids, start, end)?;
        let keys = range
            .iter()
            .map(|&id| chip.embedding(id))
            .collect::<Result<Vec<&BitEmbedding>>>()?;

        let len = range.len();
        let mut keyed = KeyedIds::new(range, keys);
        quick_sort(&mut keyed, 0, len);
        debug!("Ordered {len} probes by embedding");
        Ok(())
    }
}
