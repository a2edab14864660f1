use tracing::debug;

use crate::core::chip::Chip;
use crate::core::deposition::sequence_rank;
use crate::core::error::Result;
use crate::core::types::ProbeId;
use crate::ordering::{checked_range_mut, quick_sort, KeyedIds, ProbeOrdering};

/// Orders probes by the numeric rank of their sequences
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceOrdering;

impl ProbeOrdering for SequenceOrdering {
    fn name(&self) -> &'static str {
        "SequenceOrdering"
    }

    fn order_probes(
        &self,
        chip: &Chip,
        ids: &mut [ProbeId],
        start: usize,
        end: usize,
    ) -> Result<()> {
        let range = checked_range_mut(ids, start, end)?;
        let ranks = range
            .iter()
            .map(|&id| chip.sequence(id).map(sequence_rank))
            .collect::<Result<Vec<u64>>>()?;

        let len = range.len();
        let mut keyed = KeyedIds::new(range, ranks);
        quick_sort(&mut keyed, 0, len);
        debug!("Ordered {len} probes by sequence rank");
        Ok(())
    }
}
