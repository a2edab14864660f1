//! SNP-pair synchronized embedding.
//!
//! Two probes that differ by a single base are synthesized on neighbouring
//! spots. Both are embedded left-most (or right-most); the part of the
//! sequence they share after (or before) the mismatch is then made to use
//! identical steps, so that the two embeddings only disagree around the
//! mismatch.

use tracing::debug;

use crate::core::chip::Chip;
use crate::core::embedding::BitEmbedding;
use crate::core::error::{LayoutError, Result};
use crate::core::types::{Direction, ProbeId};
use crate::embed::leftmost::LeftMostEmbedding;
use crate::embed::rightmost::RightMostEmbedding;
use crate::embed::{checked_range, unsupported, ProbeEmbedder};

/// Embeds SNP mates so that they share their common steps
#[derive(Debug, Clone, Copy)]
pub struct SnpPairEmbedding {
    direction: Direction,
}

impl SnpPairEmbedding {
    /// `Forward` synchronizes left-most embeddings, `Backward` right-most ones
    #[must_use]
    pub fn new(direction: Direction) -> Self {
        Self { direction }
    }

    #[must_use]
    pub fn left_most() -> Self {
        Self::new(Direction::Forward)
    }

    #[must_use]
    pub fn right_most() -> Self {
        Self::new(Direction::Backward)
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    fn check_layout(&self, chip: &Chip) -> Result<()> {
        if chip.layout().is_paired() {
            return Err(unsupported(self.name(), chip));
        }
        Ok(())
    }

    fn embed_single(&self, chip: &mut Chip, id: ProbeId) -> Result<()> {
        match self.direction {
            Direction::Forward => LeftMostEmbedding.reembed_probe(chip, id),
            Direction::Backward => RightMostEmbedding.reembed_probe(chip, id),
        }
    }

    /// Embed two SNP mates and align their shared steps.
    ///
    /// # Errors
    ///
    /// Returns `InvalidChip` if the probes are not SNP mates, and
    /// `UnsupportedProbeLayout` on paired chips.
    pub fn synchronize_pair(&self, chip: &mut Chip, id1: ProbeId, id2: ProbeId) -> Result<()> {
        self.check_layout(chip)?;
        if !chip.is_snp_pair(id1, id2) {
            return Err(LayoutError::InvalidChip(format!(
                "probes {id1} and {id2} are not an SNP pair"
            )));
        }

        self.embed_single(chip, id1)?;
        self.embed_single(chip, id2)?;

        let seq1 = chip.sequence(id1)?;
        let seq2 = chip.sequence(id2)?;
        let shortest = seq1.len().min(seq2.len());
        let prefix = seq1.iter().zip(seq2).take_while(|(a, b)| a == b).count();
        let suffix = seq1
            .iter()
            .rev()
            .zip(seq2.iter().rev())
            .take_while(|(a, b)| a == b)
            .count()
            .min(shortest - prefix.min(shortest));

        let e1 = chip.embedding(id1)?;
        let e2 = chip.embedding(id2)?;

        // productive step of the first shared base beyond the mismatch, seen
        // from the scan direction
        let anchors = match self.direction {
            Direction::Forward if suffix > 0 => Some((
                e1.iter_set().nth(seq1.len() - suffix),
                e2.iter_set().nth(seq2.len() - suffix),
            )),
            Direction::Backward if prefix > 0 => {
                Some((e1.iter_set().nth(prefix - 1), e2.iter_set().nth(prefix - 1)))
            }
            _ => None,
        };
        let Some((Some(pos1), Some(pos2))) = anchors else {
            return Ok(());
        };
        if pos1 == pos2 {
            // the shared run is already aligned
            return Ok(());
        }

        let master_is_first = match self.direction {
            Direction::Forward => pos1 > pos2,
            Direction::Backward => pos1 < pos2,
        };
        let (master, slave, master_pos, slave_pos) = if master_is_first {
            (id1, id2, pos1, pos2)
        } else {
            (id2, id1, pos2, pos1)
        };

        let source = chip.embedding(master)?.clone();
        let mut synced: BitEmbedding = chip.embedding(slave)?.clone();
        match self.direction {
            Direction::Forward => {
                synced.clear_range(slave_pos, master_pos);
                synced.copy_range_from(&source, master_pos, source.len());
            }
            Direction::Backward => {
                synced.clear_range(master_pos + 1, slave_pos + 1);
                synced.copy_range_from(&source, 0, master_pos + 1);
            }
        }

        debug!(
            "Synchronized SNP pair {id1}/{id2}: probe {slave} follows probe {master} from step {master_pos}"
        );
        chip.set_embedding(slave, synced)
    }

    /// Re-embed the whole chip, synchronizing every probe with an SNP mate on
    /// its right or lower neighbour spot.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedProbeLayout` on paired chips.
    pub fn change_layout(&self, chip: &mut Chip) -> Result<()> {
        self.check_layout(chip)?;
        let (rows, cols) = (chip.rows(), chip.cols());
        let mut done = vec![false; rows * cols];
        let mut pairs = 0usize;

        for row in 0..rows {
            for col in 0..cols {
                if done[row * cols + col] {
                    continue;
                }
                let Some(id1) = chip.spot(row, col)? else {
                    continue;
                };

                let mut neighbours = Vec::with_capacity(2);
                if col + 1 < cols {
                    neighbours.push((row, col + 1));
                }
                if row + 1 < rows {
                    neighbours.push((row + 1, col));
                }

                let mut mate = None;
                for (r, c) in neighbours {
                    if done[r * cols + c] {
                        continue;
                    }
                    if let Some(id2) = chip.spot(r, c)? {
                        if chip.is_snp_pair(id1, id2) {
                            mate = Some((id2, r, c));
                            break;
                        }
                    }
                }

                match mate {
                    Some((id2, r, c)) => {
                        self.synchronize_pair(chip, id1, id2)?;
                        done[r * cols + c] = true;
                        pairs += 1;
                    }
                    None => self.embed_single(chip, id1)?,
                }
                done[row * cols + col] = true;
            }
        }

        debug!("Re-embedded chip with {pairs} synchronized SNP pairs");
        Ok(())
    }
}

impl ProbeEmbedder for SnpPairEmbedding {
    fn name(&self) -> &'static str {
        match self.direction {
            Direction::Forward => "SnpLeftMostEmbedding",
            Direction::Backward => "SnpRightMostEmbedding",
        }
    }

    /// Synchronize `id` with `id + 1` or `id - 1` when they are SNP mates,
    /// otherwise embed it alone.
    fn reembed_probe(&self, chip: &mut Chip, id: ProbeId) -> Result<()> {
        self.check_layout(chip)?;
        if chip.is_snp_pair(id, id + 1) {
            self.synchronize_pair(chip, id, id + 1)
        } else if id > 0 && chip.is_snp_pair(id - 1, id) {
            self.synchronize_pair(chip, id - 1, id)
        } else {
            self.embed_single(chip, id)
        }
    }

    /// Consecutive SNP mates in `ids[first..=last]` are synchronized
    fn reembed_probe_set(
        &self,
        chip: &mut Chip,
        ids: &mut [ProbeId],
        first: usize,
        last: usize,
    ) -> Result<()> {
        self.check_layout(chip)?;
        let range = checked_range(ids, first, last)?;

        let mut i = 0;
        while i < range.len() {
            if i + 1 < range.len() && chip.is_snp_pair(range[i], range[i + 1]) {
                self.synchronize_pair(chip, range[i], range[i + 1])?;
                i += 2;
            } else {
                self.embed_single(chip, range[i])?;
                i += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::deposition::DepositionSequence;
    use crate::core::types::LayoutKind;

    fn steps(chip: &Chip, id: ProbeId) -> Vec<usize> {
        chip.embedding(id).unwrap().iter_set().collect()
    }

    fn snp_chip(probes: &[&str]) -> Chip {
        let dep = DepositionSequence::new("ACGTACGTACGT").unwrap();
        Chip::new(1, probes.len(), dep, LayoutKind::Single, probes).unwrap()
    }

    #[test]
    fn test_leftmost_pair_acgt_acct() {
        let mut chip = snp_chip(&["ACGT", "ACCT"]);
        SnpPairEmbedding::left_most().synchronize_pair(&mut chip, 0, 1).unwrap();

        assert_eq!(steps(&chip, 0), vec![0, 1, 2, 7]);
        assert_eq!(steps(&chip, 1), vec![0, 1, 5, 7]);
        // only the G (step 2) and second C (step 5) differ
        assert_eq!(chip.embedding(0).unwrap().hamming_distance(chip.embedding(1).unwrap()), 2);
        chip.validate_layout().unwrap();
    }

    #[test]
    fn test_rightmost_pair_acgt_acct() {
        let mut chip = snp_chip(&["ACGT", "ACCT"]);
        SnpPairEmbedding::right_most().synchronize_pair(&mut chip, 0, 1).unwrap();

        assert_eq!(steps(&chip, 0), vec![4, 5, 10, 11]);
        assert_eq!(steps(&chip, 1), vec![4, 5, 9, 11]);
        chip.validate_layout().unwrap();
    }

    #[test]
    fn test_already_aligned_pair_is_untouched() {
        // mismatch in the last base: nothing shared beyond it
        let mut chip = snp_chip(&["ACGA", "ACGT"]);
        SnpPairEmbedding::left_most().synchronize_pair(&mut chip, 0, 1).unwrap();
        assert_eq!(steps(&chip, 0), vec![0, 1, 2, 4]);
        assert_eq!(steps(&chip, 1), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_indel_pair() {
        let mut chip = snp_chip(&["ACGT", "ACT"]);
        SnpPairEmbedding::left_most().synchronize_pair(&mut chip, 0, 1).unwrap();
        assert_eq!(steps(&chip, 0), vec![0, 1, 2, 3]);
        assert_eq!(steps(&chip, 1), vec![0, 1, 3]);

        let mut chip = snp_chip(&["ATG", "ATCG"]);
        SnpPairEmbedding::left_most().synchronize_pair(&mut chip, 0, 1).unwrap();
        // both already place the shared G at step 6
        assert_eq!(steps(&chip, 0), vec![0, 3, 6]);
        assert_eq!(steps(&chip, 1), vec![0, 3, 5, 6]);
        chip.validate_layout().unwrap();
    }

    #[test]
    fn test_not_an_snp_pair() {
        let mut chip = snp_chip(&["ACGT", "TTTT"]);
        assert!(SnpPairEmbedding::left_most().synchronize_pair(&mut chip, 0, 1).is_err());
    }

    #[test]
    fn test_change_layout_pairs_neighbours() {
        let dep = DepositionSequence::new("ACGTACGTACGTACGT").unwrap();
        let mut chip =
            Chip::new(2, 2, dep, LayoutKind::Single, &["ACGT", "GGAA", "ACCT", "TTAC"]).unwrap();
        // ACGT above ACCT; GGAA and TTAC unrelated
        chip.set_spot(0, 0, Some(0)).unwrap();
        chip.set_spot(0, 1, Some(1)).unwrap();
        chip.set_spot(1, 0, Some(2)).unwrap();
        chip.set_spot(1, 1, Some(3)).unwrap();

        SnpPairEmbedding::left_most().change_layout(&mut chip).unwrap();
        assert_eq!(steps(&chip, 0), vec![0, 1, 2, 7]);
        assert_eq!(steps(&chip, 2), vec![0, 1, 5, 7]);
        chip.validate_layout().unwrap();
    }

    #[test]
    fn test_reembed_probe_finds_mate_by_id() {
        let mut chip = snp_chip(&["TTAC", "ACGT", "ACCT"]);
        SnpPairEmbedding::left_most().reembed_probe(&mut chip, 2).unwrap();
        assert_eq!(steps(&chip, 1), vec![0, 1, 2, 7]);
        assert_eq!(steps(&chip, 2), vec![0, 1, 5, 7]);
    }
}
