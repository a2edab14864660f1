//! Layout quality measures: border length and conflict index.
//!
//! Border length counts, over all synthesis steps, the orthogonally adjacent
//! spot pairs where one spot is masked and the other is not. The conflict
//! index weights each unmasked neighbour of a masked spot by its distance and
//! by how far into the probe the next base to be synthesized lies.

use crate::core::chip::Chip;
use crate::core::embedding::BitEmbedding;
use crate::core::error::Result;
use crate::core::types::{ConflictDefinition, ProbeId};

/// Radius of the conflict neighbourhood
pub const CONFLICT_DIM: usize = 3;

const TABLE_SIZE: usize = 2 * CONFLICT_DIM + 1;

const THETA_NUM: f64 = 5.0;

#[rustfmt::skip]
const SIMPLIFIED_TABLE: [[f64; TABLE_SIZE]; TABLE_SIZE] = [
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 0.1, 0.0, 0.0, 0.0],
    [0.0, 0.0, 0.5, 1.0, 0.5, 0.0, 0.0],
    [0.0, 0.1, 1.0, 0.0, 1.0, 0.1, 0.0],
    [0.0, 0.0, 0.5, 1.0, 0.5, 0.0, 0.0],
    [0.0, 0.0, 0.0, 0.1, 0.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
];

impl ConflictDefinition {
    /// Weight of a neighbour at signed offset (`dv`, `dh`); zero outside the
    /// 7x7 neighbourhood
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
    pub fn distance_weight(self, dv: isize, dh: isize) -> f64 {
        let dim = CONFLICT_DIM as isize;
        if dv.abs() > dim || dh.abs() > dim {
            return 0.0;
        }
        match self {
            Self::Default => {
                let d2 = (dv * dv + dh * dh) as f64;
                if d2 > 0.0 {
                    1.0 / d2
                } else {
                    0.0
                }
            }
            Self::Simplified => SIMPLIFIED_TABLE[(dim + dv) as usize][(dim + dh) as usize],
            Self::BorderLengthEquivalent => {
                if dv.abs() + dh.abs() == 1 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Multiplier for a conflict hitting a probe after `base` bases were
    /// synthesized. Conflicts near the middle of the probe weigh more.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn position_weight(self, base: usize, probe_len: usize) -> f64 {
        if probe_len == 0 {
            return 1.0;
        }
        let theta = THETA_NUM / probe_len as f64;
        let c = 1.0 / theta.exp();
        let lambda = (if base <= probe_len - base.min(probe_len) {
            base + 1
        } else {
            probe_len - base + 1
        }) as f64;
        match self {
            Self::Default => c * (theta * lambda).exp(),
            Self::Simplified => (c * (theta * lambda).exp()).trunc(),
            Self::BorderLengthEquivalent => 1.0,
        }
    }
}

/// Total border length of the chip, optionally divided by the number of
/// probes
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn border_length(chip: &Chip, normalized: bool) -> f64 {
    let mut total = 0usize;
    let rows = chip.rows();
    let cols = chip.cols();

    let embed = |row: usize, col: usize| -> Option<&BitEmbedding> {
        chip.spot(row, col)
            .ok()
            .flatten()
            .and_then(|id| chip.embedding(id).ok())
    };

    for row in 0..rows {
        for col in 0..cols {
            let Some(e1) = embed(row, col) else {
                continue;
            };
            if col + 1 < cols {
                if let Some(e2) = embed(row, col + 1) {
                    total += e1.hamming_distance(e2);
                }
            }
            if row + 1 < rows {
                if let Some(e2) = embed(row + 1, col) {
                    total += e1.hamming_distance(e2);
                }
            }
        }
    }

    if normalized && chip.num_probes() > 0 {
        total as f64 / chip.num_probes() as f64
    } else {
        total as f64
    }
}

/// Conflict index of the probe at a spot; zero for empty spots.
///
/// # Errors
///
/// Returns `IndexOutOfRange` if the spot is outside the grid.
pub fn conflict_index(
    chip: &Chip,
    row: usize,
    col: usize,
    definition: ConflictDefinition,
) -> Result<f64> {
    let Some(id) = chip.spot(row, col)? else {
        return Ok(0.0);
    };
    conflict_index_of(chip, row, col, id, definition)
}

/// Conflict index of probe `id` as if it sat at (`row`, `col`).
///
/// # Errors
///
/// Returns `IndexOutOfRange` if the spot or probe id is invalid.
pub fn conflict_index_of(
    chip: &Chip,
    row: usize,
    col: usize,
    id: ProbeId,
    definition: ConflictDefinition,
) -> Result<f64> {
    chip.spot(row, col)?;
    let embedding = chip.embedding(id)?;
    let probe_len = chip.probe_length();

    let min_row = row.saturating_sub(CONFLICT_DIM);
    let max_row = (row + CONFLICT_DIM).min(chip.rows() - 1);
    let min_col = col.saturating_sub(CONFLICT_DIM);
    let max_col = (col + CONFLICT_DIM).min(chip.cols() - 1);

    let mut neighbours: Vec<(f64, &BitEmbedding)> = Vec::new();
    for r in min_row..=max_row {
        for c in min_col..=max_col {
            let Some(other) = chip.spot(r, c)? else {
                continue;
            };
            #[allow(clippy::cast_possible_wrap)]
            let weight = definition.distance_weight(r as isize - row as isize, c as isize - col as isize);
            if weight > 0.0 {
                neighbours.push((weight, chip.embedding(other)?));
            }
        }
    }

    let mut conflict = 0.0;
    let mut base = 0;
    for step in 0..chip.embed_len() {
        if embedding.is_set(step)? {
            base += 1;
            continue;
        }
        let position = definition.position_weight(base, probe_len);
        for (weight, other) in &neighbours {
            if other.is_set(step)? {
                conflict += position * weight;
            }
        }
    }
    Ok(conflict)
}

/// Mean conflict index over all occupied spots
///
/// # Errors
///
/// Returns `IndexOutOfRange` only if the chip is internally inconsistent.
#[allow(clippy::cast_precision_loss)]
pub fn average_conflict_index(chip: &Chip, definition: ConflictDefinition) -> Result<f64> {
    let mut total = 0.0;
    let mut count = 0usize;
    for row in 0..chip.rows() {
        for col in 0..chip.cols() {
            if chip.spot(row, col)?.is_some() {
                total += conflict_index(chip, row, col, definition)?;
                count += 1;
            }
        }
    }
    Ok(if count == 0 { 0.0 } else { total / count as f64 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::deposition::DepositionSequence;
    use crate::core::types::LayoutKind;

    fn two_probe_chip() -> Chip {
        let dep = DepositionSequence::synchronous(8);
        let mut chip = Chip::new(1, 2, dep, LayoutKind::Single, &["AC", "GT"]).unwrap();
        chip.set_spot(0, 0, Some(0)).unwrap();
        chip.set_spot(0, 1, Some(1)).unwrap();
        chip
    }

    #[test]
    fn test_distance_weights() {
        let def = ConflictDefinition::Default;
        assert_eq!(def.distance_weight(0, 0), 0.0);
        assert!((def.distance_weight(1, 0) - 1.0).abs() < 1e-12);
        assert!((def.distance_weight(1, 1) - 0.5).abs() < 1e-12);
        assert!((def.distance_weight(-3, 3) - 1.0 / 18.0).abs() < 1e-12);
        assert_eq!(def.distance_weight(4, 0), 0.0);

        let def = ConflictDefinition::Simplified;
        assert!((def.distance_weight(-1, -1) - 0.5).abs() < 1e-12);
        assert!((def.distance_weight(2, 0) - 0.1).abs() < 1e-12);

        let def = ConflictDefinition::BorderLengthEquivalent;
        assert_eq!(def.distance_weight(0, -1), 1.0);
        assert_eq!(def.distance_weight(1, 1), 0.0);
    }

    #[test]
    fn test_position_weight_peaks_in_middle() {
        let def = ConflictDefinition::Default;
        let edge = def.position_weight(0, 25);
        let middle = def.position_weight(12, 25);
        assert!((edge - 1.0).abs() < 1e-12);
        assert!(middle > edge);
        assert!((def.position_weight(25, 25) - edge).abs() < 1e-12);
        assert_eq!(ConflictDefinition::BorderLengthEquivalent.position_weight(7, 25), 1.0);
    }

    #[test]
    fn test_border_length() {
        let chip = two_probe_chip();
        // AC -> steps 0,1; GT -> steps 2,3
        assert_eq!(border_length(&chip, false), 4.0);
        assert_eq!(border_length(&chip, true), 2.0);
    }

    #[test]
    fn test_conflict_index() {
        let chip = two_probe_chip();
        // probe 0 is masked at steps 2..8; neighbour unmasked at 2 and 3,
        // both after 2 bases were synthesized
        let expected = 2.0 * ConflictDefinition::Default.position_weight(2, 2);
        let ci = conflict_index(&chip, 0, 0, ConflictDefinition::Default).unwrap();
        assert!((ci - expected).abs() < 1e-9);

        let avg = average_conflict_index(&chip, ConflictDefinition::Default).unwrap();
        assert!(avg > 0.0);
        assert!(conflict_index(&chip, 3, 0, ConflictDefinition::Default).is_err());
    }
}
