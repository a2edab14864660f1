//! Distance matrices for QAP placement.
//!
//! A window is described by its placeable slots: the non-fixed spot groups,
//! listed down each column (stepping by the layout's rows per probe) before
//! moving to the next column. The spot-distance matrix, the probe-distance
//! matrix and permutation application all use this slot order.

use crate::core::chip::Chip;
use crate::core::error::{LayoutError, Result};
use crate::core::region::RectangularRegion;
use crate::core::types::{ConflictDefinition, ConflictMode, ProbeId};
use crate::placement::qap::is_permutation;

/// Spot weights are scaled by this factor before truncation
pub const WEIGHT_SCALE: f64 = 1000.0;

/// Top-left spot of a placeable probe group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub row: usize,
    pub col: usize,
}

/// Placeable slots of a rectangular window, in column-major group order.
///
/// Groups with any fixed spot and groups cut off by the window's bottom row
/// are skipped.
///
/// # Errors
///
/// Returns `IndexOutOfRange` if the window does not fit on the chip.
pub fn window_slots(chip: &Chip, region: &RectangularRegion) -> Result<Vec<Slot>> {
    region.check_fits(chip.rows(), chip.cols())?;

    let rpp = chip.layout().rows_per_probe();
    let mut slots = Vec::with_capacity(region.rows() / rpp * region.cols());
    for col in region.first_col()..=region.last_col() {
        let mut row = region.first_row();
        while row + rpp - 1 <= region.last_row() {
            let mut fixed = false;
            for r in row..row + rpp {
                fixed |= chip.is_fixed(r, col)?;
            }
            if !fixed {
                slots.push(Slot { row, col });
            }
            row += rpp;
        }
    }
    Ok(slots)
}

/// Scaled weight between two spot groups
#[allow(
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn spot_weight(
    a: Slot,
    b: Slot,
    rows_per_probe: usize,
    mode: ConflictMode,
    definition: ConflictDefinition,
) -> u32 {
    let dv = a.row as isize - b.row as isize;
    let dh = a.col as isize - b.col as isize;
    match mode {
        ConflictMode::BorderLength => {
            let group_dv = dv / rows_per_probe as isize;
            u32::from(group_dv.abs() + dh.abs() == 1)
        }
        ConflictMode::ConflictIndex => {
            (WEIGHT_SCALE * definition.distance_weight(dv, dh)).trunc() as u32
        }
    }
}

/// Fill `out` with the `dim x dim` spot-distance matrix of `slots`
/// (`dim = slots.len()`), row-major.
pub fn spot_distance(
    chip: &Chip,
    slots: &[Slot],
    mode: ConflictMode,
    definition: ConflictDefinition,
    out: &mut Vec<u32>,
) {
    let dim = slots.len();
    let rpp = chip.layout().rows_per_probe();
    out.clear();
    out.resize(dim * dim, 0);

    for i in 0..dim {
        for j in i..dim {
            let w = spot_weight(slots[i], slots[j], rpp, mode, definition);
            out[i * dim + j] = w;
            out[j * dim + i] = w;
        }
    }
}

/// Fill `out` with the `dim x dim` probe-distance matrix of `probes` padded
/// with empty slots up to `dim`.
///
/// Real probe groups are `probe distance` apart by the Hamming distance of
/// their (merged) embeddings; a real group and an empty slot are the
/// layout's empty distance apart; two empty slots are at distance zero.
///
/// # Errors
///
/// Returns `IndexOutOfRange` if there are more probes than `dim`, or for an
/// unknown probe id.
#[allow(clippy::cast_possible_truncation)]
pub fn probe_distance(
    chip: &Chip,
    probes: &[ProbeId],
    dim: usize,
    out: &mut Vec<u32>,
) -> Result<()> {
    if probes.len() > dim {
        return Err(LayoutError::out_of_range(probes.len(), dim));
    }

    let embeddings = probes
        .iter()
        .map(|&id| chip.group_embedding(id))
        .collect::<Result<Vec<_>>>()?;
    let empty = chip.layout().empty_distance() as u32;
    let real = probes.len();

    out.clear();
    out.resize(dim * dim, 0);
    for i in 0..dim {
        for j in (i + 1)..dim {
            let d = match (i < real, j < real) {
                (true, true) => embeddings[i].hamming_distance(&embeddings[j]) as u32,
                (true, false) | (false, true) => empty,
                (false, false) => 0,
            };
            out[i * dim + j] = d;
            out[j * dim + i] = d;
        }
    }
    Ok(())
}

/// Write the solved assignment into the chip: slot `i` receives
/// `probes[perm[i]]`, or becomes empty when `perm[i]` is past the last probe.
///
/// # Errors
///
/// Returns `IndexOutOfRange` if `perm` does not cover every slot, and
/// `InvalidPermutation` if it is not a bijection on `0..slots.len()`. The
/// grid is left untouched on error.
pub fn apply_permutation(
    chip: &mut Chip,
    slots: &[Slot],
    probes: &[ProbeId],
    perm: &[usize],
) -> Result<()> {
    let dim = slots.len();
    if perm.len() != dim {
        return Err(LayoutError::out_of_range(perm.len(), dim));
    }
    if !is_permutation(perm) {
        return Err(LayoutError::InvalidPermutation { dim });
    }

    for (slot, &p) in slots.iter().zip(perm) {
        chip.place_group(slot.row, slot.col, probes.get(p).copied())?;
    }
    Ok(())
}

/// Probe groups currently in `slots`, with the permutation that reproduces
/// the current placement from them (empty slots map past the last probe).
///
/// # Errors
///
/// Returns `IndexOutOfRange` if a slot is outside the chip.
pub fn current_assignment(chip: &Chip, slots: &[Slot]) -> Result<(Vec<ProbeId>, Vec<usize>)> {
    let mut probes = Vec::with_capacity(slots.len());
    let mut occupied = Vec::with_capacity(slots.len());
    for slot in slots {
        let leader = chip
            .spot(slot.row, slot.col)?
            .map(|id| chip.layout().group_leader(id));
        if let Some(leader) = leader {
            probes.push(leader);
        }
        occupied.push(leader.is_some());
    }

    let mut next_real = 0;
    let mut next_empty = probes.len();
    let perm = occupied
        .into_iter()
        .map(|occupied| {
            let counter = if occupied { &mut next_real } else { &mut next_empty };
            *counter += 1;
            *counter - 1
        })
        .collect();
    Ok((probes, perm))
}
