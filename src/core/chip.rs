//! The chip: grid geometry, probe sequences, embeddings and spot occupancy.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::deposition::{complement, is_nucleotide, DepositionSequence};
use crate::core::embedding::BitEmbedding;
use crate::core::error::{LayoutError, Result};
use crate::core::layout::{layout_for, ProbeLayout};
use crate::core::region::RectangularRegion;
use crate::core::types::{LayoutKind, ProbeId};
use crate::embed::leftmost::leftmost_embedding;

/// Chip file format version for compatibility checking
pub const CHIP_FORMAT_VERSION: &str = "1.0.0";

/// A microarray chip under layout
#[derive(Debug)]
pub struct Chip {
    rows: usize,
    cols: usize,
    deposition: DepositionSequence,
    layout: Box<dyn ProbeLayout>,
    probes: Vec<Vec<u8>>,
    embeddings: Vec<BitEmbedding>,
    spots: Vec<Option<ProbeId>>,
    fixed: Vec<bool>,
}

impl Chip {
    /// Create a chip with an empty grid and left-most embedded probes.
    ///
    /// Paired chips expect perfect-match probes at even ids, each followed by
    /// its mismatch partner.
    ///
    /// # Errors
    ///
    /// Returns `InvalidChip` if the geometry or probe list is inconsistent,
    /// or `Unembeddable` if the deposition sequence cannot realize a probe.
    pub fn new<S: AsRef<str>>(
        rows: usize,
        cols: usize,
        deposition: DepositionSequence,
        kind: LayoutKind,
        probes: &[S],
    ) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(LayoutError::InvalidChip(format!(
                "grid must not be empty ({rows} x {cols})"
            )));
        }

        let probes: Vec<Vec<u8>> = probes
            .iter()
            .map(|p| p.as_ref().trim().bytes().map(|b| b.to_ascii_uppercase()).collect())
            .collect();

        for (id, probe) in probes.iter().enumerate() {
            if probe.is_empty() {
                return Err(LayoutError::InvalidChip(format!("probe {id} is empty")));
            }
            if let Some(&bad) = probe.iter().find(|&&b| !is_nucleotide(b)) {
                return Err(LayoutError::InvalidChip(format!(
                    "probe {id} contains invalid symbol '{}'",
                    bad as char
                )));
            }
        }

        let probe_length = probes.iter().map(Vec::len).max().unwrap_or(0);
        let layout = layout_for(kind, probe_length);

        if layout.is_paired() {
            validate_pairs(&probes, rows, layout.as_ref())?;
        }

        let middle = layout.middle_base();
        let embeddings = probes
            .iter()
            .enumerate()
            .map(|(id, probe)| {
                leftmost_embedding(&deposition, probe, middle, 0).ok_or_else(|| {
                    LayoutError::unembeddable(id, "deposition sequence is too short")
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Created {} chip {}x{} with {} probes ({} steps)",
            kind,
            rows,
            cols,
            probes.len(),
            deposition.len()
        );

        Ok(Self {
            rows,
            cols,
            deposition,
            layout,
            probes,
            embeddings,
            spots: vec![None; rows * cols],
            fixed: vec![false; rows * cols],
        })
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Region covering the whole chip
    #[must_use]
    pub fn chip_region(&self) -> RectangularRegion {
        RectangularRegion::whole(self.rows, self.cols)
    }

    #[must_use]
    pub fn deposition(&self) -> &DepositionSequence {
        &self.deposition
    }

    /// Number of synthesis steps covered by every embedding
    #[must_use]
    pub fn embed_len(&self) -> usize {
        self.deposition.len()
    }

    #[must_use]
    pub fn layout(&self) -> &dyn ProbeLayout {
        self.layout.as_ref()
    }

    #[must_use]
    pub fn num_probes(&self) -> usize {
        self.probes.len()
    }

    #[must_use]
    pub fn probe_length(&self) -> usize {
        self.layout.probe_length()
    }

    /// Probe sequence for `id`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for an unknown probe id.
    pub fn sequence(&self, id: ProbeId) -> Result<&[u8]> {
        self.probes
            .get(id)
            .map(Vec::as_slice)
            .ok_or_else(|| LayoutError::out_of_range(id, self.probes.len()))
    }

    /// Current embedding of `id`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for an unknown probe id.
    pub fn embedding(&self, id: ProbeId) -> Result<&BitEmbedding> {
        self.embeddings
            .get(id)
            .ok_or_else(|| LayoutError::out_of_range(id, self.embeddings.len()))
    }

    /// Replace the embedding of `id`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for an unknown probe id and `InvalidChip` if
    /// the embedding length differs from the deposition length.
    pub fn set_embedding(&mut self, id: ProbeId, embedding: BitEmbedding) -> Result<()> {
        if embedding.len() != self.deposition.len() {
            return Err(LayoutError::InvalidChip(format!(
                "embedding of probe {id} has {} steps, expected {}",
                embedding.len(),
                self.deposition.len()
            )));
        }
        let len = self.embeddings.len();
        let slot = self
            .embeddings
            .get_mut(id)
            .ok_or_else(|| LayoutError::out_of_range(id, len))?;
        *slot = embedding;
        Ok(())
    }

    /// Embedding of a whole probe group (OR of both pair members when paired)
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for an unknown probe id.
    pub fn group_embedding(&self, leader: ProbeId) -> Result<BitEmbedding> {
        let members = self.layout.group_members(leader);
        let mut merged = self.embedding(members[0])?.clone();
        for &id in &members[1..] {
            merged = merged.union(self.embedding(id)?);
        }
        Ok(merged)
    }

    fn index(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows {
            return Err(LayoutError::out_of_range(row, self.rows));
        }
        if col >= self.cols {
            return Err(LayoutError::out_of_range(col, self.cols));
        }
        Ok(row * self.cols + col)
    }

    /// Probe at a spot.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if the spot is outside the grid.
    pub fn spot(&self, row: usize, col: usize) -> Result<Option<ProbeId>> {
        Ok(self.spots[self.index(row, col)?])
    }

    /// Write a probe (or nothing) into a spot.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if the spot is outside the grid or the probe
    /// id is unknown.
    pub fn set_spot(&mut self, row: usize, col: usize, id: Option<ProbeId>) -> Result<()> {
        if let Some(id) = id {
            if id >= self.probes.len() {
                return Err(LayoutError::out_of_range(id, self.probes.len()));
            }
        }
        let idx = self.index(row, col)?;
        self.spots[idx] = id;
        Ok(())
    }

    /// Whether the spot is fixed.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if the spot is outside the grid.
    pub fn is_fixed(&self, row: usize, col: usize) -> Result<bool> {
        Ok(self.fixed[self.index(row, col)?])
    }

    /// Mark or unmark a spot as fixed.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if the spot is outside the grid.
    pub fn set_fixed(&mut self, row: usize, col: usize, fixed: bool) -> Result<()> {
        let idx = self.index(row, col)?;
        self.fixed[idx] = fixed;
        Ok(())
    }

    /// Number of fixed spots
    #[must_use]
    pub fn num_fixed(&self) -> usize {
        self.fixed.iter().filter(|&&f| f).count()
    }

    /// Write a probe group starting at its top row; `None` empties the group.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if the group does not fit on the grid.
    pub fn place_group(&mut self, row: usize, col: usize, leader: Option<ProbeId>) -> Result<()> {
        let rpp = self.layout.rows_per_probe();
        match leader {
            Some(leader) => {
                for (offset, id) in self.layout.group_members(leader).into_iter().enumerate() {
                    self.set_spot(row + offset, col, Some(id))?;
                }
            }
            None => {
                for offset in 0..rpp {
                    self.set_spot(row + offset, col, None)?;
                }
            }
        }
        Ok(())
    }

    /// Empty every spot that is not fixed
    pub fn clear_unfixed(&mut self) {
        for (spot, &fixed) in self.spots.iter_mut().zip(&self.fixed) {
            if !fixed {
                *spot = None;
            }
        }
    }

    /// Number of occupied spots
    #[must_use]
    pub fn num_placed(&self) -> usize {
        self.spots.iter().filter(|s| s.is_some()).count()
    }

    /// Probe group leaders that are not sitting on a fixed spot
    #[must_use]
    pub fn movable_probes(&self) -> Vec<ProbeId> {
        let mut pinned = vec![false; self.probes.len()];
        for (spot, &fixed) in self.spots.iter().zip(&self.fixed) {
            if let (Some(id), true) = (spot, fixed) {
                pinned[self.layout.group_leader(*id)] = true;
            }
        }

        (0..self.probes.len())
            .filter(|&id| self.layout.group_leader(id) == id && !pinned[id])
            .collect()
    }

    /// Whether two probes differ by a single substitution or a single indel
    #[must_use]
    pub fn is_snp_pair(&self, id1: ProbeId, id2: ProbeId) -> bool {
        match (self.probes.get(id1), self.probes.get(id2)) {
            (Some(a), Some(b)) => id1 != id2 && snp_mates(a, b),
            _ => false,
        }
    }

    /// Check grid consistency and embedding validity.
    ///
    /// # Errors
    ///
    /// Returns `InvalidChip` describing the first violation found.
    pub fn validate_layout(&self) -> Result<()> {
        let mut seen = vec![false; self.probes.len()];

        for row in 0..self.rows {
            for col in 0..self.cols {
                let Some(id) = self.spots[row * self.cols + col] else {
                    continue;
                };
                if id >= self.probes.len() {
                    return Err(LayoutError::InvalidChip(format!(
                        "spot ({row}, {col}) holds unknown probe {id}"
                    )));
                }
                if std::mem::replace(&mut seen[id], true) {
                    return Err(LayoutError::InvalidChip(format!(
                        "probe {id} is placed more than once"
                    )));
                }
                if self.layout.is_paired() {
                    let leader = self.layout.group_leader(id);
                    let (partner, partner_row) = if id == leader {
                        (id + 1, Some(row + 1))
                    } else {
                        (leader, row.checked_sub(1))
                    };
                    let found = partner_row
                        .filter(|&r| r < self.rows)
                        .and_then(|r| self.spots[r * self.cols + col]);
                    if found != Some(partner) {
                        return Err(LayoutError::InvalidChip(format!(
                            "probe {id} at ({row}, {col}) is not stacked with its pair partner {partner}"
                        )));
                    }
                }
            }
        }

        for (id, embedding) in self.embeddings.iter().enumerate() {
            if embedding.decode(&self.deposition) != self.probes[id] {
                return Err(LayoutError::InvalidChip(format!(
                    "embedding of probe {id} does not reproduce its sequence"
                )));
            }
        }

        Ok(())
    }

    /// Export to the serializable chip document
    #[must_use]
    pub fn to_data(&self) -> ChipData {
        ChipData {
            version: CHIP_FORMAT_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            layout: self.layout.kind(),
            rows: self.rows,
            cols: self.cols,
            deposition: self.deposition.clone(),
            probes: self
                .probes
                .iter()
                .zip(&self.embeddings)
                .map(|(seq, emb)| ProbeRecord {
                    sequence: String::from_utf8_lossy(seq).into_owned(),
                    embedding: Some(emb.to_step_string()),
                })
                .collect(),
            grid: self.spots.chunks(self.cols).map(<[_]>::to_vec).collect(),
            fixed: self
                .fixed
                .iter()
                .enumerate()
                .filter(|(_, &f)| f)
                .map(|(idx, _)| (idx / self.cols, idx % self.cols))
                .collect(),
        }
    }

    /// Rebuild a chip from its serialized document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidChip` if the document is inconsistent.
    pub fn from_data(data: ChipData) -> Result<Self> {
        let sequences: Vec<&str> = data.probes.iter().map(|p| p.sequence.as_str()).collect();
        let mut chip = Self::new(data.rows, data.cols, data.deposition, data.layout, &sequences)?;

        for (id, record) in data.probes.iter().enumerate() {
            if let Some(steps) = &record.embedding {
                chip.set_embedding(id, BitEmbedding::from_step_string(steps)?)?;
            }
        }

        if data.grid.len() != chip.rows || data.grid.iter().any(|r| r.len() != chip.cols) {
            return Err(LayoutError::InvalidChip(format!(
                "grid does not match {} x {} geometry",
                chip.rows, chip.cols
            )));
        }
        for (row, cells) in data.grid.iter().enumerate() {
            for (col, &id) in cells.iter().enumerate() {
                chip.set_spot(row, col, id)?;
            }
        }
        for &(row, col) in &data.fixed {
            chip.set_fixed(row, col, true)?;
        }

        chip.validate_layout()?;
        Ok(chip)
    }

    /// Load a chip from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let data: ChipData = serde_json::from_str(&contents)?;
        Self::from_data(data)
    }

    /// Save the chip as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_data())?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Serializable chip document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChipData {
    pub version: String,
    pub created_at: String,
    pub layout: LayoutKind,
    pub rows: usize,
    pub cols: usize,
    pub deposition: DepositionSequence,
    pub probes: Vec<ProbeRecord>,
    /// Row-major grid; `null` marks an empty spot
    pub grid: Vec<Vec<Option<ProbeId>>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fixed: Vec<(usize, usize)>,
}

/// A probe sequence with its optional embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeRecord {
    pub sequence: String,
    /// One `0`/`1` character per synthesis step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<String>,
}

/// Whether two sequences differ by one substitution or one inserted base
#[must_use]
pub fn snp_mates(a: &[u8], b: &[u8]) -> bool {
    match a.len().abs_diff(b.len()) {
        0 => a.iter().zip(b).filter(|(x, y)| x != y).count() == 1,
        1 => {
            let (long, short) = if a.len() > b.len() { (a, b) } else { (b, a) };
            let prefix = long.iter().zip(short).take_while(|(x, y)| x == y).count();
            long[prefix + 1..] == short[prefix..]
        }
        _ => false,
    }
}

fn validate_pairs(probes: &[Vec<u8>], rows: usize, layout: &dyn ProbeLayout) -> Result<()> {
    if rows % layout.rows_per_probe() != 0 {
        return Err(LayoutError::InvalidChip(format!(
            "paired chips need an even number of rows, got {rows}"
        )));
    }
    if probes.len() % 2 != 0 {
        return Err(LayoutError::InvalidChip(format!(
            "paired chips need an even number of probes, got {}",
            probes.len()
        )));
    }

    let middle = layout.middle_base().unwrap_or(0);
    for (pair, chunk) in probes.chunks_exact(2).enumerate() {
        let (pm, mm) = (&chunk[0], &chunk[1]);
        let consistent = pm.len() == layout.probe_length()
            && mm.len() == pm.len()
            && pm.iter().zip(mm.iter()).enumerate().all(|(i, (&a, &b))| {
                if i == middle {
                    b == complement(a)
                } else {
                    a == b
                }
            });
        if !consistent {
            return Err(LayoutError::InvalidChip(format!(
                "probes {} and {} are not a perfect-match/mismatch pair",
                2 * pair,
                2 * pair + 1
            )));
        }
    }
    Ok(())
}
