//! Seeded generation of synthetic chips for benchmarking and tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::chip::Chip;
use crate::core::deposition::{complement, DepositionSequence, ALPHABET};
use crate::core::error::{LayoutError, Result};
use crate::core::types::LayoutKind;
use crate::embed::leftmost::leftmost_embedding;

/// Default seed shared by every seeded component
pub const DEFAULT_SEED: u64 = 270_001;

const MAX_ATTEMPTS: usize = 1000;

/// Parameters of a synthetic chip
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub rows: usize,
    pub cols: usize,
    pub probe_length: usize,
    pub layout: LayoutKind,
    /// Deposition sequence; a synchronous sequence long enough for any probe
    /// when absent
    pub deposition: Option<DepositionSequence>,
    /// Fraction of probe groups to generate relative to grid capacity
    pub fill: f64,
    /// Generate single-layout probes as adjacent SNP pairs
    pub snp_pairs: bool,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rows: 16,
            cols: 16,
            probe_length: 25,
            layout: LayoutKind::Single,
            deposition: None,
            fill: 1.0,
            snp_pairs: false,
            seed: DEFAULT_SEED,
        }
    }
}

impl GeneratorConfig {
    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an empty grid, a zero probe length or a
    /// fill fraction outside `0..=1`.
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(LayoutError::InvalidConfig("grid must not be empty".to_string()));
        }
        if self.probe_length < 2 {
            return Err(LayoutError::InvalidConfig(
                "probe length must be at least 2".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.fill) {
            return Err(LayoutError::InvalidConfig(format!(
                "fill must be between 0 and 1, got {}",
                self.fill
            )));
        }
        if self.layout == LayoutKind::Paired && self.rows % 2 != 0 {
            return Err(LayoutError::InvalidConfig(
                "paired chips need an even number of rows".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generate random probes and place them row-major on a new chip.
///
/// # Errors
///
/// Returns `InvalidConfig` for bad parameters, or `InvalidChip` if no probe
/// fitting the deposition sequence could be drawn.
pub fn generate_chip(config: &GeneratorConfig) -> Result<Chip> {
    config.validate()?;

    let deposition = config
        .deposition
        .clone()
        .unwrap_or_else(|| DepositionSequence::synchronous(4 * config.probe_length));
    let mut rng = StdRng::seed_from_u64(config.seed);

    let rows_per_probe = match config.layout {
        LayoutKind::Single => 1,
        LayoutKind::Paired => 2,
    };
    let capacity = (config.rows / rows_per_probe) * config.cols;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let groups = ((capacity as f64) * config.fill).round() as usize;

    let mut probes: Vec<Vec<u8>> = Vec::with_capacity(groups * rows_per_probe);
    let middle = config.probe_length / 2;
    let pair_middle = (config.layout == LayoutKind::Paired).then_some(middle);

    while probes.len() < groups * rows_per_probe {
        let probe = random_probe(&mut rng, &deposition, config.probe_length, pair_middle)?;
        match config.layout {
            LayoutKind::Paired => {
                let mut mismatch = probe.clone();
                mismatch[middle] = complement(probe[middle]);
                probes.push(probe);
                probes.push(mismatch);
            }
            LayoutKind::Single => {
                let need_mate = config.snp_pairs && probes.len() + 1 < groups;
                let mate = need_mate.then(|| snp_variant(&mut rng, &deposition, &probe)).flatten();
                probes.push(probe);
                if let Some(mate) = mate {
                    probes.push(mate);
                }
            }
        }
    }

    let sequences: Vec<String> = probes
        .iter()
        .map(|p| String::from_utf8_lossy(p).into_owned())
        .collect();
    let mut chip = Chip::new(config.rows, config.cols, deposition, config.layout, &sequences)?;

    let leaders: Vec<usize> = (0..chip.num_probes())
        .filter(|&id| chip.layout().group_leader(id) == id)
        .collect();
    let mut leaders = leaders.into_iter();
    'grid: for row in (0..config.rows).step_by(rows_per_probe) {
        for col in 0..config.cols {
            match leaders.next() {
                Some(id) => chip.place_group(row, col, Some(id))?,
                None => break 'grid,
            }
        }
    }

    info!(
        "Generated {}x{} {} chip with {} probes (seed {})",
        config.rows,
        config.cols,
        config.layout,
        chip.num_probes(),
        config.seed
    );
    Ok(chip)
}

fn random_probe(
    rng: &mut StdRng,
    deposition: &DepositionSequence,
    len: usize,
    middle: Option<usize>,
) -> Result<Vec<u8>> {
    for _ in 0..MAX_ATTEMPTS {
        let probe: Vec<u8> = (0..len).map(|_| ALPHABET[rng.gen_range(0..4)]).collect();
        if leftmost_embedding(deposition, &probe, middle, 0).is_some() {
            return Ok(probe);
        }
    }
    Err(LayoutError::InvalidChip(format!(
        "deposition sequence of {} steps cannot realize random {len}-mers",
        deposition.len()
    )))
}

fn snp_variant(rng: &mut StdRng, deposition: &DepositionSequence, probe: &[u8]) -> Option<Vec<u8>> {
    for _ in 0..MAX_ATTEMPTS {
        let pos = rng.gen_range(0..probe.len());
        let mut variant = probe.to_vec();
        let replacement = ALPHABET[rng.gen_range(0..4)];
        if replacement == probe[pos] {
            continue;
        }
        variant[pos] = replacement;
        if leftmost_embedding(deposition, &variant, None, 0).is_some() {
            return Some(variant);
        }
    }
    None
}
