//! Deposition sequences: the fixed series of nucleotide additions applied to
//! the whole chip surface during synthesis.

use serde::{Deserialize, Serialize};

use crate::core::error::{LayoutError, Result};

/// Nucleotide alphabet in rank order
pub const ALPHABET: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Repeating unit of the Affymetrix deposition sequence
pub const AFFYMETRIX_CYCLE: &str = "TGCA";

/// Number of steps of the Affymetrix deposition sequence
pub const AFFYMETRIX_STEPS: usize = 74;

/// Repeating unit of the synchronous deposition sequence
pub const SYNCHRONOUS_CYCLE: &str = "ACGT";

/// Number of steps of the synchronous deposition sequence
pub const SYNCHRONOUS_STEPS: usize = 100;

/// Watson-Crick complement of a nucleotide; other symbols map to themselves
#[must_use]
pub fn complement(symbol: u8) -> u8 {
    match symbol {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        other => other,
    }
}

/// Two-bit rank code of a nucleotide (A=0, C=1, G=2, T=3)
#[must_use]
pub fn rank_code(symbol: u8) -> u64 {
    match symbol {
        b'A' => 0,
        b'C' => 1,
        b'G' => 2,
        _ => 3,
    }
}

/// Numeric rank of a probe sequence.
///
/// Symbols are appended two bits at a time, so equal-length probes compare by
/// rank the same way they compare lexicographically. Only the first 32 bases
/// contribute.
#[must_use]
pub fn sequence_rank(sequence: &[u8]) -> u64 {
    sequence
        .iter()
        .take(32)
        .fold(0u64, |rank, &symbol| (rank << 2) | rank_code(symbol))
}

/// Returns true if `symbol` is one of A, C, G, T
#[must_use]
pub fn is_nucleotide(symbol: u8) -> bool {
    ALPHABET.contains(&symbol)
}

/// A deposition sequence with its cycle length
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DepositionSequence {
    symbols: Vec<u8>,
    cycle: usize,
}

impl DepositionSequence {
    /// Build a deposition sequence from its symbols.
    ///
    /// # Errors
    ///
    /// Returns `InvalidChip` if the sequence is empty or contains a symbol
    /// other than A, C, G, T.
    pub fn new(sequence: &str) -> Result<Self> {
        let symbols: Vec<u8> = sequence.trim().bytes().map(|b| b.to_ascii_uppercase()).collect();

        if symbols.is_empty() {
            return Err(LayoutError::InvalidChip(
                "deposition sequence is empty".to_string(),
            ));
        }

        if let Some(pos) = symbols.iter().position(|&b| !is_nucleotide(b)) {
            return Err(LayoutError::InvalidChip(format!(
                "invalid symbol '{}' at deposition step {pos}",
                symbols[pos] as char
            )));
        }

        let cycle = smallest_period(&symbols);
        Ok(Self { symbols, cycle })
    }

    /// The 74-step "TGCA" sequence used by Affymetrix chips
    #[must_use]
    pub fn affymetrix() -> Self {
        Self::cyclic(AFFYMETRIX_CYCLE.as_bytes(), AFFYMETRIX_STEPS)
    }

    /// A synchronous "ACGT" sequence of `steps` steps
    #[must_use]
    pub fn synchronous(steps: usize) -> Self {
        Self::cyclic(SYNCHRONOUS_CYCLE.as_bytes(), steps.max(1))
    }

    fn cyclic(unit: &[u8], steps: usize) -> Self {
        let symbols: Vec<u8> = unit.iter().copied().cycle().take(steps).collect();
        let cycle = smallest_period(&symbols);
        Self { symbols, cycle }
    }

    /// Number of synthesis steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Length of the repeating unit
    #[must_use]
    pub fn cycle_length(&self) -> usize {
        self.cycle
    }

    /// Symbol deposited at `step`.
    ///
    /// # Panics
    ///
    /// Panics if `step` is not a valid step index.
    #[must_use]
    pub fn symbol(&self, step: usize) -> u8 {
        self.symbols[step]
    }

    #[must_use]
    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    /// First step at or after `from` depositing `symbol`
    #[must_use]
    pub fn find_forward(&self, symbol: u8, from: usize) -> Option<usize> {
        self.symbols
            .get(from..)?
            .iter()
            .position(|&s| s == symbol)
            .map(|offset| from + offset)
    }

    /// Last step at or before `from` depositing `symbol`
    #[must_use]
    pub fn find_backward(&self, symbol: u8, from: usize) -> Option<usize> {
        let end = from.checked_add(1)?.min(self.symbols.len());
        self.symbols[..end].iter().rposition(|&s| s == symbol)
    }
}

impl TryFrom<String> for DepositionSequence {
    type Error = LayoutError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<DepositionSequence> for String {
    fn from(value: DepositionSequence) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for DepositionSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.symbols))
    }
}

fn smallest_period(symbols: &[u8]) -> usize {
    (1..=symbols.len())
        .find(|&p| symbols.iter().enumerate().all(|(i, &s)| s == symbols[i % p]))
        .unwrap_or(symbols.len())
}
