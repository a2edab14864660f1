//! Fixed-length bit vectors marking the productive synthesis steps of a probe.
//!
//! Position 0 is the first synthesis step. Bits are packed most-significant
//! first into 64-bit words, so comparing the word slices as unsigned integers
//! orders embeddings lexicographically by step.

use std::cmp::Ordering;

use crate::core::deposition::DepositionSequence;
use crate::core::error::{LayoutError, Result};
use crate::core::types::Direction;

const WORD_BITS: usize = 64;

#[inline]
fn mask(pos: usize) -> u64 {
    1u64 << (WORD_BITS - 1 - pos % WORD_BITS)
}

/// Bit vector over `len` synthesis steps
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitEmbedding {
    words: Vec<u64>,
    len: usize,
}

impl BitEmbedding {
    /// An embedding of `len` steps with every step masked
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(WORD_BITS)],
            len,
        }
    }

    /// Build an embedding with the given steps set.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if any position is `>= len`.
    pub fn from_positions(len: usize, positions: impl IntoIterator<Item = usize>) -> Result<Self> {
        let mut embedding = Self::new(len);
        for pos in positions {
            embedding.set(pos)?;
        }
        Ok(embedding)
    }

    /// Parse a string of `0`/`1` characters, one per step.
    ///
    /// # Errors
    ///
    /// Returns `InvalidChip` on any other character.
    pub fn from_step_string(steps: &str) -> Result<Self> {
        let mut embedding = Self::new(steps.len());
        for (pos, ch) in steps.chars().enumerate() {
            match ch {
                '1' => embedding.words[pos / WORD_BITS] |= mask(pos),
                '0' => {}
                other => {
                    return Err(LayoutError::InvalidChip(format!(
                        "invalid embedding character '{other}' at step {pos}"
                    )))
                }
            }
        }
        Ok(embedding)
    }

    /// One `0`/`1` character per step
    #[must_use]
    pub fn to_step_string(&self) -> String {
        (0..self.len)
            .map(|pos| if self.bit(pos) { '1' } else { '0' })
            .collect()
    }

    /// Number of steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn check(&self, pos: usize) -> Result<()> {
        if pos < self.len {
            Ok(())
        } else {
            Err(LayoutError::out_of_range(pos, self.len))
        }
    }

    #[inline]
    fn bit(&self, pos: usize) -> bool {
        self.words[pos / WORD_BITS] & mask(pos) != 0
    }

    /// Whether step `pos` is productive.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `pos >= len()`.
    pub fn is_set(&self, pos: usize) -> Result<bool> {
        self.check(pos)?;
        Ok(self.bit(pos))
    }

    /// Mark step `pos` as productive.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `pos >= len()`.
    pub fn set(&mut self, pos: usize) -> Result<()> {
        self.check(pos)?;
        self.words[pos / WORD_BITS] |= mask(pos);
        Ok(())
    }

    /// Mark step `pos` as masked.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `pos >= len()`.
    pub fn clear(&mut self, pos: usize) -> Result<()> {
        self.check(pos)?;
        self.words[pos / WORD_BITS] &= !mask(pos);
        Ok(())
    }

    /// Mask every step
    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }

    /// Number of productive steps
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Nearest productive step at or beyond `pos` in `direction`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `pos >= len()`.
    pub fn next_set_from(&self, pos: usize, direction: Direction) -> Result<Option<usize>> {
        self.check(pos)?;
        Ok(match direction {
            Direction::Forward => self.scan_forward(pos),
            Direction::Backward => self.scan_backward(pos),
        })
    }

    fn scan_forward(&self, pos: usize) -> Option<usize> {
        let mut word = pos / WORD_BITS;
        let mut bits = self.words.get(word)? & (u64::MAX >> (pos % WORD_BITS));
        loop {
            if bits != 0 {
                let found = word * WORD_BITS + bits.leading_zeros() as usize;
                return (found < self.len).then_some(found);
            }
            word += 1;
            bits = *self.words.get(word)?;
        }
    }

    fn scan_backward(&self, pos: usize) -> Option<usize> {
        let mut word = pos / WORD_BITS;
        let mut bits = self.words.get(word)? & (u64::MAX << (WORD_BITS - 1 - pos % WORD_BITS));
        loop {
            if bits != 0 {
                return Some(word * WORD_BITS + WORD_BITS - 1 - bits.trailing_zeros() as usize);
            }
            word = word.checked_sub(1)?;
            bits = self.words[word];
        }
    }

    /// First productive step
    #[must_use]
    pub fn first_set(&self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.scan_forward(0)
    }

    /// Last productive step
    #[must_use]
    pub fn last_set(&self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.scan_backward(self.len - 1)
    }

    /// Lazy iterator over productive steps, usable from either end
    #[must_use]
    pub fn iter_set(&self) -> SetSteps<'_> {
        SetSteps {
            embedding: self,
            front: 0,
            back: self.len,
        }
    }

    /// Number of steps where `self` and `other` differ
    #[must_use]
    pub fn hamming_distance(&self, other: &Self) -> usize {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a ^ b).count_ones() as usize)
            .sum()
    }

    /// Bitwise OR of two embeddings of the same length
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            words: self
                .words
                .iter()
                .zip(&other.words)
                .map(|(a, b)| a | b)
                .collect(),
            len: self.len,
        }
    }

    /// Mask every step in `start..end`
    pub fn clear_range(&mut self, start: usize, end: usize) {
        for pos in start..end.min(self.len) {
            self.words[pos / WORD_BITS] &= !mask(pos);
        }
    }

    /// Overwrite steps `start..end` with the corresponding steps of `source`
    pub fn copy_range_from(&mut self, source: &Self, start: usize, end: usize) {
        for pos in start..end.min(self.len).min(source.len) {
            if source.bit(pos) {
                self.words[pos / WORD_BITS] |= mask(pos);
            } else {
                self.words[pos / WORD_BITS] &= !mask(pos);
            }
        }
    }

    /// Deposition symbols read at the productive steps, in step order
    #[must_use]
    pub fn decode(&self, deposition: &DepositionSequence) -> Vec<u8> {
        self.iter_set()
            .filter(|&pos| pos < deposition.len())
            .map(|pos| deposition.symbol(pos))
            .collect()
    }
}

impl PartialOrd for BitEmbedding {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BitEmbedding {
    fn cmp(&self, other: &Self) -> Ordering {
        self.words
            .cmp(&other.words)
            .then_with(|| self.len.cmp(&other.len))
    }
}

impl std::fmt::Display for BitEmbedding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_step_string())
    }
}

/// Iterator over the productive steps of a [`BitEmbedding`]
#[derive(Debug, Clone)]
pub struct SetSteps<'a> {
    embedding: &'a BitEmbedding,
    front: usize,
    back: usize,
}

impl Iterator for SetSteps<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.front >= self.back {
            return None;
        }
        match self.embedding.scan_forward(self.front) {
            Some(pos) if pos < self.back => {
                self.front = pos + 1;
                Some(pos)
            }
            _ => {
                self.front = self.back;
                None
            }
        }
    }
}

impl DoubleEndedIterator for SetSteps<'_> {
    fn next_back(&mut self) -> Option<usize> {
        if self.front >= self.back {
            return None;
        }
        match self.embedding.scan_backward(self.back - 1) {
            Some(pos) if pos >= self.front => {
                self.back = pos;
                Some(pos)
            }
            _ => {
                self.back = self.front;
                None
            }
        }
    }
}
