//! Quadratic assignment solving.
//!
//! A solver receives two `dim x dim` matrices in row-major order and writes a
//! permutation `perm` (a bijection on `0..dim`) that minimizes, exactly or
//! approximately,
//!
//! ```text
//! cost(perm) = sum over i, j of a[i][j] * b[perm[i]][perm[j]]
//! ```
//!
//! Placement passes spot distances as `a` and probe distances as `b`, so
//! `perm[slot]` is the probe assigned to that slot.

use crate::core::error::{LayoutError, Result};

/// A quadratic assignment solver
pub trait QapSolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Solve the instance, writing the permutation into `perm` and returning
    /// its cost.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if a matrix or `perm` does not match `dim`.
    fn solve(&self, dim: usize, a: &[u32], b: &[u32], perm: &mut [usize]) -> Result<u64>;
}

impl<S: QapSolver + ?Sized> QapSolver for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn solve(&self, dim: usize, a: &[u32], b: &[u32], perm: &mut [usize]) -> Result<u64> {
        (**self).solve(dim, a, b, perm)
    }
}

/// Check that both matrices are `dim x dim` and `perm` has `dim` entries
///
/// # Errors
///
/// Returns `IndexOutOfRange` naming the first mismatching length.
pub fn check_dimensions(dim: usize, a: &[u32], b: &[u32], perm: &[usize]) -> Result<()> {
    let cells = dim * dim;
    if a.len() != cells {
        return Err(LayoutError::out_of_range(a.len(), cells));
    }
    if b.len() != cells {
        return Err(LayoutError::out_of_range(b.len(), cells));
    }
    if perm.len() != dim {
        return Err(LayoutError::out_of_range(perm.len(), dim));
    }
    Ok(())
}

/// Cost of a permutation
#[must_use]
pub fn compute_cost(dim: usize, a: &[u32], b: &[u32], perm: &[usize]) -> u64 {
    let mut cost = 0u64;
    for i in 0..dim {
        let pi = perm[i] * dim;
        for j in 0..dim {
            cost += u64::from(a[i * dim + j]) * u64::from(b[pi + perm[j]]);
        }
    }
    cost
}

/// Whether `perm` is a bijection on `0..perm.len()`
#[must_use]
pub fn is_permutation(perm: &[usize]) -> bool {
    let mut seen = vec![false; perm.len()];
    perm.iter().all(|&p| p < seen.len() && !std::mem::replace(&mut seen[p], true))
}

/// Inverse of a permutation; `perm` must be a bijection
#[must_use]
pub fn invert(perm: &[usize]) -> Vec<usize> {
    let mut inverse = vec![0; perm.len()];
    for (i, &p) in perm.iter().enumerate() {
        inverse[p] = i;
    }
    inverse
}

/// Keeps the given order: `perm[i] = i`
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentitySolver;

impl QapSolver for IdentitySolver {
    fn name(&self) -> &'static str {
        "IdentitySolver"
    }

    fn solve(&self, dim: usize, a: &[u32], b: &[u32], perm: &mut [usize]) -> Result<u64> {
        check_dimensions(dim, a, b, perm)?;
        for (i, p) in perm.iter_mut().enumerate() {
            *p = i;
        }
        Ok(compute_cost(dim, a, b, perm))
    }
}

/// Runs the inner solver with the two matrices exchanged and inverts the
/// resulting permutation, for solvers that expect flows and distances the
/// other way round
#[derive(Debug, Clone, Copy, Default)]
pub struct SwappedSolver<S>(pub S);

impl<S: QapSolver> QapSolver for SwappedSolver<S> {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn solve(&self, dim: usize, a: &[u32], b: &[u32], perm: &mut [usize]) -> Result<u64> {
        check_dimensions(dim, a, b, perm)?;
        let mut swapped = vec![0; dim];
        let cost = self.0.solve(dim, b, a, &mut swapped)?;
        if !is_permutation(&swapped) {
            return Err(LayoutError::InvalidPermutation { dim });
        }
        perm.copy_from_slice(&invert(&swapped));
        Ok(cost)
    }
}
