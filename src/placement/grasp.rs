//! GRASP heuristic for the quadratic assignment problem.
//!
//! Each iteration builds a randomized greedy assignment and improves it with
//! pairwise exchanges until no exchange lowers the cost. The best assignment
//! over all iterations is returned. The random source is seeded from the
//! configuration on every call, so equal inputs give equal permutations.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::error::{LayoutError, Result};
use crate::core::generator::DEFAULT_SEED;
use crate::placement::qap::{check_dimensions, compute_cost, QapSolver};

/// GRASP parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraspConfig {
    /// Number of construct-and-improve iterations
    pub max_iter: usize,
    /// Fraction of the candidate list kept for random selection
    pub alpha: f64,
    /// Fraction of matrix entries considered when seeding the first two
    /// assignments
    pub beta: f64,
    pub seed: u64,
}

impl Default for GraspConfig {
    fn default() -> Self {
        Self {
            max_iter: 32,
            alpha: 0.1,
            beta: 0.4,
            seed: DEFAULT_SEED,
        }
    }
}

impl GraspConfig {
    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if there are no iterations or a fraction is
    /// outside `(0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if self.max_iter == 0 {
            return Err(LayoutError::InvalidConfig(
                "GRASP needs at least one iteration".to_string(),
            ));
        }
        for (name, value) in [("alpha", self.alpha), ("beta", self.beta)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(LayoutError::InvalidConfig(format!(
                    "GRASP {name} must be in (0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Greedy randomized adaptive search
#[derive(Debug, Clone, Default)]
pub struct GraspSolver {
    config: GraspConfig,
}

impl GraspSolver {
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration does not validate.
    pub fn new(config: GraspConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &GraspConfig {
        &self.config
    }

    /// Seed two assignments: pair the heaviest spot weights with the lightest
    /// probe distances and pick randomly among the best products.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn seed_pairs(
        &self,
        dim: usize,
        a: &[u32],
        b: &[u32],
        rng: &mut StdRng,
    ) -> (usize, usize, usize, usize) {
        let off_diagonal = |m: &[u32]| -> Vec<(u32, usize, usize)> {
            let mut entries = Vec::with_capacity(dim * (dim - 1));
            for i in 0..dim {
                for j in 0..dim {
                    if i != j {
                        entries.push((m[i * dim + j], i, j));
                    }
                }
            }
            entries
        };

        let mut spots = off_diagonal(a);
        let mut probes = off_diagonal(b);
        spots.sort_by(|x, y| y.0.cmp(&x.0));
        probes.sort_by(|x, y| x.0.cmp(&y.0));

        let keep = ((self.config.beta * spots.len() as f64) as usize).clamp(1, spots.len());
        let mut products: Vec<(u64, usize)> = (0..keep)
            .map(|t| (u64::from(spots[t].0) * u64::from(probes[t].0), t))
            .collect();
        products.sort_unstable();

        let rcl = ((self.config.alpha * keep as f64) as usize).clamp(1, keep);
        let t = products[rng.gen_range(0..rcl)].1;
        (spots[t].1, spots[t].2, probes[t].1, probes[t].2)
    }

    /// Randomized greedy construction of a full assignment
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn construct(&self, dim: usize, a: &[u32], b: &[u32], rng: &mut StdRng) -> Vec<usize> {
        let mut partial = PartialAssignment::new(dim);
        let (s1, s2, p1, p2) = self.seed_pairs(dim, a, b, rng);
        partial.assign(a, b, s1, p1);
        partial.assign(a, b, s2, p2);

        let mut candidates: Vec<(u64, usize, usize)> = Vec::with_capacity(dim * dim);
        for _ in 2..dim {
            candidates.clear();
            for s in (0..dim).filter(|&s| partial.perm[s] == UNASSIGNED) {
                for p in (0..dim).filter(|&p| !partial.used[p]) {
                    candidates.push((partial.cost[s * dim + p], s, p));
                }
            }
            let rcl = ((self.config.alpha * candidates.len() as f64) as usize)
                .clamp(1, candidates.len());
            if rcl < candidates.len() {
                candidates.select_nth_unstable(rcl - 1);
            }
            let (_, s, p) = candidates[rng.gen_range(0..rcl)];
            partial.assign(a, b, s, p);
        }
        partial.perm
    }
}

const UNASSIGNED: usize = usize::MAX;

/// Assignment under construction
struct PartialAssignment {
    dim: usize,
    perm: Vec<usize>,
    used: Vec<bool>,
    /// `cost[s * dim + p]`: added cost of putting probe `p` on spot `s`
    /// given the assignments made so far
    cost: Vec<u64>,
}

impl PartialAssignment {
    fn new(dim: usize) -> Self {
        Self {
            dim,
            perm: vec![UNASSIGNED; dim],
            used: vec![false; dim],
            cost: vec![0; dim * dim],
        }
    }

    fn assign(&mut self, a: &[u32], b: &[u32], s: usize, p: usize) {
        let dim = self.dim;
        self.perm[s] = p;
        self.used[p] = true;
        for t in (0..dim).filter(|&t| self.perm[t] == UNASSIGNED) {
            for q in (0..dim).filter(|&q| !self.used[q]) {
                self.cost[t * dim + q] += u64::from(a[t * dim + s]) * u64::from(b[q * dim + p])
                    + u64::from(a[s * dim + t]) * u64::from(b[p * dim + q]);
            }
        }
    }
}

/// Cost change of exchanging the probes on spots `r` and `s`
fn exchange_delta(dim: usize, a: &[u32], b: &[u32], perm: &[usize], r: usize, s: usize) -> i64 {
    let a = |i: usize, j: usize| i64::from(a[i * dim + j]);
    let b = |i: usize, j: usize| i64::from(b[i * dim + j]);
    let (pr, ps) = (perm[r], perm[s]);

    let mut delta = a(r, r) * (b(ps, ps) - b(pr, pr))
        + a(r, s) * (b(ps, pr) - b(pr, ps))
        + a(s, r) * (b(pr, ps) - b(ps, pr))
        + a(s, s) * (b(pr, pr) - b(ps, ps));
    for k in 0..dim {
        if k == r || k == s {
            continue;
        }
        let pk = perm[k];
        delta += a(k, r) * (b(pk, ps) - b(pk, pr))
            + a(k, s) * (b(pk, pr) - b(pk, ps))
            + a(r, k) * (b(ps, pk) - b(pr, pk))
            + a(s, k) * (b(pr, pk) - b(ps, pk));
    }
    delta
}

/// First-improvement pairwise exchange until no exchange helps
fn local_search(dim: usize, a: &[u32], b: &[u32], perm: &mut [usize]) {
    let mut improved = true;
    while improved {
        improved = false;
        for r in 0..dim {
            for s in (r + 1)..dim {
                if exchange_delta(dim, a, b, perm, r, s) < 0 {
                    perm.swap(r, s);
                    improved = true;
                }
            }
        }
    }
}

impl QapSolver for GraspSolver {
    fn name(&self) -> &'static str {
        "GraspSolver"
    }

    fn solve(&self, dim: usize, a: &[u32], b: &[u32], perm: &mut [usize]) -> Result<u64> {
        check_dimensions(dim, a, b, perm)?;
        for (i, p) in perm.iter_mut().enumerate() {
            *p = i;
        }
        if dim < 2 {
            return Ok(compute_cost(dim, a, b, perm));
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut best_cost = compute_cost(dim, a, b, perm);

        for iteration in 0..self.config.max_iter {
            let mut candidate = self.construct(dim, a, b, &mut rng);
            local_search(dim, a, b, &mut candidate);
            let cost = compute_cost(dim, a, b, &candidate);
            if cost < best_cost {
                trace!("GRASP iteration {iteration}: cost {best_cost} -> {cost}");
                best_cost = cost;
                perm.copy_from_slice(&candidate);
            }
            if best_cost == 0 {
                break;
            }
        }
        Ok(best_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::qap::is_permutation;

    fn random_instance(dim: usize, seed: u64) -> (Vec<u32>, Vec<u32>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut a = vec![0; dim * dim];
        let mut b = vec![0; dim * dim];
        for i in 0..dim {
            for j in (i + 1)..dim {
                let x = rng.gen_range(0..10);
                let y = rng.gen_range(0..25);
                a[i * dim + j] = x;
                a[j * dim + i] = x;
                b[i * dim + j] = y;
                b[j * dim + i] = y;
            }
        }
        (a, b)
    }

    #[test]
    fn test_returns_bijection_with_reported_cost() {
        let solver = GraspSolver::default();
        for (dim, seed) in [(2, 1), (5, 2), (12, 3), (20, 4)] {
            let (a, b) = random_instance(dim, seed);
            let mut perm = vec![0; dim];
            let cost = solver.solve(dim, &a, &b, &mut perm).unwrap();
            assert!(is_permutation(&perm), "dim {dim}");
            assert_eq!(cost, compute_cost(dim, &a, &b, &perm), "dim {dim}");
        }
    }

    #[test]
    fn test_never_worse_than_identity() {
        let (a, b) = random_instance(10, 11);
        let identity: Vec<usize> = (0..10).collect();
        let mut perm = vec![0; 10];
        let cost = GraspSolver::default().solve(10, &a, &b, &mut perm).unwrap();
        assert!(cost <= compute_cost(10, &a, &b, &identity));
    }

    #[test]
    fn test_deterministic_for_seed() {
        let (a, b) = random_instance(9, 5);
        let solver = GraspSolver::default();
        let mut first = vec![0; 9];
        let mut second = vec![0; 9];
        solver.solve(9, &a, &b, &mut first).unwrap();
        solver.solve(9, &a, &b, &mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_separates_similar_probes_from_dissimilar() {
        // a path of four spots, probes 0/1 similar and 2/3 similar
        #[rustfmt::skip]
        let a = vec![
            0, 1, 0, 0,
            1, 0, 1, 0,
            0, 1, 0, 1,
            0, 0, 1, 0,
        ];
        #[rustfmt::skip]
        let b = vec![
            0, 1, 9, 9,
            1, 0, 9, 5,
            9, 9, 0, 1,
            9, 5, 1, 0,
        ];
        let mut perm = vec![0; 4];
        let cost = GraspSolver::default().solve(4, &a, &b, &mut perm).unwrap();
        // optimal path 0-1-3-2: 2 * (1 + 5 + 1)
        assert_eq!(cost, 14);
    }

    #[test]
    fn test_tiny_dimensions() {
        let mut perm = vec![5];
        assert_eq!(GraspSolver::default().solve(1, &[3], &[4], &mut perm).unwrap(), 12);
        assert_eq!(perm, vec![0]);

        let mut empty: Vec<usize> = Vec::new();
        assert_eq!(GraspSolver::default().solve(0, &[], &[], &mut empty).unwrap(), 0);
    }

    #[test]
    fn test_config_validation() {
        assert!(GraspConfig::default().validate().is_ok());
        let config = GraspConfig {
            alpha: 0.0,
            ..GraspConfig::default()
        };
        assert!(GraspSolver::new(config).is_err());
        let config = GraspConfig {
            max_iter: 0,
            ..GraspConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
