//! Sliding-window layout optimization.
//!
//! A fixed-shape window slides over the chip. For every window position the
//! probes inside are re-assigned to the window's free slots by the QAP
//! solver, and the new assignment is kept only when it lowers the window cost
//! by at least a fraction of the current cost. Passes repeat until one pass
//! makes no change or the pass limit is reached.
//!
//! The matrices and permutation buffer live in an arena owned by the
//! optimizer and reused across windows, so one optimizer runs one pass at a
//! time: [`SlidingWindowOptimizer::optimize_layout`] waits for the arena,
//! [`SlidingWindowOptimizer::try_optimize_layout`] fails with `EngineBusy`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, TryLockError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::chip::Chip;
use crate::core::error::{LayoutError, Result};
use crate::core::region::RectangularRegion;
use crate::core::types::{ConflictDefinition, ConflictMode};
use crate::placement::distance::{
    apply_permutation, current_assignment, probe_distance, spot_distance, window_slots,
};
use crate::placement::qap::{compute_cost, is_permutation, QapSolver};

/// Sliding-window parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub window_rows: usize,
    pub window_cols: usize,
    /// Distance between consecutive window positions, in spots
    pub step: usize,
    /// Maximum number of passes over the chip
    pub max_iter: usize,
    /// Minimum relative cost reduction for a window to be rewritten
    pub threshold: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            window_rows: 6,
            window_cols: 6,
            step: 3,
            max_iter: 20,
            threshold: 0.1,
        }
    }
}

impl OptimizerConfig {
    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an empty window, a zero step or a
    /// threshold outside `0..=1`.
    pub fn validate(&self) -> Result<()> {
        if self.window_rows == 0 || self.window_cols == 0 {
            return Err(LayoutError::InvalidConfig("window must not be empty".to_string()));
        }
        if self.step == 0 {
            return Err(LayoutError::InvalidConfig("window step must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(LayoutError::InvalidConfig(format!(
                "threshold must be between 0 and 1, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Outcome of an optimization run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OptimizeReport {
    /// Completed passes over the chip
    pub passes: usize,
    /// Window placements replaced over all passes
    pub improvements: usize,
    pub cancelled: bool,
}

/// Scratch buffers reused across windows
#[derive(Debug, Default)]
struct WindowArena {
    /// Window rows, columns and rows per probe the cached spot matrix was
    /// built for
    shape: Option<(usize, usize, usize)>,
    /// Spot matrix of a window without fixed spots
    spot_cache: Vec<u32>,
    /// Spot matrix of the current window when it has fixed spots
    spot_scratch: Vec<u32>,
    probe_dist: Vec<u32>,
    perm: Vec<usize>,
}

impl WindowArena {
    /// Size the per-window buffers for `dim` slots
    fn prepare(&mut self, dim: usize) {
        if self.perm.len() != dim {
            self.perm.resize(dim, 0);
        }
    }

    /// Drop the cached spot matrix when the window shape changes
    fn reset_shape(&mut self, shape: (usize, usize, usize)) {
        if self.shape != Some(shape) {
            self.shape = Some(shape);
            self.spot_cache.clear();
        }
    }
}

/// Re-solves windows of an existing layout
pub struct SlidingWindowOptimizer {
    config: OptimizerConfig,
    solver: Box<dyn QapSolver>,
    mode: ConflictMode,
    definition: ConflictDefinition,
    arena: Mutex<WindowArena>,
    cancel: Option<Arc<AtomicBool>>,
}

impl SlidingWindowOptimizer {
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration does not validate.
    pub fn new(
        config: OptimizerConfig,
        solver: Box<dyn QapSolver>,
        mode: ConflictMode,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            solver,
            mode,
            definition: ConflictDefinition::default(),
            arena: Mutex::new(WindowArena::default()),
            cancel: None,
        })
    }

    /// Weight table used in conflict-index mode
    #[must_use]
    pub fn with_definition(mut self, definition: ConflictDefinition) -> Self {
        self.definition = definition;
        self
    }

    /// Stop at the next window boundary once `flag` is set
    #[must_use]
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    #[must_use]
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Optimize the chip, waiting for any pass already running on this
    /// optimizer.
    ///
    /// # Errors
    ///
    /// Returns errors from matrix construction, the solver or placement.
    pub fn optimize_layout(&self, chip: &mut Chip) -> Result<OptimizeReport> {
        let mut arena = self.arena.lock().unwrap_or_else(PoisonError::into_inner);
        self.run(chip, &mut arena)
    }

    /// Optimize the chip unless another pass is running on this optimizer.
    ///
    /// # Errors
    ///
    /// Returns `EngineBusy` if the arena is in use, otherwise as
    /// [`SlidingWindowOptimizer::optimize_layout`].
    pub fn try_optimize_layout(&self, chip: &mut Chip) -> Result<OptimizeReport> {
        let mut arena = match self.arena.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return Err(LayoutError::EngineBusy),
        };
        self.run(chip, &mut arena)
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn run(&self, chip: &mut Chip, arena: &mut WindowArena) -> Result<OptimizeReport> {
        let windows = self.window_positions(chip)?;
        let mut report = OptimizeReport::default();
        if let Some(first) = windows.first() {
            arena.reset_shape((first.rows(), first.cols(), chip.layout().rows_per_probe()));
        }

        for pass in 0..self.config.max_iter {
            let mut improved = 0;
            for window in &windows {
                if self.cancelled() {
                    info!("Optimization cancelled during pass {}", pass + 1);
                    report.cancelled = true;
                    return Ok(report);
                }
                if self.optimize_window(chip, window, arena)? {
                    improved += 1;
                }
            }
            report.passes += 1;
            report.improvements += improved;
            debug!("Pass {}: {} of {} windows improved", pass + 1, improved, windows.len());
            if improved == 0 {
                break;
            }
        }

        info!(
            "Sliding-window optimization finished after {} passes ({} windows improved)",
            report.passes, report.improvements
        );
        Ok(report)
    }

    /// Window positions, row bands first then columns; the last position in
    /// each direction is clamped to the chip border
    fn window_positions(&self, chip: &Chip) -> Result<Vec<RectangularRegion>> {
        let rpp = chip.layout().rows_per_probe();
        let align = |n: usize| (n / rpp).max(1) * rpp;

        let rows = align(self.config.window_rows).min(chip.rows() / rpp * rpp);
        let cols = self.config.window_cols.min(chip.cols());
        if rows == 0 || cols == 0 {
            return Ok(Vec::new());
        }

        let mut positions = Vec::new();
        for first_row in starts(chip.rows() / rpp * rpp, rows, align(self.config.step)) {
            for first_col in starts(chip.cols(), cols, self.config.step) {
                positions.push(RectangularRegion::new(
                    first_row,
                    first_row + rows - 1,
                    first_col,
                    first_col + cols - 1,
                )?);
            }
        }
        Ok(positions)
    }

    /// Re-solve one window; returns whether its placement was replaced
    #[allow(clippy::cast_precision_loss)]
    fn optimize_window(
        &self,
        chip: &mut Chip,
        window: &RectangularRegion,
        arena: &mut WindowArena,
    ) -> Result<bool> {
        let slots = window_slots(chip, window)?;
        let dim = slots.len();
        if dim < 2 {
            return Ok(false);
        }

        let full_window = dim * chip.layout().rows_per_probe() == window.rows() * window.cols();
        arena.prepare(dim);
        let WindowArena {
            spot_cache,
            spot_scratch,
            probe_dist,
            perm,
            ..
        } = arena;

        let spots: &[u32] = if full_window {
            if spot_cache.len() != dim * dim {
                spot_distance(chip, &slots, self.mode, self.definition, spot_cache);
            }
            spot_cache
        } else {
            spot_distance(chip, &slots, self.mode, self.definition, spot_scratch);
            spot_scratch
        };

        let (probes, current) = current_assignment(chip, &slots)?;
        if probes.is_empty() {
            return Ok(false);
        }
        probe_distance(chip, &probes, dim, probe_dist)?;

        let current_cost = compute_cost(dim, spots, probe_dist, &current);
        if current_cost == 0 {
            return Ok(false);
        }
        self.solver.solve(dim, spots, probe_dist, perm)?;
        if !is_permutation(perm) {
            return Err(LayoutError::InvalidPermutation { dim });
        }
        let solved_cost = compute_cost(dim, spots, probe_dist, perm);

        let gain = current_cost.saturating_sub(solved_cost);
        if solved_cost < current_cost && gain as f64 >= self.config.threshold * current_cost as f64
        {
            apply_permutation(chip, &slots, &probes, perm)?;
            debug!("Window {window}: cost {current_cost} -> {solved_cost}");
            return Ok(true);
        }
        Ok(false)
    }
}

impl std::fmt::Debug for SlidingWindowOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingWindowOptimizer")
            .field("config", &self.config)
            .field("solver", &self.solver.name())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// Start offsets of a `size` window sliding by `step` over `total`, the last
/// one flush with the end
fn starts(total: usize, size: usize, step: usize) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut start = 0;
    loop {
        if start + size >= total {
            let last = total - size;
            if starts.last() != Some(&last) {
                starts.push(last);
            }
            return starts;
        }
        starts.push(start);
        start += step;
    }
}
