//! End-to-end layout runs: embed, order, place, optimize, evaluate.

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::chip::Chip;
use crate::core::error::Result;
use crate::core::evaluation::{average_conflict_index, border_length};
use crate::core::types::{
    ConflictDefinition, ConflictMode, EmbeddingKind, OrderingKind, PlacementKind, SolverKind,
};
use crate::embed::{embedder_for, SnpPairEmbedding};
use crate::ordering::ordering_for;
use crate::placement::grasp::{GraspConfig, GraspSolver};
use crate::placement::qap::{IdentitySolver, QapSolver, SwappedSolver};
use crate::placement::window::{OptimizeReport, OptimizerConfig, SlidingWindowOptimizer};
use crate::placement::{QapPlacer, RandomFiller, RegionFiller, SequentialFiller};

/// Everything a layout run needs besides the chip
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub embedding: EmbeddingKind,
    pub ordering: OrderingKind,
    pub placement: PlacementKind,
    /// Solver behind QAP placement and the sliding windows
    pub solver: SolverKind,
    pub conflict_mode: ConflictMode,
    pub conflict_definition: ConflictDefinition,
    pub grasp: GraspConfig,
    /// Sliding-window pass after placement; skipped when absent
    pub optimizer: Option<OptimizerConfig>,
}

impl PipelineConfig {
    /// Load a configuration from a JSON file; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Json` if the file cannot be read or parsed, and
    /// `InvalidConfig` if a value is out of range.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `InvalidConfig` if a nested configuration does not validate.
    pub fn validate(&self) -> Result<()> {
        self.grasp.validate()?;
        if let Some(optimizer) = &self.optimizer {
            optimizer.validate()?;
        }
        Ok(())
    }

    fn solver(&self) -> Result<Box<dyn QapSolver>> {
        Ok(match self.solver {
            SolverKind::Grasp => Box::new(GraspSolver::new(self.grasp.clone())?),
            SolverKind::SwappedGrasp => {
                Box::new(SwappedSolver(GraspSolver::new(self.grasp.clone())?))
            }
            SolverKind::Identity => Box::new(IdentitySolver),
        })
    }

    fn filler(&self) -> Result<Box<dyn RegionFiller>> {
        Ok(match self.placement {
            PlacementKind::Qap => Box::new(
                QapPlacer::new(self.solver()?, self.conflict_mode)
                    .with_definition(self.conflict_definition),
            ),
            PlacementKind::Sequential => Box::new(SequentialFiller),
            PlacementKind::Random => Box::new(RandomFiller::new(self.grasp.seed)),
        })
    }
}

/// Layout quality of a chip
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityReport {
    pub rows: usize,
    pub cols: usize,
    pub probes: usize,
    pub placed_spots: usize,
    pub border_length: f64,
    pub normalized_border_length: f64,
    pub average_conflict_index: f64,
}

impl QualityReport {
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if the grid references unknown probes.
    pub fn measure(chip: &Chip, definition: ConflictDefinition) -> Result<Self> {
        Ok(Self {
            rows: chip.rows(),
            cols: chip.cols(),
            probes: chip.num_probes(),
            placed_spots: chip.num_placed(),
            border_length: border_length(chip, false),
            normalized_border_length: border_length(chip, true),
            average_conflict_index: average_conflict_index(chip, definition)?,
        })
    }
}

/// Outcome of [`run_pipeline`]
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub embedding: &'static str,
    pub ordering: Option<&'static str>,
    pub placement: &'static str,
    pub unplaced: usize,
    pub optimization: Option<OptimizeReport>,
    pub quality: QualityReport,
    pub elapsed_ms: u64,
}

/// Embed every probe, order the movable probe groups, place them over the
/// whole chip and optionally refine the placement with sliding windows.
///
/// SNP strategies re-synchronize mates that ended up on neighbouring spots
/// after placement.
///
/// # Errors
///
/// Returns `InvalidConfig` for a bad configuration, or any error of the
/// embedding, ordering and placement layers.
pub fn run_pipeline(chip: &mut Chip, config: &PipelineConfig) -> Result<PipelineReport> {
    config.validate()?;
    let started = Instant::now();

    let embedder = embedder_for(config.embedding);
    embedder.reembed_chip(chip)?;
    info!("Embedded {} probes with {}", chip.num_probes(), embedder.name());

    let mut ids = chip.movable_probes();
    let ordering = ordering_for(config.ordering);
    if let (Some(ordering), false) = (&ordering, ids.is_empty()) {
        let last = ids.len() - 1;
        ordering.order_probes(chip, &mut ids, 0, last)?;
    }

    let filler = config.filler()?;
    let unplaced = filler.make_layout(chip, &ids)?;
    if unplaced > 0 {
        info!("{unplaced} probe groups did not fit on the chip");
    }

    let optimization = match &config.optimizer {
        Some(optimizer) => {
            let solver = config.solver()?;
            let optimizer =
                SlidingWindowOptimizer::new(optimizer.clone(), solver, config.conflict_mode)?
                    .with_definition(config.conflict_definition);
            Some(optimizer.optimize_layout(chip)?)
        }
        None => None,
    };

    match config.embedding {
        EmbeddingKind::SnpLeftMost => SnpPairEmbedding::left_most().change_layout(chip)?,
        EmbeddingKind::SnpRightMost => SnpPairEmbedding::right_most().change_layout(chip)?,
        _ => {}
    }

    chip.validate_layout()?;

    Ok(PipelineReport {
        embedding: embedder.name(),
        ordering: ordering.as_ref().map(|o| o.name()),
        placement: filler.name(),
        unplaced,
        optimization,
        quality: QualityReport::measure(chip, config.conflict_definition)?,
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LayoutError;
    use crate::core::generator::{generate_chip, GeneratorConfig};
    use crate::core::types::LayoutKind;

    fn chip(layout: LayoutKind, snp_pairs: bool) -> Chip {
        generate_chip(&GeneratorConfig {
            rows: 6,
            cols: 6,
            probe_length: 10,
            layout,
            snp_pairs,
            ..GeneratorConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_default_pipeline() {
        let mut chip = chip(LayoutKind::Single, false);
        let report = run_pipeline(&mut chip, &PipelineConfig::default()).unwrap();
        assert_eq!(report.unplaced, 0);
        assert_eq!(report.quality.placed_spots, 36);
        assert_eq!(report.embedding, "LeftMostEmbedding");
        assert_eq!(report.ordering, Some("EmbeddingOrdering"));
        assert_eq!(report.placement, "QapPlacer");
        assert!(report.optimization.is_none());
    }

    #[test]
    fn test_pipeline_with_optimizer_and_paired_chip() {
        let mut chip = chip(LayoutKind::Paired, false);
        let config = PipelineConfig {
            embedding: EmbeddingKind::Centered,
            ordering: OrderingKind::Sequences,
            conflict_mode: ConflictMode::ConflictIndex,
            optimizer: Some(OptimizerConfig {
                window_rows: 4,
                window_cols: 4,
                step: 2,
                max_iter: 2,
                ..OptimizerConfig::default()
            }),
            ..PipelineConfig::default()
        };
        let report = run_pipeline(&mut chip, &config).unwrap();
        assert_eq!(report.quality.placed_spots, 36);
        assert!(report.optimization.unwrap().passes >= 1);
    }

    #[test]
    fn test_snp_pipeline() {
        let mut chip = chip(LayoutKind::Single, true);
        let config = PipelineConfig {
            embedding: EmbeddingKind::SnpLeftMost,
            placement: PlacementKind::Sequential,
            ordering: OrderingKind::None,
            ..PipelineConfig::default()
        };
        let report = run_pipeline(&mut chip, &config).unwrap();
        assert_eq!(report.ordering, None);
        assert_eq!(report.placement, "SequentialFiller");
    }

    #[test]
    fn test_identity_solver_matches_sequential_fill() {
        let mut sequential = chip(LayoutKind::Single, false);
        let mut identity = chip(LayoutKind::Single, false);
        let base = PipelineConfig {
            ordering: OrderingKind::None,
            ..PipelineConfig::default()
        };
        run_pipeline(
            &mut sequential,
            &PipelineConfig {
                placement: PlacementKind::Sequential,
                ..base.clone()
            },
        )
        .unwrap();
        run_pipeline(
            &mut identity,
            &PipelineConfig {
                solver: SolverKind::Identity,
                ..base
            },
        )
        .unwrap();

        for row in 0..6 {
            for col in 0..6 {
                assert_eq!(identity.spot(row, col).unwrap(), sequential.spot(row, col).unwrap());
            }
        }
    }

    #[test]
    fn test_swapped_grasp_pipeline() {
        let mut chip = chip(LayoutKind::Paired, false);
        let config = PipelineConfig {
            solver: SolverKind::SwappedGrasp,
            optimizer: Some(OptimizerConfig {
                window_rows: 4,
                window_cols: 4,
                step: 2,
                max_iter: 2,
                ..OptimizerConfig::default()
            }),
            ..PipelineConfig::default()
        };
        let report = run_pipeline(&mut chip, &config).unwrap();
        assert_eq!(report.unplaced, 0);
        assert_eq!(report.quality.placed_spots, 36);
    }

    #[test]
    fn test_config_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(
            &path,
            r#"{"embedding": "pivot", "solver": "identity", "grasp": {"max_iter": 4}, "optimizer": {"step": 2}}"#,
        )
        .unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.embedding, EmbeddingKind::Pivot);
        assert_eq!(config.solver, SolverKind::Identity);
        assert_eq!(config.grasp.max_iter, 4);
        assert!((config.grasp.alpha - 0.1).abs() < f64::EPSILON);
        let optimizer = config.optimizer.unwrap();
        assert_eq!(optimizer.step, 2);
        assert_eq!(optimizer.max_iter, 20);

        std::fs::write(&path, r#"{"grasp": {"beta": 2.0}}"#).unwrap();
        assert!(matches!(PipelineConfig::load(&path), Err(LayoutError::InvalidConfig(_))));
    }
}
