use std::path::PathBuf;

use clap::Args;

use crate::cli::OutputFormat;
use crate::core::chip::Chip;
use crate::core::deposition::DepositionSequence;
use crate::core::generator::{generate_chip, GeneratorConfig, DEFAULT_SEED};
use crate::core::types::{
    ConflictDefinition, ConflictMode, EmbeddingKind, LayoutKind, OrderingKind, PlacementKind,
    SolverKind,
};
use crate::pipeline::{run_pipeline, PipelineConfig, PipelineReport, QualityReport};
use crate::placement::window::OptimizerConfig;

#[derive(Args)]
pub struct LayoutArgs {
    /// Chip JSON to lay out; a synthetic chip is generated when omitted
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Write the resulting chip as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pipeline configuration JSON; command-line options override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Rows of a generated chip
    #[arg(long, default_value = "16")]
    pub rows: usize,

    /// Columns of a generated chip
    #[arg(long, default_value = "16")]
    pub cols: usize,

    /// Probe length of a generated chip
    #[arg(long, default_value = "25")]
    pub probe_length: usize,

    /// Probe layout of a generated chip
    #[arg(long, value_enum, default_value = "single")]
    pub layout: LayoutKind,

    /// Deposition sequence of a generated chip ("affymetrix" or explicit bases)
    #[arg(long)]
    pub deposition: Option<String>,

    /// Fraction of the generated grid to fill with probes
    #[arg(long, default_value = "1.0")]
    pub fill: f64,

    /// Generate adjacent SNP pairs instead of independent probes
    #[arg(long)]
    pub snp_pairs: bool,

    /// Seed for chip generation and randomized placement
    #[arg(long)]
    pub seed: Option<u64>,

    /// Embedding strategy
    #[arg(long, value_enum)]
    pub embedding: Option<EmbeddingKind>,

    /// Probe ordering before placement
    #[arg(long, value_enum)]
    pub ordering: Option<OrderingKind>,

    /// Initial placement algorithm
    #[arg(long, value_enum)]
    pub placement: Option<PlacementKind>,

    /// QAP solver for placement and sliding windows
    #[arg(long, value_enum)]
    pub solver: Option<SolverKind>,

    /// Quality measure minimized by placement
    #[arg(long, value_enum)]
    pub conflict_mode: Option<ConflictMode>,

    /// Conflict index weight tables
    #[arg(long, value_enum)]
    pub definition: Option<ConflictDefinition>,

    /// GRASP iterations per QAP solve
    #[arg(long)]
    pub grasp_iter: Option<usize>,

    /// Refine the placement with sliding windows
    #[arg(long)]
    pub optimize: bool,

    /// Sliding window size in spots (square)
    #[arg(long, requires = "optimize")]
    pub window: Option<usize>,

    /// Distance between sliding window positions
    #[arg(long, requires = "optimize")]
    pub step: Option<usize>,

    /// Maximum number of sliding window passes
    #[arg(long, requires = "optimize")]
    pub passes: Option<usize>,
}

impl LayoutArgs {
    fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(embedding) = self.embedding {
            config.embedding = embedding;
        }
        if let Some(ordering) = self.ordering {
            config.ordering = ordering;
        }
        if let Some(placement) = self.placement {
            config.placement = placement;
        }
        if let Some(solver) = self.solver {
            config.solver = solver;
        }
        if let Some(mode) = self.conflict_mode {
            config.conflict_mode = mode;
        }
        if let Some(definition) = self.definition {
            config.conflict_definition = definition;
        }
        if let Some(seed) = self.seed {
            config.grasp.seed = seed;
        }
        if let Some(max_iter) = self.grasp_iter {
            config.grasp.max_iter = max_iter;
        }

        if self.optimize {
            let optimizer = config.optimizer.get_or_insert_with(OptimizerConfig::default);
            if let Some(window) = self.window {
                optimizer.window_rows = window;
                optimizer.window_cols = window;
            }
            if let Some(step) = self.step {
                optimizer.step = step;
            }
            if let Some(passes) = self.passes {
                optimizer.max_iter = passes;
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn generator_config(&self) -> anyhow::Result<GeneratorConfig> {
        let deposition = match self.deposition.as_deref() {
            None => None,
            Some(name) if name.eq_ignore_ascii_case("affymetrix") => {
                Some(DepositionSequence::affymetrix())
            }
            Some(sequence) => Some(DepositionSequence::new(sequence)?),
        };
        Ok(GeneratorConfig {
            rows: self.rows,
            cols: self.cols,
            probe_length: self.probe_length,
            layout: self.layout,
            deposition,
            fill: self.fill,
            snp_pairs: self.snp_pairs,
            seed: self.seed.unwrap_or(DEFAULT_SEED),
        })
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn run(args: LayoutArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = args.pipeline_config()?;

    let mut chip = match &args.input {
        Some(path) => Chip::load(path)?,
        None => generate_chip(&args.generator_config()?)?,
    };

    if verbose {
        eprintln!(
            "Chip: {}x{} spots, {} probes, {} deposition steps",
            chip.rows(),
            chip.cols(),
            chip.num_probes(),
            chip.deposition().len()
        );
        eprintln!(
            "Pipeline: embedding={:?} ordering={:?} placement={:?} solver={:?} mode={}",
            config.embedding,
            config.ordering,
            config.placement,
            config.solver,
            config.conflict_mode
        );
    }

    let report = run_pipeline(&mut chip, &config)?;

    if let Some(path) = &args.output {
        chip.save(path)?;
        if verbose {
            eprintln!("Wrote chip to {}", path.display());
        }
    }

    match format {
        OutputFormat::Text => print_text_report(&report),
        OutputFormat::Json => print_json_report(&report)?,
        OutputFormat::Tsv => print_tsv_report(&report),
    }

    Ok(())
}

fn print_text_report(report: &PipelineReport) {
    println!("Layout Results");
    println!("{}", "=".repeat(60));

    println!("\nStrategies:");
    println!("  Embedding: {}", report.embedding);
    println!("  Ordering: {}", report.ordering.unwrap_or("none"));
    println!("  Placement: {}", report.placement);

    if let Some(optimization) = &report.optimization {
        println!("\nSliding Window Optimization:");
        println!("  Passes: {}", optimization.passes);
        println!("  Windows improved: {}", optimization.improvements);
        if optimization.cancelled {
            println!("  Cancelled before convergence");
        }
    }

    if report.unplaced > 0 {
        println!("\nWARNING: {} probe groups did not fit on the chip", report.unplaced);
    }

    print_text_quality(&report.quality);
    println!("\nElapsed: {} ms", report.elapsed_ms);
}

/// Shared with `evaluate`
pub(crate) fn print_text_quality(quality: &QualityReport) {
    println!("\nChip:");
    println!("  Grid: {} x {}", quality.rows, quality.cols);
    println!("  Probes: {}", quality.probes);
    println!("  Placed spots: {}", quality.placed_spots);

    println!("\nQuality:");
    println!("  Border length: {:.0}", quality.border_length);
    println!("  Normalized border length: {:.4}", quality.normalized_border_length);
    println!("  Average conflict index: {:.4}", quality.average_conflict_index);
}

fn print_json_report(report: &PipelineReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn print_tsv_report(report: &PipelineReport) {
    println!(
        "embedding\tordering\tplacement\tunplaced\tborder_length\tnormalized_border_length\taverage_conflict_index\telapsed_ms"
    );
    println!(
        "{}\t{}\t{}\t{}\t{:.0}\t{:.4}\t{:.4}\t{}",
        report.embedding,
        report.ordering.unwrap_or("none"),
        report.placement,
        report.unplaced,
        report.quality.border_length,
        report.quality.normalized_border_length,
        report.quality.average_conflict_index,
        report.elapsed_ms,
    );
}
